//! Return codes and the internal error type for `mediad`.
//!
//! `ReturnCode` is the closed taxonomy exposed on the wire (§4.1 of the
//! design). `CoreError` is the richer, `thiserror`-based type propagated
//! internally through the object tree and the parser; the transport layer is
//! the only place that collapses a `CoreError` back down to a `ReturnCode`.

use thiserror::Error;

/// The closed set of outcomes returned by every core operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    Eok,
    NullArgument,
    BadCommand,
    NoResource,
    ExistingResource,
    BadValue,
    NoConnection,
    NoUpdate,
    Timeout,
}

impl ReturnCode {
    /// Stable small integer used in the wire envelope's `code` field.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Eok => 0,
            Self::NullArgument => 1,
            Self::BadCommand => 2,
            Self::NoResource => 3,
            Self::ExistingResource => 4,
            Self::BadValue => 5,
            Self::NoConnection => 6,
            Self::NoUpdate => 7,
            Self::Timeout => 8,
        }
    }

    /// Fixed human-readable description used in the wire envelope's
    /// `description` field.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Eok => "OK",
            Self::NullArgument => "null argument",
            Self::BadCommand => "bad command",
            Self::NoResource => "no such resource",
            Self::ExistingResource => "resource already exists",
            Self::BadValue => "bad value",
            Self::NoConnection => "no connection",
            Self::NoUpdate => "no update",
            Self::Timeout => "timeout",
        }
    }

    /// HTTP status mapping per §4.7.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::Eok => 200,
            Self::BadCommand | Self::NoResource => 404,
            Self::ExistingResource => 409,
            Self::BadValue => 204,
            Self::NullArgument | Self::NoConnection | Self::NoUpdate | Self::Timeout => 400,
        }
    }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Internal error type propagated through the object tree and parser.
///
/// Carries structured context (offending path, operand, …) for logging; the
/// wire protocol only ever sees the collapsed [`ReturnCode`].
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("null argument")]
    NullArgument,

    #[error("bad command: {0}")]
    BadCommand(String),

    #[error("no resource at '{0}'")]
    NoResource(String),

    #[error("resource '{0}' already exists")]
    ExistingResource(String),

    #[error("bad value for '{0}': {1}")]
    BadValue(String, String),

    #[error("no connection: {0}")]
    NoConnection(String),

    #[error("no update: {0}")]
    NoUpdate(String),

    #[error("timed out waiting on '{0}'")]
    Timeout(String),
}

impl CoreError {
    /// Collapses this error onto the closed wire taxonomy.
    #[must_use]
    pub const fn return_code(&self) -> ReturnCode {
        match self {
            Self::NullArgument => ReturnCode::NullArgument,
            Self::BadCommand(_) => ReturnCode::BadCommand,
            Self::NoResource(_) => ReturnCode::NoResource,
            Self::ExistingResource(_) => ReturnCode::ExistingResource,
            Self::BadValue(..) => ReturnCode::BadValue,
            Self::NoConnection(_) => ReturnCode::NoConnection,
            Self::NoUpdate(_) => ReturnCode::NoUpdate,
            Self::Timeout(_) => ReturnCode::Timeout,
        }
    }
}

/// Convenience alias used throughout the tree and parser.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_code_http_mapping_matches_spec_table() {
        assert_eq!(ReturnCode::Eok.http_status(), 200);
        assert_eq!(ReturnCode::BadCommand.http_status(), 404);
        assert_eq!(ReturnCode::NoResource.http_status(), 404);
        assert_eq!(ReturnCode::ExistingResource.http_status(), 409);
        assert_eq!(ReturnCode::BadValue.http_status(), 204);
        assert_eq!(ReturnCode::Timeout.http_status(), 400);
    }

    #[test]
    fn core_error_collapses_to_expected_return_code() {
        let err = CoreError::ExistingResource("p0".to_string());
        assert_eq!(err.return_code(), ReturnCode::ExistingResource);
    }
}
