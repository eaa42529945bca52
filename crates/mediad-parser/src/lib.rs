//! The Parser (§4.5): translates a textual command line into a resolved
//! `(verb, path, name?, operand?)` intent, shared verbatim by the TCP and
//! HTTP servers so both wire protocols yield identical behavior.
//!
//! Two grammars are accepted: the URI form (`<verb> <path> [<name>]
//! [<operand…>]`) and a shorthand form (`<domain>_<action> <arg…>`)
//! expanded through a fixed dispatch table onto the URI form. Neither form
//! ever touches the object tree directly — `parse` only builds a
//! [`Command`]; the caller resolves the path and invokes the verb.

mod dispatch;
mod shorthand;

use thiserror::Error;

pub use dispatch::{execute, parse_and_execute};
pub use shorthand::shorthand_names;

/// A parsed, not-yet-dispatched command (§4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create { path: String, name: String, description: String },
    Read { path: String },
    Update { path: String, value: String },
    Delete { path: String, name: String },
}

/// Errors raised while translating command text, before any Node is ever
/// consulted (§4.5: "It never executes side effects itself").
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("null argument")]
    NullArgument,
    #[error("bad command: {0}")]
    BadCommand(String),
    #[error("bad value: {0}")]
    BadValue(String),
}

impl From<ParseError> for mediad_core::CoreError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::NullArgument => Self::NullArgument,
            ParseError::BadCommand(msg) => Self::BadCommand(msg),
            ParseError::BadValue(msg) => Self::BadValue(msg, "command operand".to_string()),
        }
    }
}

/// Parses a single command line. `input` models the C API's nullable
/// string argument explicitly: `None` is `NULL_ARGUMENT` (§4.5), while
/// `Some("")` (and whitespace-only input) is `BAD_COMMAND` with no panic —
/// the fix for the source's documented empty-input crash (§4.5 "Known open
/// question", §9).
pub fn parse(input: Option<&str>) -> Result<Command, ParseError> {
    let Some(input) = input else {
        return Err(ParseError::NullArgument);
    };
    let trimmed = input.trim_end_matches(['\n', '\0']).trim();
    if trimmed.is_empty() {
        return Err(ParseError::BadCommand("empty command".to_string()));
    }

    let (head, rest) = split_head(trimmed);
    match head {
        "create" => parse_create(rest),
        "read" => parse_read(rest),
        "update" => parse_update(rest),
        "delete" => parse_delete(rest),
        other => shorthand::expand(other, rest),
    }
}

/// Splits the leading whitespace-delimited token from the remainder.
fn split_head(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim_start()),
        None => (input, ""),
    }
}

fn require_path(rest: &str) -> Result<(&str, &str), ParseError> {
    let (path, tail) = split_head(rest);
    if path.is_empty() {
        return Err(ParseError::BadValue("missing path".to_string()));
    }
    Ok((path, tail))
}

fn parse_create(rest: &str) -> Result<Command, ParseError> {
    let (path, tail) = require_path(rest)?;
    let (name, description) = split_head(tail);
    if name.is_empty() {
        return Err(ParseError::BadValue("create requires a name".to_string()));
    }
    Ok(Command::Create {
        path: path.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    })
}

fn parse_read(rest: &str) -> Result<Command, ParseError> {
    let (path, _tail) = require_path(rest)?;
    Ok(Command::Read { path: path.to_string() })
}

fn parse_update(rest: &str) -> Result<Command, ParseError> {
    let (path, tail) = require_path(rest)?;
    if tail.is_empty() {
        return Err(ParseError::BadValue("update requires an operand".to_string()));
    }
    Ok(Command::Update { path: path.to_string(), value: tail.to_string() })
}

fn parse_delete(rest: &str) -> Result<Command, ParseError> {
    let (path, tail) = require_path(rest)?;
    let (name, _) = split_head(tail);
    if name.is_empty() {
        return Err(ParseError::BadValue("delete requires a name".to_string()));
    }
    Ok(Command::Delete { path: path.to_string(), name: name.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_input_is_null_argument() {
        assert_eq!(parse(None), Err(ParseError::NullArgument));
    }

    #[test]
    fn empty_input_is_bad_command_not_a_panic() {
        assert!(matches!(parse(Some("")), Err(ParseError::BadCommand(_))));
        assert!(matches!(parse(Some("   ")), Err(ParseError::BadCommand(_))));
    }

    #[test]
    fn unknown_verb_is_bad_command() {
        assert!(matches!(parse(Some("frobnicate /pipelines")), Err(ParseError::BadCommand(_))));
    }

    #[test]
    fn uri_form_create_round_trips() {
        let cmd = parse(Some("create /pipelines p0 fakesrc ! fakesink")).unwrap();
        assert_eq!(
            cmd,
            Command::Create {
                path: "/pipelines".to_string(),
                name: "p0".to_string(),
                description: "fakesrc ! fakesink".to_string(),
            }
        );
    }

    #[test]
    fn uri_form_create_without_description_defaults_to_empty() {
        let cmd = parse(Some("create /pipelines p0")).unwrap();
        assert_eq!(
            cmd,
            Command::Create {
                path: "/pipelines".to_string(),
                name: "p0".to_string(),
                description: String::new(),
            }
        );
    }

    #[test]
    fn uri_form_update_requires_an_operand() {
        assert!(matches!(
            parse(Some("update /pipelines/p0/state")),
            Err(ParseError::BadValue(_))
        ));
    }

    #[test]
    fn leading_and_trailing_whitespace_is_tolerated() {
        let cmd = parse(Some("  read /pipelines  \n")).unwrap();
        assert_eq!(cmd, Command::Read { path: "/pipelines".to_string() });
    }

    #[test]
    fn nul_terminator_is_stripped() {
        let cmd = parse(Some("read /pipelines\0")).unwrap();
        assert_eq!(cmd, Command::Read { path: "/pipelines".to_string() });
    }
}
