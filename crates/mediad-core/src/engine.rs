//! The Engine adapter (§4.9): the only surface the core calls into the
//! multimedia backend. The backend itself is out of scope (§1); this module
//! defines the trait contract plus the small set of value types that cross
//! the boundary, and the core-owned iteration-resync policy (§9).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::error::CoreError;

/// Opaque handle into a backend pipeline, minted by [`Engine::build_pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineHandle(pub u64);

/// Opaque handle into a backend element, minted by [`Engine::iterate_elements`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Mints a fresh, process-unique handle value. Shared by every `Engine`
/// implementation so handles never collide across pipelines.
#[must_use]
pub fn next_handle_id() -> u64 {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

/// `state ∈ {null, ready, paused, playing}` (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Null,
    Ready,
    Paused,
    Playing,
}

impl EngineState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Ready => "ready",
            Self::Paused => "paused",
            Self::Playing => "playing",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "null" => Some(Self::Null),
            "ready" => Some(Self::Ready),
            "paused" => Some(Self::Paused),
            "playing" => Some(Self::Playing),
            _ => None,
        }
    }

    /// A transition to playing/paused holds the pipeline's play-hold
    /// refcount open; a transition to null releases it (§3, §9).
    #[must_use]
    pub const fn holds_play_refcount(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

/// `(sync|async)` outcome of [`Engine::set_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetStateOutcome {
    Sync,
    Async,
}

/// `(current, pending, ok|async|failed)` outcome of [`Engine::query_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Ok,
    Async,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryStateResult {
    pub current: EngineState,
    pub pending: Option<EngineState>,
    pub status: QueryStatus,
}

/// The declared width/shape of a property value (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyType {
    Str,
    I32,
    I64,
    U32,
    U64,
    Bool,
    F32,
    F64,
    Enum,
}

impl PropertyType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Bool => "bool",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Enum => "enum",
        }
    }
}

/// A typed property value (§3: "string, signed/unsigned integer of declared
/// width, boolean, float, double, or opaque-enum-as-string").
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Str(String),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    Bool(bool),
    F32(f32),
    F64(f64),
    Enum(String),
}

impl PropertyValue {
    #[must_use]
    pub const fn value_type(&self) -> PropertyType {
        match self {
            Self::Str(_) => PropertyType::Str,
            Self::I32(_) => PropertyType::I32,
            Self::I64(_) => PropertyType::I64,
            Self::U32(_) => PropertyType::U32,
            Self::U64(_) => PropertyType::U64,
            Self::Bool(_) => PropertyType::Bool,
            Self::F32(_) => PropertyType::F32,
            Self::F64(_) => PropertyType::F64,
            Self::Enum(_) => PropertyType::Enum,
        }
    }

    #[must_use]
    pub fn to_wire_string(&self) -> String {
        match self {
            Self::Str(s) | Self::Enum(s) => s.clone(),
            Self::I32(v) => v.to_string(),
            Self::I64(v) => v.to_string(),
            Self::U32(v) => v.to_string(),
            Self::U64(v) => v.to_string(),
            Self::Bool(v) => v.to_string(),
            Self::F32(v) => v.to_string(),
            Self::F64(v) => v.to_string(),
        }
    }

    /// Parses a wire-form operand string into a value of the given declared
    /// type, per §4.3 "Node-specific read errors" / `BAD_VALUE`.
    pub fn parse_as(kind: PropertyType, operand: &str) -> Result<Self, CoreError> {
        let bad_value = || CoreError::BadValue(operand.to_string(), kind.as_str().to_string());
        match kind {
            PropertyType::Str => Ok(Self::Str(operand.to_string())),
            PropertyType::Enum => Ok(Self::Enum(operand.to_string())),
            PropertyType::I32 => operand.parse().map(Self::I32).map_err(|_| bad_value()),
            PropertyType::I64 => operand.parse().map(Self::I64).map_err(|_| bad_value()),
            PropertyType::U32 => operand.parse().map(Self::U32).map_err(|_| bad_value()),
            PropertyType::U64 => operand.parse().map(Self::U64).map_err(|_| bad_value()),
            PropertyType::Bool => operand.parse().map(Self::Bool).map_err(|_| bad_value()),
            PropertyType::F32 => operand.parse().map(Self::F32).map_err(|_| bad_value()),
            PropertyType::F64 => operand.parse().map(Self::F64).map_err(|_| bad_value()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

#[derive(Debug, Clone)]
pub struct PropertySchema {
    pub name: String,
    pub value_type: PropertyType,
    pub access: PropertyAccess,
    pub description: String,
    pub default: PropertyValue,
}

#[derive(Debug, Clone)]
pub struct SignalSchema {
    pub name: String,
    pub arguments: Vec<PropertyType>,
}

#[derive(Debug, Clone)]
pub struct ActionSchema {
    pub name: String,
    pub arguments: Vec<PropertyType>,
    pub return_type: PropertyType,
}

/// A message popped off a pipeline's bus (§3, §4.9).
#[derive(Debug, Clone, Serialize)]
pub struct BusMessage {
    pub kind: String,
    pub source: Option<String>,
    pub fields: serde_json::Value,
}

/// Errors raised by an `Engine` implementation, translated at the adapter
/// boundary per §7's propagation policy (parse failure → `BAD_COMMAND`,
/// state-change rejection → `BAD_VALUE`, timeout → `TIMEOUT`, bind/connect
/// failure → `NO_CONNECTION`).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to parse pipeline description: {0}")]
    ParseError(String),
    #[error("no such element or pipeline handle")]
    NotFound,
    #[error("state transition rejected: {0}")]
    StateRejected(String),
    #[error("timed out")]
    Timeout,
    #[error("backend connection failure: {0}")]
    ConnectionFailure(String),
    #[error("internal engine error: {0}")]
    Internal(String),
}

impl From<EngineError> for CoreError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ParseError(msg) => Self::BadCommand(msg),
            EngineError::NotFound => Self::NoResource("engine handle".to_string()),
            EngineError::StateRejected(msg) => Self::BadValue("state".to_string(), msg),
            EngineError::Timeout => Self::Timeout("engine adapter call".to_string()),
            EngineError::ConnectionFailure(msg) => Self::NoConnection(msg),
            EngineError::Internal(msg) => Self::BadCommand(msg),
        }
    }
}

/// Outcome of a single iteration attempt, used by the core's resync-cap loop
/// (§9 "Iteration resync"). An `Engine` whose backing graph cannot mutate
/// concurrently (e.g. [`RefEngine`](../../mediad_engine/struct.RefEngine.html))
/// only ever returns `Ready`; test wrappers exercise `Resync`.
#[derive(Debug)]
pub enum IterateOutcome {
    Ready(Vec<ElementHandle>),
    Resync,
    Failed(EngineError),
}

/// The only interface the core depends on for multimedia backend
/// concurrency semantics; per §4.9, all adapter calls may block up to a
/// caller-supplied timeout and are thread-safe per-handle.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn build_pipeline(&self, description: &str) -> Result<PipelineHandle, EngineError>;

    async fn destroy(&self, handle: PipelineHandle);

    async fn set_state(
        &self,
        handle: PipelineHandle,
        state: EngineState,
    ) -> Result<SetStateOutcome, EngineError>;

    async fn query_state(
        &self,
        handle: PipelineHandle,
        timeout: Duration,
    ) -> Result<QueryStateResult, EngineError>;

    /// Single iteration attempt; callers needing the resync-cap contract
    /// should go through [`crate::engine::iterate_elements`] instead of
    /// calling this directly.
    async fn poll_elements(&self, handle: PipelineHandle) -> IterateOutcome;

    fn element_name(&self, element: ElementHandle) -> Option<String>;

    async fn list_properties(
        &self,
        element: ElementHandle,
    ) -> Result<Vec<PropertySchema>, EngineError>;

    async fn list_signals(&self, element: ElementHandle) -> Result<Vec<SignalSchema>, EngineError>;

    async fn list_actions(&self, element: ElementHandle) -> Result<Vec<ActionSchema>, EngineError>;

    async fn get_property(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<PropertyValue, EngineError>;

    async fn set_property(
        &self,
        element: ElementHandle,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), EngineError>;

    async fn connect_signal(&self, element: ElementHandle, signal: &str)
        -> Result<(), EngineError>;

    async fn emit_action(
        &self,
        element: ElementHandle,
        name: &str,
        args: &[String],
    ) -> Result<PropertyValue, EngineError>;

    async fn post_event(&self, handle: PipelineHandle, kind: &str) -> Result<(), EngineError>;

    async fn bus_pop(
        &self,
        handle: PipelineHandle,
        timeout: Duration,
        type_mask: Option<&str>,
    ) -> Result<Option<BusMessage>, EngineError>;
}

/// The core's resync-cap policy (§4.9, §9): retries `poll_elements` while it
/// reports `Resync`, capping at 10 attempts before surfacing a fatal
/// iteration error.
pub const RESYNC_CAP: u32 = 10;

pub async fn iterate_elements(
    engine: &dyn Engine,
    handle: PipelineHandle,
) -> Result<Vec<ElementHandle>, EngineError> {
    for _ in 0..RESYNC_CAP {
        match engine.poll_elements(handle).await {
            IterateOutcome::Ready(elements) => return Ok(elements),
            IterateOutcome::Resync => continue,
            IterateOutcome::Failed(err) => return Err(err),
        }
    }
    Err(EngineError::Internal("iteration resync cap exceeded".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct AlwaysResync {
        calls: AtomicU32,
        give_up_after: u32,
    }

    #[async_trait]
    impl Engine for AlwaysResync {
        async fn build_pipeline(&self, _description: &str) -> Result<PipelineHandle, EngineError> {
            unimplemented!()
        }
        async fn destroy(&self, _handle: PipelineHandle) {}
        async fn set_state(
            &self,
            _handle: PipelineHandle,
            _state: EngineState,
        ) -> Result<SetStateOutcome, EngineError> {
            unimplemented!()
        }
        async fn query_state(
            &self,
            _handle: PipelineHandle,
            _timeout: Duration,
        ) -> Result<QueryStateResult, EngineError> {
            unimplemented!()
        }
        async fn poll_elements(&self, _handle: PipelineHandle) -> IterateOutcome {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.give_up_after {
                IterateOutcome::Resync
            } else {
                IterateOutcome::Ready(vec![])
            }
        }
        fn element_name(&self, _element: ElementHandle) -> Option<String> {
            None
        }
        async fn list_properties(
            &self,
            _element: ElementHandle,
        ) -> Result<Vec<PropertySchema>, EngineError> {
            unimplemented!()
        }
        async fn list_signals(
            &self,
            _element: ElementHandle,
        ) -> Result<Vec<SignalSchema>, EngineError> {
            unimplemented!()
        }
        async fn list_actions(
            &self,
            _element: ElementHandle,
        ) -> Result<Vec<ActionSchema>, EngineError> {
            unimplemented!()
        }
        async fn get_property(
            &self,
            _element: ElementHandle,
            _name: &str,
        ) -> Result<PropertyValue, EngineError> {
            unimplemented!()
        }
        async fn set_property(
            &self,
            _element: ElementHandle,
            _name: &str,
            _value: &PropertyValue,
        ) -> Result<(), EngineError> {
            unimplemented!()
        }
        async fn connect_signal(
            &self,
            _element: ElementHandle,
            _signal: &str,
        ) -> Result<(), EngineError> {
            unimplemented!()
        }
        async fn emit_action(
            &self,
            _element: ElementHandle,
            _name: &str,
            _args: &[String],
        ) -> Result<PropertyValue, EngineError> {
            unimplemented!()
        }
        async fn post_event(&self, _handle: PipelineHandle, _kind: &str) -> Result<(), EngineError> {
            unimplemented!()
        }
        async fn bus_pop(
            &self,
            _handle: PipelineHandle,
            _timeout: Duration,
            _type_mask: Option<&str>,
        ) -> Result<Option<BusMessage>, EngineError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn resync_succeeds_under_the_cap() {
        let engine = AlwaysResync { calls: AtomicU32::new(0), give_up_after: 3 };
        let result = iterate_elements(&engine, PipelineHandle(1)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn resync_fails_at_the_cap() {
        let engine = AlwaysResync { calls: AtomicU32::new(0), give_up_after: 100 };
        let result = iterate_elements(&engine, PipelineHandle(1)).await;
        assert!(result.is_err());
    }
}
