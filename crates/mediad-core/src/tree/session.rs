//! The Session root (§3, §4.4): a process-singleton Node holding the
//! `Pipelines` container and the `Debug` configuration Node.
//!
//! Construction is guarded by a process-wide mutex with double-checked
//! initialization (§9 "Global Session"); repeated acquisitions return the
//! same `Arc` clone, and releases are simply drops — `Arc`'s atomic
//! refcount already balances acquire/release for us.

use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::engine::Engine;
use crate::error::CoreResult;
use crate::tree::debug::DebugNode;
use crate::tree::pipelines::PipelinesNode;
use crate::tree::{render_container, NodeKind, NodeRef, TreeNode};

pub struct Session {
    pipelines: Arc<PipelinesNode>,
    debug: Arc<DebugNode>,
}

static SESSION: OnceLock<Mutex<Option<Arc<Session>>>> = OnceLock::new();

impl Session {
    /// Builds a standalone Session, bypassing the process-wide singleton.
    /// Production code should go through [`Session::acquire`]; this exists
    /// so tests can hold an isolated tree instead of sharing global state.
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>) -> Arc<Self> {
        Arc::new(Self { pipelines: Arc::new(PipelinesNode::new(engine)), debug: DebugNode::new() })
    }

    /// Returns the process-wide Session, constructing it on the first call
    /// (§4.4, §9 "Global Session"). `engine` is only consulted on that first
    /// call; later calls return the existing instance unchanged.
    pub fn acquire(engine: Arc<dyn Engine>) -> Arc<Self> {
        let cell = SESSION.get_or_init(|| Mutex::new(None));
        let mut guard = cell.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(existing) = guard.as_ref() {
            return existing.clone();
        }
        let session = Self::new(engine);
        *guard = Some(session.clone());
        session
    }

    #[must_use]
    pub fn pipelines(&self) -> Arc<PipelinesNode> {
        self.pipelines.clone()
    }

    #[must_use]
    pub fn debug(&self) -> Arc<DebugNode> {
        self.debug.clone()
    }

    /// Returns this Session as a `NodeRef`, the entry point for path
    /// resolution (§4.3).
    #[must_use]
    pub fn as_node_ref(self: &Arc<Self>) -> NodeRef {
        self.clone()
    }
}

#[async_trait]
impl TreeNode for Session {
    fn name(&self) -> String {
        "session".to_string()
    }

    fn description(&self) -> String {
        "mediad session root".to_string()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Session
    }

    async fn child(&self, segment: &str) -> CoreResult<NodeRef> {
        match segment {
            "pipelines" => Ok(self.pipelines.clone()),
            "debug" => Ok(self.debug.clone()),
            other => Err(crate::error::CoreError::NoResource(other.to_string())),
        }
    }

    async fn read(&self) -> CoreResult<Value> {
        Ok(render_container(
            &self.name(),
            vec![
                ("pipelines".to_string(), "pipeline collection".to_string()),
                ("debug".to_string(), "debug configuration".to_string()),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeEngine;

    #[tokio::test]
    async fn repeated_acquisitions_return_the_same_instance() {
        let a = Session::acquire(Arc::new(FakeEngine::new()));
        let b = Session::acquire(Arc::new(FakeEngine::new()));
        assert!(Arc::ptr_eq(&a, &b));
    }
}
