//! The `EventFactory` Node (§3, §4.5): posts Engine events. `event_eos P`
//! expands to `create /pipelines/P/event eos` (§4.5); there is no standing
//! child to install, so `create` simply posts the event and returns this
//! Node itself as the resolved target.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value;

use crate::engine::{Engine, PipelineHandle};
use crate::error::CoreResult;
use crate::tree::{NodeKind, NodeRef, TreeNode};

pub struct EventFactoryNode {
    engine: Arc<dyn Engine>,
    handle: PipelineHandle,
    self_weak: std::sync::OnceLock<Weak<EventFactoryNode>>,
}

impl EventFactoryNode {
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>, handle: PipelineHandle) -> Arc<Self> {
        let node = Arc::new(Self { engine, handle, self_weak: std::sync::OnceLock::new() });
        let _ = node.self_weak.set(Arc::downgrade(&node));
        node
    }
}

#[async_trait]
impl TreeNode for EventFactoryNode {
    fn name(&self) -> String {
        "event".to_string()
    }

    fn description(&self) -> String {
        "pipeline event factory".to_string()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::EventFactory
    }

    async fn create(&self, name: &str, _description: &str) -> CoreResult<NodeRef> {
        self.engine.post_event(self.handle, name).await.map_err(crate::error::CoreError::from)?;
        Ok(self.self_weak.get().and_then(Weak::upgrade).expect("set in new()"))
    }

    async fn read(&self) -> CoreResult<Value> {
        Ok(serde_json::json!({"name": "event"}))
    }
}
