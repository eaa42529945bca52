//! An `Element` Node (§3): owns a `Properties` container and a combined
//! `Signals`/`Actions` container, plus a non-owning handle into the Engine.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::engine::{ElementHandle, Engine};
use crate::error::{CoreError, CoreResult};
use crate::tree::properties::PropertiesNode;
use crate::tree::signals_actions::SignalsActionsNode;
use crate::tree::{NodeKind, NodeRef, TreeNode};

pub struct ElementNode {
    name: String,
    engine: Arc<dyn Engine>,
    handle: ElementHandle,
    properties: OnceCell<Arc<PropertiesNode>>,
    signals_actions: OnceCell<Arc<SignalsActionsNode>>,
}

impl ElementNode {
    #[must_use]
    pub fn new(name: String, engine: Arc<dyn Engine>, handle: ElementHandle) -> Self {
        Self {
            name,
            engine,
            handle,
            properties: OnceCell::new(),
            signals_actions: OnceCell::new(),
        }
    }

    async fn properties_node(&self) -> Arc<PropertiesNode> {
        self.properties
            .get_or_init(|| async { Arc::new(PropertiesNode::new(self.engine.clone(), self.handle)) })
            .await
            .clone()
    }

    async fn signals_actions_node(&self) -> Arc<SignalsActionsNode> {
        self.signals_actions
            .get_or_init(|| async {
                Arc::new(SignalsActionsNode::new(self.engine.clone(), self.handle))
            })
            .await
            .clone()
    }
}

#[async_trait]
impl TreeNode for ElementNode {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        "engine element".to_string()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Element
    }

    async fn child(&self, segment: &str) -> CoreResult<NodeRef> {
        match segment {
            "properties" => Ok(self.properties_node().await),
            "signals-actions" => Ok(self.signals_actions_node().await),
            other => Err(CoreError::NoResource(other.to_string())),
        }
    }

    async fn read(&self) -> CoreResult<Value> {
        Ok(serde_json::json!({
            "name": self.name,
            "children": [
                {"name": "properties", "description": "property collection"},
                {"name": "signals-actions", "description": "signal and action collection"},
            ],
        }))
    }
}
