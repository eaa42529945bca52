//! The combined `Signals`/`Actions` container (§3). Actions are discovered
//! from the Engine's schema on first resolve, mirroring `Properties`.
//! Signals have no standing existence on the Engine side until a caller
//! explicitly connects one; `signal_connect` (§4.5) maps onto this
//! container's `create`.
//!
//! Both kinds share one name index so a signal cannot collide with an
//! action of the same name; the wire path segment is `signals-actions`
//! (chosen over picking one of the two names to avoid biasing the
//! rendered tree toward either).

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::{OnceCell, RwLock};

use crate::engine::{ElementHandle, Engine};
use crate::error::{CoreError, CoreResult};
use crate::tree::action::ActionNode;
use crate::tree::signal::SignalNode;
use crate::tree::{render_container, NodeKind, NodeRef, TreeNode};

enum Child {
    Action(Arc<ActionNode>),
    Signal(Arc<SignalNode>),
}

impl Child {
    fn name(&self) -> String {
        match self {
            Self::Action(node) => node.name(),
            Self::Signal(node) => node.name(),
        }
    }

    fn description(&self) -> String {
        match self {
            Self::Action(node) => node.description(),
            Self::Signal(node) => node.description(),
        }
    }
}

pub struct SignalsActionsNode {
    engine: Arc<dyn Engine>,
    element: ElementHandle,
    actions: OnceCell<IndexMap<String, Arc<ActionNode>>>,
    signals: RwLock<IndexMap<String, Arc<SignalNode>>>,
}

impl SignalsActionsNode {
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>, element: ElementHandle) -> Self {
        Self { engine, element, actions: OnceCell::new(), signals: RwLock::new(IndexMap::new()) }
    }

    async fn discovered_actions(&self) -> CoreResult<&IndexMap<String, Arc<ActionNode>>> {
        self.actions
            .get_or_try_init(|| async {
                let schemas = self.engine.list_actions(self.element).await.map_err(CoreError::from)?;
                let mut map = IndexMap::with_capacity(schemas.len());
                for schema in schemas {
                    let node = Arc::new(ActionNode::new(self.engine.clone(), self.element, schema.clone()));
                    map.insert(schema.name, node);
                }
                Ok(map)
            })
            .await
    }
}

#[async_trait]
impl TreeNode for SignalsActionsNode {
    fn name(&self) -> String {
        "signals-actions".to_string()
    }

    fn description(&self) -> String {
        "signal and action collection".to_string()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::SignalsActions
    }

    async fn child(&self, segment: &str) -> CoreResult<NodeRef> {
        let actions = self.discovered_actions().await?;
        if let Some(node) = actions.get(segment) {
            return Ok(node.clone());
        }
        let signals = self.signals.read().await;
        signals
            .get(segment)
            .cloned()
            .map(|node| node as NodeRef)
            .ok_or_else(|| CoreError::NoResource(segment.to_string()))
    }

    async fn create(&self, name: &str, _description: &str) -> CoreResult<NodeRef> {
        if name.is_empty() {
            return Err(CoreError::NullArgument);
        }
        let actions = self.discovered_actions().await?;
        if actions.contains_key(name) {
            return Err(CoreError::ExistingResource(name.to_string()));
        }
        let mut signals = self.signals.write().await;
        if signals.contains_key(name) {
            return Err(CoreError::ExistingResource(name.to_string()));
        }
        let schemas = self.engine.list_signals(self.element).await.map_err(CoreError::from)?;
        let schema = schemas
            .into_iter()
            .find(|schema| schema.name == name)
            .ok_or_else(|| CoreError::NoResource(name.to_string()))?;
        self.engine.connect_signal(self.element, name).await.map_err(CoreError::from)?;
        let node = Arc::new(SignalNode::new(self.engine.clone(), self.element, schema));
        signals.insert(name.to_string(), node.clone());
        Ok(node)
    }

    async fn read(&self) -> CoreResult<Value> {
        let actions = self.discovered_actions().await?;
        let signals = self.signals.read().await;
        let children: Vec<Child> = actions
            .values()
            .map(|node| Child::Action(node.clone()))
            .chain(signals.values().map(|node| Child::Signal(node.clone())))
            .collect();
        Ok(render_container(
            &self.name(),
            children.iter().map(|child| (child.name(), child.description())).collect(),
        ))
    }

    async fn delete(&self, name: &str) -> CoreResult<()> {
        let mut signals = self.signals.write().await;
        signals.swap_remove(name).map(|_| ()).ok_or_else(|| CoreError::NoResource(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeEngine;

    async fn new_node() -> SignalsActionsNode {
        let engine: Arc<dyn Engine> = Arc::new(FakeEngine::new());
        let pipeline = engine.build_pipeline("fakesrc ! fakesink").await.unwrap();
        let elements = crate::engine::iterate_elements(engine.as_ref(), pipeline).await.unwrap();
        SignalsActionsNode::new(engine, elements[0])
    }

    #[tokio::test]
    async fn signal_connect_installs_a_child_and_rejects_a_second_connect() {
        let node = new_node().await;
        let signal = node.create("bar", "").await.unwrap();
        assert_eq!(signal.name(), "bar");
        assert!(matches!(node.create("bar", "").await, Err(CoreError::ExistingResource(_))));

        let rendered = node.read().await.unwrap();
        let names: Vec<&str> =
            rendered["children"].as_array().unwrap().iter().map(|c| c["name"].as_str().unwrap()).collect();
        assert!(names.contains(&"bar"));
    }

    #[tokio::test]
    async fn connecting_an_unknown_signal_is_no_resource() {
        let node = new_node().await;
        assert!(matches!(node.create("does-not-exist", "").await, Err(CoreError::NoResource(_))));
    }
}
