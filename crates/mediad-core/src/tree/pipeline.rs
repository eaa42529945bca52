//! A `Pipeline` Node (§3): owns an `Elements` container, a `Bus`, a
//! `State`, and an `EventFactory`, all built lazily on first resolve and
//! torn down when the Pipeline is deleted (§3 Lifecycle).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};

use crate::engine::{Engine, PipelineHandle};
use crate::error::{CoreError, CoreResult};
use crate::tree::bus::BusNode;
use crate::tree::elements::ElementsNode;
use crate::tree::event_factory::EventFactoryNode;
use crate::tree::state::StateNode;
use crate::tree::{NodeKind, NodeRef, TreeNode};

pub struct PipelineNode {
    name: String,
    description: String,
    handle: PipelineHandle,
    engine: Arc<dyn Engine>,
    /// Serializes state transitions and play-hold refcount changes (§5
    /// "State play-hold refcount ... is serialized by the Pipeline's own
    /// object lock").
    object_lock: Mutex<()>,
    play_hold: AtomicUsize,
    elements: OnceCell<Arc<ElementsNode>>,
    bus: OnceCell<Arc<BusNode>>,
    state: OnceCell<Arc<StateNode>>,
    event_factory: OnceCell<Arc<EventFactoryNode>>,
    self_weak: std::sync::OnceLock<Weak<Self>>,
}

impl PipelineNode {
    #[must_use]
    pub fn new(
        name: String,
        description: String,
        handle: PipelineHandle,
        engine: Arc<dyn Engine>,
    ) -> Arc<Self> {
        let node = Arc::new(Self {
            name,
            description,
            handle,
            engine,
            object_lock: Mutex::new(()),
            play_hold: AtomicUsize::new(0),
            elements: OnceCell::new(),
            bus: OnceCell::new(),
            state: OnceCell::new(),
            event_factory: OnceCell::new(),
            self_weak: std::sync::OnceLock::new(),
        });
        let _ = node.self_weak.set(Arc::downgrade(&node));
        node
    }

    #[must_use]
    pub const fn handle(&self) -> PipelineHandle {
        self.handle
    }

    fn weak_self(&self) -> Weak<Self> {
        self.self_weak.get().cloned().unwrap_or_default()
    }

    async fn elements_node(&self) -> Arc<ElementsNode> {
        self.elements
            .get_or_init(|| async { Arc::new(ElementsNode::new(self.engine.clone(), self.handle)) })
            .await
            .clone()
    }

    async fn bus_node(&self) -> Arc<BusNode> {
        self.bus
            .get_or_init(|| async { BusNode::new(self.engine.clone(), self.handle) })
            .await
            .clone()
    }

    async fn state_node(&self) -> Arc<StateNode> {
        self.state
            .get_or_init(|| async { Arc::new(StateNode::new(self.weak_self())) })
            .await
            .clone()
    }

    async fn event_factory_node(&self) -> Arc<EventFactoryNode> {
        self.event_factory
            .get_or_init(|| async { EventFactoryNode::new(self.engine.clone(), self.handle) })
            .await
            .clone()
    }

    #[must_use]
    pub const fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    /// Applies a play-hold refcount delta under the object lock (§9
    /// "Reference counting and cycles": "implement as an atomic counter on
    /// the pipeline guarded by its per-object lock").
    pub async fn adjust_play_hold(&self, holds: bool) {
        let _guard = self.object_lock.lock().await;
        if holds {
            self.play_hold.fetch_add(1, Ordering::SeqCst);
        } else if self.play_hold.load(Ordering::SeqCst) > 0 {
            self.play_hold.fetch_sub(1, Ordering::SeqCst);
        }
    }

    pub async fn is_play_held(&self) -> bool {
        let _guard = self.object_lock.lock().await;
        self.play_hold.load(Ordering::SeqCst) > 0
    }

    pub async fn current_state_name(&self) -> String {
        let state = self.state_node().await;
        state.current_state_name().await
    }
}

#[async_trait]
impl TreeNode for PipelineNode {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Pipeline
    }

    async fn child(&self, segment: &str) -> CoreResult<NodeRef> {
        match segment {
            "elements" => Ok(self.elements_node().await),
            "bus" => Ok(self.bus_node().await),
            "state" => Ok(self.state_node().await),
            "event" => Ok(self.event_factory_node().await),
            other => Err(CoreError::NoResource(other.to_string())),
        }
    }

    async fn read(&self) -> CoreResult<Value> {
        Ok(serde_json::json!({
            "name": self.name,
            "description": self.description,
            "state": self.current_state_name().await,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeEngine;

    async fn new_pipeline() -> Arc<PipelineNode> {
        let engine: Arc<dyn Engine> = Arc::new(FakeEngine::new());
        let handle = engine.build_pipeline("fakesrc ! fakesink").await.unwrap();
        PipelineNode::new("p0".to_string(), "fakesrc ! fakesink".to_string(), handle, engine)
    }

    #[tokio::test]
    async fn lazily_built_children_are_cached_across_resolves() {
        let pipeline = new_pipeline().await;
        let first = pipeline.child("state").await.unwrap();
        let second = pipeline.child("state").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn play_hold_is_refcount_balanced_across_a_playing_to_null_cycle() {
        let pipeline = new_pipeline().await;
        assert!(!pipeline.is_play_held().await);

        let state = pipeline.child("state").await.unwrap();
        state.update("playing").await.unwrap();
        assert!(pipeline.is_play_held().await);

        state.update("paused").await.unwrap();
        assert!(pipeline.is_play_held().await, "paused still holds the refcount");

        state.update("null").await.unwrap();
        assert!(!pipeline.is_play_held().await);
    }

    #[tokio::test]
    async fn current_state_name_reflects_the_engine() {
        let pipeline = new_pipeline().await;
        assert_eq!(pipeline.current_state_name().await, "null");
        let state = pipeline.child("state").await.unwrap();
        state.update("playing").await.unwrap();
        assert_eq!(pipeline.current_state_name().await, "playing");
    }
}
