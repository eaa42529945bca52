//! The `Pipelines` container (§3): an ordered, name-indexed collection of
//! `Pipeline` Nodes owned by the Session root.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::engine::Engine;
use crate::error::{CoreError, CoreResult};
use crate::tree::pipeline::PipelineNode;
use crate::tree::{render_container, NodeKind, NodeRef, TreeNode};

pub struct PipelinesNode {
    engine: Arc<dyn Engine>,
    children: RwLock<IndexMap<String, Arc<PipelineNode>>>,
}

impl PipelinesNode {
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self { engine, children: RwLock::new(IndexMap::new()) }
    }

    /// Lightweight listing used by the HTTP server's `/pipelines/status`
    /// fast path (§4.7): name + current state, without going through the
    /// Parser. Iteration happens under the container lock, as required by
    /// §5 ("The Pipelines container lock is held for the full duration of
    /// `/pipelines/status` iteration").
    pub async fn status_listing(&self) -> Vec<(String, String)> {
        let children = self.children.read().await;
        let mut listing = Vec::with_capacity(children.len());
        for (name, pipeline) in children.iter() {
            let state = pipeline.current_state_name().await;
            listing.push((name.clone(), state));
        }
        listing
    }
}

#[async_trait]
impl TreeNode for PipelinesNode {
    fn name(&self) -> String {
        "pipelines".to_string()
    }

    fn description(&self) -> String {
        "pipeline collection".to_string()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Pipelines
    }

    async fn child(&self, segment: &str) -> CoreResult<NodeRef> {
        let children = self.children.read().await;
        children
            .get(segment)
            .cloned()
            .map(|node| node as NodeRef)
            .ok_or_else(|| CoreError::NoResource(segment.to_string()))
    }

    async fn create(&self, name: &str, description: &str) -> CoreResult<NodeRef> {
        if name.is_empty() {
            return Err(CoreError::NullArgument);
        }
        let mut children = self.children.write().await;
        if children.contains_key(name) {
            return Err(CoreError::ExistingResource(name.to_string()));
        }
        let handle = self
            .engine
            .build_pipeline(description)
            .await
            .map_err(CoreError::from)?;
        let node = Arc::new(PipelineNode::new(
            name.to_string(),
            description.to_string(),
            handle,
            self.engine.clone(),
        ));
        children.insert(name.to_string(), node.clone());
        Ok(node)
    }

    async fn read(&self) -> CoreResult<Value> {
        let children = self.children.read().await;
        Ok(render_container(
            &self.name(),
            children.values().map(|p| (p.name(), p.description())).collect(),
        ))
    }

    async fn delete(&self, name: &str) -> CoreResult<()> {
        let mut children = self.children.write().await;
        let Some(pipeline) = children.get(name) else {
            return Err(CoreError::NoResource(name.to_string()));
        };
        if pipeline.is_play_held().await {
            return Err(CoreError::BadValue(
                name.to_string(),
                "pipeline is running; stop it before deleting".to_string(),
            ));
        }
        let pipeline = children.swap_remove(name).expect("checked above");
        self.engine.destroy(pipeline.handle()).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeEngine;

    #[tokio::test]
    async fn create_then_delete_round_trips_the_child_set() {
        let pipelines = PipelinesNode::new(Arc::new(FakeEngine::new()));
        pipelines.create("p0", "fakesrc ! fakesink").await.unwrap();
        assert!(matches!(
            pipelines.create("p0", "fakesrc ! fakesink").await,
            Err(CoreError::ExistingResource(_))
        ));
        pipelines.delete("p0").await.unwrap();
        assert!(matches!(pipelines.delete("p0").await, Err(CoreError::NoResource(_))));
    }

    #[tokio::test]
    async fn concurrent_create_has_exactly_one_winner() {
        let pipelines = Arc::new(PipelinesNode::new(Arc::new(FakeEngine::new())));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let pipelines = pipelines.clone();
            handles.push(tokio::spawn(async move {
                pipelines.create("p0", "fakesrc ! fakesink").await
            }));
        }
        let mut ok_count = 0;
        let mut existing_count = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok_count += 1,
                Err(CoreError::ExistingResource(_)) => existing_count += 1,
                other => panic!("unexpected result: {other:?}"),
            }
        }
        assert_eq!(ok_count, 1);
        assert_eq!(existing_count, 7);
    }
}
