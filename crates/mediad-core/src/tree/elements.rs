//! The `Elements` container (§3): an ordered, name-indexed collection of
//! `Element` Nodes discovered via Engine introspection rather than created
//! by callers. Discovery happens once, on first resolve, and walks the
//! core-owned iteration-resync policy (§4.9, §9).

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::OnceCell;

use serde_json::Value;

use crate::engine::{iterate_elements, Engine, PipelineHandle};
use crate::error::{CoreError, CoreResult};
use crate::tree::element::ElementNode;
use crate::tree::{render_container, NodeKind, NodeRef, TreeNode};

pub struct ElementsNode {
    engine: Arc<dyn Engine>,
    handle: PipelineHandle,
    children: OnceCell<IndexMap<String, Arc<ElementNode>>>,
}

impl ElementsNode {
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>, handle: PipelineHandle) -> Self {
        Self { engine, handle, children: OnceCell::new() }
    }

    async fn discovered(&self) -> CoreResult<&IndexMap<String, Arc<ElementNode>>> {
        self.children
            .get_or_try_init(|| async {
                let handles = iterate_elements(self.engine.as_ref(), self.handle)
                    .await
                    .map_err(CoreError::from)?;
                let mut map: IndexMap<String, Arc<ElementNode>> = IndexMap::with_capacity(handles.len());
                for (index, element) in handles.into_iter().enumerate() {
                    let mut name = self
                        .engine
                        .element_name(element)
                        .unwrap_or_else(|| format!("element{index}"));
                    // Guards against a duplicate discovered name so the
                    // container's key invariant (§3: unique among siblings)
                    // always holds.
                    if map.contains_key(&name) {
                        name = format!("{name}-{index}");
                    }
                    map.insert(name.clone(), Arc::new(ElementNode::new(name, self.engine.clone(), element)));
                }
                Ok(map)
            })
            .await
    }
}

#[async_trait]
impl TreeNode for ElementsNode {
    fn name(&self) -> String {
        "elements".to_string()
    }

    fn description(&self) -> String {
        "element collection".to_string()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Elements
    }

    async fn child(&self, segment: &str) -> CoreResult<NodeRef> {
        let children = self.discovered().await?;
        children
            .get(segment)
            .cloned()
            .map(|node| node as NodeRef)
            .ok_or_else(|| CoreError::NoResource(segment.to_string()))
    }

    async fn read(&self) -> CoreResult<Value> {
        let children = self.discovered().await?;
        Ok(render_container(
            &self.name(),
            children.values().map(|e| (e.name(), e.description())).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeEngine;

    #[tokio::test]
    async fn discovers_one_element_per_segment_of_the_pipeline_description() {
        let engine: Arc<dyn Engine> = Arc::new(FakeEngine::new());
        let handle = engine.build_pipeline("fakesrc ! queue ! fakesink").await.unwrap();
        let elements = ElementsNode::new(engine, handle);

        let rendered = elements.read().await.unwrap();
        assert_eq!(rendered["children"].as_array().unwrap().len(), 3);
        assert!(elements.child("element0").await.is_ok());
        assert!(matches!(elements.child("missing").await, Err(CoreError::NoResource(_))));
    }

    #[tokio::test]
    async fn element_get_after_element_set_returns_the_written_value() {
        let engine: Arc<dyn Engine> = Arc::new(FakeEngine::new());
        let handle = engine.build_pipeline("fakesrc ! fakesink").await.unwrap();
        let elements = ElementsNode::new(engine, handle);

        let element = elements.child("element0").await.unwrap();
        let properties = element.child("properties").await.unwrap();
        let property = properties.child("num-buffers").await.unwrap();

        property.update("42").await.unwrap();
        let rendered = property.read().await.unwrap();
        assert_eq!(rendered["value"], "42");
    }
}
