//! The `Properties` container (§3): an element's typed properties,
//! discovered from the Engine's schema on first resolve.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::engine::{ElementHandle, Engine};
use crate::error::{CoreError, CoreResult};
use crate::tree::property::PropertyNode;
use crate::tree::{render_container, NodeKind, NodeRef, TreeNode};

pub struct PropertiesNode {
    engine: Arc<dyn Engine>,
    element: ElementHandle,
    children: OnceCell<IndexMap<String, Arc<PropertyNode>>>,
}

impl PropertiesNode {
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>, element: ElementHandle) -> Self {
        Self { engine, element, children: OnceCell::new() }
    }

    async fn discovered(&self) -> CoreResult<&IndexMap<String, Arc<PropertyNode>>> {
        self.children
            .get_or_try_init(|| async {
                let schemas = self
                    .engine
                    .list_properties(self.element)
                    .await
                    .map_err(CoreError::from)?;
                let mut map = IndexMap::with_capacity(schemas.len());
                for schema in schemas {
                    let node = Arc::new(PropertyNode::new(self.engine.clone(), self.element, schema.clone()));
                    map.insert(schema.name, node);
                }
                Ok(map)
            })
            .await
    }
}

#[async_trait]
impl TreeNode for PropertiesNode {
    fn name(&self) -> String {
        "properties".to_string()
    }

    fn description(&self) -> String {
        "property collection".to_string()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Properties
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
            children.values().map(|p| (p.name(), p.description())).collect(),
        ))
    }
}
