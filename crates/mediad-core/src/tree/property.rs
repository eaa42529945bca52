//! A `Property` leaf Node (§3): a typed value on an Engine element.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::engine::{ElementHandle, Engine, PropertyAccess, PropertySchema, PropertyValue};
use crate::error::{CoreError, CoreResult};
use crate::tree::{NodeKind, TreeNode};

pub struct PropertyNode {
    engine: Arc<dyn Engine>,
    element: ElementHandle,
    schema: PropertySchema,
}

impl PropertyNode {
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>, element: ElementHandle, schema: PropertySchema) -> Self {
        Self { engine, element, schema }
    }
}

#[async_trait]
impl TreeNode for PropertyNode {
    fn name(&self) -> String {
        self.schema.name.clone()
    }

    fn description(&self) -> String {
        self.schema.description.clone()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Property
    }

    async fn read(&self) -> CoreResult<Value> {
        let value = self.engine.get_property(self.element, &self.schema.name).await.map_err(CoreError::from)?;
        Ok(serde_json::json!({
            "name": self.schema.name,
            "value": value.to_wire_string(),
            "param": {
                "description": self.schema.description,
                "type": self.schema.value_type.as_str(),
                "access": format!("{:?}", self.schema.access).to_lowercase(),
            },
        }))
    }

    async fn update(&self, value: &str) -> CoreResult<()> {
        if matches!(self.schema.access, PropertyAccess::ReadOnly) {
            return Err(CoreError::BadValue(value.to_string(), "read-only property".to_string()));
        }
        let parsed = PropertyValue::parse_as(self.schema.value_type, value)?;
        self.engine
            .set_property(self.element, &self.schema.name, &parsed)
            .await
            .map_err(CoreError::from)
    }
}
