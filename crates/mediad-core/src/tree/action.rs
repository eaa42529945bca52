//! An `Action` leaf Node (§3): a named callable on an Engine element,
//! invoked via `update` (`action_emit`, §4.5); `read` renders its schema
//! plus the value returned by the most recent invocation, if any.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::engine::{ActionSchema, ElementHandle, Engine, PropertyValue};
use crate::error::CoreResult;
use crate::tree::{NodeKind, TreeNode};

pub struct ActionNode {
    engine: Arc<dyn Engine>,
    element: ElementHandle,
    schema: ActionSchema,
    last_result: Mutex<Option<PropertyValue>>,
}

impl ActionNode {
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>, element: ElementHandle, schema: ActionSchema) -> Self {
        Self { engine, element, schema, last_result: Mutex::new(None) }
    }
}

#[async_trait]
impl TreeNode for ActionNode {
    fn name(&self) -> String {
        self.schema.name.clone()
    }

    fn description(&self) -> String {
        "engine action".to_string()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Action
    }

    async fn read(&self) -> CoreResult<Value> {
        let last_result = self.last_result.lock().await;
        Ok(serde_json::json!({
            "name": self.schema.name,
            "arguments": self.schema.arguments.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
            "return": self.schema.return_type.as_str(),
            "value": last_result.as_ref().map(PropertyValue::to_wire_string),
        }))
    }

    async fn update(&self, value: &str) -> CoreResult<()> {
        let args: Vec<String> = value.split_whitespace().map(ToString::to_string).collect();
        let result = self
            .engine
            .emit_action(self.element, &self.schema.name, &args)
            .await
            .map_err(crate::error::CoreError::from)?;
        *self.last_result.lock().await = Some(result);
        Ok(())
    }
}
