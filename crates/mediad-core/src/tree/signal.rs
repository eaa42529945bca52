//! A `Signal` leaf Node (§3): exists once a caller has explicitly connected
//! it via `signal_connect` (§4.5). `update` sets the wait timeout
//! (`signal_timeout`, in milliseconds) used when a future caller blocks on
//! this signal's next emission; there is no Engine-side wait implemented in
//! the core (out of scope per §1), so the timeout is stored and reported
//! back on `read` but does not itself block anything.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::engine::{ElementHandle, Engine, SignalSchema};
use crate::error::{CoreError, CoreResult};
use crate::tree::{NodeKind, TreeNode};

const DEFAULT_SIGNAL_TIMEOUT: Duration = Duration::from_millis(100);

pub struct SignalNode {
    #[allow(dead_code)]
    engine: Arc<dyn Engine>,
    #[allow(dead_code)]
    element: ElementHandle,
    schema: SignalSchema,
    timeout: RwLock<Duration>,
}

impl SignalNode {
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>, element: ElementHandle, schema: SignalSchema) -> Self {
        Self { engine, element, schema, timeout: RwLock::new(DEFAULT_SIGNAL_TIMEOUT) }
    }
}

#[async_trait]
impl TreeNode for SignalNode {
    fn name(&self) -> String {
        self.schema.name.clone()
    }

    fn description(&self) -> String {
        "connected signal".to_string()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Signal
    }

    async fn read(&self) -> CoreResult<Value> {
        let timeout_ms = self.timeout.read().await.as_millis();
        Ok(serde_json::json!({
            "name": self.schema.name,
            "arguments": self.schema.arguments.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
            "connected": true,
            "timeout": timeout_ms,
        }))
    }

    async fn update(&self, value: &str) -> CoreResult<()> {
        let millis: u64 =
            value.parse().map_err(|_| CoreError::BadValue(value.to_string(), "milliseconds".to_string()))?;
        *self.timeout.write().await = Duration::from_millis(millis);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PropertyType;
    use crate::test_support::FakeEngine;

    #[tokio::test]
    async fn signal_timeout_round_trips() {
        let engine: Arc<dyn Engine> = Arc::new(FakeEngine::new());
        let node = SignalNode::new(
            engine,
            ElementHandle(1),
            SignalSchema { name: "bar".to_string(), arguments: vec![PropertyType::I32] },
        );
        node.update("250").await.unwrap();
        assert_eq!(node.read().await.unwrap()["timeout"], 250);
    }

    #[tokio::test]
    async fn non_numeric_timeout_is_bad_value() {
        let engine: Arc<dyn Engine> = Arc::new(FakeEngine::new());
        let node = SignalNode::new(
            engine,
            ElementHandle(1),
            SignalSchema { name: "bar".to_string(), arguments: vec![] },
        );
        assert!(matches!(node.update("soon").await, Err(CoreError::BadValue(..))));
    }
}
