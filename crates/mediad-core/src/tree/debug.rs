//! The `Debug` configuration Node (§3): the Session's logging knobs,
//! addressed through `debug_enable`, `debug_color`, `debug_threshold`, and
//! `debug_reset` (§4.5).

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::tree::{render_container, NodeKind, NodeRef, TreeNode};

#[derive(Debug, Clone)]
struct DebugConfig {
    enabled: bool,
    color: bool,
    threshold: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self { enabled: false, color: true, threshold: "warn".to_string() }
    }
}

pub struct DebugNode {
    config: RwLock<DebugConfig>,
    self_weak: std::sync::OnceLock<Weak<DebugNode>>,
}

impl DebugNode {
    #[must_use]
    pub fn new() -> Arc<Self> {
        let node = Arc::new(Self { config: RwLock::new(DebugConfig::default()), self_weak: std::sync::OnceLock::new() });
        let _ = node.self_weak.set(Arc::downgrade(&node));
        node
    }

    fn weak_self(&self) -> Weak<Self> {
        self.self_weak.get().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl TreeNode for DebugNode {
    fn name(&self) -> String {
        "debug".to_string()
    }

    fn description(&self) -> String {
        "debug configuration".to_string()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Debug
    }

    async fn child(&self, segment: &str) -> CoreResult<NodeRef> {
        match segment {
            "enabled" => Ok(Arc::new(FieldNode { debug: self.weak_self(), field: Field::Enabled })),
            "color" => Ok(Arc::new(FieldNode { debug: self.weak_self(), field: Field::Color })),
            "threshold" => Ok(Arc::new(FieldNode { debug: self.weak_self(), field: Field::Threshold })),
            other => Err(CoreError::NoResource(other.to_string())),
        }
    }

    async fn read(&self) -> CoreResult<Value> {
        Ok(render_container(
            &self.name(),
            vec![
                ("enabled".to_string(), "debug logging toggle".to_string()),
                ("color".to_string(), "colorized output toggle".to_string()),
                ("threshold".to_string(), "minimum log level".to_string()),
            ],
        ))
    }

    /// `debug_reset` (§4.5): the only verb recognized directly on this
    /// Node; anything else is `BAD_COMMAND` via the default.
    async fn update(&self, value: &str) -> CoreResult<()> {
        if value != "reset" {
            return Err(CoreError::BadCommand(format!("unsupported debug command '{value}'")));
        }
        *self.config.write().await = DebugConfig::default();
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Field {
    Enabled,
    Color,
    Threshold,
}

struct FieldNode {
    debug: Weak<DebugNode>,
    field: Field,
}

#[async_trait]
impl TreeNode for FieldNode {
    fn name(&self) -> String {
        match self.field {
            Field::Enabled => "enabled".to_string(),
            Field::Color => "color".to_string(),
            Field::Threshold => "threshold".to_string(),
        }
    }

    fn description(&self) -> String {
        "debug configuration field".to_string()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Debug
    }

    async fn read(&self) -> CoreResult<Value> {
        let debug = self.debug.upgrade().ok_or_else(|| CoreError::NoResource("debug".to_string()))?;
        let config = debug.config.read().await;
        let value = match self.field {
            Field::Enabled => Value::Bool(config.enabled),
            Field::Color => Value::Bool(config.color),
            Field::Threshold => Value::String(config.threshold.clone()),
        };
        Ok(serde_json::json!({"name": self.name(), "value": value}))
    }

    async fn update(&self, value: &str) -> CoreResult<()> {
        let debug = self.debug.upgrade().ok_or_else(|| CoreError::NoResource("debug".to_string()))?;
        let mut config = debug.config.write().await;
        match self.field {
            Field::Enabled => {
                config.enabled = value
                    .parse()
                    .map_err(|_| CoreError::BadValue(value.to_string(), "bool".to_string()))?;
            }
            Field::Color => {
                config.color = value
                    .parse()
                    .map_err(|_| CoreError::BadValue(value.to_string(), "bool".to_string()))?;
            }
            Field::Threshold => config.threshold = value.to_string(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn debug_enable_and_reset_round_trip() {
        let debug = DebugNode::new();
        let enabled = debug.child("enabled").await.unwrap();
        enabled.update("true").await.unwrap();
        assert_eq!(enabled.read().await.unwrap()["value"], true);

        debug.update("reset").await.unwrap();
        assert_eq!(enabled.read().await.unwrap()["value"], false);
    }

    #[tokio::test]
    async fn unsupported_debug_command_is_bad_command() {
        let debug = DebugNode::new();
        assert!(matches!(debug.update("frobnicate").await, Err(CoreError::BadCommand(_))));
    }
}
