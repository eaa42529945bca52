//! The `Bus` Node (§3): child Nodes for read-timeout and message-type
//! filter, plus a pending-message queue exposed through `read`.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::engine::{Engine, PipelineHandle};
use crate::error::{CoreError, CoreResult};
use crate::tree::{NodeKind, NodeRef, TreeNode};

const DEFAULT_BUS_TIMEOUT: Duration = Duration::from_millis(100);

pub struct BusNode {
    engine: Arc<dyn Engine>,
    handle: PipelineHandle,
    timeout: RwLock<Duration>,
    filter: RwLock<Option<String>>,
    self_weak: std::sync::OnceLock<Weak<BusNode>>,
}

impl BusNode {
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>, handle: PipelineHandle) -> Arc<Self> {
        let node = Arc::new(Self {
            engine,
            handle,
            timeout: RwLock::new(DEFAULT_BUS_TIMEOUT),
            filter: RwLock::new(None),
            self_weak: std::sync::OnceLock::new(),
        });
        let _ = node.self_weak.set(Arc::downgrade(&node));
        node
    }

    fn weak_self(&self) -> Weak<Self> {
        self.self_weak.get().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl TreeNode for BusNode {
    fn name(&self) -> String {
        "bus".to_string()
    }

    fn description(&self) -> String {
        "pipeline message bus".to_string()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Bus
    }

    async fn child(&self, segment: &str) -> CoreResult<NodeRef> {
        match segment {
            "timeout" => Ok(Arc::new(TimeoutNode { bus: self.weak_self() })),
            "filter" => Ok(Arc::new(FilterNode { bus: self.weak_self() })),
            other => Err(CoreError::NoResource(other.to_string())),
        }
    }

    async fn read(&self) -> CoreResult<Value> {
        let timeout = *self.timeout.read().await;
        let filter = self.filter.read().await.clone();
        let message = self
            .engine
            .bus_pop(self.handle, timeout, filter.as_deref())
            .await
            .map_err(CoreError::from)?;
        Ok(serde_json::json!({
            "name": "bus",
            "message": message.map(|m| serde_json::json!({
                "kind": m.kind,
                "source": m.source,
                "fields": m.fields,
            })),
        }))
    }
}

struct TimeoutNode {
    bus: Weak<BusNode>,
}

#[async_trait]
impl TreeNode for TimeoutNode {
    fn name(&self) -> String {
        "timeout".to_string()
    }

    fn description(&self) -> String {
        "bus read timeout in milliseconds".to_string()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Bus
    }

    async fn read(&self) -> CoreResult<Value> {
        let bus = self.bus.upgrade().ok_or_else(|| CoreError::NoResource("bus".to_string()))?;
        let millis = bus.timeout.read().await.as_millis();
        Ok(serde_json::json!({"name": "timeout", "value": millis}))
    }

    async fn update(&self, value: &str) -> CoreResult<()> {
        let bus = self.bus.upgrade().ok_or_else(|| CoreError::NoResource("bus".to_string()))?;
        let millis: u64 = value
            .parse()
            .map_err(|_| CoreError::BadValue(value.to_string(), "u64 milliseconds".to_string()))?;
        *bus.timeout.write().await = Duration::from_millis(millis);
        Ok(())
    }
}

struct FilterNode {
    bus: Weak<BusNode>,
}

#[async_trait]
impl TreeNode for FilterNode {
    fn name(&self) -> String {
        "filter".to_string()
    }

    fn description(&self) -> String {
        "bus message-type filter".to_string()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Bus
    }

    async fn read(&self) -> CoreResult<Value> {
        let bus = self.bus.upgrade().ok_or_else(|| CoreError::NoResource("bus".to_string()))?;
        let filter = bus.filter.read().await.clone();
        Ok(serde_json::json!({"name": "filter", "value": filter}))
    }

    async fn update(&self, value: &str) -> CoreResult<()> {
        let bus = self.bus.upgrade().ok_or_else(|| CoreError::NoResource("bus".to_string()))?;
        *bus.filter.write().await = if value.is_empty() { None } else { Some(value.to_string()) };
        Ok(())
    }
}
