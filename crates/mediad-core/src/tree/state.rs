//! The `State` leaf Node (§3): mirrors the Engine pipeline's state and
//! drives the Pipeline's play-hold refcount (§3, §9) on each transition.

use std::sync::Weak;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::engine::EngineState;
use crate::error::{CoreError, CoreResult};
use crate::tree::pipeline::PipelineNode;
use crate::tree::{NodeKind, TreeNode};

/// §5: "state queries use a 100 ms timeout, not a zero-timeout/no-wait
/// query (the latter causes misreports during async transitions)".
const STATE_QUERY_TIMEOUT: Duration = Duration::from_millis(100);

pub struct StateNode {
    pipeline: Weak<PipelineNode>,
    current: RwLock<EngineState>,
}

impl StateNode {
    #[must_use]
    pub fn new(pipeline: Weak<PipelineNode>) -> Self {
        Self { pipeline, current: RwLock::new(EngineState::Null) }
    }

    pub async fn current_state_name(&self) -> String {
        let Some(pipeline) = self.pipeline.upgrade() else {
            return EngineState::Null.as_str().to_string();
        };
        match pipeline.engine().query_state(pipeline.handle(), STATE_QUERY_TIMEOUT).await {
            Ok(result) => {
                *self.current.write().await = result.current;
                result.current.as_str().to_string()
            }
            Err(_) => self.current.read().await.as_str().to_string(),
        }
    }
}

#[async_trait]
impl TreeNode for StateNode {
    fn name(&self) -> String {
        "state".to_string()
    }

    fn description(&self) -> String {
        "pipeline state".to_string()
    }

    fn kind(&self) -> NodeKind {
        NodeKind::State
    }

    async fn read(&self) -> CoreResult<Value> {
        let pipeline = self.pipeline.upgrade().ok_or_else(|| CoreError::NoResource("pipeline".to_string()))?;
        let result = pipeline
            .engine()
            .query_state(pipeline.handle(), STATE_QUERY_TIMEOUT)
            .await
            .map_err(CoreError::from)?;
        *self.current.write().await = result.current;
        Ok(serde_json::json!({
            "name": "state",
            "value": result.current.as_str(),
            "pending": result.pending.map(EngineState::as_str),
        }))
    }

    async fn update(&self, value: &str) -> CoreResult<()> {
        let target = EngineState::parse(value)
            .ok_or_else(|| CoreError::BadValue(value.to_string(), "null|ready|paused|playing".to_string()))?;
        let pipeline = self.pipeline.upgrade().ok_or_else(|| CoreError::NoResource("pipeline".to_string()))?;
        pipeline.engine().set_state(pipeline.handle(), target).await.map_err(CoreError::from)?;

        let mut current = self.current.write().await;
        let was_held = current.holds_play_refcount();
        let holds_now = target.holds_play_refcount();
        if was_held != holds_now {
            pipeline.adjust_play_hold(holds_now).await;
        }
        *current = target;
        Ok(())
    }
}
