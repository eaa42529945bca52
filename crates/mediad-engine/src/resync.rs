//! [`ResyncEngine`]: wraps any [`Engine`] and forces a bounded run of
//! `Resync` outcomes out of `poll_elements` before delegating to the inner
//! engine. [`RefEngine`](crate::RefEngine) never needs to resync on its
//! own — nothing else is mutating its graph concurrently — so this wrapper
//! is how the test suite exercises the core's resync-cap policy (§9,
//! `RESYNC_CAP`) deterministically, including driving it past the cap.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mediad_core::engine::{
    ActionSchema, BusMessage, ElementHandle, Engine, EngineError, EngineState, IterateOutcome,
    PipelineHandle, PropertySchema, PropertyValue, QueryStateResult, SetStateOutcome, SignalSchema,
};

pub struct ResyncEngine {
    inner: Arc<dyn Engine>,
    forced_resyncs: u32,
    remaining: Mutex<HashMap<u64, u32>>,
}

impl ResyncEngine {
    /// Every pipeline `inner` builds gets its own resync budget of
    /// `forced_resyncs`: that many `poll_elements` calls report `Resync`
    /// before the wrapper starts delegating to `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn Engine>, forced_resyncs: u32) -> Self {
        Self { inner, forced_resyncs, remaining: Mutex::new(HashMap::new()) }
    }
}

#[async_trait]
impl Engine for ResyncEngine {
    async fn build_pipeline(&self, description: &str) -> Result<PipelineHandle, EngineError> {
        let handle = self.inner.build_pipeline(description).await?;
        self.remaining.lock().unwrap().insert(handle.0, self.forced_resyncs);
        Ok(handle)
    }

    async fn destroy(&self, handle: PipelineHandle) {
        self.remaining.lock().unwrap().remove(&handle.0);
        self.inner.destroy(handle).await;
    }

    async fn set_state(
        &self,
        handle: PipelineHandle,
        state: EngineState,
    ) -> Result<SetStateOutcome, EngineError> {
        self.inner.set_state(handle, state).await
    }

    async fn query_state(
        &self,
        handle: PipelineHandle,
        timeout: Duration,
    ) -> Result<QueryStateResult, EngineError> {
        self.inner.query_state(handle, timeout).await
    }

    async fn poll_elements(&self, handle: PipelineHandle) -> IterateOutcome {
        {
            let mut remaining = self.remaining.lock().unwrap();
            if let Some(count) = remaining.get_mut(&handle.0) {
                if *count > 0 {
                    *count -= 1;
                    return IterateOutcome::Resync;
                }
            }
        }
        self.inner.poll_elements(handle).await
    }

    fn element_name(&self, element: ElementHandle) -> Option<String> {
        self.inner.element_name(element)
    }

    async fn list_properties(
        &self,
        element: ElementHandle,
    ) -> Result<Vec<PropertySchema>, EngineError> {
        self.inner.list_properties(element).await
    }

    async fn list_signals(&self, element: ElementHandle) -> Result<Vec<SignalSchema>, EngineError> {
        self.inner.list_signals(element).await
    }

    async fn list_actions(&self, element: ElementHandle) -> Result<Vec<ActionSchema>, EngineError> {
        self.inner.list_actions(element).await
    }

    async fn get_property(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<PropertyValue, EngineError> {
        self.inner.get_property(element, name).await
    }

    async fn set_property(
        &self,
        element: ElementHandle,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), EngineError> {
        self.inner.set_property(element, name, value).await
    }

    async fn connect_signal(&self, element: ElementHandle, signal: &str) -> Result<(), EngineError> {
        self.inner.connect_signal(element, signal).await
    }

    async fn emit_action(
        &self,
        element: ElementHandle,
        name: &str,
        args: &[String],
    ) -> Result<PropertyValue, EngineError> {
        self.inner.emit_action(element, name, args).await
    }

    async fn post_event(&self, handle: PipelineHandle, kind: &str) -> Result<(), EngineError> {
        self.inner.post_event(handle, kind).await
    }

    async fn bus_pop(
        &self,
        handle: PipelineHandle,
        timeout: Duration,
        type_mask: Option<&str>,
    ) -> Result<Option<BusMessage>, EngineError> {
        self.inner.bus_pop(handle, timeout, type_mask).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RefEngine;
    use mediad_core::engine::iterate_elements;

    #[tokio::test]
    async fn resyncs_fewer_times_than_the_cap_still_succeeds() {
        let engine = ResyncEngine::new(Arc::new(RefEngine::new()), 3);
        let handle = engine.build_pipeline("fakesrc ! fakesink").await.unwrap();
        let elements = iterate_elements(&engine, handle).await.unwrap();
        assert_eq!(elements.len(), 2);
    }

    #[tokio::test]
    async fn resyncing_past_the_cap_is_an_error() {
        let engine = ResyncEngine::new(Arc::new(RefEngine::new()), 100);
        let handle = engine.build_pipeline("fakesrc ! fakesink").await.unwrap();
        assert!(iterate_elements(&engine, handle).await.is_err());
    }

    #[tokio::test]
    async fn each_pipeline_gets_its_own_resync_budget() {
        let engine = ResyncEngine::new(Arc::new(RefEngine::new()), 1);
        let first = engine.build_pipeline("fakesrc ! fakesink").await.unwrap();
        let second = engine.build_pipeline("fakesrc ! fakesink").await.unwrap();
        assert!(iterate_elements(&engine, first).await.is_ok());
        assert!(iterate_elements(&engine, second).await.is_ok());
    }
}
