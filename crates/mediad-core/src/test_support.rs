//! Shared fixtures for unit tests across the tree modules. Not part of the
//! public API; gated behind `#[cfg(test)]` in `lib.rs`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::engine::{
    ActionSchema, BusMessage, ElementHandle, Engine, EngineError, EngineState, IterateOutcome,
    PipelineHandle, PropertyAccess, PropertySchema, PropertyType, PropertyValue, QueryStateResult,
    QueryStatus, SetStateOutcome, SignalSchema,
};

/// A minimal in-memory `Engine` for exercising the tree without pulling in
/// `mediad-engine`'s fuller `RefEngine` (that crate depends on this one, so
/// it cannot be a dev-dependency here).
#[derive(Default)]
pub struct FakeEngine {
    next: AtomicU64,
    states: Mutex<HashMap<u64, EngineState>>,
    elements: Mutex<HashMap<u64, Vec<u64>>>,
    element_names: Mutex<HashMap<u64, String>>,
    properties: Mutex<HashMap<u64, PropertyValue>>,
}

impl FakeEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn build_pipeline(&self, description: &str) -> Result<PipelineHandle, EngineError> {
        if description.trim().is_empty() {
            return Err(EngineError::ParseError("empty description".to_string()));
        }
        let id = self.next_id();
        self.states.lock().unwrap().insert(id, EngineState::Null);
        let mut element_ids = Vec::new();
        for (i, _) in description.split('!').enumerate() {
            let eid = self.next_id();
            self.element_names.lock().unwrap().insert(eid, format!("element{i}"));
            self.properties.lock().unwrap().insert(eid, PropertyValue::I32(0));
            element_ids.push(eid);
        }
        self.elements.lock().unwrap().insert(id, element_ids);
        Ok(PipelineHandle(id))
    }

    async fn destroy(&self, handle: PipelineHandle) {
        self.states.lock().unwrap().remove(&handle.0);
        self.elements.lock().unwrap().remove(&handle.0);
    }

    async fn set_state(
        &self,
        handle: PipelineHandle,
        state: EngineState,
    ) -> Result<SetStateOutcome, EngineError> {
        self.states.lock().unwrap().insert(handle.0, state);
        Ok(SetStateOutcome::Async)
    }

    async fn query_state(
        &self,
        handle: PipelineHandle,
        _timeout: Duration,
    ) -> Result<QueryStateResult, EngineError> {
        let current = *self.states.lock().unwrap().get(&handle.0).ok_or(EngineError::NotFound)?;
        Ok(QueryStateResult { current, pending: None, status: QueryStatus::Ok })
    }

    async fn poll_elements(&self, handle: PipelineHandle) -> IterateOutcome {
        let elements = self.elements.lock().unwrap();
        match elements.get(&handle.0) {
            Some(ids) => IterateOutcome::Ready(ids.iter().copied().map(ElementHandle).collect()),
            None => IterateOutcome::Failed(EngineError::NotFound),
        }
    }

    fn element_name(&self, element: ElementHandle) -> Option<String> {
        self.element_names.lock().unwrap().get(&element.0).cloned()
    }

    async fn list_properties(
        &self,
        _element: ElementHandle,
    ) -> Result<Vec<PropertySchema>, EngineError> {
        Ok(vec![PropertySchema {
            name: "num-buffers".to_string(),
            value_type: PropertyType::I32,
            access: PropertyAccess::ReadWrite,
            description: "number of buffers to emit".to_string(),
            default: PropertyValue::I32(0),
        }])
    }

    async fn list_signals(&self, _element: ElementHandle) -> Result<Vec<SignalSchema>, EngineError> {
        Ok(vec![SignalSchema { name: "bar".to_string(), arguments: vec![] }])
    }

    async fn list_actions(&self, _element: ElementHandle) -> Result<Vec<ActionSchema>, EngineError> {
        Ok(vec![])
    }

    async fn get_property(
        &self,
        element: ElementHandle,
        _name: &str,
    ) -> Result<PropertyValue, EngineError> {
        self.properties.lock().unwrap().get(&element.0).cloned().ok_or(EngineError::NotFound)
    }

    async fn set_property(
        &self,
        element: ElementHandle,
        _name: &str,
        value: &PropertyValue,
    ) -> Result<(), EngineError> {
        self.properties.lock().unwrap().insert(element.0, value.clone());
        Ok(())
    }

    async fn connect_signal(&self, _element: ElementHandle, _signal: &str) -> Result<(), EngineError> {
        Ok(())
    }

    async fn emit_action(
        &self,
        _element: ElementHandle,
        _name: &str,
        _args: &[String],
    ) -> Result<PropertyValue, EngineError> {
        Ok(PropertyValue::Bool(true))
    }

    async fn post_event(&self, handle: PipelineHandle, _kind: &str) -> Result<(), EngineError> {
        if self.states.lock().unwrap().contains_key(&handle.0) {
            Ok(())
        } else {
            Err(EngineError::NotFound)
        }
    }

    async fn bus_pop(
        &self,
        _handle: PipelineHandle,
        _timeout: Duration,
        _type_mask: Option<&str>,
    ) -> Result<Option<BusMessage>, EngineError> {
        Ok(None)
    }
}
