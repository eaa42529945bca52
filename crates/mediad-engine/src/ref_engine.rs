//! [`RefEngine`]: an in-memory stand-in for the real multimedia backend
//! (§1, §4.9). Every pipeline it builds is parsed once from a
//! `gst-launch`-style description into a fixed list of synthetic elements;
//! state transitions resolve synchronously and push a `state-changed`
//! message onto that pipeline's bus.
//!
//! Per-kind schemas (SPEC_FULL.md "Reference/test Engine"): every element
//! gets a read-only `name` property. A kind whose name contains `"src"`
//! additionally gets a read-write `num-buffers` i32 property. A kind whose
//! name contains `"volume"` gets a read-write `mute` bool property and a
//! `bar` signal. Every element gets a `ping` action returning `true`.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use mediad_core::engine::{
    next_handle_id, ActionSchema, BusMessage, ElementHandle, Engine, EngineError, EngineState,
    IterateOutcome, PipelineHandle, PropertyAccess, PropertySchema, PropertyType, PropertyValue,
    QueryStateResult, QueryStatus, SetStateOutcome, SignalSchema,
};

use crate::parse::{parse_description, ElementSpec};

const RECOGNIZED_EVENT_KINDS: [&str; 3] = ["eos", "flush-start", "flush-stop"];

struct ElementState {
    kind: String,
    properties: IndexMap<String, (PropertySchema, PropertyValue)>,
    signals: Vec<SignalSchema>,
    actions: Vec<ActionSchema>,
}

struct PipelineState {
    state: EngineState,
    elements: Vec<ElementHandle>,
    bus: VecDeque<BusMessage>,
}

/// A reference [`Engine`] backed entirely by in-process maps. Used as the
/// daemon's default engine and by the test suite; see the module docs for
/// its synthetic per-kind element schemas.
#[derive(Default)]
pub struct RefEngine {
    pipelines: Mutex<HashMap<u64, PipelineState>>,
    elements: Mutex<HashMap<u64, ElementState>>,
}

impl RefEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn build_element(spec: &ElementSpec) -> ElementState {
        let mut properties = IndexMap::new();
        properties.insert(
            "name".to_string(),
            (
                PropertySchema {
                    name: "name".to_string(),
                    value_type: PropertyType::Str,
                    access: PropertyAccess::ReadOnly,
                    description: "element kind".to_string(),
                    default: PropertyValue::Str(spec.kind.clone()),
                },
                PropertyValue::Str(spec.kind.clone()),
            ),
        );

        let mut signals = Vec::new();
        let actions = vec![ActionSchema {
            name: "ping".to_string(),
            arguments: vec![],
            return_type: PropertyType::Bool,
        }];

        if spec.kind.contains("src") {
            properties.insert(
                "num-buffers".to_string(),
                (
                    PropertySchema {
                        name: "num-buffers".to_string(),
                        value_type: PropertyType::I32,
                        access: PropertyAccess::ReadWrite,
                        description: "number of buffers to emit before EOS".to_string(),
                        default: PropertyValue::I32(-1),
                    },
                    PropertyValue::I32(-1),
                ),
            );
        }

        if spec.kind.contains("volume") {
            properties.insert(
                "mute".to_string(),
                (
                    PropertySchema {
                        name: "mute".to_string(),
                        value_type: PropertyType::Bool,
                        access: PropertyAccess::ReadWrite,
                        description: "mute the stream".to_string(),
                        default: PropertyValue::Bool(false),
                    },
                    PropertyValue::Bool(false),
                ),
            );
            signals.push(SignalSchema { name: "bar".to_string(), arguments: vec![] });
        }

        let mut element = ElementState { kind: spec.kind.clone(), properties, signals, actions };
        for (key, value) in &spec.overrides {
            if let Some((schema, current)) = element.properties.get_mut(key) {
                if let Ok(parsed) = PropertyValue::parse_as(schema.value_type, value) {
                    *current = parsed;
                }
            }
        }
        element
    }
}

#[async_trait]
impl Engine for RefEngine {
    async fn build_pipeline(&self, description: &str) -> Result<PipelineHandle, EngineError> {
        let specs = parse_description(description)
            .map_err(|err| EngineError::ParseError(err.to_string()))?;

        let mut element_handles = Vec::with_capacity(specs.len());
        {
            let mut elements = self.elements.lock().unwrap();
            for spec in &specs {
                let element_id = next_handle_id();
                elements.insert(element_id, Self::build_element(spec));
                element_handles.push(ElementHandle(element_id));
            }
        }

        let pipeline_id = next_handle_id();
        self.pipelines.lock().unwrap().insert(
            pipeline_id,
            PipelineState { state: EngineState::Null, elements: element_handles, bus: VecDeque::new() },
        );
        Ok(PipelineHandle(pipeline_id))
    }

    async fn destroy(&self, handle: PipelineHandle) {
        if let Some(pipeline) = self.pipelines.lock().unwrap().remove(&handle.0) {
            let mut elements = self.elements.lock().unwrap();
            for element in pipeline.elements {
                elements.remove(&element.0);
            }
        }
    }

    async fn set_state(
        &self,
        handle: PipelineHandle,
        state: EngineState,
    ) -> Result<SetStateOutcome, EngineError> {
        // Looks asynchronous to callers (they're expected to poll query_state),
        // but the transition is already done by the time this yields back.
        tokio::task::yield_now().await;
        let mut pipelines = self.pipelines.lock().unwrap();
        let pipeline = pipelines.get_mut(&handle.0).ok_or(EngineError::NotFound)?;
        pipeline.state = state;
        pipeline.bus.push_back(BusMessage {
            kind: "state-changed".to_string(),
            source: None,
            fields: serde_json::json!({"new-state": state.as_str()}),
        });
        Ok(SetStateOutcome::Async)
    }

    async fn query_state(
        &self,
        handle: PipelineHandle,
        _timeout: Duration,
    ) -> Result<QueryStateResult, EngineError> {
        let pipelines = self.pipelines.lock().unwrap();
        let pipeline = pipelines.get(&handle.0).ok_or(EngineError::NotFound)?;
        Ok(QueryStateResult { current: pipeline.state, pending: None, status: QueryStatus::Ok })
    }

    async fn poll_elements(&self, handle: PipelineHandle) -> IterateOutcome {
        let pipelines = self.pipelines.lock().unwrap();
        match pipelines.get(&handle.0) {
            Some(pipeline) => IterateOutcome::Ready(pipeline.elements.clone()),
            None => IterateOutcome::Failed(EngineError::NotFound),
        }
    }

    fn element_name(&self, element: ElementHandle) -> Option<String> {
        self.elements.lock().unwrap().get(&element.0).map(|e| e.kind.clone())
    }

    async fn list_properties(
        &self,
        element: ElementHandle,
    ) -> Result<Vec<PropertySchema>, EngineError> {
        let elements = self.elements.lock().unwrap();
        let element = elements.get(&element.0).ok_or(EngineError::NotFound)?;
        Ok(element.properties.values().map(|(schema, _)| schema.clone()).collect())
    }

    async fn list_signals(&self, element: ElementHandle) -> Result<Vec<SignalSchema>, EngineError> {
        let elements = self.elements.lock().unwrap();
        let element = elements.get(&element.0).ok_or(EngineError::NotFound)?;
        Ok(element.signals.clone())
    }

    async fn list_actions(&self, element: ElementHandle) -> Result<Vec<ActionSchema>, EngineError> {
        let elements = self.elements.lock().unwrap();
        let element = elements.get(&element.0).ok_or(EngineError::NotFound)?;
        Ok(element.actions.clone())
    }

    async fn get_property(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<PropertyValue, EngineError> {
        let elements = self.elements.lock().unwrap();
        let element = elements.get(&element.0).ok_or(EngineError::NotFound)?;
        element.properties.get(name).map(|(_, value)| value.clone()).ok_or(EngineError::NotFound)
    }

    async fn set_property(
        &self,
        element: ElementHandle,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), EngineError> {
        let mut elements = self.elements.lock().unwrap();
        let element = elements.get_mut(&element.0).ok_or(EngineError::NotFound)?;
        let (schema, current) = element.properties.get_mut(name).ok_or(EngineError::NotFound)?;
        if schema.access == PropertyAccess::ReadOnly {
            return Err(EngineError::StateRejected(format!("'{name}' is read-only")));
        }
        if value.value_type() != schema.value_type {
            return Err(EngineError::StateRejected(format!(
                "'{name}' expects a {} value",
                schema.value_type.as_str()
            )));
        }
        *current = value.clone();
        Ok(())
    }

    async fn connect_signal(&self, element: ElementHandle, signal: &str) -> Result<(), EngineError> {
        let elements = self.elements.lock().unwrap();
        let element = elements.get(&element.0).ok_or(EngineError::NotFound)?;
        if element.signals.iter().any(|s| s.name == signal) {
            Ok(())
        } else {
            Err(EngineError::NotFound)
        }
    }

    async fn emit_action(
        &self,
        element: ElementHandle,
        name: &str,
        _args: &[String],
    ) -> Result<PropertyValue, EngineError> {
        let elements = self.elements.lock().unwrap();
        let element = elements.get(&element.0).ok_or(EngineError::NotFound)?;
        if element.actions.iter().any(|a| a.name == name) {
            Ok(PropertyValue::Bool(true))
        } else {
            Err(EngineError::NotFound)
        }
    }

    async fn post_event(&self, handle: PipelineHandle, kind: &str) -> Result<(), EngineError> {
        if !RECOGNIZED_EVENT_KINDS.contains(&kind) {
            return Err(EngineError::StateRejected(format!("unrecognized event kind '{kind}'")));
        }
        let mut pipelines = self.pipelines.lock().unwrap();
        let pipeline = pipelines.get_mut(&handle.0).ok_or(EngineError::NotFound)?;
        pipeline.bus.push_back(BusMessage {
            kind: kind.to_string(),
            source: None,
            fields: serde_json::Value::Null,
        });
        Ok(())
    }

    async fn bus_pop(
        &self,
        handle: PipelineHandle,
        _timeout: Duration,
        type_mask: Option<&str>,
    ) -> Result<Option<BusMessage>, EngineError> {
        let mut pipelines = self.pipelines.lock().unwrap();
        let pipeline = pipelines.get_mut(&handle.0).ok_or(EngineError::NotFound)?;
        let message = match type_mask {
            None => pipeline.bus.pop_front(),
            Some(mask) => {
                let position = pipeline.bus.iter().position(|msg| msg.kind == mask);
                position.and_then(|i| pipeline.bus.remove(i))
            },
        };
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_one_element_per_pipeline_segment() {
        let engine = RefEngine::new();
        let handle = engine.build_pipeline("fakesrc num-buffers=10 ! volume mute=true ! fakesink")
            .await
            .unwrap();
        let elements = mediad_core::engine::iterate_elements(&engine, handle).await.unwrap();
        assert_eq!(elements.len(), 3);
    }

    #[tokio::test]
    async fn malformed_description_is_a_parse_error() {
        let engine = RefEngine::new();
        assert!(matches!(
            engine.build_pipeline("").await,
            Err(EngineError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn src_kind_exposes_num_buffers_and_honors_the_override() {
        let engine = RefEngine::new();
        let handle = engine.build_pipeline("fakesrc num-buffers=10 ! fakesink").await.unwrap();
        let elements = mediad_core::engine::iterate_elements(&engine, handle).await.unwrap();
        let value = engine.get_property(elements[0], "num-buffers").await.unwrap();
        assert_eq!(value, PropertyValue::I32(10));
    }

    #[tokio::test]
    async fn volume_kind_exposes_mute_and_a_bar_signal() {
        let engine = RefEngine::new();
        let handle = engine.build_pipeline("volume ! fakesink").await.unwrap();
        let elements = mediad_core::engine::iterate_elements(&engine, handle).await.unwrap();
        let signals = engine.list_signals(elements[0]).await.unwrap();
        assert!(signals.iter().any(|s| s.name == "bar"));
        assert!(engine.connect_signal(elements[0], "bar").await.is_ok());
        assert!(matches!(
            engine.connect_signal(elements[0], "nope").await,
            Err(EngineError::NotFound)
        ));
    }

    #[tokio::test]
    async fn name_property_is_read_only() {
        let engine = RefEngine::new();
        let handle = engine.build_pipeline("fakesrc ! fakesink").await.unwrap();
        let elements = mediad_core::engine::iterate_elements(&engine, handle).await.unwrap();
        let result =
            engine.set_property(elements[0], "name", &PropertyValue::Str("nope".to_string())).await;
        assert!(matches!(result, Err(EngineError::StateRejected(_))));
    }

    #[tokio::test]
    async fn set_state_pushes_a_state_changed_bus_message() {
        let engine = RefEngine::new();
        let handle = engine.build_pipeline("fakesrc ! fakesink").await.unwrap();
        engine.set_state(handle, EngineState::Playing).await.unwrap();
        let message = engine.bus_pop(handle, Duration::from_millis(0), None).await.unwrap().unwrap();
        assert_eq!(message.kind, "state-changed");
    }

    #[tokio::test]
    async fn post_event_rejects_unrecognized_kinds() {
        let engine = RefEngine::new();
        let handle = engine.build_pipeline("fakesrc ! fakesink").await.unwrap();
        assert!(engine.post_event(handle, "eos").await.is_ok());
        assert!(matches!(
            engine.post_event(handle, "not-a-real-kind").await,
            Err(EngineError::StateRejected(_))
        ));
    }

    #[tokio::test]
    async fn bus_pop_honors_the_type_mask() {
        let engine = RefEngine::new();
        let handle = engine.build_pipeline("fakesrc ! fakesink").await.unwrap();
        engine.post_event(handle, "eos").await.unwrap();
        engine.post_event(handle, "flush-start").await.unwrap();

        let message = engine.bus_pop(handle, Duration::from_millis(0), Some("flush-start"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.kind, "flush-start");

        let remaining = engine.bus_pop(handle, Duration::from_millis(0), None).await.unwrap().unwrap();
        assert_eq!(remaining.kind, "eos");
    }

    #[tokio::test]
    async fn destroy_releases_the_pipeline_and_its_elements() {
        let engine = RefEngine::new();
        let handle = engine.build_pipeline("fakesrc ! fakesink").await.unwrap();
        engine.destroy(handle).await;
        assert!(matches!(
            engine.query_state(handle, Duration::from_millis(0)).await,
            Err(EngineError::NotFound)
        ));
    }
}
