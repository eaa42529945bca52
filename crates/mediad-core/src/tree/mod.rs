//! The object tree (§3, §4.3): a hierarchical named tree of polymorphic
//! nodes with a URI-style path resolver and uniform CRUD verbs.
//!
//! Rather than the single-inheritance class hierarchy with virtual dispatch
//! that the source used, every Node kind implements the same
//! [`TreeNode`] async trait (§9's "interface abstraction over the CRUD
//! verbs implemented once per kind"). A `NodeRef` is an `Arc<dyn TreeNode>`:
//! Rust's atomic refcounting on `Arc` *is* the "counted handle" the design
//! notes ask for — `resolve` clones the `Arc` (increment), and the caller's
//! ordinary drop releases it (decrement), so callers cannot forget to
//! release on an exit path the way a hand-rolled refcount could.

pub mod action;
pub mod bus;
pub mod debug;
pub mod element;
pub mod elements;
pub mod event_factory;
pub mod pipeline;
pub mod pipelines;
pub mod properties;
pub mod property;
pub mod session;
pub mod signal;
pub mod signals_actions;
pub mod state;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

/// Discriminant used by renderers and by the parser's shorthand dispatch to
/// tell containers from leaves without downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Session,
    Pipelines,
    Pipeline,
    Elements,
    Element,
    Properties,
    Property,
    SignalsActions,
    Signal,
    Action,
    Bus,
    State,
    EventFactory,
    Debug,
}

/// A counted handle to a Node. Cloning increments the strong count;
/// dropping the last clone destroys the Node.
pub type NodeRef = std::sync::Arc<dyn TreeNode>;

/// The uniform verb set exposed by every Node (§4.3). A Node implements only
/// the verbs it supports; the rest keep the default `BAD_COMMAND`.
#[async_trait]
pub trait TreeNode: Send + Sync {
    fn name(&self) -> String;

    fn description(&self) -> String;

    fn kind(&self) -> NodeKind;

    /// Resolves a single path segment to a child. Containers override this;
    /// leaves inherit the `NO_RESOURCE` default (a leaf has no children).
    async fn child(&self, _segment: &str) -> CoreResult<NodeRef> {
        Err(CoreError::NoResource(_segment.to_string()))
    }

    async fn create(&self, _name: &str, _description: &str) -> CoreResult<NodeRef> {
        Err(CoreError::BadCommand("create not supported on this node".to_string()))
    }

    /// Renders the Node's structured view (§4.3 "Rendering"). Every Node
    /// supports `read`.
    async fn read(&self) -> CoreResult<Value>;

    async fn update(&self, _value: &str) -> CoreResult<()> {
        Err(CoreError::BadCommand("update not supported on this node".to_string()))
    }

    async fn delete(&self, _name: &str) -> CoreResult<()> {
        Err(CoreError::BadCommand("delete not supported on this node".to_string()))
    }
}

/// Default container rendering shape: `{ "name", "children": [{name, description}, …] }`.
pub fn render_container(name: &str, children: Vec<(String, String)>) -> Value {
    serde_json::json!({
        "name": name,
        "children": children
            .into_iter()
            .map(|(name, description)| serde_json::json!({"name": name, "description": description}))
            .collect::<Vec<_>>(),
    })
}
