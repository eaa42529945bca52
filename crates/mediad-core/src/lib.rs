//! The request-handling core: the session object tree, the Engine adapter
//! contract, the JSON formatter, and the shared return-code taxonomy.
//!
//! The Parser, the TCP/HTTP servers, and the worker pool live in sibling
//! crates and depend on this one; this crate has no knowledge of either
//! wire protocol.

pub mod engine;
pub mod error;
pub mod formatter;
pub mod path;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::Engine;
pub use error::{CoreError, CoreResult, ReturnCode};
pub use tree::session::Session;
pub use tree::{NodeKind, NodeRef, TreeNode};
