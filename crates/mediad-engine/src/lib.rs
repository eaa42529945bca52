//! A reference [`mediad_core::Engine`] implementation (§4.9, SPEC_FULL.md
//! "Reference/test Engine"). The real multimedia backend is out of scope
//! (§1); this crate stands in for it, both as the daemon's default engine
//! and as the engine the whole test suite runs against.
//!
//! [`RefEngine`] parses a `gst-launch`-style `elem1 prop=val ! elem2`
//! description into a list of synthetic elements with small fixed property
//! schemas, and maintains per-pipeline state and a pending-message bus
//! queue entirely in memory. [`ResyncEngine`] wraps any `Engine` and forces
//! a bounded run of `Resync` outcomes, exercising the core's resync-cap
//! policy (§4.9, §9) without a truly concurrently-mutating backend.

mod parse;
mod ref_engine;
mod resync;

pub use ref_engine::RefEngine;
pub use resync::ResyncEngine;
