//! Shared state handed to every HTTP handler (modeled on
//! `streamkit-server`'s `AppState`): the object tree's root plus the Session
//! handle that owns it, and the HTTP side's own worker pool. The TCP server
//! keeps its pool to itself in `tcp_server.rs` since no handler code needs
//! to reach it.

use std::sync::Arc;

use mediad_core::{NodeRef, Session};

use crate::worker_pool::WorkerPool;

pub struct AppState {
    pub session: Arc<Session>,
    pub root: NodeRef,
    pub http_pool: Arc<WorkerPool>,
}
