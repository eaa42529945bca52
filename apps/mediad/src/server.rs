//! Boots the configured IPC servers against one shared [`Session`]
//! (spec.md §2, §4.4), and drives their graceful shutdown from Ctrl-C or
//! SIGTERM — the same signal-handling shape as `streamkit-server`'s
//! `shutdown_signal`, generalized to fan out to both servers through a
//! single [`CancellationToken`].

use std::net::SocketAddr;
use std::sync::Arc;

use mediad_core::Session;
use mediad_engine::RefEngine;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::http_server;
use crate::state::AppState;
use crate::tcp_server::{self, TcpServerConfig};
use crate::worker_pool::WorkerPool;

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::acquire(Arc::new(RefEngine::new()));
    let root = session.as_node_ref();

    let shutdown = CancellationToken::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        signal_shutdown.cancel();
    });

    let mut tasks = Vec::new();

    if config.tcp.enable {
        let tcp_config = TcpServerConfig {
            address: config.tcp.address.clone(),
            port: config.tcp.port,
            max_threads: config.tcp.effective_max_threads(),
        };
        let root = root.clone();
        let shutdown = shutdown.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = tcp_server::run(tcp_config, root, shutdown).await {
                error!(error = %e, "TCP server exited with an error");
            }
        }));
    }

    if config.http.enable {
        let http_pool = Arc::new(WorkerPool::new(config.http.effective_max_threads()));
        let state = Arc::new(AppState { session: session.clone(), root: root.clone(), http_pool: http_pool.clone() });
        let app = http_server::build_router(state);

        let addr: SocketAddr = format!("{}:{}", config.http.address, config.http.port).parse()?;
        let listener = TcpListener::bind(addr).await?;
        info!(address = %addr, "HTTP server listening");

        let shutdown = shutdown.clone();
        tasks.push(tokio::spawn(async move {
            let result = axum::serve(listener, app).with_graceful_shutdown(shutdown.cancelled_owned()).await;
            if let Err(e) = result {
                error!(error = %e, "HTTP server exited with an error");
            }
            // axum's graceful shutdown only waits out in-flight *connections*;
            // a `generic_handler` that already handed its command off to
            // `http_pool` returns as soon as its own worker task completes, so
            // drain the pool too before this task (and thus the process) exits
            // (spec.md §4.7 "Graceful shutdown").
            http_pool.drain().await;
        }));
    }

    if tasks.is_empty() {
        warn!("neither the TCP nor the HTTP protocol is enabled; mediad has nothing to serve");
    }

    for task in tasks {
        let _ = task.await;
    }

    info!("mediad shut down cleanly");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        #[allow(clippy::expect_used)]
        tokio::signal::ctrl_c().await.expect("failed to install the Ctrl-C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[allow(clippy::expect_used)]
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install the SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl-C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
