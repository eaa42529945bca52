//! The TCP command server (spec.md §4.6): one task per connection, a
//! single read framed as one command, a single NUL-terminated write back.
//! Modeled on `alfredjeanlab-oddjobs`'s `listener/mod.rs` accept loop, with
//! connection admission gated by the same [`WorkerPool`] the HTTP server
//! uses for request admission.

use std::net::SocketAddr;
use std::sync::Arc;

use mediad_core::NodeRef;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::envelope::render_envelope;
use crate::worker_pool::WorkerPool;

/// §4.6 step 1: "read up to 1 MiB into a buffer, then treat whatever was
/// read as one command".
const MAX_COMMAND_BYTES: usize = 1024 * 1024;

pub struct TcpServerConfig {
    pub address: String,
    pub port: u16,
    pub max_threads: usize,
}

/// Binds and serves until `shutdown` fires.
pub async fn run(config: TcpServerConfig, root: NodeRef, shutdown: CancellationToken) -> std::io::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.address, config.port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{e}")))?;
    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "TCP server listening");
    serve(listener, root, config.max_threads, shutdown).await
}

/// Accepts connections on an already-bound `listener` until `shutdown`
/// fires, then stops accepting and drains every admitted connection task
/// before returning (§4.6's "stop" step: close the listener, then join the
/// connections it already handed off).
async fn serve(
    listener: TcpListener,
    root: NodeRef,
    max_threads: usize,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let pool = Arc::new(WorkerPool::new(max_threads));

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                info!("TCP server shutting down, draining in-flight connections");
                break;
            },
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let root = root.clone();
                        if pool.try_submit(async move { handle_connection(stream, peer, root).await }).is_err() {
                            debug!(%peer, "TCP connection rejected, pool at capacity");
                        }
                    },
                    Err(e) => error!(error = %e, "TCP accept error"),
                }
            },
        }
    }

    pool.drain().await;
    Ok(())
}

async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, root: NodeRef) {
    let mut buf = vec![0u8; MAX_COMMAND_BYTES];
    let mut served = 0u64;

    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => {
                debug!(%peer, served, "TCP client closed the connection");
                break;
            },
            Ok(n) => n,
            Err(e) => {
                warn!(%peer, error = %e, served, "TCP read error");
                break;
            },
        };

        let command_text = String::from_utf8_lossy(&buf[..n]);
        let result = mediad_parser::parse_and_execute(&root, Some(&command_text)).await;
        let envelope = render_envelope(result);

        let mut bytes = match serde_json::to_vec(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, "failed to serialize the response envelope");
                break;
            },
        };
        bytes.push(0);

        if let Err(e) = stream.write_all(&bytes).await {
            warn!(%peer, error = %e, served, "TCP write error");
            break;
        }
        served += 1;
    }
}
