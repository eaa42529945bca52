//! mediad: a remote-controlled multimedia pipeline daemon (spec.md §1).
//! Exposes the same object tree over a TCP line protocol and an HTTP/JSON
//! REST API; see `SPEC_FULL.md` for the full module map.

use clap::Parser;

mod cli;
mod config;
mod envelope;
mod http_server;
mod logging;
mod server;
mod state;
mod tcp_server;
mod worker_pool;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    cli::handle_command(&cli).await;
}
