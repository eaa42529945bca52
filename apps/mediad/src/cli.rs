//! The command-line surface (SPEC_FULL.md §6), modeled verbatim on
//! `streamkit-server`'s `cli.rs`: a default `serve` subcommand plus a
//! `config` subcommand for inspecting the defaults and the JSON schema
//! without starting the daemon.

use clap::{Parser, Subcommand};
use schemars::schema_for;
use tracing::{error, info, warn};

use crate::config;

#[derive(Parser, Debug)]
#[command(author, version, about = "Remote-controlled multimedia pipeline daemon", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file. Missing is not an error — defaults
    /// apply and a warning is logged once logging is initialized.
    #[arg(short, long, default_value = "mediad.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the daemon (the default when no subcommand is given).
    Serve,
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the built-in default configuration as TOML.
    Default,
    /// Print the configuration's JSON Schema.
    Schema,
}

pub async fn handle_command(cli: &Cli) {
    match cli.command.as_ref().unwrap_or(&Commands::Serve) {
        Commands::Serve => handle_serve_command(&cli.config).await,
        Commands::Config(ConfigCommands::Default) => handle_config_default_command(),
        Commands::Config(ConfigCommands::Schema) => handle_config_schema_command(),
    }
}

async fn handle_serve_command(config_path: &str) {
    let load_result = match config::load(config_path) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("failed to load configuration from {config_path}: {e}");
            std::process::exit(1);
        },
    };

    let _log_guard = match crate::logging::init_logging(&load_result.config.log) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e}");
            std::process::exit(1);
        },
    };

    if let Some(missing) = &load_result.file_missing {
        warn!(config_path = %missing, "config file not found, starting with defaults");
    }

    info!(
        tcp_enable = load_result.config.tcp.enable,
        http_enable = load_result.config.http.enable,
        "starting mediad"
    );

    if let Err(e) = crate::server::run(load_result.config).await {
        error!(error = %e, "mediad exited with an error");
        std::process::exit(1);
    }
}

fn handle_config_default_command() {
    match config::generate_default() {
        Ok(toml) => println!("{toml}"),
        Err(e) => {
            eprintln!("failed to render default configuration: {e}");
            std::process::exit(1);
        },
    }
}

fn handle_config_schema_command() {
    let schema = schema_for!(config::Config);
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("failed to render configuration schema: {e}");
            std::process::exit(1);
        },
    }
}
