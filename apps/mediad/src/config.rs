//! Layered configuration (SPEC_FULL.md §6): defaults, overridden by a TOML
//! file, overridden by `MEDIAD_`-prefixed environment variables — the same
//! `figment` stack the teacher's `streamkit-server` builds its config on.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `-1` ("unlimited") and any other non-positive value clamp to this many
/// concurrently admitted tasks (§4.8, DESIGN.md's Open Question decision).
pub const DEFAULT_MAX_THREADS: usize = 16;

fn default_tcp_address() -> String {
    "127.0.0.1".to_string()
}

const fn default_tcp_port() -> u16 {
    5000
}

fn default_http_address() -> String {
    "127.0.0.1".to_string()
}

const fn default_http_port() -> u16 {
    5001
}

const fn default_max_threads() -> i64 {
    16
}

fn default_log_file_path() -> String {
    "mediad.log".to_string()
}

/// Clamps a configured thread-pool size to a concrete capacity. Negative
/// values (the historical "-1 means unlimited" convention) fall back to
/// [`DEFAULT_MAX_THREADS`] rather than growing the pool without bound.
#[must_use]
pub fn clamp_max_threads(value: i64) -> usize {
    usize::try_from(value).unwrap_or(DEFAULT_MAX_THREADS)
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TcpConfig {
    pub enable: bool,
    pub address: String,
    pub port: u16,
    pub max_threads: i64,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            enable: false,
            address: default_tcp_address(),
            port: default_tcp_port(),
            max_threads: default_max_threads(),
        }
    }
}

impl TcpConfig {
    #[must_use]
    pub fn effective_max_threads(&self) -> usize {
        clamp_max_threads(self.max_threads)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HttpConfig {
    pub enable: bool,
    pub address: String,
    pub port: u16,
    pub max_threads: i64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enable: true,
            address: default_http_address(),
            port: default_http_port(),
            max_threads: default_max_threads(),
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn effective_max_threads(&self) -> usize {
        clamp_max_threads(self.max_threads)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LogConfig {
    pub console_enable: bool,
    pub console_level: LogLevel,
    pub file_enable: bool,
    pub file_path: String,
    pub file_level: LogLevel,
    pub file_format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_enable: true,
            console_level: LogLevel::Info,
            file_enable: false,
            file_path: default_log_file_path(),
            file_level: LogLevel::Info,
            file_format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    pub tcp: TcpConfig,
    pub http: HttpConfig,
    pub log: LogConfig,
}

/// The outcome of [`load`]: the resolved config plus whether the requested
/// file was actually found (the daemon still starts on defaults if not, but
/// logs a warning once logging is up).
pub struct ConfigLoadResult {
    pub config: Config,
    pub file_missing: Option<String>,
}

/// Loads the config from (in increasing priority) built-in defaults, the
/// TOML file at `config_path` if it exists, then `MEDIAD_`-prefixed
/// environment variables (`MEDIAD_HTTP__PORT`, `MEDIAD_TCP__ENABLE`, ...).
pub fn load(config_path: &str) -> Result<ConfigLoadResult, figment::Error> {
    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

    let file_missing = if std::path::Path::new(config_path).exists() {
        figment = figment.merge(Toml::file(config_path));
        None
    } else {
        Some(config_path.to_string())
    };

    let config: Config = figment.merge(Env::prefixed("MEDIAD_").split("__")).extract()?;
    Ok(ConfigLoadResult { config, file_missing })
}

/// Renders the built-in defaults as a TOML document, for `mediad config
/// default`.
pub fn generate_default() -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_max_threads_clamps_to_the_default() {
        assert_eq!(clamp_max_threads(-1), DEFAULT_MAX_THREADS);
    }

    #[test]
    fn positive_max_threads_passes_through() {
        assert_eq!(clamp_max_threads(4), 4);
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let result = load("/nonexistent/mediad-config-path.toml").unwrap();
        assert!(result.file_missing.is_some());
        assert_eq!(result.config.http.port, default_http_port());
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let rendered = generate_default().unwrap();
        assert!(rendered.contains("[tcp]"));
        assert!(rendered.contains("[http]"));
        assert!(rendered.contains("[log]"));
    }
}
