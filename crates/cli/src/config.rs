//! Runtime configuration
//!
//! Every setting can come from a flag or from the environment variable the
//! container image documents. The API key has no default; starting without
//! it is a fatal error reported by clap.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Paperproxy - upload documents dropped into a directory to Paperless
#[derive(Debug, Clone, Parser)]
#[command(name = "paperproxy")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Directory to watch for new documents
    #[arg(long, env = "WATCH_DIR", default_value = "/consume")]
    pub watch_dir: PathBuf,

    /// Paperless host, with or without scheme
    #[arg(long, env = "PAPERLESS_HOST", default_value = "localhost:8000")]
    pub paperless_host: String,

    /// Paperless API token
    #[arg(long = "api-key", env = "PAPERLESS_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Tag id attached to every uploaded document
    #[arg(long, env = "PAPERLESS_TAG")]
    pub tag: Option<u32>,

    /// Seconds an idle, already processed path keeps its debounce timer (0 = forever)
    #[arg(long, env = "EVICT_AFTER_SECS", default_value_t = 60)]
    pub evict_after_secs: u64,

    /// Log verbosity: debug, info, warn or error
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Eviction delay for fired debounce timers
    pub fn evict_after(&self) -> Option<Duration> {
        match self.evict_after_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Parsed log level; unknown values fall back to info
    pub fn level(&self) -> Level {
        parse_level(&self.log_level)
    }
}

/// Map a `LOG_LEVEL` value onto a tracing level
pub fn parse_level(value: &str) -> Level {
    match value {
        "debug" | "DEBUG" => Level::DEBUG,
        "info" | "INFO" => Level::INFO,
        "warn" | "WARN" => Level::WARN,
        "error" | "ERROR" => Level::ERROR,
        _ => Level::INFO,
    }
}
