use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

/// Scribe runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// SQLite database path, `:memory:` for a throwaway store
    pub db_path: String,
    /// Number of pooled SQLite connections
    pub pool_size: usize,
    /// Ollama base URL
    pub ollama_url: String,
    /// Model asked for summaries
    pub summary_model: String,
    /// Qualifying messages read per compaction attempt
    pub compaction_window: usize,
    /// Smallest window that gets summarized
    pub compaction_min: usize,
    /// Directory for the rolling JSON log file
    pub log_dir: Option<PathBuf>,
    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 4000,
            db_path: "scribe.db".to_string(),
            pool_size: 8,
            ollama_url: scribe_summarizer::ollama::DEFAULT_BASE_URL.to_string(),
            summary_model: scribe_summarizer::ollama::DEFAULT_MODEL.to_string(),
            compaction_window: 20,
            compaction_min: 6,
            log_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading values through `lookup`.
    /// Unparseable numbers fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            bind_address: lookup("SCRIBE_BIND").unwrap_or(defaults.bind_address),
            port: parse_var::<u16>(&lookup, "SCRIBE_PORT").unwrap_or(defaults.port),
            db_path: lookup("SCRIBE_DB").unwrap_or(defaults.db_path),
            pool_size: parse_var::<usize>(&lookup, "SCRIBE_POOL_SIZE")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.pool_size),
            ollama_url: lookup("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            summary_model: lookup("SCRIBE_SUMMARY_MODEL").unwrap_or(defaults.summary_model),
            compaction_window: parse_var::<usize>(&lookup, "SCRIBE_COMPACTION_WINDOW")
                .unwrap_or(defaults.compaction_window),
            compaction_min: parse_var::<usize>(&lookup, "SCRIBE_COMPACTION_MIN")
                .unwrap_or(defaults.compaction_min),
            log_dir: lookup("SCRIBE_LOG_DIR")
                .filter(|d| !d.is_empty())
                .map(PathBuf::from),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.db_path == ":memory:"
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}
