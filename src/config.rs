//! Scanner configuration: endpoint, chunk geometry, retry budget.

use std::time::Duration;

pub const APP_NAME: &str = "mnpi-scan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default Ollama endpoint on the local machine.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Per-request timeout. Local CPU inference on a full chunk can take
/// minutes, so this is generous.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Target chunk size in characters.
pub const DEFAULT_CHUNK_CHARS: usize = 1500;

/// Overlap carried between consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Model invocations allowed per chunk before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 2;

/// Pause between consecutive attempts on one chunk.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(600);

/// Tracing filter applied when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    "mnpi_scan=info".to_string()
}

/// `OLLAMA_HOST` overrides the endpoint default, matching the Ollama CLI.
pub fn default_ollama_url() -> String {
    std::env::var("OLLAMA_HOST")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
}

/// Knobs for one scanner run. CLI flags override field by field.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Model to use; `None` resolves through the preference list at
    /// preflight.
    pub model: Option<String>,
    pub ollama_url: String,
    pub timeout_secs: u64,
    pub chunk_chars: usize,
    pub chunk_overlap: usize,
    pub max_attempts: usize,
    pub retry_delay: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            model: None,
            ollama_url: default_ollama_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            chunk_chars: DEFAULT_CHUNK_CHARS,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}
