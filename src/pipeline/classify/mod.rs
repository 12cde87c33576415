pub mod controller;
pub mod normalize;
pub mod ollama;
pub mod prompt;
pub mod types;

pub use controller::{ChunkClassifier, RetryPolicy, Sleeper, ThreadSleeper};
pub use normalize::normalize_model_output;
pub use ollama::{resolve_model, MockLlmClient, OllamaClient};
pub use prompt::{build_classify_prompt, build_verifier_prompt};
pub use types::*;

use thiserror::Error;

/// Faults from the model invoker. None of these ever reach a scan result:
/// the controller converts every one of them into a conservative
/// `unclear`/`human_review` record once the retry budget is spent.
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Ollama is not running at {0}")]
    OllamaConnection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    OllamaError { status: u16, body: String },

    #[error("model '{0}' is not installed (try: ollama pull {0})")]
    ModelNotInstalled(String),

    #[error("no preferred model installed (looked for llama3.1, llama3, mistral)")]
    NoModelAvailable,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}
