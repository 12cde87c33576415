//! Scan documents for Material Non-Public Information (MNPI) with a
//! locally hosted LLM.
//!
//! Nothing leaves the machine: classification runs against a local
//! Ollama instance, free-text model output is normalized into validated
//! records, and per-chunk records fold into one document verdict.

pub mod config;
pub mod pipeline;

pub use pipeline::aggregate::{aggregate_json, aggregate_records};
pub use pipeline::chunker::{Chunk, TextSplitter};
pub use pipeline::classify::controller::{ChunkClassifier, RetryPolicy, Sleeper, ThreadSleeper};
pub use pipeline::classify::normalize::normalize_model_output;
pub use pipeline::classify::ollama::{resolve_model, MockLlmClient, OllamaClient};
pub use pipeline::classify::types::{
    thresholds, Category, ClassificationRecord, DocumentSummary, LlmClient, ModelOutput,
    OverallVerdict, RecommendedAction, RiskLevel, Verdict,
};
pub use pipeline::classify::ClassifyError;
pub use pipeline::scanner::{DocumentScanner, ScanReport};
pub use pipeline::ScanError;
