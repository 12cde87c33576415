//! The scan pipeline: document in, verdict out.
//!
//! ```text
//! load → sanitize → chunk → classify (retry + verify) → aggregate
//! ```

pub mod aggregate;
pub mod chunker;
pub mod classify;
pub mod loader;
pub mod scanner;

pub use aggregate::{aggregate_json, aggregate_records};
pub use chunker::{Chunk, TextSplitter};
pub use loader::{load_document, sanitize_document_text};
pub use scanner::{DocumentScanner, ScanReport};

use thiserror::Error;

/// Faults that stop a scan before classification begins. Once chunks
/// exist, nothing in the pipeline fails a scan.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("Text encoding error: {0}")]
    EncodingError(String),

    #[error("Document contains no scannable text")]
    EmptyDocument,

    #[error("Classification error: {0}")]
    Classify(#[from] classify::ClassifyError),
}
