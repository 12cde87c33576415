//! Scan driver: load, chunk, classify, aggregate.
//!
//! The driver stays thin. Everything that can fail a scan fails before
//! the first model call; from there every chunk resolves to a record and
//! every scan resolves to a report.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ScanConfig;
use crate::pipeline::aggregate::aggregate_records;
use crate::pipeline::chunker::TextSplitter;
use crate::pipeline::classify::controller::{ChunkClassifier, RetryPolicy};
use crate::pipeline::classify::types::{ClassificationRecord, DocumentSummary, LlmClient};
use crate::pipeline::loader::{load_document, sanitize_document_text};
use crate::pipeline::ScanError;

/// Terminal artifact of one document scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub source: String,
    pub scanned_at: DateTime<Utc>,
    pub model: String,
    pub chunk_count: usize,
    pub records: Vec<ClassificationRecord>,
    pub summary: DocumentSummary,
}

pub struct DocumentScanner {
    classifier: ChunkClassifier,
    splitter: TextSplitter,
    model: String,
}

impl DocumentScanner {
    pub fn new(llm: Box<dyn LlmClient + Send + Sync>, model: &str, config: &ScanConfig) -> Self {
        let classifier = ChunkClassifier::new(llm, model).with_policy(RetryPolicy {
            max_attempts: config.max_attempts,
            retry_delay: config.retry_delay,
        });

        Self {
            classifier,
            splitter: TextSplitter::new(config.chunk_chars, config.chunk_overlap),
            model: model.to_string(),
        }
    }

    /// Scan a document on disk. Only loading can fail; classification
    /// trouble surfaces in the records, not as an error.
    pub fn scan_path(&self, path: &Path) -> Result<ScanReport, ScanError> {
        let text = load_document(path)?;
        Ok(self.scan_text(&text, &path.display().to_string()))
    }

    /// Scan text already in memory. `source` labels the report.
    pub fn scan_text(&self, text: &str, source: &str) -> ScanReport {
        let text = sanitize_document_text(text);
        let chunks = self.splitter.split(&text);

        tracing::info!(
            source,
            chunks = chunks.len(),
            model = %self.model,
            "starting scan"
        );

        let mut records = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            tracing::info!(chunk = chunk.index + 1, total = chunks.len(), "classifying chunk");
            records.push(self.classifier.classify_chunk(&chunk.text));
        }

        let summary = aggregate_records(&records);
        tracing::info!(
            verdict = summary.overall_mnpi.as_str(),
            confidence = summary.overall_confidence,
            action = summary.recommended_action.as_str(),
            "scan complete"
        );

        ScanReport {
            scan_id: Uuid::new_v4(),
            source: source.to_string(),
            scanned_at: Utc::now(),
            model: self.model.clone(),
            chunk_count: chunks.len(),
            records,
            summary,
        }
    }
}
