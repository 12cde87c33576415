//! Classification controller: drives the model call for one chunk and
//! guarantees a fully-formed record comes out the other side.
//!
//! The protocol is deliberately cautious. A verdict is accepted early
//! only when the model is confident or the chunk is clean; borderline
//! confidence buys one verifier pass whose merge always moves toward
//! `unclear`/`human_review`, never away from it.

use std::time::Duration;

use super::normalize::{clamp_confidence, fallback_record, normalize_model_output};
use super::prompt::{build_classify_prompt, build_verifier_prompt};
use super::types::{
    thresholds, ClassificationRecord, LlmClient, ModelOutput, RecommendedAction, Verdict,
};

// ═══════════════════════════════════════════════════════════
// Retry policy
// ═══════════════════════════════════════════════════════════

/// Bounded retry budget for one chunk.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Model invocations allowed in the attempt loop (at least 1).
    pub max_attempts: usize,
    /// Fixed delay between consecutive attempts.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            retry_delay: Duration::from_millis(600),
        }
    }
}

/// Blocking wait between attempts; injected so tests run with no delay.
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

/// Sleeper backed by the OS clock.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

// ═══════════════════════════════════════════════════════════
// Controller
// ═══════════════════════════════════════════════════════════

/// Classifies one chunk at a time through an injected model client.
pub struct ChunkClassifier {
    llm: Box<dyn LlmClient + Send + Sync>,
    model: String,
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper + Send + Sync>,
}

impl ChunkClassifier {
    pub fn new(llm: Box<dyn LlmClient + Send + Sync>, model: &str) -> Self {
        Self {
            llm,
            model: model.to_string(),
            policy: RetryPolicy::default(),
            sleeper: Box::new(ThreadSleeper),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = RetryPolicy {
            max_attempts: policy.max_attempts.max(1),
            ..policy
        };
        self
    }

    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper + Send + Sync>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Classify one chunk of document text.
    ///
    /// Never fails: transport errors, garbage output and exhausted
    /// retries all resolve to a record biased toward `unclear` and
    /// `human_review`. Only the most recent model response is kept.
    pub fn classify_chunk(&self, chunk: &str) -> ClassificationRecord {
        let prompt = build_classify_prompt(chunk);
        let max_attempts = self.policy.max_attempts.max(1);

        let mut latest: Option<ClassificationRecord> = None;
        for attempt in 1..=max_attempts {
            let response = match self.llm.generate(&self.model, &prompt) {
                Ok(text) => text,
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(attempt, error = %e, "model call failed, retrying");
                    self.sleeper.sleep(self.policy.retry_delay);
                    continue;
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "model call failed, retry budget spent");
                    return fallback_record("LLM error", &format!("LLM error after retries: {e}"));
                }
            };

            let record = normalize_model_output(ModelOutput::Raw(response));

            if record.confidence >= thresholds::EARLY_ACCEPT || record.mnpi == Verdict::No {
                tracing::debug!(
                    attempt,
                    confidence = record.confidence,
                    verdict = record.mnpi.as_str(),
                    "verdict accepted early"
                );
                return record;
            }

            latest = Some(record);
            if attempt < max_attempts {
                self.sleeper.sleep(self.policy.retry_delay);
            }
        }

        let record =
            latest.unwrap_or_else(|| fallback_record("LLM error", "no model response retained"));

        if (thresholds::VERIFY_FLOOR..thresholds::EARLY_ACCEPT).contains(&record.confidence) {
            self.verify(chunk, record)
        } else {
            record
        }
    }

    /// One confirmation pass over a borderline first verdict.
    fn verify(&self, chunk: &str, first: ClassificationRecord) -> ClassificationRecord {
        let prompt = build_verifier_prompt(chunk);
        let response = match self.llm.generate(&self.model, &prompt) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "verifier pass failed, routing first verdict to review");
                return degrade_to_review(first);
            }
        };

        let verifier = normalize_model_output(ModelOutput::Raw(response));
        tracing::debug!(
            first_verdict = first.mnpi.as_str(),
            first_confidence = first.confidence,
            verifier_verdict = verifier.mnpi.as_str(),
            verifier_confidence = verifier.confidence,
            "merging verifier pass"
        );
        merge_passes(first, verifier)
    }
}

// ═══════════════════════════════════════════════════════════
// Merge rules
// ═══════════════════════════════════════════════════════════

/// Merge a borderline first pass with its verifier pass.
///
/// The lower confidence wins. An `unclear` on either side, or a first-pass
/// `yes` the verifier contradicts, demotes the verdict to `unclear`; a
/// first-pass `no` stands even when the verifier flips to `yes`. Field
/// values prefer the verifier when it produced something non-empty.
fn merge_passes(first: ClassificationRecord, verifier: ClassificationRecord) -> ClassificationRecord {
    let confidence = clamp_confidence(first.confidence.min(verifier.confidence));

    let mut mnpi = if first.mnpi == Verdict::Unclear || verifier.mnpi == Verdict::Unclear {
        Verdict::Unclear
    } else if first.mnpi == Verdict::Yes && verifier.mnpi == Verdict::No {
        Verdict::Unclear
    } else {
        first.mnpi
    };

    let categories = if verifier.categories.is_empty() {
        first.categories
    } else {
        verifier.categories
    };
    let evidence_summary = if verifier.evidence_summary.is_empty() {
        first.evidence_summary
    } else {
        verifier.evidence_summary
    };
    let notes = verifier.notes.or(first.notes);
    let risk_level = verifier.risk_level;
    let mut recommended_action = verifier.recommended_action;

    // The merged confidence can drop below what either pass reported,
    // so the low-trust `yes` demotion applies again.
    if mnpi == Verdict::Yes && confidence < thresholds::TRUSTED_YES {
        mnpi = Verdict::Unclear;
        recommended_action = RecommendedAction::HumanReview;
    }

    ClassificationRecord {
        mnpi,
        categories,
        confidence,
        evidence_summary,
        risk_level,
        recommended_action,
        notes,
    }
}

/// Verifier transport failure: the first verdict stands, but it goes to a
/// human with a note about the failed re-check.
fn degrade_to_review(mut record: ClassificationRecord) -> ClassificationRecord {
    record.recommended_action = RecommendedAction::HumanReview;
    record.notes = Some(match record.notes.take() {
        Some(notes) => format!("{notes} | verifier failed"),
        None => "verifier failed".to_string(),
    });
    record
}
