//! Result aggregator: folds per-chunk records into one document verdict.
//!
//! Flagged chunks dominate. A single confident `yes` outweighs any number
//! of clean chunks, and `unclear` never surfaces at document level; it
//! only pulls the recommended action toward human review.

use serde_json::Value;

use crate::pipeline::classify::normalize::normalize_model_output;
use crate::pipeline::classify::types::{
    thresholds, Category, ClassificationRecord, DocumentSummary, ModelOutput, OverallVerdict,
    RecommendedAction, Verdict,
};

/// Reduce chunk records to a document summary. Order of the input is
/// irrelevant; an empty slice reads as a clean document.
pub fn aggregate_records(records: &[ClassificationRecord]) -> DocumentSummary {
    let flagged: Vec<&ClassificationRecord> =
        records.iter().filter(|r| r.mnpi == Verdict::Yes).collect();

    if flagged.is_empty() {
        let any_unclear = records.iter().any(|r| r.mnpi == Verdict::Unclear);
        let overall_confidence = round2(max_confidence(records.iter().map(|r| r.confidence)));

        let (reason, recommended_action) = if any_unclear {
            (
                "No MNPI detected; some chunks marked unclear - human review recommended."
                    .to_string(),
                RecommendedAction::HumanReview,
            )
        } else {
            ("No MNPI detected.".to_string(), RecommendedAction::NoAction)
        };

        return DocumentSummary {
            overall_mnpi: OverallVerdict::No,
            categories: Vec::new(),
            overall_confidence,
            reason,
            recommended_action,
        };
    }

    let mut categories: Vec<Category> = flagged
        .iter()
        .flat_map(|r| r.categories.iter())
        .filter(|c| **c != Category::None)
        .cloned()
        .collect();
    categories.sort_by_key(|c| c.as_str());
    categories.dedup();

    // Document confidence tracks the strongest flag, not the clean chunks.
    let overall_confidence = round2(max_confidence(flagged.iter().map(|r| r.confidence)));

    let recommended_action = if overall_confidence >= thresholds::ESCALATE {
        RecommendedAction::Escalate
    } else {
        RecommendedAction::HumanReview
    };

    DocumentSummary {
        overall_mnpi: OverallVerdict::Yes,
        categories,
        overall_confidence,
        reason: format!("Detected MNPI in {} chunk(s).", flagged.len()),
        recommended_action,
    }
}

/// Aggregate records that arrive as loose JSON, e.g. replayed from a
/// saved report. Non-object entries are skipped; object entries run
/// through the output normalizer before the typed reduction.
pub fn aggregate_json(values: &[Value]) -> DocumentSummary {
    let records: Vec<ClassificationRecord> = values
        .iter()
        .filter(|v| v.is_object())
        .map(|v| normalize_model_output(ModelOutput::Structured(v.clone())))
        .collect();

    aggregate_records(&records)
}

fn max_confidence(confidences: impl Iterator<Item = f64>) -> f64 {
    confidences.fold(0.0, f64::max)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::pipeline::classify::types::RiskLevel;

    fn record(mnpi: Verdict, confidence: f64) -> ClassificationRecord {
        ClassificationRecord {
            mnpi,
            categories: vec![Category::None],
            confidence,
            evidence_summary: String::new(),
            risk_level: RiskLevel::Low,
            recommended_action: RecommendedAction::NoAction,
            notes: None,
        }
    }

    fn flagged(confidence: f64, categories: Vec<Category>) -> ClassificationRecord {
        ClassificationRecord {
            categories,
            risk_level: RiskLevel::Medium,
            recommended_action: RecommendedAction::HumanReview,
            ..record(Verdict::Yes, confidence)
        }
    }

    #[test]
    fn empty_input_reads_as_clean_document() {
        let summary = aggregate_records(&[]);

        assert_eq!(summary.overall_mnpi, OverallVerdict::No);
        assert_eq!(summary.overall_confidence, 0.0);
        assert!(summary.categories.is_empty());
        assert_eq!(summary.recommended_action, RecommendedAction::NoAction);
        assert_eq!(summary.reason, "No MNPI detected.");
    }

    #[test]
    fn clean_chunks_keep_max_confidence_and_no_action() {
        let records = vec![record(Verdict::No, 0.3), record(Verdict::No, 0.6)];

        let summary = aggregate_records(&records);

        assert_eq!(summary.overall_mnpi, OverallVerdict::No);
        assert_eq!(summary.overall_confidence, 0.6);
        assert_eq!(summary.recommended_action, RecommendedAction::NoAction);
    }

    #[test]
    fn unclear_without_flags_recommends_review() {
        let records = vec![record(Verdict::No, 0.2), record(Verdict::Unclear, 0.45)];

        let summary = aggregate_records(&records);

        assert_eq!(summary.overall_mnpi, OverallVerdict::No);
        assert_eq!(summary.recommended_action, RecommendedAction::HumanReview);
        assert!(summary.reason.contains("unclear"));
    }

    #[test]
    fn one_confident_flag_escalates() {
        let records = vec![
            record(Verdict::No, 0.2),
            flagged(0.9, vec![Category::MergersAcquisitions]),
        ];

        let summary = aggregate_records(&records);

        assert_eq!(summary.overall_mnpi, OverallVerdict::Yes);
        assert_eq!(summary.overall_confidence, 0.9);
        assert_eq!(summary.categories, vec![Category::MergersAcquisitions]);
        assert_eq!(summary.recommended_action, RecommendedAction::Escalate);
        assert_eq!(summary.reason, "Detected MNPI in 1 chunk(s).");
    }

    #[test]
    fn moderate_flag_goes_to_review() {
        let records = vec![flagged(0.6, vec![Category::UnreleasedEarnings])];

        let summary = aggregate_records(&records);

        assert_eq!(summary.overall_mnpi, OverallVerdict::Yes);
        assert_eq!(summary.recommended_action, RecommendedAction::HumanReview);
    }

    #[test]
    fn escalation_threshold_is_inclusive() {
        let records = vec![flagged(0.75, vec![Category::InsiderTradingRisk])];

        let summary = aggregate_records(&records);

        assert_eq!(summary.recommended_action, RecommendedAction::Escalate);
    }

    #[test]
    fn document_confidence_ignores_unflagged_chunks() {
        // A very confident "no" must not inflate the document confidence.
        let records = vec![
            flagged(0.55, vec![Category::ExecutiveChanges]),
            record(Verdict::No, 0.9),
        ];

        let summary = aggregate_records(&records);

        assert_eq!(summary.overall_confidence, 0.55);
        assert_eq!(summary.recommended_action, RecommendedAction::HumanReview);
    }

    #[test]
    fn categories_union_sorted_and_deduplicated() {
        let records = vec![
            flagged(
                0.8,
                vec![Category::MergersAcquisitions, Category::ExecutiveChanges],
            ),
            flagged(0.6, vec![Category::ExecutiveChanges, Category::None]),
        ];

        let summary = aggregate_records(&records);

        assert_eq!(
            summary.categories,
            vec![Category::ExecutiveChanges, Category::MergersAcquisitions],
            "sorted by label, deduplicated, None excluded"
        );
        assert_eq!(summary.reason, "Detected MNPI in 2 chunk(s).");
    }

    #[test]
    fn flags_with_only_none_category_yield_empty_list() {
        let records = vec![flagged(0.8, vec![Category::None])];

        let summary = aggregate_records(&records);

        assert_eq!(summary.overall_mnpi, OverallVerdict::Yes);
        assert!(summary.categories.is_empty());
    }

    #[test]
    fn json_aggregation_skips_non_object_entries() {
        let values = vec![
            json!({
                "mnpi": "yes",
                "categories": ["Insider Trading Risk"],
                "confidence": 0.9,
                "evidence_summary": "window closed",
                "risk_level": "high",
                "recommended_action": "escalate"
            }),
            json!("garbage"),
            json!(42),
            json!([1, 2, 3]),
        ];

        let summary = aggregate_json(&values);

        assert_eq!(summary.overall_mnpi, OverallVerdict::Yes);
        assert_eq!(summary.overall_confidence, 0.9);
        assert_eq!(summary.reason, "Detected MNPI in 1 chunk(s).");
    }

    #[test]
    fn json_aggregation_coerces_loose_fields() {
        // String confidence and an off-vocabulary category still land.
        let values = vec![json!({
            "mnpi": "yes",
            "categories": ["M&A/Transactions", "made-up label"],
            "confidence": "0.88",
            "risk_level": "high",
            "recommended_action": "escalate"
        })];

        let summary = aggregate_json(&values);

        assert_eq!(summary.overall_mnpi, OverallVerdict::Yes);
        assert_eq!(summary.overall_confidence, 0.88);
        assert_eq!(summary.categories, vec![Category::MergersAcquisitions]);
    }

    #[test]
    fn json_aggregation_of_only_junk_is_clean() {
        let values = vec![json!(null), json!("x"), json!(3.2)];

        let summary = aggregate_json(&values);

        assert_eq!(summary.overall_mnpi, OverallVerdict::No);
        assert_eq!(summary.overall_confidence, 0.0);
        assert_eq!(summary.recommended_action, RecommendedAction::NoAction);
    }
}
