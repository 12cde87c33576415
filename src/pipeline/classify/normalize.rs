//! Output normalization: anything the model says becomes a valid record.
//!
//! Local models drift: they wrap JSON in prose, emit trailing commas,
//! invent category labels, return confidence as a string. Rather than
//! bubbling parse errors up through the pipeline, every response is
//! forced into a [`ClassificationRecord`] here. Normalization is total;
//! the worst response still yields a conservative `unclear` record that
//! routes to human review.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::types::{
    thresholds, Category, ClassificationRecord, ModelOutput, RecommendedAction, RiskLevel, Verdict,
};

/// Widest `{...}` span in a response, for models that wrap JSON in prose.
static JSON_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid JSON span regex"));

// ═══════════════════════════════════════════════════════════
// Entry point
// ═══════════════════════════════════════════════════════════

/// Normalize one model response into a validated record.
///
/// Never fails. Unparseable or off-schema responses collapse to a
/// fallback record (`unclear`, confidence 0.0, human review) whose
/// evidence and notes say what went wrong.
pub fn normalize_model_output(output: ModelOutput) -> ClassificationRecord {
    match output {
        ModelOutput::Raw(text) | ModelOutput::Wrapped(text) => normalize_text(&text),
        ModelOutput::Structured(value) => match value {
            Value::Object(map) => coerce_object(&map),
            _ => fallback_record(
                "Response was JSON but not an object",
                "Normalization fallback used",
            ),
        },
    }
}

fn normalize_text(text: &str) -> ClassificationRecord {
    // Well-behaved models return bare JSON; try the whole response first.
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text.trim()) {
        return coerce_object(&map);
    }

    let Some(span) = JSON_SPAN.find(text) else {
        return fallback_record("No valid JSON returned", "Model did not return JSON");
    };

    match serde_json::from_str::<Value>(span.as_str()) {
        Ok(Value::Object(map)) => coerce_object(&map),
        _ => fallback_record("Malformed JSON", "JSON parse error"),
    }
}

/// Conservative record used when a response cannot be trusted at all.
pub(crate) fn fallback_record(evidence: &str, note: &str) -> ClassificationRecord {
    ClassificationRecord {
        mnpi: Verdict::Unclear,
        categories: vec![Category::None],
        confidence: 0.0,
        evidence_summary: evidence.to_string(),
        risk_level: RiskLevel::Low,
        recommended_action: RecommendedAction::HumanReview,
        notes: Some(note.to_string()),
    }
}

// ═══════════════════════════════════════════════════════════
// Field coercion
// ═══════════════════════════════════════════════════════════

fn coerce_object(map: &Map<String, Value>) -> ClassificationRecord {
    let mut mnpi = coerce_verdict(map.get("mnpi"));
    let confidence = coerce_confidence(map.get("confidence"));

    // A yes the model itself barely believes is not actionable on its own.
    let mut action_override = None;
    if mnpi == Verdict::Yes && confidence < thresholds::TRUSTED_YES {
        mnpi = Verdict::Unclear;
        action_override = Some(RecommendedAction::HumanReview);
    }

    let categories = coerce_categories(map.get("categories"));

    let risk_level =
        coerce_risk(map.get("risk_level")).unwrap_or_else(|| derive_risk(confidence));

    let recommended_action = action_override
        .or_else(|| coerce_action(map.get("recommended_action")))
        .unwrap_or_else(|| derive_action(&risk_level, &mnpi));

    let evidence_summary = map
        .get("evidence_summary")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();

    let notes = map
        .get("notes")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

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

fn coerce_verdict(value: Option<&Value>) -> Verdict {
    value
        .and_then(Value::as_str)
        .and_then(Verdict::from_label)
        .unwrap_or(Verdict::Unclear)
}

fn coerce_confidence(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        // Some models quote the number.
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    clamp_confidence(raw)
}

/// Clamp to `[0.0, CONFIDENCE_CAP]`, round to 2 decimals. Non-finite
/// input counts as no confidence at all.
pub(crate) fn clamp_confidence(raw: f64) -> f64 {
    let c = if raw.is_finite() { raw } else { 0.0 };
    let c = c.clamp(0.0, thresholds::CONFIDENCE_CAP);
    (c * 100.0).round() / 100.0
}

fn coerce_categories(value: Option<&Value>) -> Vec<Category> {
    // Only a real list counts; a bare string or anything else is off-schema.
    let mut categories: Vec<Category> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(Category::from_label)
            .collect(),
        _ => Vec::new(),
    };

    if categories.is_empty() {
        categories.push(Category::None);
    }
    categories
}

fn coerce_risk(value: Option<&Value>) -> Option<RiskLevel> {
    value.and_then(Value::as_str).and_then(RiskLevel::from_label)
}

fn coerce_action(value: Option<&Value>) -> Option<RecommendedAction> {
    value
        .and_then(Value::as_str)
        .and_then(RecommendedAction::from_label)
}

fn derive_risk(confidence: f64) -> RiskLevel {
    if confidence >= thresholds::RISK_HIGH {
        RiskLevel::High
    } else if confidence >= thresholds::RISK_MEDIUM {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn derive_action(risk: &RiskLevel, mnpi: &Verdict) -> RecommendedAction {
    if *risk == RiskLevel::High {
        RecommendedAction::Escalate
    } else if *mnpi == Verdict::Unclear || *risk == RiskLevel::Medium {
        RecommendedAction::HumanReview
    } else {
        RecommendedAction::NoAction
    }
}
