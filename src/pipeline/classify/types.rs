//! Wire types for the classification exchange with the model.
//!
//! The JSON record schema is the only bit-exact contract shared with the
//! LLM: a mapping with keys `mnpi`, `categories`, `confidence`,
//! `evidence_summary`, `risk_level`, `recommended_action`, `notes`. The
//! enums here carry those exact wire labels; lenient coercion of anything
//! off-schema is the normalizer's job, not serde's.

use serde::{Deserialize, Serialize};

use super::ClassifyError;

// ═══════════════════════════════════════════════════════════
// Wire enums
// ═══════════════════════════════════════════════════════════

/// Macro to generate a wire enum with exact serde labels plus
/// as_str / from_label accessors.
macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            /// Parse an exact wire label. Unknown labels yield `None`.
            pub fn from_label(s: &str) -> Option<Self> {
                match s {
                    $($s => Some(Self::$variant)),+,
                    _ => None,
                }
            }
        }
    };
}

wire_enum!(Verdict {
    Yes => "yes",
    No => "no",
    Unclear => "unclear",
});

wire_enum!(OverallVerdict {
    Yes => "yes",
    No => "no",
});

wire_enum!(Category {
    UnreleasedEarnings => "Unreleased Earnings/Guidance",
    MergersAcquisitions => "M&A/Transactions",
    ExecutiveChanges => "Executive Changes",
    ProductLaunch => "Product Launch/Strategic Plans",
    LegalRegulatory => "Legal/Regulatory Investigations",
    InsiderTradingRisk => "Insider Trading Risk",
    FinancialProjections => "Confidential Financial Projections",
    None => "None",
});

wire_enum!(RiskLevel {
    Low => "low",
    Medium => "medium",
    High => "high",
});

wire_enum!(RecommendedAction {
    Escalate => "escalate",
    HumanReview => "human_review",
    NoAction => "no_action",
});

// ═══════════════════════════════════════════════════════════
// Records
// ═══════════════════════════════════════════════════════════

/// Validated per-chunk classification record.
///
/// Every field is present and inside its domain once normalization has
/// run: a record leaving the controller is never partially formed, no
/// matter what the model produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub mnpi: Verdict,
    /// Never empty; `[Category::None]` when nothing applies.
    pub categories: Vec<Category>,
    /// Clamped to `[0.0,` [`thresholds::CONFIDENCE_CAP`]`]`, 2 decimals.
    pub confidence: f64,
    /// High-level reason without verbatim source text. Empty when the
    /// model omitted it.
    pub evidence_summary: String,
    pub risk_level: RiskLevel,
    pub recommended_action: RecommendedAction,
    /// Optional annotation for a human reviewer.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Document-level verdict reduced from per-chunk records.
///
/// `unclear` never surfaces here; it demotes to a recommended action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub overall_mnpi: OverallVerdict,
    /// Sorted by label, deduplicated, `None` sentinel excluded.
    pub categories: Vec<Category>,
    pub overall_confidence: f64,
    pub reason: String,
    pub recommended_action: RecommendedAction,
}

/// The shapes a model response can arrive in.
#[derive(Debug, Clone)]
pub enum ModelOutput {
    /// Free text straight from the model.
    Raw(String),
    /// Content lifted out of a chat-style response wrapper.
    Wrapped(String),
    /// A response that was parsed upstream (e.g. replayed from a report).
    Structured(serde_json::Value),
}

// ═══════════════════════════════════════════════════════════
// Thresholds
// ═══════════════════════════════════════════════════════════

/// Confidence thresholds governing the classification protocol.
pub mod thresholds {
    /// At or above this, a first-pass verdict is accepted without
    /// retry or verification.
    pub const EARLY_ACCEPT: f64 = 0.75;

    /// Bottom of the borderline band `[VERIFY_FLOOR, EARLY_ACCEPT)`
    /// that triggers a verifier re-check.
    pub const VERIFY_FLOOR: f64 = 0.4;

    /// Below this, a `yes` verdict demotes to `unclear`.
    pub const TRUSTED_YES: f64 = 0.5;

    /// Upper clamp on any reported confidence; the model may not
    /// assert near-certainty.
    pub const CONFIDENCE_CAP: f64 = 0.95;

    /// Derived risk is `high` at or above this confidence.
    pub const RISK_HIGH: f64 = 0.75;

    /// Derived risk is `medium` at or above this confidence.
    pub const RISK_MEDIUM: f64 = 0.5;

    /// Document-level confidence at or above this escalates.
    pub const ESCALATE: f64 = 0.75;
}

// ═══════════════════════════════════════════════════════════
// Client seam
// ═══════════════════════════════════════════════════════════

/// LLM client abstraction (allows mocking).
pub trait LlmClient {
    /// One blocking completion call; returns the raw response text.
    fn generate(&self, model: &str, prompt: &str) -> Result<String, ClassifyError>;

    fn is_model_available(&self, model: &str) -> Result<bool, ClassifyError>;

    fn list_models(&self) -> Result<Vec<String>, ClassifyError>;
}
