pub const CLASSIFY_PROMPT_TEMPLATE: &str = r#"
You are an MNPI (Material Non-Public Information) detection classifier.
Read the following text CHUNK and decide whether it contains MNPI according to the strict definition below.

DEFINITION (strict):
- MNPI is non-public information that a reasonable investor would consider likely to affect the price or value of a company's securities, or that would be material to a decision to buy, sell, or hold securities.
- Examples: unreleased earnings/financial forecasts, confirmed but unannounced M&A, non-public regulatory investigation details, planned executive departures or appointments that would materially affect company prospects, confidential product launch timelines tied to revenue, or other confidential strategic plans with measurable financial impact.

INSTRUCTIONS (must follow exactly):
1. Do NOT quote or reproduce any verbatim text from the chunk. Never output raw text from the document.
2. Consider "public vs non-public" signals. Phrases like "announced" or "press release" reduce materiality; "confidential" or "internal" increase it.
3. Consider materiality: financial figures tied to future performance, firm dates for product launches that affect revenue, confirmed negotiations (M&A), or confirmed executive actions are strong signals.
4. Consider context: hypotheticals, examples, or generated/sample text should NOT be treated as MNPI unless it clearly states real, non-public facts.
5. Output JSON ONLY (no explanation, no markdown, no commentary). If you cannot determine, return mnpi:"unclear" with low confidence.

JSON OUTPUT SCHEMA (strict):
{
  "mnpi": "yes" | "no" | "unclear",
  "categories": ["Unreleased Earnings/Guidance", "M&A/Transactions", "Executive Changes",
                 "Product Launch/Strategic Plans", "Legal/Regulatory Investigations",
                 "Insider Trading Risk", "Confidential Financial Projections", "None"],
  "confidence": 0.00-1.00,
  "evidence_summary": "high-level one-sentence reason (no quotes, <=30 words)",
  "risk_level": "low" | "medium" | "high",
  "recommended_action": "escalate" | "human_review" | "no_action",
  "notes": "optional short note for human reviewer (max 40 words)"
}

Now analyze the chunk below.

--- CHUNK START ---
{CHUNK}
--- CHUNK END ---
"#;

const VERIFIER_PREAMBLE: &str = "RE-CHECK: Based on the previous analysis, do you CONFIRM the MNPI judgement and \
confidence? Provide JSON with same schema (mnpi, categories, confidence, evidence_summary, \
risk_level, recommended_action, notes). Respond JSON only. If unsure, return mnpi:'unclear'.\n\n";

/// Build the classification prompt for one chunk.
pub fn build_classify_prompt(chunk: &str) -> String {
    CLASSIFY_PROMPT_TEMPLATE.replace("{CHUNK}", chunk)
}

/// Build the short re-check prompt used for borderline verdicts.
pub fn build_verifier_prompt(chunk: &str) -> String {
    format!("{VERIFIER_PREAMBLE}--- ORIGINAL CHUNK ---\n{chunk}")
}
