//! Normalization of heterogeneous provider records.
//!
//! Providers disagree on field names; this module maps every raw record onto
//! the single [`CanonicalResult`] shape. It is pure: the same record always
//! normalizes to the same result.

use crate::provider::RawRecord;
use crate::types::CanonicalResult;
use serde_json::Value;

/// Content fields in order of preference.
const CONTENT_FIELDS: &[&str] = &["snippet", "abstract"];

/// Normalize a single raw record, tagging it with the provider it came from.
pub fn normalize(source: &str, raw: &RawRecord) -> CanonicalResult {
    CanonicalResult {
        source: source.to_string(),
        title: extract_str(raw, "title").unwrap_or_default(),
        content: extract_content(raw),
        url: extract_str(raw, "url"),
        relevance_score: extract_score(raw),
        metadata: raw.clone(),
    }
}

/// Normalize every record from one provider, preserving their order.
pub fn normalize_all(source: &str, raw: &[RawRecord]) -> Vec<CanonicalResult> {
    raw.iter().map(|record| normalize(source, record)).collect()
}

/// Clamp a score into [0, 1]. Non-finite values become 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn extract_str(raw: &RawRecord, field: &str) -> Option<String> {
    raw.get(field)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

fn extract_content(raw: &RawRecord) -> String {
    CONTENT_FIELDS
        .iter()
        .find_map(|field| extract_str(raw, field))
        .unwrap_or_default()
}

/// Provider-reported score, or 0.0. No score is ever derived from content
/// here; scoring heuristics belong to the providers.
fn extract_score(raw: &RawRecord) -> f64 {
    raw.get("relevance_score")
        .and_then(Value::as_f64)
        .map(clamp_score)
        .unwrap_or(0.0)
}
