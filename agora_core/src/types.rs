//! Core types for aggregated search results and health documents.

use crate::provider::{HealthState, HealthStatus, RawRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A normalized search result from any provider.
///
/// Produced fresh by every search call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResult {
    /// Registered name of the provider that produced this result
    pub source: String,

    /// Result title
    pub title: String,

    /// Snippet or abstract; empty when the provider supplied neither
    pub content: String,

    /// URL to the full content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Provider-reported relevance, clamped to [0, 1]
    pub relevance_score: f64,

    /// The raw record exactly as the provider returned it
    #[serde(default)]
    pub metadata: RawRecord,
}

/// Aggregated health of one manager and its providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerHealth {
    /// `healthy` once the manager is initialized, else `not_initialized`
    pub manager_status: HealthState,

    /// Per-provider health keyed by registered name
    pub providers: BTreeMap<String, HealthStatus>,
}

impl ManagerHealth {
    /// Number of providers reporting `healthy`.
    pub fn healthy_count(&self) -> usize {
        self.providers
            .values()
            .filter(|s| s.status == HealthState::Healthy)
            .count()
    }

    /// Whether any provider reported an error.
    pub fn has_errors(&self) -> bool {
        self.providers
            .values()
            .any(|s| s.status == HealthState::Error)
    }
}
