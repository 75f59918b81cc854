//! Default registry wiring.

use crate::config::AgoraConfig;
use crate::domains::config::{DATA_ANALYSIS, GENERAL, RESEARCH, STRATEGIC};
use crate::domains::DomainRegistry;
use crate::error::ConfigError;
use crate::provider::Provider;
use crate::providers::mock::MockProvider;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Build a registry with every configured domain and the providers enabled
/// via Cargo features and `providers.disabled`.
///
/// Wikipedia and arXiv serve `research` and `general`; two in-memory demo
/// sources stand in for the business and analytics databases.
pub fn build_default_registry(config: &AgoraConfig) -> Result<DomainRegistry, ConfigError> {
    let mut registry = DomainRegistry::new().with_call_timeout(config.call_timeout());
    for domain in config.effective_domains() {
        registry.register_domain(domain.domain.clone(), domain)?;
    }

    #[cfg(feature = "wikipedia")]
    {
        if config.providers.is_enabled("wikipedia") {
            let provider: Arc<dyn Provider> =
                Arc::new(crate::providers::wikipedia::WikipediaProvider::with_language(
                    &config.providers.wikipedia_language,
                    config.http_settings(),
                ));
            bind(&mut registry, "wikipedia", &provider, &[(RESEARCH, 3), (GENERAL, 2)])?;
        }
    }

    #[cfg(feature = "arxiv")]
    {
        if config.providers.is_enabled("arxiv") {
            let provider: Arc<dyn Provider> = Arc::new(crate::providers::arxiv::ArxivProvider::new(
                config.http_settings(),
            ));
            bind(&mut registry, "arxiv", &provider, &[(RESEARCH, 2), (GENERAL, 1)])?;
        }
    }

    if config.providers.is_enabled("business_db") {
        let provider: Arc<dyn Provider> = Arc::new(business_db());
        bind(&mut registry, "business_db", &provider, &[(STRATEGIC, 3)])?;
    }

    if config.providers.is_enabled("analytics_db") {
        let provider: Arc<dyn Provider> = Arc::new(analytics_db());
        bind(&mut registry, "analytics_db", &provider, &[(DATA_ANALYSIS, 3)])?;
    }

    Ok(registry)
}

fn bind(
    registry: &mut DomainRegistry,
    name: &str,
    provider: &Arc<dyn Provider>,
    domains: &[(&str, u32)],
) -> Result<(), ConfigError> {
    for (domain, priority) in domains {
        if registry.domain_config(domain).is_none() {
            debug!(provider = %name, domain = %domain, "Domain not configured; skipping binding");
            continue;
        }
        registry.register_provider_for_domain(domain, name, Arc::clone(provider), *priority)?;
    }
    Ok(())
}

fn business_db() -> MockProvider {
    MockProvider::new("Business Database", "Internal business intelligence records")
        .with_records(vec![
            json!({
                "title": "Quarterly market share review",
                "snippet": "Market share grew in the enterprise segment while consumer revenue held flat.",
                "url": "business://reports/market-share",
                "relevance_score": 0.8,
            }),
            json!({
                "title": "Competitive landscape brief",
                "snippet": "Three new entrants target the mid-market with usage-based pricing.",
                "url": "business://briefs/competition",
                "relevance_score": 0.6,
            }),
        ])
        .with_content(
            "market-share",
            json!({
                "title": "Quarterly market share review",
                "content": "Enterprise share rose two points; consumer share was unchanged.",
            }),
        )
}

fn analytics_db() -> MockProvider {
    MockProvider::new("Analytics Database", "Aggregated product analytics")
        .with_records(vec![
            json!({
                "title": "Weekly active users",
                "snippet": "Weekly active users trend upward after the onboarding redesign.",
                "url": "analytics://dashboards/wau",
                "relevance_score": 0.7,
            }),
            json!({
                "title": "Retention cohorts",
                "snippet": "Day-30 retention improved for cohorts that completed onboarding.",
                "url": "analytics://dashboards/retention",
                "relevance_score": 0.5,
            }),
        ])
        .with_content(
            "wau",
            json!({
                "title": "Weekly active users",
                "content": "Weekly active users by week for the trailing quarter.",
            }),
        )
}
