use agora_core::provider::Lifecycle;
use agora_core::{
    AggregationManager, DomainConfig, DomainRegistry, Provider, ProviderError, RawRecord,
};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

/// A tiny in-memory glossary searched by substring.
struct GlossaryProvider {
    entries: Vec<(&'static str, &'static str)>,
    lifecycle: Lifecycle,
}

#[async_trait]
impl Provider for GlossaryProvider {
    fn name(&self) -> &str {
        "Glossary"
    }

    fn description(&self) -> &str {
        "Team glossary"
    }

    fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    async fn initialize(&self) -> Result<(), ProviderError> {
        self.lifecycle.initialize_with(|| async { Ok(()) }).await?;
        Ok(())
    }

    async fn search(&self, query: &str, max_results: usize) -> Vec<RawRecord> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|(term, _)| term.to_lowercase().contains(&query))
            .take(max_results)
            .filter_map(|(term, definition)| {
                json!({"title": term, "snippet": definition, "relevance_score": 0.7})
                    .as_object()
                    .cloned()
            })
            .collect()
    }

    async fn get_content(&self, resource_id: &str) -> Result<Option<RawRecord>, ProviderError> {
        Ok(self
            .entries
            .iter()
            .find(|(term, _)| term.eq_ignore_ascii_case(resource_id))
            .and_then(|(term, definition)| {
                json!({"title": term, "content": definition}).as_object().cloned()
            }))
    }

    async fn cleanup(&self) -> Result<(), ProviderError> {
        self.lifecycle.cleanup_with(|| async { Ok(()) }).await
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let glossary = Arc::new(GlossaryProvider {
        entries: vec![
            ("Churn", "Customers lost in a period"),
            ("Churn rate", "Churned customers over starting customers"),
            ("ARR", "Annual recurring revenue"),
        ],
        lifecycle: Lifecycle::new(),
    });

    let mut manager = AggregationManager::new();
    manager.register("glossary", glossary.clone());
    for r in manager.search_all("churn", 5, None).await {
        println!("{:.2} {} - {}", r.relevance_score, r.title, r.content);
    }
    manager.cleanup().await;

    let mut registry = DomainRegistry::new();
    registry.register_domain(
        "finance",
        DomainConfig::new("finance", "Finance team").with_allowed_sources(["glossary"]),
    )?;
    registry.register_provider_for_domain("finance", "glossary", glossary, 2)?;
    let results = registry.search_domain("finance", "arr", 5, None).await;
    println!("finance: {} result(s)", results.len());
    registry.cleanup_all().await;

    Ok(())
}
