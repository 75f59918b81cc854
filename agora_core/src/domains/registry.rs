//! Domain registry.
//!
//! Gives every domain its own provider bindings, configuration and
//! [`AggregationManager`], next to a global manager that holds every
//! registered provider. Registration errors are loud; query-time lookups of
//! unknown domains fall back to the global manager.

use crate::context::{build_context, SynthesisContext};
use crate::domains::config::{ContextRules, DomainConfig, SecurityLevel, GENERAL};
use crate::error::DomainError;
use crate::manager::AggregationManager;
use crate::provider::{Provider, RawRecord};
use crate::types::{CanonicalResult, ManagerHealth};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// A provider bound to a domain. Higher priority sorts first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainBinding {
    pub provider_name: String,
    pub priority: u32,
}

/// Health of a single domain.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DomainHealth {
    Manager(ManagerHealth),
    NotFound { status: &'static str, error: String },
}

impl DomainHealth {
    fn not_found(domain: &str) -> Self {
        DomainHealth::NotFound {
            status: "domain_not_found",
            error: DomainError::UnknownDomain(domain.to_string()).to_string(),
        }
    }
}

/// Health of the global manager and every domain.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryHealth {
    pub global_manager: ManagerHealth,
    pub domains: BTreeMap<String, DomainHealth>,
}

/// Listing entry for one registered domain.
#[derive(Debug, Clone, Serialize)]
pub struct DomainSummary {
    pub domain: String,
    pub description: String,
    pub security_level: SecurityLevel,
    pub status: &'static str,
    pub providers: Vec<DomainBinding>,
}

struct DomainEntry {
    config: DomainConfig,
    bindings: Vec<DomainBinding>,
    manager: AggregationManager,
}

impl DomainEntry {
    fn new(config: DomainConfig, call_timeout: Duration) -> Self {
        Self {
            config,
            bindings: Vec::new(),
            manager: AggregationManager::new().with_call_timeout(call_timeout),
        }
    }

    /// Allowed sources that are actually bound here, in allow-list order.
    fn effective_sources(&self) -> Vec<String> {
        self.config
            .allowed_sources
            .iter()
            .filter(|name| self.manager.contains(name))
            .cloned()
            .collect()
    }

    fn dangling_sources(&self) -> Vec<&str> {
        self.config
            .allowed_sources
            .iter()
            .filter(|name| !self.manager.contains(name))
            .map(String::as_str)
            .collect()
    }
}

pub struct DomainRegistry {
    global: AggregationManager,
    domains: BTreeMap<String, DomainEntry>,
    initialized: AtomicBool,
    init_guard: Mutex<()>,
    call_timeout: Duration,
}

impl DomainRegistry {
    pub fn new() -> Self {
        let global = AggregationManager::new();
        let call_timeout = global.call_timeout();
        Self {
            global,
            domains: BTreeMap::new(),
            initialized: AtomicBool::new(false),
            init_guard: Mutex::new(()),
            call_timeout,
        }
    }

    /// A registry with every built-in domain registered and no providers.
    pub fn with_builtin_domains() -> Self {
        let mut registry = Self::new();
        for config in DomainConfig::list_builtin() {
            registry.insert_domain(config.domain.clone(), config.clone());
        }
        registry
    }

    /// Set the per-provider call timeout for the global manager and every
    /// domain manager, present and future.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self.global.set_call_timeout(call_timeout);
        for entry in self.domains.values_mut() {
            entry.manager.set_call_timeout(call_timeout);
        }
        self
    }

    /// Bind `config` to `domain_id`, replacing any earlier registration
    /// together with its bindings and domain manager.
    pub fn register_domain(
        &mut self,
        domain_id: impl Into<String>,
        mut config: DomainConfig,
    ) -> Result<(), DomainError> {
        let domain_id = domain_id.into();
        config.domain = domain_id.clone();
        config.validate()?;
        self.insert_domain(domain_id, config);
        Ok(())
    }

    fn insert_domain(&mut self, domain_id: String, config: DomainConfig) {
        let replaced = self
            .domains
            .insert(domain_id.clone(), DomainEntry::new(config, self.call_timeout))
            .is_some();
        if replaced {
            warn!(domain = %domain_id, "Replaced domain registration; bindings reset");
        } else {
            info!(domain = %domain_id, "Registered domain");
        }
    }

    /// Bind a provider into a registered domain and into the global table.
    ///
    /// The same provider instance may be bound to several domains; its own
    /// lifecycle keeps setup from running more than once.
    pub fn register_provider_for_domain(
        &mut self,
        domain_id: &str,
        provider_name: &str,
        provider: Arc<dyn Provider>,
        priority: u32,
    ) -> Result<(), DomainError> {
        let entry = self
            .domains
            .get_mut(domain_id)
            .ok_or_else(|| DomainError::UnknownDomain(domain_id.to_string()))?;
        if priority == 0 {
            return Err(DomainError::InvalidPriority {
                provider: provider_name.to_string(),
                priority,
            });
        }

        self.global.register(provider_name, Arc::clone(&provider));
        entry.manager.register(provider_name, provider);

        entry.bindings.retain(|b| b.provider_name != provider_name);
        entry.bindings.push(DomainBinding {
            provider_name: provider_name.to_string(),
            priority,
        });
        // Stable, so equal priorities keep binding order.
        entry.bindings.sort_by(|a, b| b.priority.cmp(&a.priority));

        info!(
            domain = %domain_id,
            provider = %provider_name,
            priority,
            "Registered provider for domain"
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// The manager holding every registered provider.
    pub fn global(&self) -> &AggregationManager {
        &self.global
    }

    /// Initialize the global manager and every domain manager. Idempotent.
    pub async fn initialize_all(&self) {
        if self.is_initialized() {
            return;
        }
        let _guard = self.init_guard.lock().await;
        if self.is_initialized() {
            return;
        }

        info!(domains = self.domains.len(), "Initializing domain registry");
        self.global.initialize_all().await;
        join_all(
            self.domains
                .iter()
                .map(|(domain_id, entry)| Self::initialize_entry(domain_id, entry)),
        )
        .await;

        self.initialized.store(true, Ordering::SeqCst);
        info!("Domain registry initialization complete");
    }

    /// Initialize one domain's manager.
    pub async fn initialize_domain(&self, domain_id: &str) -> Result<(), DomainError> {
        let entry = self
            .domains
            .get(domain_id)
            .ok_or_else(|| DomainError::UnknownDomain(domain_id.to_string()))?;
        Self::initialize_entry(domain_id, entry).await;
        Ok(())
    }

    async fn initialize_entry(domain_id: &str, entry: &DomainEntry) {
        let dangling = entry.dangling_sources();
        if !dangling.is_empty() {
            warn!(
                domain = %domain_id,
                sources = ?dangling,
                "Allowed sources not bound to domain; ignoring them"
            );
        }
        entry.manager.initialize_all().await;
        info!(domain = %domain_id, providers = entry.manager.len(), "Initialized domain");
    }

    /// Search within one domain.
    ///
    /// Without explicit `sources` (or with an empty list) the domain's
    /// allowed sources are used, or every provider bound to it when the
    /// allow-list is empty. Explicit sources reach only providers bound to
    /// the domain. An unknown domain falls back to an unrestricted global
    /// search.
    pub async fn search_domain(
        &self,
        domain_id: &str,
        query: &str,
        max_results: usize,
        sources: Option<&[String]>,
    ) -> Vec<CanonicalResult> {
        if !self.is_initialized() {
            self.initialize_all().await;
        }

        let Some(entry) = self.domains.get(domain_id) else {
            warn!(domain = %domain_id, "Domain not found, using global search");
            return self.global.search_all(query, max_results, sources).await;
        };

        let sources = sources.filter(|s| !s.is_empty());
        if sources.is_some() || entry.config.allowed_sources.is_empty() {
            return entry.manager.search_all(query, max_results, sources).await;
        }

        let effective = entry.effective_sources();
        if effective.is_empty() {
            debug!(domain = %domain_id, "No allowed source is bound to domain");
            return Vec::new();
        }
        entry
            .manager
            .search_all(query, max_results, Some(&effective))
            .await
    }

    /// Search a domain and pack the results with its context rules.
    pub async fn search_domain_context(
        &self,
        domain_id: &str,
        query: &str,
        max_results: usize,
    ) -> SynthesisContext {
        let results = self.search_domain(domain_id, query, max_results, None).await;
        build_context(&results, &self.context_rules(domain_id))
    }

    fn context_rules(&self, domain_id: &str) -> ContextRules {
        self.domains
            .get(domain_id)
            .or_else(|| self.domains.get(GENERAL))
            .map(|entry| entry.config.context_rules)
            .unwrap_or_default()
    }

    /// Fetch content through a domain's manager, or globally for an
    /// unknown domain.
    pub async fn get_content_domain(
        &self,
        domain_id: &str,
        source: &str,
        resource_id: &str,
    ) -> Option<RawRecord> {
        if !self.is_initialized() {
            self.initialize_all().await;
        }

        match self.domains.get(domain_id) {
            Some(entry) => entry.manager.get_content(source, resource_id).await,
            None => {
                warn!(domain = %domain_id, "Domain not found, using global manager");
                self.global.get_content(source, resource_id).await
            }
        }
    }

    /// Provider names bound to a domain, highest priority first.
    pub fn domain_sources(&self, domain_id: &str) -> Vec<String> {
        self.domain_bindings(domain_id)
            .iter()
            .map(|b| b.provider_name.clone())
            .collect()
    }

    pub fn domain_bindings(&self, domain_id: &str) -> &[DomainBinding] {
        self.domains
            .get(domain_id)
            .map(|entry| entry.bindings.as_slice())
            .unwrap_or(&[])
    }

    pub fn domain_config(&self, domain_id: &str) -> Option<&DomainConfig> {
        self.domains.get(domain_id).map(|entry| &entry.config)
    }

    /// Registered domain ids, sorted.
    pub fn list_domains(&self) -> Vec<String> {
        self.domains.keys().cloned().collect()
    }

    pub fn domain_summaries(&self) -> Vec<DomainSummary> {
        self.domains
            .iter()
            .map(|(domain_id, entry)| DomainSummary {
                domain: domain_id.clone(),
                description: entry.config.description.clone(),
                security_level: entry.config.security_level,
                status: "active",
                providers: entry.bindings.clone(),
            })
            .collect()
    }

    pub async fn health_check_domain(&self, domain_id: &str) -> DomainHealth {
        match self.domains.get(domain_id) {
            Some(entry) => DomainHealth::Manager(entry.manager.health_check().await),
            None => DomainHealth::not_found(domain_id),
        }
    }

    pub async fn health_check_all(&self) -> RegistryHealth {
        let global_manager = self.global.health_check().await;
        let domains = join_all(self.domains.iter().map(|(domain_id, entry)| async move {
            (
                domain_id.clone(),
                DomainHealth::Manager(entry.manager.health_check().await),
            )
        }))
        .await
        .into_iter()
        .collect();

        RegistryHealth {
            global_manager,
            domains,
        }
    }

    /// Clean up one domain.
    ///
    /// Only providers bound to no other domain are torn down; shared ones
    /// keep serving the other domains and the global manager. The domain
    /// manager re-initializes on its next use.
    pub async fn cleanup_domain(&self, domain_id: &str) -> Result<(), DomainError> {
        let entry = self
            .domains
            .get(domain_id)
            .ok_or_else(|| DomainError::UnknownDomain(domain_id.to_string()))?;

        let exclusive: Vec<String> = entry
            .bindings
            .iter()
            .map(|b| b.provider_name.clone())
            .filter(|name| {
                !self
                    .domains
                    .iter()
                    .any(|(other_id, other)| other_id != domain_id && other.manager.contains(name))
            })
            .collect();

        entry.manager.cleanup_only(&exclusive).await;
        info!(domain = %domain_id, torn_down = ?exclusive, "Cleaned up domain");
        Ok(())
    }

    /// Tear down the global manager and every domain manager concurrently.
    /// Always leaves the registry uninitialized.
    pub async fn cleanup_all(&self) {
        info!("Cleaning up domain registry");

        let domains = join_all(self.domains.values().map(|entry| entry.manager.cleanup()));
        futures::join!(self.global.cleanup(), domains);

        self.initialized.store(false, Ordering::SeqCst);
        info!("Domain registry cleanup complete");
    }
}

impl Default for DomainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::config::{RESEARCH, STRATEGIC};
    use crate::provider::HealthState;
    use crate::providers::mock::MockProvider;
    use serde_json::json;

    fn mock(name: &str, title: &str, score: f64) -> Arc<MockProvider> {
        Arc::new(
            MockProvider::new(name, "mock").with_record(json!({
                "title": title,
                "relevance_score": score,
            })),
        )
    }

    #[test]
    fn test_register_provider_requires_domain() {
        let mut registry = DomainRegistry::new();
        let err = registry
            .register_provider_for_domain("missing", "wiki", mock("Wiki", "T", 0.5), 1)
            .unwrap_err();
        assert!(matches!(err, DomainError::UnknownDomain(ref d) if d == "missing"));
        assert!(registry.global().is_empty());
    }

    #[test]
    fn test_priority_must_be_positive() {
        let mut registry = DomainRegistry::with_builtin_domains();
        let err = registry
            .register_provider_for_domain(RESEARCH, "wiki", mock("Wiki", "T", 0.5), 0)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidPriority { priority: 0, .. }));
    }

    #[test]
    fn test_bindings_sorted_by_priority() {
        let mut registry = DomainRegistry::with_builtin_domains();
        registry
            .register_provider_for_domain(RESEARCH, "low", mock("Low", "l", 0.1), 1)
            .unwrap();
        registry
            .register_provider_for_domain(RESEARCH, "high", mock("High", "h", 0.1), 5)
            .unwrap();
        registry
            .register_provider_for_domain(RESEARCH, "mid", mock("Mid", "m", 0.1), 3)
            .unwrap();

        assert_eq!(registry.domain_sources(RESEARCH), vec!["high", "mid", "low"]);

        // Rebinding replaces the earlier entry.
        registry
            .register_provider_for_domain(RESEARCH, "low", mock("Low", "l", 0.1), 9)
            .unwrap();
        assert_eq!(registry.domain_sources(RESEARCH), vec!["low", "high", "mid"]);
        assert_eq!(registry.domain_bindings(RESEARCH).len(), 3);
    }

    #[test]
    fn test_reregister_domain_resets_bindings() {
        let mut registry = DomainRegistry::with_builtin_domains();
        registry
            .register_provider_for_domain(RESEARCH, "wiki", mock("Wiki", "T", 0.5), 2)
            .unwrap();
        registry
            .register_domain(RESEARCH, DomainConfig::new(RESEARCH, "Replaced"))
            .unwrap();

        assert!(registry.domain_sources(RESEARCH).is_empty());
        assert_eq!(registry.domain_config(RESEARCH).unwrap().description, "Replaced");
        // The global table keeps the provider.
        assert!(registry.global().contains("wiki"));
    }

    #[test]
    fn test_register_domain_validates() {
        let mut registry = DomainRegistry::new();
        let mut config = DomainConfig::new("broken", "zero budget");
        config.context_rules.max_context_length = 0;
        assert!(registry.register_domain("broken", config).is_err());
        assert!(registry.list_domains().is_empty());
    }

    #[test]
    fn test_list_domains_sorted() {
        let registry = DomainRegistry::with_builtin_domains();
        let domains = registry.list_domains();
        assert_eq!(domains.len(), 8);
        let mut sorted = domains.clone();
        sorted.sort();
        assert_eq!(domains, sorted);
    }

    #[tokio::test]
    async fn test_search_domain_uses_allowed_sources() {
        let mut registry = DomainRegistry::new();
        registry
            .register_domain(
                "team",
                DomainConfig::new("team", "Team").with_allowed_sources(["docs"]),
            )
            .unwrap();
        registry
            .register_provider_for_domain("team", "docs", mock("Docs", "doc", 0.2), 1)
            .unwrap();
        registry
            .register_provider_for_domain("team", "chat", mock("Chat", "chat", 0.9), 2)
            .unwrap();

        let results = registry.search_domain("team", "q", 5, None).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "docs");

        let explicit = vec!["chat".to_string()];
        let results = registry.search_domain("team", "q", 5, Some(&explicit)).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "chat");
    }

    #[tokio::test]
    async fn test_allow_list_without_bound_sources_is_empty() {
        let mut registry = DomainRegistry::new();
        registry
            .register_domain(
                "team",
                DomainConfig::new("team", "Team").with_allowed_sources(["absent"]),
            )
            .unwrap();
        registry
            .register_provider_for_domain("team", "other", mock("Other", "o", 0.9), 1)
            .unwrap();

        assert!(registry.search_domain("team", "q", 5, None).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_domain_falls_back_to_global() {
        let mut registry = DomainRegistry::with_builtin_domains();
        registry
            .register_provider_for_domain(RESEARCH, "wiki", mock("Wiki", "T1", 0.4), 3)
            .unwrap();

        let results = registry.search_domain("nonexistent", "x", 10, None).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "wiki");
    }

    #[tokio::test]
    async fn test_registered_domain_without_providers_is_empty() {
        let mut registry = DomainRegistry::with_builtin_domains();
        registry
            .register_provider_for_domain(RESEARCH, "wiki", mock("Wiki", "T1", 0.4), 3)
            .unwrap();

        assert!(registry.search_domain(STRATEGIC, "x", 10, None).await.is_empty());
    }

    #[tokio::test]
    async fn test_shared_provider_initialized_once() {
        let shared = Arc::new(MockProvider::new("Shared", "shared"));
        let mut registry = DomainRegistry::with_builtin_domains();
        registry
            .register_provider_for_domain(RESEARCH, "shared", shared.clone(), 2)
            .unwrap();
        registry
            .register_provider_for_domain(GENERAL, "shared", shared.clone(), 1)
            .unwrap();

        registry.initialize_all().await;
        registry.initialize_all().await;

        assert!(registry.is_initialized());
        assert_eq!(shared.probe_calls(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_domain_keeps_shared_provider_serving() {
        let shared = Arc::new(
            MockProvider::new("Shared", "session-backed")
                .with_record(json!({"title": "shared", "relevance_score": 0.8}))
                .requiring_init(),
        );
        let solo = Arc::new(
            MockProvider::new("Solo", "session-backed")
                .with_record(json!({"title": "solo", "relevance_score": 0.5}))
                .requiring_init(),
        );
        let mut registry = DomainRegistry::with_builtin_domains();
        registry
            .register_provider_for_domain(RESEARCH, "wikipedia", shared.clone(), 2)
            .unwrap();
        registry
            .register_provider_for_domain(RESEARCH, "arxiv", solo.clone(), 1)
            .unwrap();
        registry
            .register_provider_for_domain(GENERAL, "wikipedia", shared.clone(), 1)
            .unwrap();

        registry.initialize_all().await;
        assert_eq!(registry.search_domain(GENERAL, "q", 5, None).await.len(), 1);

        registry.cleanup_domain(RESEARCH).await.unwrap();

        assert!(shared.is_initialized());
        assert!(!solo.is_initialized());
        assert_eq!(registry.search_domain(GENERAL, "q", 5, None).await.len(), 1);
        assert_eq!(registry.global().search_all("q", 5, None).await.len(), 2);

        let results = registry.search_domain(RESEARCH, "q", 5, None).await;
        assert_eq!(results.len(), 2);
        assert!(solo.is_initialized());
    }

    #[tokio::test]
    async fn test_empty_sources_respect_allow_list() {
        let mut registry = DomainRegistry::new();
        registry
            .register_domain(
                "team",
                DomainConfig::new("team", "Team").with_allowed_sources(["docs"]),
            )
            .unwrap();
        registry
            .register_provider_for_domain("team", "docs", mock("Docs", "doc", 0.2), 1)
            .unwrap();
        registry
            .register_provider_for_domain("team", "chat", mock("Chat", "chat", 0.9), 2)
            .unwrap();

        let results = registry.search_domain("team", "q", 5, Some(&[][..])).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "docs");
    }

    #[tokio::test]
    async fn test_health_check_domain_not_found() {
        let registry = DomainRegistry::new();
        match registry.health_check_domain("ghost").await {
            DomainHealth::NotFound { status, error } => {
                assert_eq!(status, "domain_not_found");
                assert!(error.contains("ghost"));
            }
            DomainHealth::Manager(_) => panic!("expected not found"),
        }
    }

    #[tokio::test]
    async fn test_initialize_and_cleanup_unknown_domain() {
        let registry = DomainRegistry::new();
        assert!(registry.initialize_domain("ghost").await.is_err());
        assert!(registry.cleanup_domain("ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_cleanup_all_resets() {
        let wiki = mock("Wiki", "T1", 0.4);
        let mut registry = DomainRegistry::with_builtin_domains();
        registry
            .register_provider_for_domain(RESEARCH, "wiki", wiki.clone(), 3)
            .unwrap();

        registry.initialize_all().await;
        registry.cleanup_all().await;

        assert!(!registry.is_initialized());
        assert!(!wiki.is_initialized());

        let health = registry.health_check_all().await;
        assert_eq!(
            health.global_manager.providers["wiki"].status,
            HealthState::NotInitialized
        );
        match &health.domains[RESEARCH] {
            DomainHealth::Manager(h) => {
                assert_eq!(h.providers["wiki"].status, HealthState::NotInitialized)
            }
            DomainHealth::NotFound { .. } => panic!("research is registered"),
        }
    }

    #[tokio::test]
    async fn test_search_domain_context_uses_domain_rules() {
        let mut registry = DomainRegistry::new();
        registry
            .register_domain(
                "brief",
                DomainConfig::new("brief", "Brief").with_context_rules(ContextRules {
                    max_context_length: 10_000,
                    include_metadata: false,
                }),
            )
            .unwrap();
        registry
            .register_provider_for_domain("brief", "docs", mock("Docs", "Doc", 0.5), 1)
            .unwrap();

        let context = registry.search_domain_context("brief", "q", 5).await;
        assert_eq!(context.included, 1);
        assert!(context.text.starts_with("Source: docs\nTitle: Doc"));
        assert!(!context.text.contains("Relevance:"));
    }

    #[test]
    fn test_domain_summaries() {
        let mut registry = DomainRegistry::with_builtin_domains();
        registry
            .register_provider_for_domain(STRATEGIC, "business_db", mock("Biz", "b", 0.5), 3)
            .unwrap();

        let summaries = registry.domain_summaries();
        let strategic = summaries.iter().find(|s| s.domain == STRATEGIC).unwrap();
        assert_eq!(strategic.security_level, SecurityLevel::High);
        assert_eq!(strategic.status, "active");
        assert_eq!(strategic.providers[0].provider_name, "business_db");
    }
}
