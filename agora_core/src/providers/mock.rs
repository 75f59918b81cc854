//! In-memory provider with canned data.
//!
//! Backs the domain-restricted demo sources (`business_db`, `analytics_db`)
//! and doubles as the test provider: failures can be injected per operation
//! and every lifecycle call is counted.

use crate::error::ProviderError;
use crate::provider::{HealthStatus, Lifecycle, Provider, RawRecord, ResourceDescriptor};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Default, Clone, Copy)]
struct Failures {
    init: bool,
    search: bool,
    search_panic: bool,
    content: bool,
    health: bool,
    cleanup: bool,
}

#[derive(Debug, Default)]
struct Counters {
    init_calls: AtomicUsize,
    probe_calls: AtomicUsize,
    search_calls: AtomicUsize,
    cleanup_calls: AtomicUsize,
}

#[derive(Debug)]
pub struct MockProvider {
    name: String,
    description: String,
    records: Vec<RawRecord>,
    contents: HashMap<String, RawRecord>,
    resources: Vec<ResourceDescriptor>,
    delay: Option<Duration>,
    respect_limit: bool,
    requires_init: bool,
    failures: Failures,
    lifecycle: Lifecycle,
    counters: Counters,
}

impl MockProvider {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            records: Vec::new(),
            contents: HashMap::new(),
            resources: Vec::new(),
            delay: None,
            respect_limit: true,
            requires_init: false,
            failures: Failures::default(),
            lifecycle: Lifecycle::new(),
            counters: Counters::default(),
        }
    }

    /// Add one canned search record. Non-object values are ignored.
    pub fn with_record(mut self, record: Value) -> Self {
        if let Value::Object(map) = record {
            self.records.push(map);
        }
        self
    }

    pub fn with_records(self, records: impl IntoIterator<Item = Value>) -> Self {
        records
            .into_iter()
            .fold(self, |provider, record| provider.with_record(record))
    }

    /// Make `resource_id` resolvable through `get_content`.
    pub fn with_content(mut self, resource_id: impl Into<String>, content: Value) -> Self {
        if let Value::Object(map) = content {
            self.contents.insert(resource_id.into(), map);
        }
        self
    }

    pub fn with_resource(mut self, resource: ResourceDescriptor) -> Self {
        self.resources.push(resource);
        self
    }

    /// Sleep before answering a search.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Return every canned record regardless of `max_results`.
    pub fn ignoring_limit(mut self) -> Self {
        self.respect_limit = false;
        self
    }

    /// Return nothing while uninitialized, like a provider whose client
    /// only exists between `initialize` and `cleanup`.
    pub fn requiring_init(mut self) -> Self {
        self.requires_init = true;
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.failures.init = true;
        self
    }

    /// Search fails internally and degrades to an empty list.
    pub fn failing_search(mut self) -> Self {
        self.failures.search = true;
        self
    }

    /// Search panics instead of returning.
    pub fn panicking_search(mut self) -> Self {
        self.failures.search_panic = true;
        self
    }

    pub fn failing_content(mut self) -> Self {
        self.failures.content = true;
        self
    }

    pub fn failing_health(mut self) -> Self {
        self.failures.health = true;
        self
    }

    pub fn failing_cleanup(mut self) -> Self {
        self.failures.cleanup = true;
        self
    }

    /// Number of `initialize` calls received.
    pub fn init_calls(&self) -> usize {
        self.counters.init_calls.load(Ordering::SeqCst)
    }

    /// Number of times setup (the connectivity probe) actually ran.
    pub fn probe_calls(&self) -> usize {
        self.counters.probe_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.counters.search_calls.load(Ordering::SeqCst)
    }

    pub fn cleanup_calls(&self) -> usize {
        self.counters.cleanup_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    async fn initialize(&self) -> Result<(), ProviderError> {
        self.counters.init_calls.fetch_add(1, Ordering::SeqCst);
        let fail = self.failures.init;
        let probes = &self.counters.probe_calls;
        self.lifecycle
            .initialize_with(|| async move {
                probes.fetch_add(1, Ordering::SeqCst);
                if fail {
                    Err(ProviderError::Other("injected init failure".to_string()))
                } else {
                    Ok(())
                }
            })
            .await
            .map(|_| ())
    }

    async fn search(&self, _query: &str, max_results: usize) -> Vec<RawRecord> {
        self.counters.search_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failures.search_panic {
            panic!("injected search panic in {}", self.name);
        }
        if self.failures.search {
            warn!(provider = %self.name, "Injected search failure");
            return Vec::new();
        }
        if self.requires_init && !self.is_initialized() {
            warn!(provider = %self.name, "Search before initialization");
            return Vec::new();
        }

        let limit = if self.respect_limit {
            max_results
        } else {
            self.records.len()
        };
        self.records.iter().take(limit).cloned().collect()
    }

    async fn get_content(&self, resource_id: &str) -> Result<Option<RawRecord>, ProviderError> {
        if self.failures.content {
            return Err(ProviderError::Other("injected content failure".to_string()));
        }
        Ok(self.contents.get(resource_id).cloned())
    }

    async fn list_resources(
        &self,
        _query: Option<&str>,
    ) -> Result<Vec<ResourceDescriptor>, ProviderError> {
        Ok(self.resources.clone())
    }

    async fn health_check(&self) -> Result<HealthStatus, ProviderError> {
        if self.failures.health {
            return Err(ProviderError::Other("injected health failure".to_string()));
        }
        Ok(HealthStatus::for_provider(
            &self.name,
            &self.description,
            self.is_initialized(),
        ))
    }

    async fn cleanup(&self) -> Result<(), ProviderError> {
        self.counters.cleanup_calls.fetch_add(1, Ordering::SeqCst);
        let fail = self.failures.cleanup;
        self.lifecycle
            .cleanup_with(|| async move {
                if fail {
                    Err(ProviderError::Other("injected cleanup failure".to_string()))
                } else {
                    Ok(())
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::HealthState;
    use serde_json::json;

    #[tokio::test]
    async fn test_search_respects_limit() {
        let provider = MockProvider::new("Mock", "mock").with_records(vec![
            json!({"title": "a"}),
            json!({"title": "b"}),
            json!({"title": "c"}),
        ]);

        let results = provider.search("anything", 2).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["title"], "a");
        assert_eq!(provider.search_calls(), 1);
    }

    #[tokio::test]
    async fn test_non_object_records_ignored() {
        let provider = MockProvider::new("Mock", "mock")
            .with_record(json!("just a string"))
            .with_record(json!({"title": "kept"}));
        assert_eq!(provider.search("q", 10).await.len(), 1);
    }

    #[tokio::test]
    async fn test_lifecycle_counters() {
        let provider = MockProvider::new("Mock", "mock");
        provider.initialize().await.unwrap();
        provider.initialize().await.unwrap();

        assert_eq!(provider.init_calls(), 2);
        assert_eq!(provider.probe_calls(), 1);
        assert!(provider.is_initialized());

        provider.cleanup().await.unwrap();
        provider.cleanup().await.unwrap();
        assert!(!provider.is_initialized());
        assert_eq!(provider.cleanup_calls(), 2);
    }

    #[tokio::test]
    async fn test_requiring_init_is_empty_until_initialized() {
        let provider = MockProvider::new("Mock", "mock")
            .with_record(json!({"title": "kept"}))
            .requiring_init();
        assert!(provider.search("q", 5).await.is_empty());

        provider.initialize().await.unwrap();
        assert_eq!(provider.search("q", 5).await.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_init_stays_uninitialized() {
        let provider = MockProvider::new("Mock", "mock").failing_init();
        assert!(provider.initialize().await.is_err());
        assert!(!provider.is_initialized());
    }

    #[tokio::test]
    async fn test_failing_search_is_empty() {
        let provider = MockProvider::new("Mock", "mock")
            .with_record(json!({"title": "hidden"}))
            .failing_search();
        assert!(provider.search("q", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_health_reflects_lifecycle() {
        let provider = MockProvider::new("Mock", "mock");
        let status = provider.health_check().await.unwrap();
        assert_eq!(status.status, HealthState::NotInitialized);

        provider.initialize().await.unwrap();
        let status = provider.health_check().await.unwrap();
        assert_eq!(status.status, HealthState::Healthy);
    }

    #[tokio::test]
    async fn test_failing_cleanup_still_resets() {
        let provider = MockProvider::new("Mock", "mock").failing_cleanup();
        provider.initialize().await.unwrap();
        assert!(provider.cleanup().await.is_err());
        assert!(!provider.is_initialized());
    }
}
