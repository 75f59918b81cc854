//! Aggregation manager.
//!
//! Registers named providers, fans a query out to a subset of them
//! concurrently, normalizes and ranks the merged results, and aggregates
//! provider health and lifecycle.
//!
//! # Example
//!
//! ```ignore
//! use agora_core::manager::AggregationManager;
//!
//! let mut manager = AggregationManager::new();
//! manager.register("wikipedia", Arc::new(WikipediaProvider::new(HttpSettings::default())));
//! manager.initialize_all().await;
//! let results = manager.search_all("model context protocol", 10, None).await;
//! ```

use crate::normalize::normalize_all;
use crate::provider::{HealthState, HealthStatus, Provider, RawRecord, ResourceDescriptor};
use crate::types::{CanonicalResult, ManagerHealth};
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Default per-provider call timeout in milliseconds
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 10000;

/// Fans queries out to registered providers and merges their results.
pub struct AggregationManager {
    /// Providers in registration order; the order breaks relevance ties.
    providers: Vec<(String, Arc<dyn Provider>)>,
    initialized: AtomicBool,
    init_guard: Mutex<()>,
    call_timeout: Duration,
}

impl AggregationManager {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            initialized: AtomicBool::new(false),
            init_guard: Mutex::new(()),
            call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
        }
    }

    /// Set the timeout applied to every individual provider call.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn set_call_timeout(&mut self, call_timeout: Duration) {
        self.call_timeout = call_timeout;
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Register a provider under `name`, replacing any earlier binding for
    /// that name in place. Does not initialize the provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        let name = name.into();
        match self.providers.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => {
                slot.1 = provider;
                info!(provider = %name, "Replaced provider binding");
            }
            None => {
                self.providers.push((name.clone(), provider));
                info!(provider = %name, "Registered provider");
            }
        }
    }

    pub fn provider(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        self.providers
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, provider)| provider)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.provider(name).is_some()
    }

    /// Registered provider names in registration order.
    pub fn available_sources(&self) -> Vec<String> {
        self.providers.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Initialize every registered provider.
    ///
    /// Idempotent. A provider that fails to initialize is logged and
    /// skipped; the manager still ends up initialized.
    pub async fn initialize_all(&self) {
        if self.is_initialized() {
            return;
        }
        let _guard = self.init_guard.lock().await;
        if self.is_initialized() {
            return;
        }

        info!(providers = self.providers.len(), "Initializing aggregation manager");

        let inits = self.providers.iter().map(|(name, provider)| async move {
            match guarded(provider.initialize()).await {
                Ok(Ok(())) => debug!(provider = %name, "Provider initialized"),
                Ok(Err(e)) => {
                    error!(provider = %name, error = %e, "Failed to initialize provider")
                }
                Err(panic) => error!(
                    provider = %name,
                    error = %panic,
                    "Provider panicked during initialization"
                ),
            }
        });
        join_all(inits).await;

        self.initialized.store(true, Ordering::SeqCst);
        info!("Aggregation manager initialization complete");
    }

    /// Search across providers and return one ranked list.
    ///
    /// `sources` selects providers by name; `None` (or an empty list)
    /// searches every registered provider and unknown names are skipped.
    /// Each provider contributes at most `max_results_per_source` records.
    /// The merged list is sorted by descending relevance, ties keeping
    /// registration order, and capped at `max_results_per_source` times the
    /// number of providers searched.
    pub async fn search_all(
        &self,
        query: &str,
        max_results_per_source: usize,
        sources: Option<&[String]>,
    ) -> Vec<CanonicalResult> {
        if !self.is_initialized() {
            self.initialize_all().await;
        }

        let targets = self.resolve_targets(sources);
        if targets.is_empty() {
            debug!(query = %query, "No providers selected for search");
            return Vec::new();
        }

        let call_timeout = self.call_timeout;
        let searches = targets.iter().map(|(name, provider)| async move {
            let outcome = timeout(call_timeout, async {
                ensure_initialized(name, provider.as_ref()).await;
                guarded(provider.search(query, max_results_per_source)).await
            })
            .await;

            let mut raw = match outcome {
                Ok(Ok(raw)) => raw,
                Ok(Err(panic)) => {
                    warn!(provider = %name, error = %panic, "Provider search failed");
                    Vec::new()
                }
                Err(_) => {
                    warn!(
                        provider = %name,
                        timeout_ms = call_timeout.as_millis() as u64,
                        "Provider search timed out"
                    );
                    Vec::new()
                }
            };
            raw.truncate(max_results_per_source);
            debug!(provider = %name, count = raw.len(), "Provider returned results");
            normalize_all(name, &raw)
        });

        // join_all yields in input order, so completion order never leaks
        // into the merged list.
        let mut merged: Vec<CanonicalResult> =
            join_all(searches).await.into_iter().flatten().collect();

        // Stable: equal scores keep registration order.
        merged.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        merged.truncate(max_results_per_source.saturating_mul(targets.len()));
        merged
    }

    /// Fetch one resource from the named provider.
    ///
    /// Unknown providers, missing resources and provider faults all come
    /// back as `None`.
    pub async fn get_content(&self, source: &str, resource_id: &str) -> Option<RawRecord> {
        if !self.is_initialized() {
            self.initialize_all().await;
        }

        let Some(provider) = self.provider(source) else {
            warn!(source = %source, "Unknown provider");
            return None;
        };

        let lookup = async {
            ensure_initialized(source, provider.as_ref()).await;
            guarded(provider.get_content(resource_id)).await
        };
        match timeout(self.call_timeout, lookup).await {
            Ok(Ok(Ok(content))) => content,
            Ok(Ok(Err(e))) => {
                warn!(
                    source = %source,
                    resource_id = %resource_id,
                    error = %e,
                    "Failed to get content"
                );
                None
            }
            Ok(Err(panic)) => {
                warn!(
                    source = %source,
                    resource_id = %resource_id,
                    error = %panic,
                    "Provider panicked while getting content"
                );
                None
            }
            Err(_) => {
                warn!(source = %source, resource_id = %resource_id, "Content lookup timed out");
                None
            }
        }
    }

    /// Resources advertised by every provider, keyed by registered name.
    pub async fn list_all_resources(
        &self,
        query: Option<&str>,
    ) -> BTreeMap<String, Vec<ResourceDescriptor>> {
        if !self.is_initialized() {
            self.initialize_all().await;
        }

        let listings = self.providers.iter().map(|(name, provider)| async move {
            let resources = match guarded(provider.list_resources(query)).await {
                Ok(Ok(resources)) => resources,
                Ok(Err(e)) => {
                    warn!(provider = %name, error = %e, "Failed to list resources");
                    Vec::new()
                }
                Err(panic) => {
                    warn!(
                        provider = %name,
                        error = %panic,
                        "Provider panicked while listing resources"
                    );
                    Vec::new()
                }
            };
            (name.clone(), resources)
        });

        join_all(listings).await.into_iter().collect()
    }

    /// Aggregate provider health. A failing probe is reported as an
    /// `error` entry, never as a manager failure.
    pub async fn health_check(&self) -> ManagerHealth {
        let probes = self.providers.iter().map(|(name, provider)| async move {
            let status = match guarded(provider.health_check()).await {
                Ok(Ok(status)) => status,
                Ok(Err(e)) => HealthStatus::error(name, e.to_string()),
                Err(panic) => HealthStatus::error(name, panic),
            };
            (name.clone(), status)
        });

        ManagerHealth {
            manager_status: if self.is_initialized() {
                HealthState::Healthy
            } else {
                HealthState::NotInitialized
            },
            providers: join_all(probes).await.into_iter().collect(),
        }
    }

    /// Tear down every provider concurrently. Individual failures are
    /// logged; the manager is always left uninitialized.
    pub async fn cleanup(&self) {
        info!("Cleaning up aggregation manager");

        let teardowns = self.providers.iter().map(|(name, provider)| async move {
            match guarded(provider.cleanup()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(provider = %name, error = %e, "Provider cleanup failed"),
                Err(panic) => {
                    warn!(provider = %name, error = %panic, "Provider panicked during cleanup")
                }
            }
        });
        join_all(teardowns).await;

        self.initialized.store(false, Ordering::SeqCst);
        info!("Aggregation manager cleanup complete");
    }

    /// Tear down only the named providers and mark the manager
    /// uninitialized. Providers left running are re-entered idempotently on
    /// the next `initialize_all`.
    pub async fn cleanup_only(&self, names: &[String]) {
        let teardowns = self
            .providers
            .iter()
            .filter(|(name, _)| names.contains(name))
            .map(|(name, provider)| async move {
                match guarded(provider.cleanup()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(provider = %name, error = %e, "Provider cleanup failed"),
                    Err(panic) => {
                        warn!(provider = %name, error = %panic, "Provider panicked during cleanup")
                    }
                }
            });
        join_all(teardowns).await;

        self.initialized.store(false, Ordering::SeqCst);
    }

    fn resolve_targets(&self, sources: Option<&[String]>) -> Vec<(&str, &Arc<dyn Provider>)> {
        let requested = sources.filter(|s| !s.is_empty());

        if let Some(requested) = requested {
            for name in requested {
                if !self.contains(name) {
                    debug!(source = %name, "Skipping unknown source");
                }
            }
        }

        self.providers
            .iter()
            .filter(|(name, _)| requested.map_or(true, |r| r.iter().any(|s| s == name)))
            .map(|(name, provider)| (name.as_str(), provider))
            .collect()
    }
}

impl Default for AggregationManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Bring a provider back up if something else tore it down since the
/// manager initialized. Failures are logged; the call proceeds regardless.
async fn ensure_initialized(name: &str, provider: &dyn Provider) {
    if provider.is_initialized() {
        return;
    }
    debug!(provider = %name, "Re-initializing provider");
    match guarded(provider.initialize()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(provider = %name, error = %e, "Failed to re-initialize provider"),
        Err(panic) => {
            warn!(provider = %name, error = %panic, "Provider panicked during initialization")
        }
    }
}

/// Run a provider future, turning a panic into an error message.
async fn guarded<F: Future>(fut: F) -> Result<F::Output, String> {
    AssertUnwindSafe(fut).catch_unwind().await.map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("provider panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("provider panicked: {}", s)
    } else {
        "provider panicked".to_string()
    }
}
