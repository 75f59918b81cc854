//! The provider contract.
//!
//! A provider wraps one external data source (an encyclopedia, a paper
//! archive, a business database, ...) behind a small set of async
//! operations. Any type implementing [`Provider`] can be registered with an
//! [`AggregationManager`](crate::manager::AggregationManager); there is no
//! shared base state, only the optional [`Lifecycle`] helper that concrete
//! providers embed.

use crate::error::ProviderError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// A provider's raw result record. Field names vary per provider
/// ("snippet" vs "abstract", "page_id" vs "arxiv_id", ...).
pub type RawRecord = Map<String, Value>;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name (e.g. "Wikipedia Provider").
    fn name(&self) -> &str;

    /// Returns a description of the provider.
    fn description(&self) -> &str;

    /// Whether `initialize` has completed and `cleanup` has not run since.
    fn is_initialized(&self) -> bool;

    /// One-time setup. Calling it on an initialized provider is a no-op.
    ///
    /// Connectivity probes that fail are logged and must not fail
    /// initialization.
    async fn initialize(&self) -> Result<(), ProviderError>;

    /// Search the source. Returns at most `max_results` records and never
    /// fails: internal faults are logged and produce an empty list.
    async fn search(&self, query: &str, max_results: usize) -> Vec<RawRecord>;

    /// Fetch a single resource. `Ok(None)` means the resource does not exist;
    /// `Err` is reserved for transport-level faults.
    async fn get_content(&self, resource_id: &str) -> Result<Option<RawRecord>, ProviderError>;

    /// Resources this provider advertises. Defaults to none.
    async fn list_resources(
        &self,
        _query: Option<&str>,
    ) -> Result<Vec<ResourceDescriptor>, ProviderError> {
        Ok(Vec::new())
    }

    async fn health_check(&self) -> Result<HealthStatus, ProviderError> {
        Ok(HealthStatus::for_provider(
            self.name(),
            self.description(),
            self.is_initialized(),
        ))
    }

    /// Release held resources. Safe to call repeatedly; afterwards
    /// `is_initialized` reads false.
    async fn cleanup(&self) -> Result<(), ProviderError>;
}

/// Health states reported by providers and managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    NotInitialized,
    Error,
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthState::Healthy => "healthy",
            HealthState::NotInitialized => "not_initialized",
            HealthState::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub name: String,
    pub status: HealthState,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    /// The default health record: healthy once initialized.
    pub fn for_provider(name: &str, description: &str, initialized: bool) -> Self {
        Self {
            name: name.to_string(),
            status: if initialized {
                HealthState::Healthy
            } else {
                HealthState::NotInitialized
            },
            description: description.to_string(),
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// A record for a provider whose health probe itself failed.
    pub fn error(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: HealthState::Error,
            description: String::new(),
            timestamp: Utc::now(),
            error: Some(message.into()),
        }
    }
}

/// A resource a provider advertises through `list_resources`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(rename = "lastModified", skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl ResourceDescriptor {
    pub fn json(uri: &str, name: &str, description: &str) -> Self {
        Self {
            uri: uri.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            mime_type: "application/json".to_string(),
            size: None,
            last_modified: None,
        }
    }
}

/// Idempotent initialize/cleanup bookkeeping for a provider.
///
/// Setup runs at most once even when several managers sharing the same
/// provider initialize it concurrently.
#[derive(Debug, Default)]
pub struct Lifecycle {
    initialized: AtomicBool,
    guard: Mutex<()>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Run `setup` unless already initialized.
    ///
    /// Returns `Ok(true)` when setup actually ran.
    pub async fn initialize_with<F, Fut>(&self, setup: F) -> Result<bool, ProviderError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ProviderError>>,
    {
        if self.is_initialized() {
            return Ok(false);
        }
        let _guard = self.guard.lock().await;
        if self.is_initialized() {
            return Ok(false);
        }
        setup().await?;
        self.initialized.store(true, Ordering::SeqCst);
        Ok(true)
    }

    /// Run `teardown` and mark the provider uninitialized, even if
    /// teardown fails.
    pub async fn cleanup_with<F, Fut>(&self, teardown: F) -> Result<(), ProviderError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ProviderError>>,
    {
        let _guard = self.guard.lock().await;
        let result = teardown().await;
        self.initialized.store(false, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_health_status_for_provider() {
        let status = HealthStatus::for_provider("Wiki", "Encyclopedia", false);
        assert_eq!(status.status, HealthState::NotInitialized);
        assert!(status.error.is_none());

        let status = HealthStatus::for_provider("Wiki", "Encyclopedia", true);
        assert_eq!(status.status, HealthState::Healthy);
    }

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus::error("wikipedia", "probe exploded");
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "probe exploded");

        let healthy = HealthStatus::for_provider("Wiki", "Encyclopedia", true);
        let json = serde_json::to_value(&healthy).unwrap();
        assert_eq!(json["status"], "healthy");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn test_lifecycle_runs_setup_once() {
        let lifecycle = Lifecycle::new();
        let calls = AtomicUsize::new(0);

        let ran = lifecycle
            .initialize_with(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();
        assert!(ran);

        let ran = lifecycle
            .initialize_with(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();
        assert!(!ran);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(lifecycle.is_initialized());
    }

    #[tokio::test]
    async fn test_lifecycle_concurrent_initialize() {
        let lifecycle = Arc::new(Lifecycle::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let lifecycle = Arc::clone(&lifecycle);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    lifecycle
                        .initialize_with(|| async {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::task::yield_now().await;
                            Ok(())
                        })
                        .await
                })
            })
            .collect();

        for task in futures::future::join_all(tasks).await {
            task.unwrap().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lifecycle_failed_setup_stays_uninitialized() {
        let lifecycle = Lifecycle::new();
        let result = lifecycle
            .initialize_with(|| async { Err(ProviderError::Other("boom".to_string())) })
            .await;
        assert!(result.is_err());
        assert!(!lifecycle.is_initialized());
    }

    #[tokio::test]
    async fn test_lifecycle_cleanup_resets_even_on_error() {
        let lifecycle = Lifecycle::new();
        lifecycle.initialize_with(|| async { Ok(()) }).await.unwrap();

        let result = lifecycle
            .cleanup_with(|| async { Err(ProviderError::Other("close failed".to_string())) })
            .await;
        assert!(result.is_err());
        assert!(!lifecycle.is_initialized());

        // Repeat cleanup is harmless.
        lifecycle.cleanup_with(|| async { Ok(()) }).await.unwrap();
        assert!(!lifecycle.is_initialized());
    }
}
