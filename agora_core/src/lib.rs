// src/lib.rs
//! Domain-scoped aggregation of heterogeneous search providers.
//!
//! Providers implement [`Provider`]; an [`AggregationManager`] fans a query
//! out to them concurrently and returns one ranked list of
//! [`CanonicalResult`]s; a [`DomainRegistry`] gives every use case its own
//! providers, configuration and manager.

pub mod bootstrap;
pub mod config;
pub mod context;
pub mod domains;
pub mod error;
pub mod manager;
pub mod normalize;
pub mod provider;
pub mod providers;
pub mod types;

pub use crate::bootstrap::build_default_registry;
pub use crate::config::AgoraConfig;
pub use crate::context::{build_context, SynthesisContext};
pub use crate::domains::{DomainConfig, DomainRegistry};
pub use crate::error::{ConfigError, DomainError, ProviderError};
pub use crate::manager::AggregationManager;
pub use crate::provider::{HealthState, HealthStatus, Provider, RawRecord, ResourceDescriptor};
pub use crate::types::{CanonicalResult, ManagerHealth};
