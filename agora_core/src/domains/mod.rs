//! Domain segmentation: per-use-case configuration, provider bindings and
//! isolated aggregation managers.

pub mod config;
pub mod registry;

pub use config::{ContextRules, DomainConfig, MemoryConfig, RateLimits, SecurityLevel};
pub use registry::{DomainBinding, DomainHealth, DomainRegistry, DomainSummary, RegistryHealth};
