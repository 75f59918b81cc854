//! Operator configuration.
//!
//! Parsed from YAML or TOML text handed in by the caller; this module never
//! reads files or the environment itself.
//!
//! ```yaml
//! search:
//!   timeout_ms: 5000
//! providers:
//!   wikipedia_language: de
//! domains:
//!   legal:
//!     description: Legal research
//!     allowed_sources: [wikipedia]
//!     security_level: restricted
//! ```

use crate::domains::config::DomainConfig;
use crate::error::ConfigError;
use crate::manager::DEFAULT_CALL_TIMEOUT_MS;
use crate::providers::{HttpSettings, DEFAULT_USER_AGENT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default results per source
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Per-provider call timeout in milliseconds (default: 10000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Results per source when the caller does not say (default: 10)
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_CALL_TIMEOUT_MS
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            default_limit: DEFAULT_LIMIT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Wikipedia language edition (default: en)
    #[serde(default = "default_language")]
    pub wikipedia_language: String,

    /// Registered provider names to leave out at startup
    #[serde(default)]
    pub disabled: Vec<String>,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            wikipedia_language: default_language(),
            disabled: Vec::new(),
        }
    }
}

impl ProviderSettings {
    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.iter().any(|d| d == name)
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgoraConfig {
    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub providers: ProviderSettings,

    /// Domain overrides keyed by id. An entry replaces the built-in domain
    /// of the same id as a whole; unknown ids add new domains.
    #[serde(default)]
    pub domains: BTreeMap<String, DomainConfig>,
}

impl AgoraConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.finish()
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.finish()
    }

    fn finish(mut self) -> Result<Self, ConfigError> {
        for (id, domain) in self.domains.iter_mut() {
            domain.domain = id.clone();
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.timeout_ms == 0 {
            return Err(ConfigError::Invalid("search.timeout_ms must be positive".to_string()));
        }
        if self.search.default_limit == 0 {
            return Err(ConfigError::Invalid(
                "search.default_limit must be positive".to_string(),
            ));
        }
        for domain in self.domains.values() {
            domain.validate()?;
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.search.timeout_ms)
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            user_agent: self.search.user_agent.clone(),
            timeout: self.call_timeout(),
        }
    }

    /// Built-in domains with overrides applied, sorted by id.
    pub fn effective_domains(&self) -> Vec<DomainConfig> {
        let mut merged: BTreeMap<String, DomainConfig> = DomainConfig::list_builtin()
            .iter()
            .map(|d| (d.domain.clone(), d.clone()))
            .collect();
        for (id, domain) in &self.domains {
            merged.insert(id.clone(), domain.clone());
        }
        merged.into_values().collect()
    }
}
