//! Domain configuration.
//!
//! A domain is a logical use case ("research", "strategic", ...) with its own
//! allowed sources, rate limits, context budget and security level. Built-in
//! domains cover the common agent roles; operators may override or extend
//! them through [`AgoraConfig`](crate::config::AgoraConfig).

use crate::error::DomainError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// ============================================================================
// Built-in domain ids
// ============================================================================

pub const RESEARCH: &str = "research";
pub const STRATEGIC: &str = "strategic";
pub const DATA_ANALYSIS: &str = "data_analysis";
pub const WRITER: &str = "writer";
pub const OPS_MANAGER: &str = "ops_manager";
pub const CUSTOMER_SUPPORT: &str = "customer_support";
pub const RAG: &str = "rag";
pub const GENERAL: &str = "general";

// ============================================================================
// Default Values
// ============================================================================

/// Default requests per minute
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Default daily request limit
pub const DEFAULT_DAILY_LIMIT: u32 = 10000;

/// Default context budget in characters
pub const DEFAULT_MAX_CONTEXT_LENGTH: usize = 8000;

/// Default cache lifetime in seconds
pub const DEFAULT_CACHE_DURATION_SECS: u64 = 1800;

/// Default cache capacity in entries
pub const DEFAULT_MAX_CACHE_SIZE: usize = 1000;

// ============================================================================
// Settings groups
// ============================================================================

/// Request budget. Carried as configuration; not enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
}

fn default_requests_per_minute() -> u32 {
    DEFAULT_REQUESTS_PER_MINUTE
}

fn default_daily_limit() -> u32 {
    DEFAULT_DAILY_LIMIT
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            daily_limit: DEFAULT_DAILY_LIMIT,
        }
    }
}

/// How results are packed into synthesis context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRules {
    /// Maximum packed context size in characters
    #[serde(default = "default_max_context_length")]
    pub max_context_length: usize,

    /// Whether URL and relevance lines are included per result
    #[serde(default = "default_include_metadata")]
    pub include_metadata: bool,
}

fn default_max_context_length() -> usize {
    DEFAULT_MAX_CONTEXT_LENGTH
}

fn default_include_metadata() -> bool {
    true
}

impl Default for ContextRules {
    fn default() -> Self {
        Self {
            max_context_length: DEFAULT_MAX_CONTEXT_LENGTH,
            include_metadata: true,
        }
    }
}

/// Result cache settings. Carried as configuration only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Cache lifetime in seconds
    #[serde(default = "default_cache_duration")]
    pub cache_duration: u64,

    #[serde(default = "default_max_cache_size")]
    pub max_cache_size: usize,
}

fn default_cache_duration() -> u64 {
    DEFAULT_CACHE_DURATION_SECS
}

fn default_max_cache_size() -> usize {
    DEFAULT_MAX_CACHE_SIZE
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            cache_duration: DEFAULT_CACHE_DURATION_SECS,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    Low,
    #[default]
    Standard,
    High,
    Restricted,
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SecurityLevel::Low => "low",
            SecurityLevel::Standard => "standard",
            SecurityLevel::High => "high",
            SecurityLevel::Restricted => "restricted",
        };
        f.write_str(s)
    }
}

// ============================================================================
// DomainConfig
// ============================================================================

/// Configuration of one domain. Read-only once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Domain id. Filled from the map key when loaded from a config file.
    #[serde(default)]
    pub domain: String,

    #[serde(default)]
    pub description: String,

    /// Provider names searched by default, in order. Empty means every
    /// provider bound to the domain.
    #[serde(default)]
    pub allowed_sources: Vec<String>,

    #[serde(default)]
    pub rate_limits: RateLimits,

    #[serde(default)]
    pub context_rules: ContextRules,

    #[serde(default)]
    pub memory_config: MemoryConfig,

    #[serde(default)]
    pub security_level: SecurityLevel,
}

impl DomainConfig {
    /// Create a config with default settings and no source restriction.
    pub fn new(domain: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            description: description.into(),
            allowed_sources: Vec::new(),
            rate_limits: RateLimits::default(),
            context_rules: ContextRules::default(),
            memory_config: MemoryConfig::default(),
            security_level: SecurityLevel::Standard,
        }
    }

    pub fn with_allowed_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_security_level(mut self, level: SecurityLevel) -> Self {
        self.security_level = level;
        self
    }

    pub fn with_context_rules(mut self, rules: ContextRules) -> Self {
        self.context_rules = rules;
        self
    }

    /// Get a built-in domain config by id.
    pub fn get_builtin(domain: &str) -> Option<Self> {
        BUILTIN_DOMAINS.iter().find(|d| d.domain == domain).cloned()
    }

    /// List all built-in domain configs.
    pub fn list_builtin() -> &'static [DomainConfig] {
        &BUILTIN_DOMAINS
    }

    /// Reject configs whose limits would make the domain unusable.
    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidConfig {
            domain: self.domain.clone(),
            reason: reason.to_string(),
        };

        if self.domain.trim().is_empty() {
            return Err(invalid("domain id must not be empty"));
        }
        if self.rate_limits.requests_per_minute == 0 {
            return Err(invalid("requests_per_minute must be positive"));
        }
        if self.rate_limits.daily_limit == 0 {
            return Err(invalid("daily_limit must be positive"));
        }
        if self.context_rules.max_context_length == 0 {
            return Err(invalid("max_context_length must be positive"));
        }
        Ok(())
    }
}

// ============================================================================
// Built-in Domains
// ============================================================================

fn builtin(
    domain: &str,
    description: &str,
    sources: &[&str],
    (cache_duration, max_cache_size): (u64, usize),
    (max_context_length, include_metadata): (usize, bool),
    (requests_per_minute, daily_limit): (u32, u32),
    security_level: SecurityLevel,
) -> DomainConfig {
    DomainConfig {
        domain: domain.to_string(),
        description: description.to_string(),
        allowed_sources: sources.iter().map(|s| s.to_string()).collect(),
        rate_limits: RateLimits {
            requests_per_minute,
            daily_limit,
        },
        context_rules: ContextRules {
            max_context_length,
            include_metadata,
        },
        memory_config: MemoryConfig {
            cache_duration,
            max_cache_size,
        },
        security_level,
    }
}

/// Built-in domains shipped with Agora.
static BUILTIN_DOMAINS: Lazy<Vec<DomainConfig>> = Lazy::new(|| {
    vec![
        builtin(
            RESEARCH,
            "Research agents with access to academic and web sources",
            &["wikipedia", "arxiv", "web_search", "academic_db"],
            (3600, 1000),
            (8000, true),
            (60, 10000),
            SecurityLevel::Standard,
        ),
        builtin(
            STRATEGIC,
            "Strategic agents with access to business and policy data",
            &["business_db", "policy_db", "financial_data", "market_research"],
            (7200, 500),
            (12000, true),
            (30, 5000),
            SecurityLevel::High,
        ),
        builtin(
            DATA_ANALYSIS,
            "Data analysis agents with access to databases and analytics tools",
            &["postgres", "mongodb", "analytics_db", "data_warehouse"],
            (1800, 2000),
            (16000, true),
            (120, 20000),
            SecurityLevel::High,
        ),
        builtin(
            WRITER,
            "Writer agents with access to content and style guides",
            &["style_guides", "content_db", "templates", "reference_materials"],
            (14400, 300),
            (6000, false),
            (45, 8000),
            SecurityLevel::Standard,
        ),
        builtin(
            OPS_MANAGER,
            "Operations manager agents with access to operational data",
            &["ops_db", "monitoring", "logs", "performance_metrics"],
            (900, 1500),
            (10000, true),
            (90, 15000),
            SecurityLevel::High,
        ),
        builtin(
            CUSTOMER_SUPPORT,
            "Customer support agents with access to support databases",
            &["support_db", "knowledge_base", "ticket_system", "faq_db"],
            (3600, 800),
            (4000, false),
            (150, 25000),
            SecurityLevel::Standard,
        ),
        builtin(
            RAG,
            "RAG agents with access to vector databases and embeddings",
            &["vector_db", "embeddings", "document_store", "semantic_search"],
            (300, 3000),
            (20000, true),
            (200, 30000),
            SecurityLevel::Standard,
        ),
        builtin(
            GENERAL,
            "General purpose agents with access to all sources",
            &[],
            (1800, 1000),
            (8000, true),
            (60, 10000),
            SecurityLevel::Standard,
        ),
    ]
});
