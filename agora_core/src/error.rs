// src/error.rs

/// Faults raised inside a provider.
///
/// These never cross the aggregation boundary: the manager logs them and
/// turns them into empty result lists or absent content.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Provider '{0}' is not initialized")]
    NotInitialized(String),

    #[error("Upstream returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ProviderError {
    pub fn code_str(&self) -> &'static str {
        match self {
            ProviderError::Http(_) => "upstream_error",
            ProviderError::Upstream { .. } => "upstream_error",
            ProviderError::SerdeJson(_) => "parse_error",
            ProviderError::Parse(_) => "parse_error",
            ProviderError::NotInitialized(_) => "not_initialized",
            ProviderError::InvalidInput(_) => "invalid_input",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Other(_) => "internal_error",
        }
    }
}

/// Configuration-time failures of the domain registry.
///
/// Query-time calls never return these; they degrade instead.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Domain '{0}' not registered")]
    UnknownDomain(String),

    #[error("Invalid priority {priority} for provider '{provider}': priority must be at least 1")]
    InvalidPriority { provider: String, priority: u32 },

    #[error("Invalid domain configuration for '{domain}': {reason}")]
    InvalidConfig { domain: String, reason: String },
}

/// Errors from parsing operator-supplied configuration text.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<DomainError> for ConfigError {
    fn from(err: DomainError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}
