//! Concrete providers and the helpers they share.

#[cfg(feature = "arxiv")]
pub mod arxiv;
pub mod mock;
#[cfg(feature = "wikipedia")]
pub mod wikipedia;

use crate::error::ProviderError;
use crate::provider::RawRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::RwLock;

pub const DEFAULT_USER_AGENT: &str = concat!("agora/", env!("CARGO_PKG_VERSION"));

/// Transport settings shared by the HTTP-backed providers.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_millis(crate::manager::DEFAULT_CALL_TIMEOUT_MS),
        }
    }
}

/// A pooled HTTP client that exists only between `open` and `close`.
#[derive(Debug)]
pub struct HttpSession {
    settings: HttpSettings,
    client: RwLock<Option<Client>>,
}

impl HttpSession {
    pub fn new(settings: HttpSettings) -> Self {
        Self {
            settings,
            client: RwLock::new(None),
        }
    }

    /// Build the client if it does not exist yet.
    pub async fn open(&self) -> Result<Client, ProviderError> {
        let mut slot = self.client.write().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }
        let client = Client::builder()
            .user_agent(self.settings.user_agent.as_str())
            .timeout(self.settings.timeout)
            .build()?;
        *slot = Some(client.clone());
        Ok(client)
    }

    /// The open client. Fails with `NotInitialized` after `close` or before `open`.
    pub async fn client(&self, owner: &str) -> Result<Client, ProviderError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or_else(|| ProviderError::NotInitialized(owner.to_string()))
    }

    /// Drop the client, releasing pooled connections.
    pub async fn close(&self) {
        self.client.write().await.take();
    }

    pub async fn is_open(&self) -> bool {
        self.client.read().await.is_some()
    }
}

/// Fraction of the query's terms that occur in `text`, case-insensitively.
///
/// Returns 0.0 for an empty query.
pub fn term_overlap_score(text: &str, query: &str) -> f64 {
    let haystack = text.to_lowercase();
    let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if terms.is_empty() {
        return 0.0;
    }
    let hits = terms.iter().filter(|term| haystack.contains(term.as_str())).count();
    (hits as f64 / terms.len() as f64).min(1.0)
}

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Strip markup from a search snippet and decode its entities.
pub fn strip_html(html: &str) -> String {
    let without_tags = TAG_RE.replace_all(html, "");
    html_escape::decode_html_entities(&without_tags).into_owned()
}

/// Turn a JSON object into a raw record; anything else becomes an empty record.
pub(crate) fn into_record(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        _ => RawRecord::new(),
    }
}

/// Collapse runs of whitespace (Atom feeds wrap titles and abstracts).
pub fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_overlap_score() {
        assert_eq!(term_overlap_score("Rust is a language", "rust language"), 1.0);
        assert_eq!(term_overlap_score("Rust is a language", "rust python"), 0.5);
        assert_eq!(term_overlap_score("anything", ""), 0.0);
        assert_eq!(term_overlap_score("", "rust"), 0.0);
        assert_eq!(term_overlap_score("MODEL context", "model Context"), 1.0);
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html(r#"The <span class="searchmatch">Rust</span> language &amp; tools"#),
            "The Rust language & tools"
        );
        assert_eq!(strip_html("plain &quot;quoted&quot;"), "plain \"quoted\"");
    }

    #[test]
    fn test_squash_whitespace() {
        assert_eq!(
            squash_whitespace("  Attention\n   Is All\tYou Need "),
            "Attention Is All You Need"
        );
    }

    #[tokio::test]
    async fn test_http_session_lifecycle() {
        let session = HttpSession::new(HttpSettings::default());
        assert!(!session.is_open().await);
        assert!(matches!(
            session.client("test").await,
            Err(ProviderError::NotInitialized(_))
        ));

        session.open().await.unwrap();
        assert!(session.is_open().await);
        assert!(session.client("test").await.is_ok());

        session.close().await;
        session.close().await;
        assert!(!session.is_open().await);
    }
}
