use crate::error::ProviderError;
use crate::provider::{Lifecycle, Provider, RawRecord, ResourceDescriptor};
use crate::providers::{into_record, strip_html, term_overlap_score, HttpSession, HttpSettings};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

const PROVIDER_NAME: &str = "Wikipedia Provider";
const PROVIDER_DESCRIPTION: &str = "Access to Wikipedia articles and content";

/// Structured-document provider backed by the MediaWiki action API and the
/// Wikipedia REST API.
pub struct WikipediaProvider {
    language: String,
    api_url: String,
    rest_url: String,
    session: HttpSession,
    lifecycle: Lifecycle,
}

impl WikipediaProvider {
    pub fn new(settings: HttpSettings) -> Self {
        Self::with_language("en", settings)
    }

    pub fn with_language(language: &str, settings: HttpSettings) -> Self {
        Self {
            language: language.to_string(),
            api_url: format!("https://{}.wikipedia.org/w/api.php", language),
            rest_url: format!("https://{}.wikipedia.org/api/rest_v1", language),
            session: HttpSession::new(settings),
            lifecycle: Lifecycle::new(),
        }
    }

    /// Point the provider at different API roots (mirrors, test servers).
    pub fn with_endpoints(
        mut self,
        api_url: impl Into<String>,
        rest_url: impl Into<String>,
    ) -> Self {
        self.api_url = api_url.into();
        self.rest_url = rest_url.into();
        self
    }

    fn article_url(&self, title: &str) -> String {
        format!(
            "https://{}.wikipedia.org/wiki/{}",
            self.language,
            title.replace(' ', "_")
        )
    }

    fn summary_url(&self, title: &str) -> String {
        format!(
            "{}/page/summary/{}",
            self.rest_url,
            urlencoding::encode(&title.replace(' ', "_"))
        )
    }

    async fn search_articles(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RawRecord>, ProviderError> {
        let client = self.session.client(PROVIDER_NAME).await?;
        let limit = limit.to_string();
        let params = [
            ("action", "query"),
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", limit.as_str()),
            ("srnamespace", "0"),
            ("srprop", "snippet"),
            ("format", "json"),
        ];

        let data = fetch_json(client.get(&self.api_url).query(&params))
            .await?
            .unwrap_or(Value::Null);

        let hits = data
            .get("query")
            .and_then(|q| q.get("search"))
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Parse("Invalid search response format".to_string()))?;

        Ok(hits
            .iter()
            .filter_map(|item| {
                let title = item.get("title")?.as_str()?;
                let snippet = strip_html(item.get("snippet").and_then(Value::as_str).unwrap_or(""));
                Some(into_record(json!({
                    "title": title,
                    "relevance_score": term_overlap_score(&snippet, query),
                    "snippet": snippet,
                    "page_id": item.get("pageid").cloned().unwrap_or(Value::Null),
                    "url": self.article_url(title),
                })))
            })
            .collect())
    }

    async fn article_by_title(&self, title: &str) -> Result<Option<RawRecord>, ProviderError> {
        let client = self.session.client(PROVIDER_NAME).await?;

        let Some(summary) = fetch_json(client.get(self.summary_url(title))).await? else {
            return Ok(None);
        };

        let params = [
            ("action", "query"),
            ("prop", "extracts"),
            ("explaintext", "1"),
            ("redirects", "1"),
            ("titles", title),
            ("format", "json"),
        ];
        let extract = fetch_json(client.get(&self.api_url).query(&params))
            .await?
            .and_then(|data| first_page(&data).cloned())
            .filter(|page| page.get("missing").is_none())
            .and_then(|page| page.get("extract").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default();

        let resolved_title = summary
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(title)
            .to_string();
        let url = summary
            .pointer("/content_urls/desktop/page")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.article_url(&resolved_title));

        Ok(Some(into_record(json!({
            "title": resolved_title,
            "content": extract,
            "summary": summary.get("extract").and_then(Value::as_str).unwrap_or(""),
            "page_id": summary.get("pageid").cloned().unwrap_or(Value::Null),
            "last_modified": summary.get("timestamp").cloned().unwrap_or(Value::Null),
            "url": url,
        }))))
    }

    async fn title_for_page_id(&self, page_id: u64) -> Result<Option<String>, ProviderError> {
        let client = self.session.client(PROVIDER_NAME).await?;
        let page_id = page_id.to_string();
        let params = [
            ("action", "query"),
            ("pageids", page_id.as_str()),
            ("prop", "info"),
            ("format", "json"),
        ];

        Ok(fetch_json(client.get(&self.api_url).query(&params))
            .await?
            .and_then(|data| first_page(&data).cloned())
            .filter(|page| page.get("missing").is_none())
            .and_then(|page| page.get("title").and_then(Value::as_str).map(str::to_string)))
    }
}

#[async_trait]
impl Provider for WikipediaProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        PROVIDER_DESCRIPTION
    }

    fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    async fn initialize(&self) -> Result<(), ProviderError> {
        self.lifecycle
            .initialize_with(|| async {
                let client = self.session.open().await?;
                match fetch_json(client.get(self.summary_url("Test"))).await {
                    Ok(_) => debug!("Wikipedia API connection test succeeded"),
                    Err(e) => warn!(error = %e, "Wikipedia API connection test failed"),
                }
                Ok(())
            })
            .await
            .map(|_| ())
    }

    async fn search(&self, query: &str, max_results: usize) -> Vec<RawRecord> {
        match self.search_articles(query, max_results).await {
            Ok(mut records) => {
                records.truncate(max_results);
                records
            }
            Err(e) => {
                warn!(error = %e, code = e.code_str(), "Wikipedia search failed");
                Vec::new()
            }
        }
    }

    async fn get_content(&self, resource_id: &str) -> Result<Option<RawRecord>, ProviderError> {
        if let Some(article) = self.article_by_title(resource_id).await? {
            return Ok(Some(article));
        }
        let Ok(page_id) = resource_id.parse::<u64>() else {
            return Ok(None);
        };
        match self.title_for_page_id(page_id).await? {
            Some(title) => self.article_by_title(&title).await,
            None => Ok(None),
        }
    }

    async fn list_resources(
        &self,
        _query: Option<&str>,
    ) -> Result<Vec<ResourceDescriptor>, ProviderError> {
        Ok(vec![ResourceDescriptor::json(
            "wikipedia://featured",
            "Featured Articles",
            "Wikipedia featured articles",
        )])
    }

    async fn cleanup(&self) -> Result<(), ProviderError> {
        self.lifecycle
            .cleanup_with(|| async {
                self.session.close().await;
                Ok(())
            })
            .await
    }
}

/// Send a request and decode its JSON body. `Ok(None)` on 404.
async fn fetch_json(request: RequestBuilder) -> Result<Option<Value>, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(ProviderError::Upstream {
            status: status.as_u16(),
            message: format!("Wikipedia API returned {}", status),
        });
    }
    Ok(Some(response.json::<Value>().await?))
}

fn first_page(data: &Value) -> Option<&Value> {
    data.get("query")?
        .get("pages")?
        .as_object()?
        .values()
        .next()
}
