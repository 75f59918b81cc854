use crate::error::ProviderError;
use crate::provider::{Lifecycle, Provider, RawRecord, ResourceDescriptor};
use crate::providers::{
    into_record, squash_whitespace, term_overlap_score, HttpSession, HttpSettings,
};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

const PROVIDER_NAME: &str = "arXiv Provider";
const PROVIDER_DESCRIPTION: &str = "Access to arXiv academic papers and research";
const DEFAULT_BASE_URL: &str = "https://export.arxiv.org/api/query";

// One parsed Atom entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArxivPaper {
    pub arxiv_id: String,
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub categories: Vec<String>,
    pub published: String,
    pub doi: Option<String>,
    pub abs_url: Option<String>,
}

impl ArxivPaper {
    pub fn pdf_url(&self) -> String {
        format!("https://arxiv.org/pdf/{}", self.arxiv_id)
    }

    fn url(&self) -> String {
        self.abs_url
            .clone()
            .unwrap_or_else(|| format!("https://arxiv.org/abs/{}", self.arxiv_id))
    }

    fn to_record(&self) -> RawRecord {
        let mut record = into_record(json!({
            "arxiv_id": self.arxiv_id,
            "title": self.title,
            "authors": self.authors,
            "abstract": self.summary,
            "categories": self.categories,
            "published_date": self.published,
            "url": self.url(),
            "pdf_url": self.pdf_url(),
        }));
        if let Some(doi) = &self.doi {
            record.insert("doi".to_string(), json!(doi));
        }
        record
    }
}

/// Academic-metadata provider backed by the arXiv Atom API.
pub struct ArxivProvider {
    base_url: String,
    session: HttpSession,
    lifecycle: Lifecycle,
}

impl ArxivProvider {
    pub fn new(settings: HttpSettings) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session: HttpSession::new(settings),
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn query_url(&self, pairs: &[(&str, &str)]) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::InvalidInput(format!("Failed to parse URL: {}", e)))?;
        url.query_pairs_mut().extend_pairs(pairs);
        Ok(url)
    }

    async fn fetch_feed(&self, pairs: &[(&str, &str)]) -> Result<Vec<ArxivPaper>, ProviderError> {
        let client = self.session.client(PROVIDER_NAME).await?;
        let response = client.get(self.query_url(pairs)?).send().await?;

        if !response.status().is_success() {
            return Err(ProviderError::Upstream {
                status: response.status().as_u16(),
                message: format!("arXiv API returned error status: {}", response.status()),
            });
        }

        let content = response.text().await?;
        parse_feed(&content)
    }

    async fn search_papers(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<ArxivPaper>, ProviderError> {
        let max_results = max_results.to_string();
        self.fetch_feed(&[
            ("search_query", query),
            ("start", "0"),
            ("max_results", max_results.as_str()),
            ("sortBy", "relevance"),
            ("sortOrder", "descending"),
        ])
        .await
    }
}

#[async_trait]
impl Provider for ArxivProvider {
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
                self.session.open().await?;
                match self.search_papers("all:test", 1).await {
                    Ok(_) => debug!("arXiv API connection test succeeded"),
                    Err(e) => warn!(error = %e, "arXiv API connection test failed"),
                }
                Ok(())
            })
            .await
            .map(|_| ())
    }

    async fn search(&self, query: &str, max_results: usize) -> Vec<RawRecord> {
        match self.search_papers(query, max_results).await {
            Ok(papers) => papers
                .iter()
                .take(max_results)
                .map(|paper| {
                    let mut record = paper.to_record();
                    let text = format!("{} {}", paper.title, paper.summary);
                    record.insert(
                        "relevance_score".to_string(),
                        json!(term_overlap_score(&text, query)),
                    );
                    record
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, code = e.code_str(), "arXiv search failed");
                Vec::new()
            }
        }
    }

    async fn get_content(&self, resource_id: &str) -> Result<Option<RawRecord>, ProviderError> {
        let papers = self
            .fetch_feed(&[("id_list", resource_id), ("start", "0"), ("max_results", "1")])
            .await?;
        Ok(papers.first().map(ArxivPaper::to_record))
    }

    async fn list_resources(
        &self,
        _query: Option<&str>,
    ) -> Result<Vec<ResourceDescriptor>, ProviderError> {
        Ok(vec![
            ResourceDescriptor::json(
                "arxiv://recent",
                "Recent Papers",
                "Recently published arXiv papers",
            ),
            ResourceDescriptor::json("arxiv://popular", "Popular Papers", "Popular arXiv papers"),
        ])
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

/// Parse an arXiv Atom feed into papers, in feed order.
pub fn parse_feed(xml_content: &str) -> Result<Vec<ArxivPaper>, ProviderError> {
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    let mut papers = Vec::new();
    let mut current: Option<ArxivPaper> = None;
    let mut current_tag: Option<String> = None;
    let mut buffer = Vec::new();

    loop {
        match reader.read_event_into(&mut buffer) {
            Ok(Event::Start(ref e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match tag_name.as_str() {
                    "entry" => current = Some(ArxivPaper::default()),
                    "id" | "title" | "summary" | "published" | "name" | "arxiv:doi"
                        if current.is_some() =>
                    {
                        current_tag = Some(tag_name);
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(tag), Some(paper)) = (current_tag.as_deref(), current.as_mut()) {
                    let text = e
                        .unescape()
                        .map_err(|err| ProviderError::Parse(err.to_string()))?
                        .to_string();

                    match tag {
                        "id" => {
                            paper.arxiv_id = text.rsplit('/').next().unwrap_or_default().to_string()
                        }
                        "title" => paper.title.push_str(&text),
                        "summary" => paper.summary.push_str(&text),
                        "published" => paper.published = text,
                        "name" => paper.authors.push(text),
                        "arxiv:doi" => paper.doi = Some(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if let Some(paper) = current.as_mut() {
                    let attr = |key: &str| {
                        e.attributes()
                            .filter_map(Result::ok)
                            .find(|a| a.key.as_ref() == key.as_bytes())
                            .map(|a| String::from_utf8_lossy(&a.value).to_string())
                    };
                    match tag_name.as_str() {
                        "category" => {
                            if let Some(term) = attr("term") {
                                paper.categories.push(term);
                            }
                        }
                        "link" if attr("rel").as_deref() == Some("alternate") => {
                            paper.abs_url = attr("href");
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag_name == "entry" {
                    if let Some(mut paper) = current.take() {
                        paper.title = squash_whitespace(&paper.title);
                        paper.summary = squash_whitespace(&paper.summary);
                        papers.push(paper);
                    }
                } else if current_tag.as_deref() == Some(tag_name.as_str()) {
                    current_tag = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ProviderError::Parse(e.to_string())),
            _ => {}
        }

        buffer.clear();
    }

    Ok(papers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title>ArXiv Query: search_query=all:attention</title>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>The dominant sequence transduction models are based on
      complex recurrent or convolutional neural networks.</summary>
    <author><name>Ashish Vaswani</name></author>
    <author><name>Noam Shazeer</name></author>
    <arxiv:doi>10.48550/arXiv.1706.03762</arxiv:doi>
    <link href="http://arxiv.org/abs/1706.03762v7" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/1706.03762v7" rel="related" type="application/pdf"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2103.00020v1</id>
    <published>2021-02-26T19:04:58Z</published>
    <title>Learning Transferable Visual Models</title>
    <summary>State-of-the-art computer vision systems &amp; more.</summary>
    <author><name>Alec Radford</name></author>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed() {
        let papers = parse_feed(FEED).unwrap();
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.arxiv_id, "1706.03762v7");
        assert_eq!(first.title, "Attention Is All You Need");
        assert!(first
            .summary
            .starts_with("The dominant sequence transduction models are based on complex"));
        assert_eq!(first.authors, vec!["Ashish Vaswani", "Noam Shazeer"]);
        assert_eq!(first.categories, vec!["cs.CL", "cs.LG"]);
        assert_eq!(first.doi.as_deref(), Some("10.48550/arXiv.1706.03762"));
        assert_eq!(first.abs_url.as_deref(), Some("http://arxiv.org/abs/1706.03762v7"));

        let second = &papers[1];
        assert_eq!(second.summary, "State-of-the-art computer vision systems & more.");
        assert!(second.doi.is_none());
        assert!(second.categories.is_empty());
    }

    #[test]
    fn test_feed_title_ignored() {
        let papers = parse_feed(FEED).unwrap();
        assert!(papers.iter().all(|p| !p.title.contains("ArXiv Query")));
    }

    #[test]
    fn test_empty_feed() {
        let empty = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>none</title></feed>"#;
        assert!(parse_feed(empty).unwrap().is_empty());
    }

    #[test]
    fn test_paper_record_shape() {
        let papers = parse_feed(FEED).unwrap();
        let record = papers[1].to_record();
        assert_eq!(record["arxiv_id"], "2103.00020v1");
        assert_eq!(record["abstract"], "State-of-the-art computer vision systems & more.");
        assert_eq!(record["pdf_url"], "https://arxiv.org/pdf/2103.00020v1");
        assert_eq!(record["url"], "https://arxiv.org/abs/2103.00020v1");
        assert!(record.get("doi").is_none());
    }

    #[test]
    fn test_query_url_encodes_pairs() {
        let provider = ArxivProvider::new(HttpSettings::default());
        let url = provider
            .query_url(&[("search_query", "all:graph neural"), ("max_results", "3")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://export.arxiv.org/api/query?search_query=all%3Agraph+neural&max_results=3"
        );
    }
}
