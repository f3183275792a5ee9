//! Web search collaborator.
//!
//! The pipeline only depends on the [`SearchProvider`] trait: given a query
//! it gets back an ordered list of [`SearchHit`]s, or an empty list when
//! nothing was found or the network failed. Failures never escape the trait
//! method; the orchestrator treats "no hits" uniformly.
//!
//! The default implementation scrapes the DuckDuckGo HTML endpoint. There is
//! no free JSON search API, so results are pulled out of the HTML with a few
//! string-matching strategies; hits that fail to parse are skipped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A single web search result. Any field may be empty; consumers must
/// tolerate that without failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub snippet: String,
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("rate limited by search provider")]
    RateLimited,

    #[error("search failed: {0}")]
    Failed(String),
}

/// Search collaborator interface. Implementations return an empty list on
/// failure instead of an error.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit>;
}

/// DuckDuckGo HTML-endpoint search client.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                 Chrome/120.0.0.0 Safari/537.36",
            )
            .build()
            .unwrap_or_default();

        Self { client }
    }

    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(query)
        );

        debug!(url = %url, "Fetching search results");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(SearchError::RateLimited);
            }
            return Err(SearchError::Failed(format!("HTTP {}", response.status())));
        }

        let body = response.text().await?;
        Ok(parse_results(&body, max_results))
    }
}

impl Default for DuckDuckGoSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit> {
        info!(query = %query, "Performing web search");

        // Light rate limiting before hitting the endpoint.
        tokio::time::sleep(Duration::from_millis(500)).await;

        match self.fetch(query, max_results).await {
            Ok(hits) => {
                if hits.is_empty() {
                    warn!(query = %query, "No search results found");
                } else {
                    info!(query = %query, count = hits.len(), "Search completed");
                }
                hits
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Search failed, returning no hits");
                Vec::new()
            }
        }
    }
}

/// Extract hits from the DuckDuckGo result page.
///
/// Strategy 1 pulls the redirect targets out of `uddg=` parameters, which is
/// where organic result URLs live. Strategy 2 falls back to visible
/// `result__url` hrefs when the page layout differs. Malformed entries are
/// skipped, never fatal.
fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    let mut seen = HashSet::new();

    for segment in html.split("uddg=") {
        if hits.len() >= max_results {
            break;
        }

        let Some(end) = segment.find(['&', '"', '\'']) else {
            continue;
        };

        let Ok(decoded) = urlencoding::decode(&segment[..end]) else {
            continue;
        };

        let url = decoded.to_string();
        if !url.starts_with("http") || url.contains("duckduckgo.com") || seen.contains(&url) {
            continue;
        }

        seen.insert(url.clone());
        hits.push(SearchHit {
            title: extract_domain(&url).unwrap_or_else(|| "Result".to_string()),
            snippet: segment_snippet(segment).unwrap_or_default(),
            url,
        });
    }

    if hits.len() < max_results {
        for segment in html.split("result__url") {
            if hits.len() >= max_results {
                break;
            }

            let Some(href_start) = segment.find("href=\"") else {
                continue;
            };
            let after = &segment[href_start + 6..];
            let Some(href_end) = after.find('"') else {
                continue;
            };

            let href = &after[..href_end];
            let url = if let Some(rest) = href.strip_prefix("//") {
                format!("https://{rest}")
            } else if href.starts_with("http") {
                href.to_string()
            } else {
                continue;
            };

            if url.contains("duckduckgo.com") || seen.contains(&url) {
                continue;
            }

            seen.insert(url.clone());
            hits.push(SearchHit {
                title: extract_domain(&url).unwrap_or_else(|| "Result".to_string()),
                url,
                snippet: String::new(),
            });
        }
    }

    hits.truncate(max_results);
    hits
}

/// Best-effort snippet: the text of the `result__snippet` anchor that follows
/// the result link in the same segment.
fn segment_snippet(segment: &str) -> Option<String> {
    let marker = segment.find("result__snippet")?;
    let after = &segment[marker..];
    let text_start = after.find('>')? + 1;
    let text_end = after[text_start..].find('<')? + text_start;

    let snippet = after[text_start..text_end].trim();
    if snippet.is_empty() {
        None
    } else {
        Some(snippet.to_string())
    }
}

/// Extract the domain name from a URL.
fn extract_domain(url: &str) -> Option<String> {
    url.split("//")
        .nth(1)?
        .split('/')
        .next()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://www.example.com/page"),
            Some("www.example.com".to_string())
        );
        assert_eq!(
            extract_domain("https://rust-lang.org/learn"),
            Some("rust-lang.org".to_string())
        );
        assert_eq!(extract_domain("not a url"), None);
    }

    #[test]
    fn test_parse_results_uddg_links() {
        let html = r#"
            <a href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fone&rut=x">One</a>
            <a href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.org%2Ftwo&rut=y">Two</a>
        "#;

        let hits = parse_results(html, 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://example.com/one");
        assert_eq!(hits[0].title, "example.com");
        assert_eq!(hits[1].url, "https://example.org/two");
    }

    #[test]
    fn test_parse_results_deduplicates_and_truncates() {
        let html = r#"
            <a href="?uddg=https%3A%2F%2Fexample.com%2Fa&x">A</a>
            <a href="?uddg=https%3A%2F%2Fexample.com%2Fa&x">A again</a>
            <a href="?uddg=https%3A%2F%2Fexample.com%2Fb&x">B</a>
            <a href="?uddg=https%3A%2F%2Fexample.com%2Fc&x">C</a>
        "#;

        let hits = parse_results(html, 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://example.com/a");
        assert_eq!(hits[1].url, "https://example.com/b");
    }

    #[test]
    fn test_parse_results_empty_page() {
        assert!(parse_results("<html><body>nothing here</body></html>", 5).is_empty());
    }

    #[test]
    fn test_hit_deserializes_with_missing_fields() {
        let hit: SearchHit = serde_json::from_str(r#"{"title": "only a title"}"#).unwrap();
        assert_eq!(hit.title, "only a title");
        assert!(hit.url.is_empty());
        assert!(hit.snippet.is_empty());
    }
}
