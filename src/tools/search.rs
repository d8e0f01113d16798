//! Web search adapter
//!
//! Queries the DuckDuckGo HTML endpoint and extracts title/URL/snippet
//! triples. Supplements professional screening with registry data, recent
//! news, and ownership details.

use crate::tools::{Tool, ToolKind};
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; CDD-Research/1.0)";
const MAX_RESULTS: usize = 8;

pub struct WebSearchTool {
    client: Client,
}

impl WebSearchTool {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    async fn search(&self, query: &str) -> Result<String, String> {
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| format!("Search error: {}", e))?;

        if !response.status().is_success() {
            return Err(format!(
                "Search error: endpoint returned {}",
                response.status()
            ));
        }

        let html = response
            .text()
            .await
            .map_err(|e| format!("Search error: {}", e))?;

        let hits = parse_results(&html);
        if hits.is_empty() {
            return Ok("No results found for this query.".to_string());
        }

        Ok(hits
            .iter()
            .map(|hit| {
                format!(
                    "Title: {}\nURL: {}\nSnippet: {}",
                    hit.title, hit.url, hit.snippet
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for WebSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WebSearch
    }

    fn description(&self) -> &'static str {
        "Search the internet for information relevant to a CDD review. \
         Use this to supplement Dow Jones screening with registry data, recent news, \
         and ownership details. Each call should focus on one specific aspect. \
         After getting results, use fetch_webpage on the most relevant URLs."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "A specific search query, e.g. 'Acme Holdings BVI company registry', 'John Smith director company', 'Meridian Trading fraud 2024'"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: &Value) -> String {
        let Some(query) = input
            .get("query")
            .and_then(Value::as_str)
            .filter(|q| !q.trim().is_empty())
        else {
            return "web_search error: a non-empty 'query' field is required.".to_string();
        };

        match self.search(query).await {
            Ok(result) => result,
            Err(message) => {
                warn!(query, "Web search failed: {}", message);
                message
            }
        }
    }
}

struct SearchHit {
    title: String,
    url: String,
    snippet: String,
}

/// Pull result entries out of the DuckDuckGo HTML response.
fn parse_results(html: &str) -> Vec<SearchHit> {
    let document = Html::parse_document(html);

    // Selectors are static and known-valid.
    let result_selector = Selector::parse(".result").expect("valid selector");
    let link_selector = Selector::parse(".result__a").expect("valid selector");
    let snippet_selector = Selector::parse(".result__snippet").expect("valid selector");

    let mut hits = Vec::new();
    for result in document.select(&result_selector).take(MAX_RESULTS) {
        let Some(link) = result.select(&link_selector).next() else {
            continue;
        };

        let title = link.text().collect::<String>().trim().to_string();
        let url = link.value().attr("href").unwrap_or("N/A").to_string();
        let snippet = result
            .select(&snippet_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_else(|| "N/A".to_string());

        if !title.is_empty() {
            hits.push(SearchHit {
                title,
                url,
                snippet,
            });
        }
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html><body>
          <div class="result">
            <a class="result__a" href="https://registry.example.com/acme">Acme Holdings Ltd - BVI Registry</a>
            <a class="result__snippet">Registered 2015, British Virgin Islands. Director: John Smith.</a>
          </div>
          <div class="result">
            <a class="result__a" href="https://news.example.com/acme-fraud">Acme fraud probe</a>
            <a class="result__snippet">Regulators opened an inquiry in 2024.</a>
          </div>
        </body></html>"#;

    #[test]
    fn test_parse_results() {
        let hits = parse_results(FIXTURE);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Acme Holdings Ltd - BVI Registry");
        assert_eq!(hits[0].url, "https://registry.example.com/acme");
        assert!(hits[1].snippet.contains("inquiry"));
    }

    #[test]
    fn test_parse_results_empty_page() {
        assert!(parse_results("<html><body></body></html>").is_empty());
    }

    #[tokio::test]
    async fn test_missing_query_is_reported_as_text() {
        let tool = WebSearchTool::new();
        let result = tool.execute(&json!({"q": "wrong key"})).await;
        assert!(result.contains("'query'"));
    }
}
