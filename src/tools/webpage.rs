//! Webpage fetch adapter
//!
//! Retrieves a page and extracts its main text content, so the reasoning
//! service can read full articles and registry entries instead of search
//! snippets.

use crate::tools::{Tool, ToolKind};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; CDD-Research/1.0)";
const MAX_CHARS: usize = 4000;
const TEXT_WIDTH: usize = 100;

pub struct FetchWebpageTool {
    client: Client,
}

impl FetchWebpageTool {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(12))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    async fn fetch(&self, url: &str) -> Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Could not fetch page: {}", e))?;

        if !response.status().is_success() {
            return Err(format!(
                "Could not fetch page: server returned {}",
                response.status()
            ));
        }

        let html = response
            .text()
            .await
            .map_err(|e| format!("Could not fetch page: {}", e))?;

        Ok(truncate(&page_text(&html)))
    }
}

impl Default for FetchWebpageTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for FetchWebpageTool {
    fn kind(&self) -> ToolKind {
        ToolKind::FetchWebpage
    }

    fn description(&self) -> &'static str {
        "Fetch the full text content of a specific webpage. Use this after web_search \
         to read full articles, company registry entries, or news reports. \
         Much more detailed than search snippets."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The full URL of the webpage to fetch and read."
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, input: &Value) -> String {
        let Some(url) = input
            .get("url")
            .and_then(Value::as_str)
            .filter(|u| !u.trim().is_empty())
        else {
            return "fetch_webpage error: a non-empty 'url' field is required.".to_string();
        };

        match self.fetch(url).await {
            Ok(text) => text,
            Err(message) => {
                warn!(url, "Page fetch failed: {}", message);
                message
            }
        }
    }
}

/// Convert HTML to clean text and fold blank lines.
fn page_text(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), TEXT_WIDTH);

    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(MAX_CHARS).collect();
    format!("{}\n\n[Page truncated]", truncated)
}
