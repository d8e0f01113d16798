//! Dow Jones Risk & Compliance screening adapter
//!
//! Primary professional screening source: PEP lists, global sanctions
//! lists, state-owned enterprises, and curated adverse media. Degrades to a
//! "not configured" result when no credentials are present, so the session
//! can fall back to web-based screening.

use crate::config::DowJonesConfig;
use crate::tools::{Tool, ToolKind};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

const DJ_TOKEN_URL: &str = "https://accounts.dowjones.com/oauth2/v1/token";
const DJ_SCREEN_URL: &str = "https://api.dowjones.com/risk/v1/profiles/search";

/// Content categories requested from the profile search.
const DJ_CATEGORIES: [&str; 5] = [
    "b_peps", // Politically Exposed Persons
    "b_soe",  // State-Owned Enterprises
    "e_sl",   // Sanctions lists (all)
    "b_am",   // Adverse media
    "b_oel",  // Other enforcement lists
];

/// Profiles shown before asking the caller to refine.
const MAX_PROFILES_SHOWN: usize = 15;

pub const NOT_CONFIGURED_RESULT: &str = "Dow Jones Risk & Compliance: not configured. \
Set DOWJONES_API_KEY (API key auth) or DOWJONES_CLIENT_ID and DOWJONES_CLIENT_SECRET \
(OAuth2) to enable professional screening. \
Web-based sanctions and PEP searching will be used as an alternative.";

pub struct DowJonesScreenTool {
    client: Client,
    config: DowJonesConfig,
    token_url: String,
    screen_url: String,
}

impl DowJonesScreenTool {
    pub fn new(config: DowJonesConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            config,
            token_url: DJ_TOKEN_URL.to_string(),
            screen_url: DJ_SCREEN_URL.to_string(),
        }
    }

    /// Obtain an OAuth2 bearer token from client credentials.
    async fn bearer_token(&self) -> Result<String, String> {
        let (client_id, client_secret) = match (&self.config.client_id, &self.config.client_secret)
        {
            (Some(id), Some(secret)) => (id, secret),
            _ => return Err("OAuth2 client credentials incomplete".to_string()),
        };

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| format!("token request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("token endpoint returned {}", response.status()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("invalid token response: {}", e))?;

        body.get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| "token response missing access_token".to_string())
    }

    async fn screen(&self, name: &str, entity_type: &str) -> Result<String, String> {
        let token = match &self.config.api_key {
            Some(key) => key.clone(),
            None => self
                .bearer_token()
                .await
                .map_err(|e| format!("Dow Jones API error: {}", e))?,
        };

        let payload = json!({
            "data": {
                "attributes": {
                    "filter_search_string": name,
                    "filter_entity_type": entity_type,
                    "search_type": "CONTAINS",
                    "page_size": 25,
                    "filter_content_category": DJ_CATEGORIES,
                }
            }
        });

        let response = self
            .client
            .post(&self.screen_url)
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("Dow Jones API error: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(400).collect();
            return Err(format!("Dow Jones API error (HTTP {}): {}", status, body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("Dow Jones API error: invalid response body: {}", e))?;

        Ok(format_screening_result(name, entity_type, &body))
    }
}

#[async_trait::async_trait]
impl Tool for DowJonesScreenTool {
    fn kind(&self) -> ToolKind {
        ToolKind::DowJonesScreen
    }

    fn description(&self) -> &'static str {
        "Screen a name against the Dow Jones Risk & Compliance database. \
         This is the primary professional screening tool - ALWAYS call this first. \
         It covers 1,000+ global sanctions lists (OFAC, UN, EU, HMT and more), \
         PEP lists, state-owned enterprises, and curated adverse media. \
         Call once for the entity name and, if relevant, once more for key individuals."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Full name of the person or company to screen."
                },
                "entity_type": {
                    "type": "string",
                    "enum": ["PERSON", "COMPANY", "ALL"],
                    "description": "Type of entity. Use PERSON for individuals, COMPANY for businesses, ALL if unsure."
                }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, input: &Value) -> String {
        let Some(name) = input.get("name").and_then(Value::as_str).filter(|n| !n.trim().is_empty())
        else {
            return "dow_jones_screen error: a non-empty 'name' field is required.".to_string();
        };
        let entity_type = input
            .get("entity_type")
            .and_then(Value::as_str)
            .unwrap_or("ALL");

        if !self.config.is_configured() {
            return NOT_CONFIGURED_RESULT.to_string();
        }

        match self.screen(name, entity_type).await {
            Ok(result) => result,
            Err(message) => {
                warn!(subject = name, "Dow Jones screening failed: {}", message);
                message
            }
        }
    }
}

/// Render the profile search response as screening result text.
fn format_screening_result(name: &str, entity_type: &str, body: &Value) -> String {
    let empty = Vec::new();
    let profiles = body
        .get("data")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let total = body
        .get("meta")
        .and_then(|m| m.get("total_count"))
        .and_then(Value::as_u64)
        .unwrap_or(profiles.len() as u64);

    if profiles.is_empty() {
        return format!(
            "Dow Jones R&C screening for '{}' ({}): No matches found across PEP, \
             sanctions (OFAC/UN/EU/HMT/others), SOE, and adverse media categories.",
            name, entity_type
        );
    }

    let mut lines = vec![format!(
        "Dow Jones R&C - {} potential match(es) for '{}' ({}):\n",
        total, name, entity_type
    )];

    for profile in profiles.iter().take(MAX_PROFILES_SHOWN) {
        let attrs = profile.get("attributes").cloned().unwrap_or(Value::Null);
        let primary = attrs
            .get("primary_name")
            .and_then(Value::as_str)
            .unwrap_or("N/A");
        let ptype = attrs
            .get("entity_type")
            .and_then(Value::as_str)
            .unwrap_or("N/A");
        let score = attrs
            .get("score")
            .map(|v| v.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let profile_id = profile.get("id").and_then(Value::as_str).unwrap_or("N/A");
        let categories = attrs
            .get("categories")
            .and_then(Value::as_array)
            .map(|cats| {
                cats.iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "N/A".to_string());

        let mut block = format!(
            "  Profile ID : {}\n  Name       : {}\n  Type       : {}\n  Categories : {}\n  Match score: {}\n",
            profile_id, primary, ptype, categories, score
        );

        if let Some(akas) = attrs.get("also_known_as").and_then(Value::as_array) {
            let akas: Vec<&str> = akas.iter().filter_map(Value::as_str).take(5).collect();
            if !akas.is_empty() {
                block.push_str(&format!("  AKAs       : {}\n", akas.join(", ")));
            }
        }

        lines.push(block);
    }

    if total as usize > MAX_PROFILES_SHOWN {
        lines.push(format!(
            "  ... and {} more. Refine search for full list.",
            total as usize - MAX_PROFILES_SHOWN
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_name_is_reported_as_text() {
        let tool = DowJonesScreenTool::new(DowJonesConfig::default());
        let result = tool.execute(&json!({})).await;
        assert!(result.contains("'name'"));
    }

    #[tokio::test]
    async fn test_unconfigured_credentials_fall_back() {
        let tool = DowJonesScreenTool::new(DowJonesConfig::default());
        let result = tool.execute(&json!({"name": "Acme Holdings Ltd"})).await;
        assert_eq!(result, NOT_CONFIGURED_RESULT);
        assert!(result.contains("alternative"));
    }

    #[test]
    fn test_format_no_matches_is_explicit() {
        let body = json!({"data": [], "meta": {"total_count": 0}});
        let result = format_screening_result("John Smith", "PERSON", &body);
        assert!(result.contains("No matches found"));
        assert!(result.contains("John Smith"));
    }

    #[test]
    fn test_format_profiles() {
        let body = json!({
            "data": [{
                "id": "P-1234",
                "attributes": {
                    "primary_name": "ACME HOLDINGS LTD",
                    "entity_type": "COMPANY",
                    "categories": ["e_sl", "b_am"],
                    "score": 0.92,
                    "also_known_as": ["Acme Group"]
                }
            }],
            "meta": {"total_count": 1}
        });

        let result = format_screening_result("Acme Holdings Ltd", "COMPANY", &body);
        assert!(result.contains("1 potential match(es)"));
        assert!(result.contains("P-1234"));
        assert!(result.contains("e_sl, b_am"));
        assert!(result.contains("Acme Group"));
    }
}
