//! Configuration surface
//!
//! Credentials resolve from a layered source: `.env` (via dotenv, loaded by
//! the binaries) and then the process environment. Absence of the optional
//! Dow Jones credentials degrades gracefully - the screening tool answers
//! with a "not configured" result instead of failing the session.

use crate::error::CddError;
use crate::Result;
use std::env;

/// Default cap on tool invocations per session, preventing runaway loops.
pub const DEFAULT_MAX_TOOL_CALLS: u32 = 25;

/// Default reasoning service model identifier.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Debug, Clone)]
pub struct Settings {
    pub anthropic_api_key: String,
    pub model: String,
    pub max_tool_calls: u32,
    pub dow_jones: DowJonesConfig,
}

/// Dow Jones R&C credentials: either a direct API key or an OAuth2
/// client-credentials pair. Both optional.
#[derive(Debug, Clone, Default)]
pub struct DowJonesConfig {
    pub api_key: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl DowJonesConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: non_empty_var("DOWJONES_API_KEY"),
            client_id: non_empty_var("DOWJONES_CLIENT_ID"),
            client_secret: non_empty_var("DOWJONES_CLIENT_SECRET"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() || (self.client_id.is_some() && self.client_secret.is_some())
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let anthropic_api_key = non_empty_var("ANTHROPIC_API_KEY").ok_or_else(|| {
            CddError::ConfigError(
                "ANTHROPIC_API_KEY not set. Add it to .env or the environment.".to_string(),
            )
        })?;

        let model = non_empty_var("CDD_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_tool_calls = non_empty_var("CDD_MAX_TOOL_CALLS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_TOOL_CALLS);

        Ok(Self {
            anthropic_api_key,
            model,
            max_tool_calls,
            dow_jones: DowJonesConfig::from_env(),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
