//! Session audit log
//!
//! Append-only record of every tool invocation in a research session, plus
//! session metadata. The driver is the only writer; downstream consumers
//! read it for display and export, never to steer the loop.

use crate::models::ToolInvocationRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Maximum characters kept of a tool result in its audit record.
pub const RESULT_PREVIEW_MAX_CHARS: usize = 400;

#[derive(Debug, Clone, Serialize)]
pub struct AuditLog {
    started_at: DateTime<Utc>,
    model_id: String,
    records: Vec<ToolInvocationRecord>,
}

impl AuditLog {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            started_at: Utc::now(),
            model_id: model_id.into(),
            records: Vec::new(),
        }
    }

    /// Append one record. Records are never mutated or removed afterwards.
    pub fn append(&mut self, record: ToolInvocationRecord) {
        debug_assert!(
            self.records
                .last()
                .map_or(true, |last| record.sequence > last.sequence),
            "audit sequence numbers must be strictly increasing"
        );
        self.records.push(record);
    }

    pub fn records(&self) -> &[ToolInvocationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Invocation counts aggregated by tool name.
    pub fn counts_by_tool(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for record in &self.records {
            *counts.entry(record.tool.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Total wall-clock time spent inside tool handlers.
    pub fn total_duration_ms(&self) -> u64 {
        self.records.iter().map(|r| r.duration_ms).sum()
    }
}

/// Bounded-length preview of a tool result, cut on a char boundary.
pub fn result_preview(result: &str) -> String {
    if result.chars().count() <= RESULT_PREVIEW_MAX_CHARS {
        return result.to_string();
    }
    let truncated: String = result.chars().take(RESULT_PREVIEW_MAX_CHARS).collect();
    format!("{}…", truncated)
}

/// SHA-256 digest of the final raw text, carried in exports so a reviewed
/// report can be tied back to the exact session output.
pub fn text_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(sequence: u32, tool: &str, duration_ms: u64) -> ToolInvocationRecord {
        ToolInvocationRecord {
            sequence,
            tool: tool.to_string(),
            input: json!({"query": "acme"}),
            timestamp: Utc::now(),
            duration_ms,
            result_preview: "ok".to_string(),
        }
    }

    #[test]
    fn test_aggregates() {
        let mut log = AuditLog::new("test-model");
        log.append(record(1, "dow_jones_screen", 120));
        log.append(record(2, "web_search", 80));
        log.append(record(3, "web_search", 100));

        assert_eq!(log.len(), 3);
        assert_eq!(log.total_duration_ms(), 300);

        let counts = log.counts_by_tool();
        assert_eq!(counts.get("web_search"), Some(&2));
        assert_eq!(counts.get("dow_jones_screen"), Some(&1));
    }

    #[test]
    fn test_preview_truncation() {
        let short = "no matches found";
        assert_eq!(result_preview(short), short);

        let long = "x".repeat(RESULT_PREVIEW_MAX_CHARS * 2);
        let preview = result_preview(&long);
        assert_eq!(preview.chars().count(), RESULT_PREVIEW_MAX_CHARS + 1);
        assert!(preview.ends_with('…'));
    }

    #[test]
    fn test_digest_is_stable() {
        let a = text_digest("final report text");
        let b = text_digest("final report text");
        assert_eq!(a, b);
        assert_ne!(a, text_digest("different text"));
        assert_eq!(a.len(), 64);
    }
}
