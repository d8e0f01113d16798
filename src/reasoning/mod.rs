//! Reasoning service seam
//!
//! The driver talks to the generative reasoning service only through the
//! `ReasoningService` trait, so sessions can run against the live Anthropic
//! client or against a scripted double in tests.

use crate::models::{ToolContract, ToolRequest, Turn};
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub mod anthropic;
pub use anthropic::AnthropicClient;

/// One reply from the reasoning service, already classified into the three
/// signals the loop distinguishes.
#[derive(Debug, Clone)]
pub enum AssistantReply {
    /// The service considers the research finished.
    FinalAnswer { text: String },
    /// The service wants tools run. `content` holds the raw assistant
    /// blocks so the turn can be replayed verbatim; `requests` are the
    /// tool-use blocks in emitted order.
    ToolRequests {
        text: Option<String>,
        content: Value,
        requests: Vec<ToolRequest>,
    },
    /// Anything else (malformed or unknown stop signal). Treated by the
    /// driver as a budget-style exit, not an error.
    Other {
        reason: String,
        text: Option<String>,
    },
}

impl AssistantReply {
    /// Build a tool-request reply from `(id, name, input)` triples,
    /// synthesizing the assistant content blocks. Used by tests and tooling.
    pub fn tool_requests(requests: Vec<(String, String, Value)>) -> Self {
        let blocks: Vec<Value> = requests
            .iter()
            .map(|(id, name, input)| {
                json!({"type": "tool_use", "id": id, "name": name, "input": input})
            })
            .collect();
        let requests = requests
            .into_iter()
            .map(|(id, name, input)| ToolRequest { id, name, input })
            .collect();
        Self::ToolRequests {
            text: None,
            content: Value::Array(blocks),
            requests,
        }
    }
}

#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Model/service identifier recorded in the audit log metadata.
    fn model_id(&self) -> &str;

    /// Send the full turn history plus the tool contract set and classify
    /// the response.
    async fn complete(
        &self,
        system: &str,
        turns: &[Turn],
        tools: &[ToolContract],
    ) -> Result<AssistantReply>;
}

/// Scripted service double for development and testing. Replies are served
/// in order; once the script is exhausted the last reply repeats, which
/// makes unbounded-request scenarios (budget tests) trivial to express.
pub struct ScriptedReasoner {
    replies: Mutex<VecDeque<AssistantReply>>,
    last: Mutex<Option<AssistantReply>>,
    repeat_last: bool,
    calls: AtomicUsize,
}

impl ScriptedReasoner {
    pub fn new(replies: Vec<AssistantReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            repeat_last: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Like `new`, but once the script runs out every further completion
    /// errors instead of repeating the last reply. Models a transport
    /// failure at a chosen point in the session.
    pub fn failing_after(replies: Vec<AssistantReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            repeat_last: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of completions served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReasoningService for ScriptedReasoner {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _system: &str,
        _turns: &[Turn],
        _tools: &[ToolContract],
    ) -> Result<AssistantReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut replies = self.replies.lock().expect("script lock poisoned");
        if let Some(reply) = replies.pop_front() {
            *self.last.lock().expect("script lock poisoned") = Some(reply.clone());
            return Ok(reply);
        }
        drop(replies);

        if self.repeat_last {
            if let Some(reply) = self.last.lock().expect("script lock poisoned").clone() {
                return Ok(reply);
            }
        }

        Err(crate::error::CddError::ReasoningError(
            "scripted reasoner has no replies".into(),
        ))
    }
}
