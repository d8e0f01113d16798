//! Tool trait and registry
//!
//! Research tools are the only external collaborators the loop dispatches
//! to. Handlers never fail: any internal problem (network, parse, missing
//! credential) is converted into a human-readable result string so the
//! conversation always progresses.

use crate::config::DowJonesConfig;
use crate::models::{ToolContract, ToolRequest};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub mod screening;
pub mod search;
pub mod webpage;

pub use screening::DowJonesScreenTool;
pub use search::WebSearchTool;
pub use webpage::FetchWebpageTool;

/// Fixed result content for a request naming a tool outside the registry.
/// The session continues; the call is still audited.
pub const UNKNOWN_TOOL_RESULT: &str =
    "Unknown tool. Only dow_jones_screen, web_search and fetch_webpage are available.";

/// Closed set of dispatchable tools. Free-form tool-name strings parse into
/// this; an unparseable name is a defined case, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    DowJonesScreen,
    WebSearch,
    FetchWebpage,
}

impl ToolKind {
    /// Contract emission order, kept stable across sessions.
    pub const ALL: [ToolKind; 3] = [
        ToolKind::DowJonesScreen,
        ToolKind::WebSearch,
        ToolKind::FetchWebpage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::DowJonesScreen => "dow_jones_screen",
            ToolKind::WebSearch => "web_search",
            ToolKind::FetchWebpage => "fetch_webpage",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dow_jones_screen" => Some(ToolKind::DowJonesScreen),
            "web_search" => Some(ToolKind::WebSearch),
            "fetch_webpage" => Some(ToolKind::FetchWebpage),
            _ => None,
        }
    }
}

/// Trait for a single research tool.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> Value;

    /// Run the tool. Infallible by contract: errors come back as
    /// descriptive result text.
    async fn execute(&self, input: &Value) -> String;
}

/// Enum-keyed dispatch table built at startup.
pub struct ToolRegistry {
    tools: HashMap<ToolKind, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.kind(), tool);
    }

    pub fn get(&self, kind: ToolKind) -> Option<Arc<dyn Tool>> {
        self.tools.get(&kind).cloned()
    }

    /// The ordered `{name, description, input_schema}` set sent to the
    /// reasoning service each turn.
    pub fn contracts(&self) -> Vec<ToolContract> {
        ToolKind::ALL
            .iter()
            .filter_map(|kind| self.tools.get(kind))
            .map(|tool| ToolContract {
                name: tool.kind().name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect()
    }

    /// Dispatch one requested call. Unknown or unregistered tool names
    /// yield the fixed unknown-tool result string.
    pub async fn dispatch(&self, request: &ToolRequest) -> String {
        let handler = ToolKind::from_name(&request.name).and_then(|kind| self.get(kind));
        match handler {
            Some(tool) => tool.execute(&request.input).await,
            None => UNKNOWN_TOOL_RESULT.to_string(),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the default registry with the three research tools.
pub fn create_default_registry(dow_jones: DowJonesConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(DowJonesScreenTool::new(dow_jones)));
    registry.register(Arc::new(WebSearchTool::new()));
    registry.register(Arc::new(FetchWebpageTool::new()));
    registry
}
