//! Core data models for the CDD research session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

//
// ================= Enums =================
//

/// Qualitative risk grade derived from a 0-100 score.
/// Bands: [0,25] Low, [26,50] Medium, [51,75] High, [76,100] Critical.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

/// Closed set of recommended onboarding actions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionLabel {
    Approve,
    ApproveWithConditions,
    EnhancedDueDiligence,
    Decline,
    #[default]
    EscalateForReview,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

//
// ================= Conversation =================
//

/// One atomic addition to the conversation history. Content is kept as the
/// raw block structure the reasoning service understands, so assistant
/// tool-use blocks and tool-result blocks survive the round trip verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: Value,
}

impl Turn {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Value::String(text.into()),
        }
    }

    pub fn assistant_blocks(content: Value) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// Aggregate tool-result turn: one user turn carrying every result block
    /// from the preceding assistant turn, in request order.
    pub fn tool_results(results: Vec<Value>) -> Self {
        Self {
            role: Role::User,
            content: Value::Array(results),
        }
    }
}

/// A single tool invocation requested by the reasoning service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// One `{name, description, input_schema}` triple sent to the reasoning
/// service each turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolContract {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

//
// ================= Audit =================
//

/// One row per dispatched tool call. Sequence numbers are strictly
/// increasing and equal the session tool-call counter at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocationRecord {
    pub sequence: u32,
    pub tool: String,
    pub input: Value,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub result_preview: String,
}

//
// ================= Structured Report =================
//

/// The target output shape the reasoning service must emit between the
/// report envelope markers. Unknown extra fields are tolerated and ignored;
/// missing optional fields default to null/empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StructuredReport {
    #[serde(default)]
    pub subject_identification: SubjectIdentification,
    #[serde(default)]
    pub risk_scoring: RiskScoring,
    #[serde(default)]
    pub risk_categories: RiskCategories,
    #[serde(default)]
    pub sources: Vec<SourceReference>,
    #[serde(default)]
    pub recommended_action: RecommendedAction,
    #[serde(default)]
    pub ongoing_monitoring: OngoingMonitoring,
    #[serde(default)]
    pub narrative: String,
}

/// Evidence found about the subject's identity. Every field is nullable:
/// absence means the research did not surface that datum.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubjectIdentification {
    #[serde(default)]
    pub legal_name: Option<String>,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub registered_address: Option<String>,
    #[serde(default)]
    pub incorporation_date: Option<String>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub company_type: Option<String>,
    #[serde(default)]
    pub lei: Option<String>,
    #[serde(default)]
    pub directors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RiskScoring {
    #[serde(default)]
    pub overall_score: u8,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub confidence: u8,
    #[serde(default)]
    pub customer_risk: CustomerRisk,
    #[serde(default)]
    pub matter_risk: MatterRisk,
    #[serde(default)]
    pub jurisdiction_risk: u8,
    #[serde(default)]
    pub delivery_channel_risk: u8,
    #[serde(default)]
    pub escalation_flags: Vec<String>,
    #[serde(default)]
    pub flag_override: bool,
}

/// Customer risk component: self-reported composite plus its five named
/// sub-factor scores. Missing sub-factors default to 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomerRisk {
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub sanctions: u8,
    #[serde(default)]
    pub pep: u8,
    #[serde(default)]
    pub adverse_media: u8,
    #[serde(default)]
    pub ownership_complexity: u8,
    #[serde(default)]
    pub identity_verification: u8,
}

/// Matter risk component: self-reported composite plus its three named
/// sub-factor scores.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatterRisk {
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub matter_type: u8,
    #[serde(default)]
    pub source_of_funds: u8,
    #[serde(default)]
    pub transaction_modifier: u8,
}

/// The six named category panels.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RiskCategories {
    #[serde(default)]
    pub identity: RiskCategory,
    #[serde(default)]
    pub sanctions: RiskCategory,
    #[serde(default)]
    pub pep: RiskCategory,
    #[serde(default)]
    pub adverse_media: RiskCategory,
    #[serde(default)]
    pub geographic: RiskCategory,
    #[serde(default)]
    pub ownership: RiskCategory,
}

/// One category panel. The evidence lists are category-specific: screening
/// categories populate `matches`, ownership populates `beneficial_owners`,
/// geography populates `jurisdictions`. Empty lists with an explicit
/// "no matches found" status are meaningful and must not be dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RiskCategory {
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub findings: String,
    #[serde(default)]
    pub matches: Vec<ListMatch>,
    #[serde(default)]
    pub beneficial_owners: Vec<BeneficialOwner>,
    #[serde(default)]
    pub jurisdictions: Vec<String>,
}

/// A sanctions/PEP/watch-list match surfaced during screening.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListMatch {
    #[serde(default)]
    pub list_name: String,
    #[serde(default)]
    pub matched_name: String,
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub listed_date: Option<String>,
    #[serde(default)]
    pub profile_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BeneficialOwner {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ownership_pct: Option<f64>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A cited evidence source: a screening run, a search query, or a fetched
/// page, with the one-line finding it supports.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceReference {
    #[serde(default)]
    pub source_type: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub finding: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecommendedAction {
    #[serde(default)]
    pub action: ActionLabel,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub edd_requirements: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OngoingMonitoring {
    #[serde(default)]
    pub review_frequency: String,
    #[serde(default)]
    pub transaction_flags: Vec<String>,
}

//
// ================= Reconciled Scores =================
//

/// Independently recomputed composites surfaced alongside the self-reported
/// ones. The self-reported values are never overwritten; discrepancy flags
/// fire when |computed - reported| > 5.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconciledScores {
    pub computed_customer_risk: u8,
    pub computed_matter_risk: u8,
    pub computed_overall: u8,
    pub computed_level: RiskLevel,
    pub reported_customer_risk: u8,
    pub reported_matter_risk: u8,
    pub reported_overall: u8,
    pub reported_level: RiskLevel,
    pub customer_discrepancy: bool,
    pub matter_discrepancy: bool,
    pub overall_discrepancy: bool,
}

//
// ================= Session Result =================
//

/// Everything a review session hands back to the caller. The session itself
/// is discarded once this is returned.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub session_id: Uuid,
    pub subject: String,
    pub report: Option<StructuredReport>,
    pub reconciled: Option<ReconciledScores>,
    pub raw_text: String,
    /// SHA-256 of `raw_text`, so an exported report can be tied back to the
    /// exact session output.
    pub raw_text_digest: String,
    pub audit: crate::audit::AuditLog,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionLabel::Approve => "Approve",
            ActionLabel::ApproveWithConditions => "Approve with conditions",
            ActionLabel::EnhancedDueDiligence => "Enhanced due diligence",
            ActionLabel::Decline => "Decline",
            ActionLabel::EscalateForReview => "Escalate for review",
        };
        write!(f, "{}", s)
    }
}
