//! Conversation driver - the bounded research loop
//!
//! Owns the running turn history, enforces the tool-call budget, dispatches
//! tool requests through the registry, and records every invocation to the
//! session audit log. Whatever happens, the session concludes with a
//! `ReviewOutcome`; failures degrade to a null report plus raw text, never
//! to a propagated error.

use crate::audit::{result_preview, text_digest, AuditLog};
use crate::extract::extract_report;
use crate::models::{ReviewOutcome, StructuredReport, ToolContract, ToolInvocationRecord, Turn};
use crate::prompts::{CORRECTIVE_INSTRUCTION, SYSTEM_PROMPT};
use crate::reasoning::{AssistantReply, ReasoningService};
use crate::scoring::reconcile;
use crate::tools::ToolRegistry;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct ResearchDriver {
    service: Arc<dyn ReasoningService>,
    registry: ToolRegistry,
    budget: u32,
}

impl ResearchDriver {
    pub fn new(service: Arc<dyn ReasoningService>, registry: ToolRegistry, budget: u32) -> Self {
        Self {
            service,
            registry,
            budget,
        }
    }

    /// Run one research session. Terminates within `budget + 2` reasoning
    /// service calls: at most `budget + 1` loop iterations plus one
    /// corrective round-trip.
    pub async fn run(&self, subject: &str, context: Option<&str>) -> ReviewOutcome {
        let session_id = Uuid::new_v4();
        let contracts = self.registry.contracts();
        let mut audit = AuditLog::new(self.service.model_id());

        let mut turns = vec![Turn::user_text(seed_message(subject, context))];
        let mut tool_calls: u32 = 0;
        let mut final_text = String::new();
        let mut finished = false;

        info!(
            %session_id,
            subject,
            budget = self.budget,
            "Starting CDD research session"
        );

        while tool_calls <= self.budget {
            let reply = match self
                .service
                .complete(SYSTEM_PROMPT, &turns, &contracts)
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(%session_id, error = %e, "Reasoning service call failed, concluding session");
                    break;
                }
            };

            match reply {
                AssistantReply::FinalAnswer { text } => {
                    final_text = text;
                    finished = true;
                    break;
                }
                AssistantReply::ToolRequests {
                    text,
                    content,
                    requests,
                } => {
                    if let Some(text) = text {
                        // Keep the latest assistant prose so a budget exit
                        // still has something to extract from.
                        final_text = text;
                    }
                    if requests.is_empty() {
                        warn!(%session_id, "Tool-use signal carried no requests, concluding session");
                        break;
                    }

                    turns.push(Turn::assistant_blocks(content));

                    // Every call already requested is dispatched, in emitted
                    // order, even when the budget is crossed mid-turn. The
                    // budget is re-checked at the top of the next iteration.
                    let mut results = Vec::with_capacity(requests.len());
                    for request in requests {
                        tool_calls += 1;
                        debug!(
                            %session_id,
                            sequence = tool_calls,
                            tool = %request.name,
                            "Dispatching tool call"
                        );

                        let started = Instant::now();
                        let output = self.registry.dispatch(&request).await;
                        let duration_ms = started.elapsed().as_millis() as u64;

                        audit.append(ToolInvocationRecord {
                            sequence: tool_calls,
                            tool: request.name.clone(),
                            input: request.input.clone(),
                            timestamp: Utc::now(),
                            duration_ms,
                            result_preview: result_preview(&output),
                        });

                        results.push(json!({
                            "type": "tool_result",
                            "tool_use_id": request.id,
                            "content": output,
                        }));
                    }
                    turns.push(Turn::tool_results(results));
                }
                AssistantReply::Other { reason, text } => {
                    if let Some(text) = text {
                        final_text = text;
                    }
                    warn!(%session_id, reason, "Unexpected reasoning signal, concluding session");
                    break;
                }
            }
        }

        if !finished && tool_calls > self.budget {
            info!(
                %session_id,
                tool_calls,
                "Tool-call budget exhausted, extracting from partial research"
            );
        }

        let mut report = extract_report(&final_text);

        if report.is_none() && finished && !final_text.trim().is_empty() {
            report = self
                .corrective_round_trip(session_id, &mut turns, &final_text, &contracts)
                .await;
        }

        if report.is_none() {
            warn!(
                %session_id,
                "No structured report could be extracted; returning raw text for operator review"
            );
        }

        let reconciled = report.as_ref().map(reconcile);

        info!(
            %session_id,
            tool_calls = audit.len(),
            extracted = report.is_some(),
            "Research session complete"
        );

        ReviewOutcome {
            session_id,
            subject: subject.to_string(),
            report,
            reconciled,
            raw_text_digest: text_digest(&final_text),
            raw_text: final_text,
            audit,
        }
    }

    /// Exactly one extra request replaying the conversation with an
    /// instruction to re-emit only the structured payload. No further
    /// retries.
    async fn corrective_round_trip(
        &self,
        session_id: Uuid,
        turns: &mut Vec<Turn>,
        final_text: &str,
        contracts: &[ToolContract],
    ) -> Option<StructuredReport> {
        info!(%session_id, "Extraction failed, issuing one corrective round-trip");

        turns.push(Turn::assistant_blocks(Value::String(final_text.to_string())));
        turns.push(Turn::user_text(CORRECTIVE_INSTRUCTION));

        let reply = match self.service.complete(SYSTEM_PROMPT, turns, contracts).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(%session_id, error = %e, "Corrective round-trip failed");
                return None;
            }
        };

        let text = match reply {
            AssistantReply::FinalAnswer { text } => Some(text),
            AssistantReply::ToolRequests { text, .. } => text,
            AssistantReply::Other { text, .. } => text,
        }?;

        extract_report(&text)
    }
}

fn seed_message(subject: &str, context: Option<&str>) -> String {
    let mut message = format!("Subject to review: {}", subject);
    if let Some(ctx) = context.map(str::trim).filter(|c| !c.is_empty()) {
        message.push_str("\n\nAdditional context provided by analyst:\n");
        message.push_str(ctx);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DowJonesConfig;
    use crate::models::{RiskLevel, StructuredReport};
    use crate::prompts::{REPORT_BEGIN, REPORT_END};
    use crate::reasoning::ScriptedReasoner;
    use crate::tools::{create_default_registry, UNKNOWN_TOOL_RESULT};

    fn driver(replies: Vec<AssistantReply>, budget: u32) -> (Arc<ScriptedReasoner>, ResearchDriver) {
        let service = Arc::new(ScriptedReasoner::new(replies));
        let registry = create_default_registry(DowJonesConfig::default());
        let driver = ResearchDriver::new(service.clone(), registry, budget);
        (service, driver)
    }

    fn final_answer_with_report() -> AssistantReply {
        let mut report = StructuredReport::default();
        report.subject_identification.legal_name = Some("Acme Holdings Ltd".to_string());
        report.risk_scoring.overall_score = 30;
        report.risk_scoring.risk_level = RiskLevel::Medium;
        let payload = serde_json::to_string(&report).unwrap();
        AssistantReply::FinalAnswer {
            text: format!("Research done.\n{}\n{}\n{}", REPORT_BEGIN, payload, REPORT_END),
        }
    }

    fn screen_request(id: &str) -> (String, String, Value) {
        (
            id.to_string(),
            "dow_jones_screen".to_string(),
            json!({"name": "Acme Holdings Ltd"}),
        )
    }

    #[tokio::test]
    async fn test_zero_budget_returns_immediately() {
        // Budget 0, no grounding evidence possible: one seed call, empty
        // audit log, extraction attempted on whatever text exists.
        let (service, driver) = driver(
            vec![AssistantReply::FinalAnswer {
                text: "I was unable to research Acme Holdings Ltd.".to_string(),
            }],
            0,
        );

        let outcome = driver.run("Acme Holdings Ltd", None).await;

        assert!(outcome.report.is_none());
        assert!(outcome.audit.is_empty());
        assert!(outcome.raw_text.contains("Acme Holdings Ltd"));
        // Seed call plus the one corrective round-trip: within budget + 2.
        assert!(service.calls() <= 2);
    }

    #[tokio::test]
    async fn test_loop_terminates_within_budget_plus_two() {
        // The scripted service requests tools forever; the loop must stop
        // once the counter passes the budget.
        for budget in [0u32, 1, 3, 7] {
            let (service, driver) = driver(
                vec![AssistantReply::tool_requests(vec![screen_request("tu_1")])],
                budget,
            );

            let outcome = driver.run("Acme Holdings Ltd", None).await;

            assert_eq!(outcome.audit.len() as u32, budget + 1);
            assert!(service.calls() as u32 <= budget + 2);
            assert!(outcome.report.is_none());
        }
    }

    #[tokio::test]
    async fn test_mid_turn_overrun_finishes_the_turn() {
        // Budget 1, but one turn requests three calls: all three must be
        // dispatched before the budget check stops the loop.
        let (service, driver) = driver(
            vec![AssistantReply::tool_requests(vec![
                screen_request("tu_1"),
                screen_request("tu_2"),
                screen_request("tu_3"),
            ])],
            1,
        );

        let outcome = driver.run("Acme Holdings Ltd", None).await;

        assert_eq!(outcome.audit.len(), 3);
        assert_eq!(service.calls(), 1);
        let sequences: Vec<u32> = outcome.audit.records().iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_audited_and_session_continues() {
        let (_, driver) = driver(
            vec![
                AssistantReply::tool_requests(vec![(
                    "tu_1".to_string(),
                    "crystal_ball".to_string(),
                    json!({"question": "is this customer risky?"}),
                )]),
                final_answer_with_report(),
            ],
            5,
        );

        let outcome = driver.run("Acme Holdings Ltd", None).await;

        assert_eq!(outcome.audit.len(), 1);
        let record = &outcome.audit.records()[0];
        assert_eq!(record.tool, "crystal_ball");
        assert_eq!(record.result_preview, UNKNOWN_TOOL_RESULT);
        assert!(outcome.report.is_some());
    }

    #[tokio::test]
    async fn test_dispatch_order_matches_request_order() {
        let (_, driver) = driver(
            vec![
                AssistantReply::tool_requests(vec![
                    screen_request("tu_1"),
                    (
                        "tu_2".to_string(),
                        "crystal_ball".to_string(),
                        json!({}),
                    ),
                ]),
                final_answer_with_report(),
            ],
            5,
        );

        let outcome = driver.run("Acme Holdings Ltd", None).await;

        let tools: Vec<&str> = outcome
            .audit
            .records()
            .iter()
            .map(|r| r.tool.as_str())
            .collect();
        assert_eq!(tools, vec!["dow_jones_screen", "crystal_ball"]);
    }

    #[tokio::test]
    async fn test_corrective_round_trip_recovers_report() {
        let (service, driver) = driver(
            vec![
                AssistantReply::FinalAnswer {
                    text: "Here is the report but I forgot the envelope entirely.".to_string(),
                },
                final_answer_with_report(),
            ],
            5,
        );

        let outcome = driver.run("Acme Holdings Ltd", None).await;

        assert_eq!(service.calls(), 2);
        let report = outcome.report.expect("corrective pass must recover");
        assert_eq!(
            report.subject_identification.legal_name.as_deref(),
            Some("Acme Holdings Ltd")
        );
        // Raw text stays what the loop actually ended on.
        assert!(outcome.raw_text.contains("forgot the envelope"));
        assert!(outcome.reconciled.is_some());
    }

    #[tokio::test]
    async fn test_service_failure_mid_loop_keeps_text_and_audit() {
        // One tool-use turn succeeds, then the transport fails. The session
        // must conclude with the prior text and audit intact, not panic or
        // propagate.
        let first_reply = match AssistantReply::tool_requests(vec![screen_request("tu_1")]) {
            AssistantReply::ToolRequests {
                content, requests, ..
            } => AssistantReply::ToolRequests {
                text: Some("Initial screening notes for Acme Holdings Ltd.".to_string()),
                content,
                requests,
            },
            other => panic!("unexpected reply shape {:?}", other),
        };

        let service = Arc::new(ScriptedReasoner::failing_after(vec![first_reply]));
        let registry = create_default_registry(DowJonesConfig::default());
        let driver = ResearchDriver::new(service.clone(), registry, 5);

        let outcome = driver.run("Acme Holdings Ltd", None).await;

        assert_eq!(service.calls(), 2);
        assert_eq!(outcome.audit.len(), 1);
        assert!(outcome.raw_text.contains("Initial screening notes"));
        assert!(outcome.report.is_none());
    }

    #[tokio::test]
    async fn test_service_failure_on_seed_call_still_returns_outcome() {
        let service = Arc::new(ScriptedReasoner::failing_after(vec![]));
        let registry = create_default_registry(DowJonesConfig::default());
        let driver = ResearchDriver::new(service.clone(), registry, 5);

        let outcome = driver.run("Acme Holdings Ltd", None).await;

        assert_eq!(service.calls(), 1);
        assert!(outcome.audit.is_empty());
        assert!(outcome.raw_text.is_empty());
        assert!(outcome.report.is_none());
        assert!(outcome.reconciled.is_none());
    }

    #[tokio::test]
    async fn test_corrective_round_trip_failure_degrades_to_null_report() {
        // Final answer without a parseable payload, then the corrective
        // request itself fails: the outcome degrades to raw text only.
        let service = Arc::new(ScriptedReasoner::failing_after(vec![
            AssistantReply::FinalAnswer {
                text: "Findings were written up in prose only.".to_string(),
            },
        ]));
        let registry = create_default_registry(DowJonesConfig::default());
        let driver = ResearchDriver::new(service.clone(), registry, 5);

        let outcome = driver.run("Acme Holdings Ltd", None).await;

        assert_eq!(service.calls(), 2);
        assert!(outcome.report.is_none());
        assert!(outcome.reconciled.is_none());
        assert!(outcome.raw_text.contains("prose only"));
    }

    #[tokio::test]
    async fn test_empty_request_list_keeps_reply_text() {
        // Degenerate tool-use reply with prose but zero requests: the
        // session concludes and the prose still reaches extraction.
        let service = Arc::new(ScriptedReasoner::new(vec![AssistantReply::ToolRequests {
            text: Some("Nothing further to dispatch for Acme Holdings Ltd.".to_string()),
            content: Value::Array(vec![]),
            requests: vec![],
        }]));
        let registry = create_default_registry(DowJonesConfig::default());
        let driver = ResearchDriver::new(service.clone(), registry, 5);

        let outcome = driver.run("Acme Holdings Ltd", None).await;

        assert_eq!(service.calls(), 1);
        assert!(outcome.audit.is_empty());
        assert!(outcome.raw_text.contains("Nothing further to dispatch"));
    }

    #[tokio::test]
    async fn test_unknown_signal_is_budget_style_exit() {
        let (service, driver) = driver(
            vec![AssistantReply::Other {
                reason: "max_tokens".to_string(),
                text: Some("Partial analysis of Acme Holdings Ltd...".to_string()),
            }],
            5,
        );

        let outcome = driver.run("Acme Holdings Ltd", None).await;

        // Not a final-answer exit: no corrective round-trip is permitted.
        assert_eq!(service.calls(), 1);
        assert!(outcome.report.is_none());
        assert!(outcome.raw_text.contains("Partial analysis"));
    }

    #[test]
    fn test_seed_message_includes_context() {
        let seed = seed_message("Acme Holdings Ltd", Some("Jurisdiction: BVI"));
        assert!(seed.starts_with("Subject to review: Acme Holdings Ltd"));
        assert!(seed.contains("Jurisdiction: BVI"));

        let bare = seed_message("Acme Holdings Ltd", Some("   "));
        assert!(!bare.contains("Additional context"));
    }
}
