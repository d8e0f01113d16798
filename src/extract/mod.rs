//! Report extraction and repair
//!
//! Recovers a `StructuredReport` from the reasoning service's free-form
//! final text. The strategy is a fixed, ordered chain of pure repair passes,
//! each attempted only when the previous parse fails:
//!
//! 1. parse the text between the report envelope markers as-is
//! 2. strip surrounding markdown code fences and retry
//! 3. remove trailing commas before a closing brace/bracket and retry
//! 4. escape stray raw newlines inside string spans and retry
//! 5. with no markers at all, fall back to the outermost brace-balanced
//!    span containing the subject-identification anchor key and run the
//!    same repairs on it
//!
//! Total failure returns `None`; no report is ever synthesized.

use crate::models::StructuredReport;
use crate::prompts::{REPORT_BEGIN, REPORT_END};
use tracing::debug;

/// Required anchor key for the fallback span search.
const ANCHOR_KEY: &str = "\"subject_identification\"";

/// Extract a structured report from raw final text, or `None` when every
/// repair layer fails.
pub fn extract_report(raw: &str) -> Option<StructuredReport> {
    if let Some(payload) = delimited_payload(raw) {
        let report = parse_with_repairs(payload);
        if report.is_none() {
            debug!("Delimited report payload failed all repair layers");
        }
        return report;
    }

    debug!("No report envelope markers found, trying brace-balanced fallback");
    let span = balanced_anchor_span(raw)?;
    parse_with_repairs(span)
}

/// Text between the first opening marker and the next closing marker.
fn delimited_payload(raw: &str) -> Option<&str> {
    let start = raw.find(REPORT_BEGIN)? + REPORT_BEGIN.len();
    let end = raw[start..].find(REPORT_END)? + start;
    Some(&raw[start..end])
}

fn parse_with_repairs(payload: &str) -> Option<StructuredReport> {
    let trimmed = payload.trim();
    if let Ok(report) = serde_json::from_str(trimmed) {
        return Some(report);
    }

    let unfenced = strip_code_fences(trimmed);
    if let Ok(report) = serde_json::from_str(&unfenced) {
        return Some(report);
    }

    let decommaed = strip_trailing_commas(&unfenced);
    if let Ok(report) = serde_json::from_str(&decommaed) {
        return Some(report);
    }

    let unbroken = escape_raw_newlines(&decommaed);
    serde_json::from_str(&unbroken).ok()
}

/// Drop a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_fences(input: &str) -> String {
    input
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
        .to_string()
}

/// Remove commas whose next non-whitespace character closes an object or
/// array. String contents are left untouched. Running the pass twice on
/// already-repaired text changes nothing.
pub fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                let dangling = matches!(chars.get(j), Some('}') | Some(']'));
                if !dangling {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Escape raw newlines that appear inside string spans. Carriage returns
/// inside strings are dropped.
pub fn escape_raw_newlines(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in input.chars() {
        if in_string {
            if escaped {
                out.push(c);
                escaped = false;
                continue;
            }
            match c {
                '\\' => {
                    out.push(c);
                    escaped = true;
                }
                '"' => {
                    out.push(c);
                    in_string = false;
                }
                '\n' => out.push_str("\\n"),
                '\r' => {}
                _ => out.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
    }

    out
}

/// Outermost brace-balanced span containing the anchor key. Truncated
/// documents with no matching close brace yield `None`.
fn balanced_anchor_span(raw: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(rel) = raw[search_from..].find('{') {
        let start = search_from + rel;
        match matching_brace(raw, start) {
            Some(end) => {
                let candidate = &raw[start..=end];
                if candidate.contains(ANCHOR_KEY) {
                    return Some(candidate);
                }
                search_from = end + 1;
            }
            None => {
                search_from = start + 1;
            }
        }
    }
    None
}

/// Byte index of the brace closing the one at `open_idx`, ignoring braces
/// inside strings.
fn matching_brace(s: &str, open_idx: usize) -> Option<usize> {
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (off, c) in s[open_idx..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open_idx + off);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RiskLevel, StructuredReport};

    fn sample_report() -> StructuredReport {
        let mut report = StructuredReport::default();
        report.subject_identification.legal_name = Some("Acme Holdings Ltd".to_string());
        report.subject_identification.jurisdiction = Some("British Virgin Islands".to_string());
        report.risk_scoring.overall_score = 62;
        report.risk_scoring.risk_level = RiskLevel::High;
        report.risk_scoring.customer_risk.score = 70;
        report.risk_scoring.customer_risk.sanctions = 80;
        report.narrative = "Draft case narrative.".to_string();
        report
    }

    fn wrap(payload: &str) -> String {
        format!(
            "Research summary for the analyst.\n\n{}\n{}\n{}\n",
            REPORT_BEGIN, payload, REPORT_END
        )
    }

    #[test]
    fn test_round_trip_through_envelope() {
        let report = sample_report();
        let serialized = serde_json::to_string_pretty(&report).unwrap();
        let raw = wrap(&serialized);

        let extracted = extract_report(&raw).expect("round trip must parse");
        assert_eq!(extracted, report);
    }

    #[test]
    fn test_code_fence_and_trailing_comma_repaired() {
        // Scenario: the payload is fenced and has one trailing comma before
        // a closing brace. Layer 1 must fail; layers 2-3 must recover it.
        let payload = "```json\n{\n  \"subject_identification\": {\n    \"legal_name\": \"Acme Holdings Ltd\",\n  },\n  \"narrative\": \"ok\"\n}\n```";
        let raw = wrap(payload);

        assert!(serde_json::from_str::<StructuredReport>(payload).is_err());
        let extracted = extract_report(&raw).expect("repair layers must recover");
        assert_eq!(
            extracted.subject_identification.legal_name.as_deref(),
            Some("Acme Holdings Ltd")
        );
    }

    #[test]
    fn test_trailing_comma_pass_is_idempotent() {
        let broken = r#"{"a": [1, 2, ], "b": {"c": 3, }, }"#;
        let once = strip_trailing_commas(broken);
        let twice = strip_trailing_commas(&once);
        assert_eq!(once, twice);
        assert!(serde_json::from_str::<serde_json::Value>(&once).is_ok());
    }

    #[test]
    fn test_commas_inside_strings_survive() {
        let input = r#"{"note": "matches: OFAC, UN, EU, }"}"#;
        assert_eq!(strip_trailing_commas(input), input);
    }

    #[test]
    fn test_raw_newline_inside_string_repaired() {
        let payload = "{\"subject_identification\": {},\n \"narrative\": \"line one\nline two\"}";
        let raw = wrap(payload);

        let extracted = extract_report(&raw).expect("newline repair must recover");
        assert_eq!(extracted.narrative, "line one\nline two");
    }

    #[test]
    fn test_fallback_without_markers_uses_anchor_span() {
        let report = sample_report();
        let serialized = serde_json::to_string(&report).unwrap();
        let raw = format!(
            "The model forgot the markers. Here is the report:\n{}\nEnd of message.",
            serialized
        );

        let extracted = extract_report(&raw).expect("anchored fallback must parse");
        assert_eq!(extracted, report);
    }

    #[test]
    fn test_fallback_ignores_spans_without_anchor() {
        let raw = r#"Some context {"unrelated": 1} and then {"subject_identification": {"legal_name": "Acme"}, "narrative": "n"} trailing"#;
        let extracted = extract_report(raw).expect("second span carries the anchor");
        assert_eq!(
            extracted.subject_identification.legal_name.as_deref(),
            Some("Acme")
        );
    }

    #[test]
    fn test_unrecoverable_text_returns_none() {
        assert!(extract_report("no structured content here at all").is_none());
        // Truncated document: opening brace never closes.
        assert!(extract_report("{\"subject_identification\": {\"legal_name\": \"Acme\"").is_none());
    }
}
