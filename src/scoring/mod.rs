//! Risk score reconciliation
//!
//! Deterministic recomputation of the weighted composite scores from the
//! report's declared sub-factors. The self-reported values are never
//! overwritten; computed values are surfaced alongside them with a
//! discrepancy flag whenever the two disagree by more than the tolerance.
//!
//! Weights are fixed and not configurable at call time.

use crate::models::{CustomerRisk, MatterRisk, ReconciledScores, RiskLevel, StructuredReport};

// Customer risk sub-factor weights (sum to 1.0).
const W_SANCTIONS: f64 = 0.30;
const W_PEP: f64 = 0.25;
const W_ADVERSE_MEDIA: f64 = 0.20;
const W_OWNERSHIP: f64 = 0.15;
const W_IDENTITY: f64 = 0.10;

// Matter risk sub-factor weights (sum to 1.0).
const W_MATTER_TYPE: f64 = 0.40;
const W_SOURCE_OF_FUNDS: f64 = 0.40;
const W_TRANSACTION: f64 = 0.20;

// Overall composite weights over the self-reported component scores.
const W_CUSTOMER: f64 = 0.40;
const W_MATTER: f64 = 0.35;
const W_JURISDICTION: f64 = 0.20;
const W_DELIVERY_CHANNEL: f64 = 0.05;

/// Maximum |computed - reported| difference that does not raise a flag.
const DISCREPANCY_TOLERANCE: u8 = 5;

/// Recompute all composites and compare them against the self-reported
/// scores. Pure; no I/O. Missing sub-factors have already defaulted to 0 at
/// deserialization time.
pub fn reconcile(report: &StructuredReport) -> ReconciledScores {
    let scoring = &report.risk_scoring;

    let computed_customer = customer_composite(&scoring.customer_risk);
    let computed_matter = matter_composite(&scoring.matter_risk);
    let computed_overall = overall_composite(
        scoring.customer_risk.score,
        scoring.matter_risk.score,
        scoring.jurisdiction_risk,
        scoring.delivery_channel_risk,
    );

    ReconciledScores {
        computed_customer_risk: computed_customer,
        computed_matter_risk: computed_matter,
        computed_overall,
        computed_level: risk_level(computed_overall),
        reported_customer_risk: scoring.customer_risk.score,
        reported_matter_risk: scoring.matter_risk.score,
        reported_overall: scoring.overall_score,
        reported_level: scoring.risk_level,
        customer_discrepancy: disagrees(computed_customer, scoring.customer_risk.score),
        matter_discrepancy: disagrees(computed_matter, scoring.matter_risk.score),
        overall_discrepancy: disagrees(computed_overall, scoring.overall_score),
    }
}

/// 0.30*sanctions + 0.25*pep + 0.20*adverse_media +
/// 0.15*ownership_complexity + 0.10*identity_verification
pub fn customer_composite(c: &CustomerRisk) -> u8 {
    round_half_up(
        W_SANCTIONS * f64::from(c.sanctions)
            + W_PEP * f64::from(c.pep)
            + W_ADVERSE_MEDIA * f64::from(c.adverse_media)
            + W_OWNERSHIP * f64::from(c.ownership_complexity)
            + W_IDENTITY * f64::from(c.identity_verification),
    )
}

/// 0.40*matter_type + 0.40*source_of_funds + 0.20*transaction_modifier
pub fn matter_composite(m: &MatterRisk) -> u8 {
    round_half_up(
        W_MATTER_TYPE * f64::from(m.matter_type)
            + W_SOURCE_OF_FUNDS * f64::from(m.source_of_funds)
            + W_TRANSACTION * f64::from(m.transaction_modifier),
    )
}

/// Overall composite over the self-reported component scores plus the two
/// standalone factors.
pub fn overall_composite(customer: u8, matter: u8, jurisdiction: u8, delivery_channel: u8) -> u8 {
    round_half_up(
        W_CUSTOMER * f64::from(customer)
            + W_MATTER * f64::from(matter)
            + W_JURISDICTION * f64::from(jurisdiction)
            + W_DELIVERY_CHANNEL * f64::from(delivery_channel),
    )
}

/// Qualitative grade. Four contiguous bands, no overlap, no gap.
pub fn risk_level(score: u8) -> RiskLevel {
    match score {
        0..=25 => RiskLevel::Low,
        26..=50 => RiskLevel::Medium,
        51..=75 => RiskLevel::High,
        _ => RiskLevel::Critical,
    }
}

fn disagrees(computed: u8, reported: u8) -> bool {
    let diff = i16::from(computed) - i16::from(reported);
    diff.abs() > i16::from(DISCREPANCY_TOLERANCE)
}

/// Nearest-integer rounding with ties rounding up, clamped to [0,100].
fn round_half_up(value: f64) -> u8 {
    (value + 0.5).floor().clamp(0.0, 100.0) as u8
}
