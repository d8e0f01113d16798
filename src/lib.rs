//! CDD Research Orchestrator
//!
//! A customer due diligence research agent that:
//! - Drives a bounded tool-use conversation with a reasoning service
//! - Screens subjects against Dow Jones R&C, web search, and page fetches
//! - Extracts a structured risk report through layered JSON repair
//! - Recomputes risk composites deterministically and flags discrepancies
//! - Records every tool invocation in a per-session audit log
//!
//! SESSION SHAPE:
//! SEED → (REASON → DISPATCH TOOLS)* → FINAL TEXT → EXTRACT → RECONCILE

pub mod agent;
pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod prompts;
pub mod reasoning;
pub mod scoring;
pub mod tools;

pub use error::Result;

// Re-export common types
pub use models::*;
