use cdd_research_orchestrator::{
    agent::ResearchDriver,
    config::Settings,
    reasoning::AnthropicClient,
    tools::create_default_registry,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let settings = Settings::from_env()?;

    let mut args = std::env::args().skip(1);
    let Some(subject) = args.next() else {
        eprintln!("Usage: orchestrator <subject> [additional context]");
        std::process::exit(2);
    };
    let context = args.next();

    info!("CDD Research Orchestrator starting");

    // Create components
    let service = Arc::new(AnthropicClient::new(
        settings.anthropic_api_key.clone(),
        settings.model.clone(),
    ));
    let registry = create_default_registry(settings.dow_jones.clone());
    let driver = ResearchDriver::new(service, registry, settings.max_tool_calls);

    // Run the review session
    let outcome = driver.run(&subject, context.as_deref()).await;

    println!("\n=== CDD REVIEW OUTCOME ===");
    println!("Session:  {}", outcome.session_id);
    println!("Subject:  {}", outcome.subject);
    println!("Tool calls: {}", outcome.audit.len());

    match (&outcome.report, &outcome.reconciled) {
        (Some(report), Some(reconciled)) => {
            println!("\nReported overall score: {}", report.risk_scoring.overall_score);
            println!("Computed overall score: {}", reconciled.computed_overall);
            println!("Computed risk level:    {}", reconciled.computed_level);
            if reconciled.overall_discrepancy {
                println!("NOTE: computed and reported overall scores disagree.");
            }
            println!("\n{}", serde_json::to_string_pretty(&outcome)?);
        }
        _ => {
            println!("\nNo structured report could be extracted. Raw session text:\n");
            println!("{}", outcome.raw_text);
        }
    }

    Ok(())
}
