use cdd_research_orchestrator::{
    agent::ResearchDriver,
    api::start_server,
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

    let api_port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("CDD Research Orchestrator - API server");
    info!("Port: {}", api_port);
    info!("Model: {}", settings.model);

    // Create components
    let service = Arc::new(AnthropicClient::new(
        settings.anthropic_api_key.clone(),
        settings.model.clone(),
    ));
    let registry = create_default_registry(settings.dow_jones.clone());
    let driver = Arc::new(ResearchDriver::new(
        service,
        registry,
        settings.max_tool_calls,
    ));

    info!("Driver initialized, starting API server");

    start_server(driver, api_port).await?;

    Ok(())
}
