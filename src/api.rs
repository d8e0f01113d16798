//! REST API server for the CDD research orchestrator
//!
//! Exposes review sessions via HTTP endpoints
//! Integrates with compliance team tooling

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::agent::ResearchDriver;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReviewRequest {
    pub subject: String,
    pub context: Option<String>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub driver: Arc<ResearchDriver>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Review Endpoint
/// =============================

async fn run_review(
    State(state): State<ApiState>,
    Json(req): Json<ReviewRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let subject = req.subject.trim();
    if subject.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("A non-empty subject is required".into())),
        );
    }

    info!("Received review request for subject: {}", subject);

    let outcome = state.driver.run(subject, req.context.as_deref()).await;

    // A session with no extractable report is still a completed session:
    // the raw text and audit log go back for operator review.
    (StatusCode::OK, Json(ApiResponse::success(outcome)))
}

/// =============================
/// Router
/// =============================

pub fn create_router(driver: Arc<ResearchDriver>) -> Router {
    let state = ApiState { driver };

    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/api/review", post(run_review))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    driver: Arc<ResearchDriver>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(driver);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
