//! API routes for verifaid

use crate::agents::AgentCatalog;
use crate::error::GatewayError;
use crate::server::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::info;
use verifai_shared::{FeedbackRequest, MessageResponse, VerificationRequest, VerificationResult};

type AppStateArc = Arc<AppState>;

pub const WELCOME_MESSAGE: &str = "Welcome to the VerifAi Backend API. POST /verify to check an item and GET /agents to list the available verification agents.";

pub const FEEDBACK_ACK: &str = "Feedback received successfully!";

// ============================================================================
// Info Routes
// ============================================================================

pub fn info_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/", get(read_root))
        .route("/agents", get(list_agents))
}

async fn read_root() -> Json<MessageResponse> {
    Json(MessageResponse::new(WELCOME_MESSAGE))
}

async fn list_agents(State(state): State<AppStateArc>) -> Json<AgentCatalog> {
    Json(state.gateway.catalog().clone())
}

// ============================================================================
// Verification Routes
// ============================================================================

pub fn verify_routes() -> Router<AppStateArc> {
    Router::new().route("/verify", post(verify_item))
}

async fn verify_item(
    State(state): State<AppStateArc>,
    Json(req): Json<VerificationRequest>,
) -> Result<Json<VerificationResult>, GatewayError> {
    state.gateway.verify(req).await.map(Json)
}

// ============================================================================
// Feedback Routes
// ============================================================================

pub fn feedback_routes() -> Router<AppStateArc> {
    Router::new().route("/feedback", post(receive_feedback))
}

/// Feedback is logged and acknowledged; nothing is stored.
async fn receive_feedback(Json(feedback): Json<FeedbackRequest>) -> Json<MessageResponse> {
    info!(
        verification_id = %feedback.verification_id,
        is_helpful = feedback.is_helpful,
        user_id = ?feedback.user_id,
        "Received feedback"
    );
    Json(MessageResponse::new(FEEDBACK_ACK))
}
