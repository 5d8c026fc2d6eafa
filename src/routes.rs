//! HTTP surface — webhook verification and delivery, outbound sends,
//! catalog refresh.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::channels::{OutboundSender, WebhookPayload, parse_inbound};
use crate::pipeline::PipelineCoordinator;

/// Shared state for the HTTP routes.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<PipelineCoordinator>,
    pub sender: Arc<dyn OutboundSender>,
    pub verify_token: String,
}

/// Build the service router.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .route("/messages", post(send_message))
        .route("/catalog/refresh", post(refresh_catalog))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /webhook — subscription verification handshake.
///
/// Echoes `hub.challenge` when the mode is `subscribe` and the token
/// matches; 403 otherwise.
async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token").map(String::as_str);
    let challenge = params.get("hub.challenge").cloned().unwrap_or_default();

    if mode == Some("subscribe") && token == Some(state.verify_token.as_str()) {
        info!("Webhook verified");
        (StatusCode::OK, challenge)
    } else {
        warn!(?mode, "Webhook verification rejected");
        (StatusCode::FORBIDDEN, String::new())
    }
}

/// POST /webhook — one inbound message delivery.
///
/// Pipeline failures surface as 422 with the error text; deliveries
/// without a recognizable message are 422 "message missing"; anything
/// the pipeline handled (including unsupported kinds) is 200.
async fn receive_webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> impl IntoResponse {
    if payload.object.is_none() {
        return (StatusCode::OK, String::new());
    }

    let message = match parse_inbound(&payload) {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "Rejected webhook delivery");
            return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
        }
    };

    match state.coordinator.process_inbound(&message).await {
        Ok(_) => (StatusCode::OK, String::new()),
        Err(e) => {
            warn!(id = %message.id, error = %e, "Pipeline failed for inbound message");
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    to: String,
    body: String,
}

/// POST /messages — independent outbound send capability.
async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> impl IntoResponse {
    match state.sender.send_text(&req.to, &req.body).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
    }
}

/// POST /catalog/refresh — refetch the product feed and rebuild the index.
async fn refresh_catalog(State(state): State<AppState>) -> impl IntoResponse {
    match state.coordinator.refresh_catalog().await {
        Ok(count) => Json(serde_json::json!({ "products": count })).into_response(),
        Err(e) => {
            warn!(error = %e, "Catalog refresh failed");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}
