//! Webhook handlers: inbound transport events and login callbacks.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

use tandem_types::event::InboundEvent;
use tandem_types::user::Role;

use crate::http::error::AppError;
use crate::state::AppState;

/// POST /api/v1/events -- one inbound event from the transport.
///
/// Always acks with 200 once the envelope validates; dispatch failures are
/// handled (and answered to the user) inside the engine, so the transport
/// never retries and duplicates an event.
pub async fn ingest_event(
    State(state): State<AppState>,
    Json(envelope): Json<InboundEvent>,
) -> Result<Json<Value>, AppError> {
    if envelope.user_id <= 0 {
        return Err(AppError::Validation("user_id must be positive".to_string()));
    }
    tracing::debug!(event_id = %envelope.id, user_id = envelope.user_id, "inbound event");
    state.engine.handle_event(envelope).await;
    Ok(Json(json!({ "status": "ok" })))
}

/// Body of a login callback.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_id: i64,
    pub role: Role,
}

/// POST /api/v1/logins -- called once per successful authentication.
///
/// Triggers queued-notification delivery and role-menu resolution.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    if request.user_id <= 0 {
        return Err(AppError::Validation("user_id must be positive".to_string()));
    }
    state
        .engine
        .on_authenticated(request.user_id, request.role)
        .await?;
    Ok(Json(json!({ "status": "ok" })))
}
