use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    api::state::AppState,
    error::{AppError, Result},
    service::user_service::IdentityEvent,
};

pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let verifier = state
        .identity_webhooks
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("Identity webhooks are not configured".to_string()))?;

    if let Err(e) = verifier.verify(&headers, &body) {
        tracing::warn!("Rejected identity webhook: {}", e);
        return Err(e);
    }

    let event: IdentityEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {}", e)))?;
    let event_type = event.event_type.clone();

    match state.service_context.user_service.handle_identity_event(event).await {
        Ok(()) => Ok((StatusCode::OK, Json(json!({ "success": true, "received": true })))),
        Err(e) => {
            tracing::error!("Error processing {}: {}", event_type, e);
            Ok((
                StatusCode::OK,
                Json(json!({ "success": false, "received": true, "error": e.to_string() })),
            ))
        }
    }
}
