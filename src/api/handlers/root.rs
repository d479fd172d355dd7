use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::api::state::AppState;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Skybridge API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Hotel booking backend: availability, bookings and invoice payments",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "properties": "/api/properties",
            "bookings": "/api/bookings",
            "payments": "/api/payments",
            "identity": "/api/identity/webhook",
            "admin": "/api/admin"
        }
    }))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.service_context.db_pool)
        .await
        .is_ok();

    if !db_ok {
        tracing::error!("Health check failed: database unreachable");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "status": "unhealthy",
                "database": "disconnected",
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
        );
    }

    let users = state.service_context.user_service.count().await.ok();

    (StatusCode::OK, Json(json!({
        "success": true,
        "status": "healthy",
        "database": "connected",
        "users": users,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
