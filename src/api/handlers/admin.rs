use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    api::{
        handlers::{ok, ApiResponse},
        middleware::auth::CurrentUser,
        state::AppState,
    },
    domain::{BookingSummary, User},
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    50
}

pub async fn bookings(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<BookingSummary>>>> {
    let bookings = state
        .service_context
        .booking_service
        .list_all(&current_user.user, params.limit.clamp(1, 200), params.offset.max(0))
        .await?;
    Ok(ok(bookings))
}

pub async fn users(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<User>>>> {
    let users = state
        .service_context
        .user_service
        .list(params.limit.clamp(1, 200), params.offset.max(0))
        .await?;
    Ok(ok(users))
}
