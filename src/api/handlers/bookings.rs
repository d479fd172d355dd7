use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::{
        handlers::{created, ok, with_message, ApiResponse},
        middleware::auth::CurrentUser,
        state::AppState,
    },
    domain::{Booking, BookingSummary, CreateBookingRequest},
    error::Result,
};

pub async fn create(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Booking>>)> {
    let booking = state
        .service_context
        .booking_service
        .create_booking(&current_user.user, request)
        .await?;
    Ok(created("Booking created successfully", booking))
}

pub async fn mine(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<BookingSummary>>>> {
    let bookings = state.service_context.booking_service.list_mine(&current_user.user).await?;
    Ok(ok(bookings))
}

pub async fn owner(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<BookingSummary>>>> {
    let bookings = state
        .service_context
        .booking_service
        .list_for_owner(&current_user.user)
        .await?;
    Ok(ok(bookings))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingSummary>>> {
    let booking = state
        .service_context
        .booking_service
        .get(&current_user.user, id)
        .await?;
    Ok(ok(booking))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>> {
    let booking = state
        .service_context
        .booking_service
        .cancel(&current_user.user, id)
        .await?;
    Ok(with_message("Booking cancelled successfully", booking))
}
