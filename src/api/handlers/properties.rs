use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{
        handlers::{created, ok, with_message, ApiResponse},
        middleware::auth::CurrentUser,
        state::AppState,
    },
    domain::{booking::deserialize_date, Availability, Property, PropertyInput, PropertySearch, Stay},
    error::Result,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityParams {
    pub room_type_id: Uuid,
    #[serde(deserialize_with = "deserialize_date")]
    pub check_in: NaiveDate,
    #[serde(deserialize_with = "deserialize_date")]
    pub check_out: NaiveDate,
}

pub async fn search(
    State(state): State<AppState>,
    Query(search): Query<PropertySearch>,
) -> Result<Json<ApiResponse<Vec<Property>>>> {
    let properties = state.service_context.property_service.search(search).await?;
    Ok(ok(properties))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Property>>> {
    let property = state.service_context.property_service.get_published(id).await?;
    Ok(ok(property))
}

pub async fn availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<ApiResponse<Availability>>> {
    let stay = Stay::new(params.check_in, params.check_out)?;
    let availability = state
        .service_context
        .booking_service
        .availability(id, params.room_type_id, stay)
        .await?;
    Ok(ok(availability))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(input): Json<PropertyInput>,
) -> Result<(StatusCode, Json<ApiResponse<Property>>)> {
    let property = state
        .service_context
        .property_service
        .create(&current_user.user, input)
        .await?;
    Ok(created("Property submitted for review", property))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<PropertyInput>,
) -> Result<Json<ApiResponse<Property>>> {
    let property = state
        .service_context
        .property_service
        .update(&current_user.user, id, input)
        .await?;
    Ok(with_message("Property updated and resubmitted for review", property))
}

pub async fn mine(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<Property>>>> {
    let properties = state.service_context.property_service.mine(&current_user.user).await?;
    Ok(ok(properties))
}
