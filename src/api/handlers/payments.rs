use axum::{
    body::Bytes,
    extract::{Extension, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    api::{
        handlers::{created, ok, ApiResponse},
        middleware::auth::CurrentUser,
        state::AppState,
    },
    domain::PaymentStatus,
    error::{AppError, Result},
    service::payment_service::{IssuedInvoice, PaymentNotification},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    /// Booking reference, e.g. `BK-20240110-ABC123`.
    pub booking_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub outcome: &'static str,
    pub invoice_id: String,
    pub payment_status: PaymentStatus,
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<IssuedInvoice>>)> {
    if request.booking_id.trim().is_empty() {
        return Err(AppError::Validation("Booking ID is required".to_string()));
    }

    let invoice = state
        .payments()?
        .issue_invoice(&current_user.user, request.booking_id.trim())
        .await?;

    Ok(created("Payment invoice created successfully", invoice))
}

/// Provider callback. Once the signature checks out the delivery is always
/// acknowledged, whatever happens while applying it.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let payments = state.payments()?;
    let verifier = state
        .payment_webhooks
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("Payment webhooks are not configured".to_string()))?;

    if let Err(e) = verifier.verify(&headers, &body) {
        tracing::warn!("Rejected payment webhook: {}", e);
        return Err(e);
    }

    match serde_json::from_slice::<PaymentNotification>(&body) {
        Ok(notification) => {
            let outcome = payments.reconcile(notification).await;
            tracing::info!("Payment webhook processed: {}", outcome.as_str());
        }
        Err(e) => {
            tracing::warn!("Unreadable payment webhook payload: {}", e);
        }
    }

    Ok((StatusCode::OK, Json(json!({ "success": true, "received": true }))))
}

pub async fn sync(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(reference): Path<String>,
) -> Result<Json<ApiResponse<SyncResponse>>> {
    let (outcome, payment) = state
        .payments()?
        .sync_invoice(&current_user.user, &reference)
        .await?;

    Ok(ok(SyncResponse {
        outcome: outcome.as_str(),
        invoice_id: payment.invoice_id,
        payment_status: payment.status,
    }))
}
