use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Check-out date must be after check-in date")]
    InvalidRange,

    #[error("Property is not available for booking")]
    PropertyUnavailable,

    #[error("No rooms available for selected dates")]
    NoRoomsAvailable,

    #[error("Bookings can only be cancelled at least {required_days} days before check-in ({days_remaining} remaining)")]
    CancellationWindow { required_days: i64, days_remaining: i64 },

    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    #[error("This booking has already been paid")]
    AlreadyPaid,

    #[error("An invoice already exists for this booking")]
    DuplicateInvoice { invoice_id: String, status: String },

    #[error("User email not found. Please update your profile.")]
    MissingEmail,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payment provider error: {0}")]
    PaymentProvider(String),

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Coarse classification used for status mapping and log routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Authorization,
    Conflict,
    BusinessRule,
    Upstream,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Validation(_) | AppError::InvalidRange | AppError::MissingEmail => {
                ErrorKind::Validation
            }
            AppError::Unauthorized | AppError::Forbidden(_) => ErrorKind::Authorization,
            AppError::AlreadyCancelled
            | AppError::AlreadyPaid
            | AppError::DuplicateInvoice { .. }
            | AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::PropertyUnavailable
            | AppError::NoRoomsAvailable
            | AppError::CancellationWindow { .. } => ErrorKind::BusinessRule,
            AppError::PaymentProvider(_)
            | AppError::Identity(_)
            | AppError::ServiceUnavailable(_) => ErrorKind::Upstream,
            AppError::Database(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => match self.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Authorization => StatusCode::FORBIDDEN,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::BusinessRule => StatusCode::BAD_REQUEST,
                ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Short machine-friendly label rendered as the `error` field.
    fn label(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database error occurred",
            AppError::NotFound(_) => "Not found",
            AppError::Unauthorized => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Validation(_) => "Validation failed",
            AppError::InvalidRange => "Invalid date range",
            AppError::PropertyUnavailable => "Property is not available for booking",
            AppError::NoRoomsAvailable => "No rooms available for selected dates",
            AppError::CancellationWindow { .. } => "Cancellation not allowed",
            AppError::AlreadyCancelled => "Booking is already cancelled",
            AppError::AlreadyPaid => "This booking has already been paid",
            AppError::DuplicateInvoice { .. } => "An invoice already exists for this booking",
            AppError::MissingEmail => "User email not found",
            AppError::Conflict(_) => "Conflict",
            AppError::PaymentProvider(_) => "Failed to create payment invoice",
            AppError::Identity(_) => "Identity provider error",
            AppError::ServiceUnavailable(_) => "Service unavailable",
            AppError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                None
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                None
            }
            AppError::PaymentProvider(msg) => {
                tracing::error!("Payment provider error: {}", msg);
                Some(msg.clone())
            }
            AppError::Identity(msg) => {
                tracing::error!("Identity provider error: {}", msg);
                None
            }
            AppError::NotFound(msg)
            | AppError::Forbidden(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::ServiceUnavailable(msg) => Some(msg.clone()),
            AppError::Unauthorized => {
                Some("Authentication required. Please provide a valid token.".to_string())
            }
            other => Some(other.to_string()),
        };

        let mut body = json!({
            "success": false,
            "error": self.label(),
        });

        if let Some(message) = message {
            body["message"] = json!(message);
        }

        if let AppError::DuplicateInvoice { invoice_id, status } = &self {
            body["data"] = json!({
                "invoiceId": invoice_id,
                "paymentStatus": status,
            });
        }

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_rules_are_client_errors() {
        assert_eq!(AppError::NoRoomsAvailable.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::PropertyUnavailable.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::CancellationWindow { required_days: 7, days_remaining: 3 }.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_conflicts() {
        assert_eq!(AppError::AlreadyPaid.kind(), ErrorKind::Conflict);
        assert_eq!(AppError::AlreadyCancelled.status_code(), StatusCode::CONFLICT);
        let dup = AppError::DuplicateInvoice {
            invoice_id: "inv_1".to_string(),
            status: "Pending".to_string(),
        };
        assert_eq!(dup.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_upstream_and_auth() {
        assert_eq!(
            AppError::PaymentProvider("boom".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden("nope".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Database("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
