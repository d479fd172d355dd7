use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AppError, Result};

pub mod xendit_client;

#[cfg(any(test, feature = "test-utils"))]
pub mod fake;

pub use xendit_client::XenditClient;

#[cfg(any(test, feature = "test-utils"))]
pub use fake::FakePaymentGateway;

pub const PAYMENT_METHODS: [&str; 5] = [
    "CREDIT_CARD",
    "DEBIT_CARD",
    "EWALLET",
    "RETAIL_OUTLET",
    "BANK_TRANSFER",
];

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceRequest {
    /// Our booking reference, echoed back by the provider as `external_id`.
    pub external_id: String,
    pub amount_cents: i64,
    pub payer_email: String,
    pub description: String,
    pub success_redirect_url: String,
    pub failure_redirect_url: String,
    pub payment_methods: Vec<String>,
    pub currency: String,
    pub duration_secs: u32,
}

impl InvoiceRequest {
    pub fn validate(&self) -> Result<()> {
        if self.external_id.trim().is_empty()
            || self.payer_email.trim().is_empty()
            || self.description.trim().is_empty()
        {
            return Err(AppError::PaymentProvider(
                "Missing required booking data: bookingId, amount, userEmail, or description".to_string(),
            ));
        }
        if self.amount_cents <= 0 {
            return Err(AppError::PaymentProvider("Amount must be greater than 0".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Invoice {
    pub id: String,
    pub invoice_url: String,
}

/// Provider-side view of an invoice.
#[derive(Debug, Clone)]
pub struct InvoiceStatus {
    pub id: String,
    pub external_id: String,
    pub status: String,
    pub paid_amount_cents: Option<i64>,
    pub payment_method: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_invoice(&self, request: InvoiceRequest) -> Result<Invoice>;
    async fn invoice_status(&self, invoice_id: &str) -> Result<InvoiceStatus>;
}
