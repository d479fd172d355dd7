use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    error::{AppError, Result},
    payments::{Invoice, InvoiceRequest, InvoiceStatus, PaymentGateway},
};

/// In-memory gateway that records every invoice request. Statuses are set
/// explicitly with `set_status` to simulate provider-side payment.
#[derive(Default)]
pub struct FakePaymentGateway {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    requests: Vec<InvoiceRequest>,
    statuses: HashMap<String, InvoiceStatus>,
    fail_with: Option<String>,
}

impl FakePaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `create_invoice` call fail with `message`.
    pub fn fail_with(&self, message: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_with = Some(message.to_string());
        }
    }

    pub fn requests(&self) -> Vec<InvoiceRequest> {
        self.state
            .lock()
            .map(|state| state.requests.clone())
            .unwrap_or_default()
    }

    pub fn set_status(&self, invoice_id: &str, status: &str, paid_amount_cents: Option<i64>) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(entry) = state.statuses.get_mut(invoice_id) {
                entry.status = status.to_string();
                entry.paid_amount_cents = paid_amount_cents;
                entry.payment_method = Some("EWALLET".to_string());
            }
        }
    }
}

#[async_trait]
impl PaymentGateway for FakePaymentGateway {
    async fn create_invoice(&self, request: InvoiceRequest) -> Result<Invoice> {
        request.validate()?;

        let mut state = self
            .state
            .lock()
            .map_err(|_| AppError::Internal("fake gateway poisoned".to_string()))?;

        if let Some(message) = &state.fail_with {
            return Err(AppError::PaymentProvider(format!("Xendit API Error: {}", message)));
        }

        let id = format!("inv_{}", state.requests.len() + 1);
        state.statuses.insert(
            id.clone(),
            InvoiceStatus {
                id: id.clone(),
                external_id: request.external_id.clone(),
                status: "PENDING".to_string(),
                paid_amount_cents: None,
                payment_method: None,
            },
        );
        state.requests.push(request);

        Ok(Invoice {
            invoice_url: format!("https://checkout.example.test/{}", id),
            id,
        })
    }

    async fn invoice_status(&self, invoice_id: &str) -> Result<InvoiceStatus> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("fake gateway poisoned".to_string()))?
            .statuses
            .get(invoice_id)
            .cloned()
            .ok_or_else(|| AppError::PaymentProvider(format!("Invoice {} not found", invoice_id)))
    }
}
