use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    config::PaymentConfig,
    domain::{cents_to_major, major_to_cents},
    error::{AppError, Result},
    payments::{Invoice, InvoiceRequest, InvoiceStatus, PaymentGateway},
};

pub struct XenditClient {
    http: Client,
    api_url: String,
    secret_key: String,
}

impl XenditClient {
    pub fn new(config: &PaymentConfig) -> Result<Self> {
        let secret_key = config
            .secret_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Internal("payments.secret_key is not configured".to_string()))?;

        Ok(Self {
            http: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            secret_key,
        })
    }
}

#[derive(Serialize)]
struct CreateInvoiceBody<'a> {
    external_id: &'a str,
    amount: f64,
    payer_email: &'a str,
    description: &'a str,
    success_redirect_url: &'a str,
    failure_redirect_url: &'a str,
    payment_methods: &'a [String],
    currency: &'a str,
    invoice_duration: u32,
}

#[derive(Deserialize)]
struct InvoiceBody {
    id: String,
    #[serde(default)]
    external_id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    invoice_url: String,
    paid_amount: Option<f64>,
    payment_method: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

async fn provider_error(response: reqwest::Response) -> AppError {
    let status = response.status();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| status.to_string());

    AppError::PaymentProvider(format!("Xendit API Error: {}", message))
}

#[async_trait]
impl PaymentGateway for XenditClient {
    async fn create_invoice(&self, request: InvoiceRequest) -> Result<Invoice> {
        request.validate()?;

        let body = CreateInvoiceBody {
            external_id: &request.external_id,
            amount: cents_to_major(request.amount_cents),
            payer_email: &request.payer_email,
            description: &request.description,
            success_redirect_url: &request.success_redirect_url,
            failure_redirect_url: &request.failure_redirect_url,
            payment_methods: &request.payment_methods,
            currency: &request.currency,
            invoice_duration: request.duration_secs,
        };

        let response = self
            .http
            .post(format!("{}/v2/invoices", self.api_url))
            .basic_auth(&self.secret_key, Some(""))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::PaymentProvider(format!("Payment service error: {}", e)))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let invoice: InvoiceBody = response
            .json()
            .await
            .map_err(|e| AppError::PaymentProvider(format!("Payment service error: {}", e)))?;

        tracing::info!(
            "Created invoice {} for {}",
            invoice.id,
            request.external_id
        );

        Ok(Invoice {
            id: invoice.id,
            invoice_url: invoice.invoice_url,
        })
    }

    async fn invoice_status(&self, invoice_id: &str) -> Result<InvoiceStatus> {
        let response = self
            .http
            .get(format!("{}/v2/invoices/{}", self.api_url, invoice_id))
            .basic_auth(&self.secret_key, Some(""))
            .send()
            .await
            .map_err(|e| AppError::PaymentProvider(format!("Failed to get invoice status: {}", e)))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let invoice: InvoiceBody = response
            .json()
            .await
            .map_err(|e| AppError::PaymentProvider(format!("Failed to get invoice status: {}", e)))?;

        Ok(InvoiceStatus {
            id: invoice.id,
            external_id: invoice.external_id,
            status: invoice.status,
            paid_amount_cents: invoice.paid_amount.map(major_to_cents),
            payment_method: invoice.payment_method,
        })
    }
}
