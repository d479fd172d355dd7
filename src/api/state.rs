use std::sync::Arc;
use crate::{
    auth::{WebhookVerifier, IDENTITY_HEADERS, PAYMENT_HEADERS},
    config::Settings,
    error::{AppError, Result},
    service::{payment_service::PaymentService, ServiceContext},
};

#[derive(Clone)]
pub struct AppState {
    pub service_context: Arc<ServiceContext>,
    pub settings: Arc<Settings>,
    pub identity_webhooks: Option<Arc<WebhookVerifier>>,
    pub payment_webhooks: Option<Arc<WebhookVerifier>>,
}

impl AppState {
    pub fn new(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Result<Self> {
        let identity_webhooks = match settings.auth.webhook_secret.as_deref() {
            Some(secret) if !secret.is_empty() => {
                Some(Arc::new(WebhookVerifier::new(secret, IDENTITY_HEADERS)?))
            }
            _ => {
                tracing::warn!("auth.webhook_secret not set; identity webhooks will be rejected");
                None
            }
        };

        let payment_webhooks = match settings.payments.webhook_secret.as_deref() {
            Some(secret) if !secret.is_empty() => {
                Some(Arc::new(WebhookVerifier::new(secret, PAYMENT_HEADERS)?))
            }
            _ => {
                if service_context.payment_service.is_some() {
                    tracing::warn!("payments.webhook_secret not set; payment webhooks will be rejected");
                }
                None
            }
        };

        Ok(Self {
            service_context,
            settings,
            identity_webhooks,
            payment_webhooks,
        })
    }

    pub fn payments(&self) -> Result<&Arc<PaymentService>> {
        self.service_context
            .payment_service
            .as_ref()
            .ok_or_else(|| AppError::ServiceUnavailable("Payments are not configured".to_string()))
    }
}
