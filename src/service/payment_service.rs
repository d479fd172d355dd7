use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{BookingPolicy, PaymentConfig},
    domain::*,
    error::{AppError, Result},
    payments::{InvoiceRequest, InvoiceStatus, PaymentGateway, PAYMENT_METHODS},
    repository::{BookingRepository, PaidTransition, PaymentRepository, PropertyRepository},
    service::user_service::UserService,
};

/// Payload of the provider's invoice callback. Every field is optional so
/// incomplete deliveries can be acknowledged instead of rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentNotification {
    pub id: Option<String>,
    pub external_id: Option<String>,
    pub status: Option<String>,
    pub paid_amount: Option<f64>,
    pub payment_method: Option<String>,
}

/// Provider-reported invoice state, from a callback or a status pull.
#[derive(Debug, Clone)]
pub struct InvoiceUpdate {
    pub invoice_id: String,
    pub external_id: String,
    pub state: InvoiceState,
    pub paid_amount_cents: Option<i64>,
    pub payment_method: Option<String>,
}

impl From<InvoiceStatus> for InvoiceUpdate {
    fn from(status: InvoiceStatus) -> Self {
        Self {
            state: InvoiceState::parse(&status.status),
            invoice_id: status.id,
            external_id: status.external_id,
            paid_amount_cents: status.paid_amount_cents,
            payment_method: status.payment_method,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    MissingFields,
    UnknownInvoice,
    ReferenceMismatch,
    AlreadyFinal(PaymentStatus),
    Confirmed,
    PaidBookingNotPending,
    AmountMismatch { expected_cents: i64, paid_cents: i64 },
    MarkedFailed,
    Ignored(String),
    Error(String),
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::MissingFields => "missing_fields",
            WebhookOutcome::UnknownInvoice => "unknown_invoice",
            WebhookOutcome::ReferenceMismatch => "reference_mismatch",
            WebhookOutcome::AlreadyFinal(_) => "already_final",
            WebhookOutcome::Confirmed => "confirmed",
            WebhookOutcome::PaidBookingNotPending => "paid_booking_not_pending",
            WebhookOutcome::AmountMismatch { .. } => "amount_mismatch",
            WebhookOutcome::MarkedFailed => "marked_failed",
            WebhookOutcome::Ignored(_) => "ignored",
            WebhookOutcome::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedInvoice {
    pub invoice_url: String,
    pub invoice_id: String,
    pub amount_cents: i64,
    pub booking_id: String,
    pub property_name: String,
    pub room_type: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
}

pub struct PaymentService {
    payment_repo: Arc<dyn PaymentRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    property_repo: Arc<dyn PropertyRepository>,
    user_service: Arc<UserService>,
    gateway: Arc<dyn PaymentGateway>,
    config: PaymentConfig,
    policy: BookingPolicy,
}

impl PaymentService {
    pub fn new(
        payment_repo: Arc<dyn PaymentRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        property_repo: Arc<dyn PropertyRepository>,
        user_service: Arc<UserService>,
        gateway: Arc<dyn PaymentGateway>,
        config: PaymentConfig,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            payment_repo,
            booking_repo,
            property_repo,
            user_service,
            gateway,
            config,
            policy,
        }
    }

    /// Creates a provider invoice for a pending booking. At most one invoice
    /// exists per booking.
    pub async fn issue_invoice(&self, user: &User, reference: &str) -> Result<IssuedInvoice> {
        let booking = self.owned_booking(user, reference).await?;

        if booking.status == BookingStatus::Cancelled {
            return Err(AppError::AlreadyCancelled);
        }

        if let Some(existing) = self.payment_repo.find_by_booking(booking.id).await? {
            return match existing.status {
                PaymentStatus::Paid => Err(AppError::AlreadyPaid),
                PaymentStatus::Pending | PaymentStatus::Failed => Err(AppError::DuplicateInvoice {
                    invoice_id: existing.invoice_id,
                    status: existing.status.as_str().to_uppercase(),
                }),
            };
        }

        let payer_email = self
            .user_service
            .contact_email(user)
            .await?
            .filter(|e| !e.trim().is_empty())
            .ok_or(AppError::MissingEmail)?;

        let property = self
            .property_repo
            .find_by_id(booking.property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;
        let room_type_name = property
            .room_type(booking.room_type_id)
            .map(|rt| rt.name.clone())
            .ok_or_else(|| AppError::NotFound("Room type not found".to_string()))?;

        let request = InvoiceRequest {
            external_id: booking.reference.clone(),
            amount_cents: booking.total_cents,
            payer_email,
            description: format!("Hotel Booking - {} ({})", property.name, room_type_name),
            success_redirect_url: self.config.success_redirect_url.clone(),
            failure_redirect_url: self.config.failure_redirect_url.clone(),
            payment_methods: PAYMENT_METHODS.iter().map(|m| m.to_string()).collect(),
            currency: self.config.currency.clone(),
            duration_secs: self.config.invoice_duration_secs,
        };

        let invoice = self.gateway.create_invoice(request).await?;

        let now = chrono::Utc::now();
        self.payment_repo
            .create(Payment {
                id: Uuid::new_v4(),
                booking_id: booking.id,
                invoice_id: invoice.id.clone(),
                amount_cents: booking.total_cents,
                currency: self.config.currency.clone(),
                status: PaymentStatus::Pending,
                payment_method: None,
                transaction_date: None,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!("Issued invoice {} for booking {}", invoice.id, booking.reference);

        Ok(IssuedInvoice {
            invoice_url: invoice.invoice_url,
            invoice_id: invoice.id,
            amount_cents: booking.total_cents,
            booking_id: booking.reference,
            property_name: property.name,
            room_type: room_type_name,
            check_in_date: booking.check_in,
            check_out_date: booking.check_out,
        })
    }

    /// Applies a verified callback. Never fails: whatever happens is logged
    /// and reported as an outcome so the caller can always acknowledge.
    pub async fn reconcile(&self, notification: PaymentNotification) -> WebhookOutcome {
        let (Some(invoice_id), Some(external_id), Some(status)) = (
            notification.id.filter(|s| !s.is_empty()),
            notification.external_id.filter(|s| !s.is_empty()),
            notification.status.filter(|s| !s.is_empty()),
        ) else {
            tracing::warn!("Payment webhook missing id, external_id or status");
            return WebhookOutcome::MissingFields;
        };

        let update = InvoiceUpdate {
            invoice_id,
            external_id,
            state: InvoiceState::parse(&status),
            paid_amount_cents: notification.paid_amount.map(major_to_cents),
            payment_method: notification.payment_method,
        };

        match self.apply(update).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Payment webhook processing failed: {}", e);
                WebhookOutcome::Error(e.to_string())
            }
        }
    }

    /// Pulls the invoice status from the provider and applies it through
    /// the same path as a callback.
    pub async fn sync_invoice(&self, user: &User, reference: &str) -> Result<(WebhookOutcome, Payment)> {
        let booking = self.owned_booking(user, reference).await?;

        let payment = self
            .payment_repo
            .find_by_booking(booking.id)
            .await?
            .ok_or_else(|| AppError::NotFound("No invoice exists for this booking".to_string()))?;

        let status = self.gateway.invoice_status(&payment.invoice_id).await?;
        let outcome = self.apply(InvoiceUpdate::from(status)).await?;

        let payment = self
            .payment_repo
            .find_by_id(payment.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        Ok((outcome, payment))
    }

    pub async fn apply(&self, update: InvoiceUpdate) -> Result<WebhookOutcome> {
        let Some(payment) = self.payment_repo.find_by_invoice_id(&update.invoice_id).await? else {
            tracing::warn!("No payment found for invoice {}", update.invoice_id);
            return Ok(WebhookOutcome::UnknownInvoice);
        };

        let booking = self
            .booking_repo
            .find_by_id(payment.booking_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Payment {} has no booking", payment.id)))?;

        if booking.reference != update.external_id {
            tracing::warn!(
                "Invoice {} reported external id {} but belongs to {}",
                update.invoice_id,
                update.external_id,
                booking.reference
            );
            return Ok(WebhookOutcome::ReferenceMismatch);
        }

        match update.state {
            InvoiceState::Paid => self.apply_paid(&payment, &booking, &update).await,
            InvoiceState::Expired | InvoiceState::Failed => {
                if self.payment_repo.mark_failed(payment.id).await? {
                    tracing::info!(
                        "Payment {} for booking {} marked failed ({:?})",
                        payment.id,
                        booking.reference,
                        update.state
                    );
                    Ok(WebhookOutcome::MarkedFailed)
                } else {
                    Ok(WebhookOutcome::AlreadyFinal(payment.status))
                }
            }
            InvoiceState::Other(status) => {
                tracing::debug!("Ignoring invoice {} status {}", update.invoice_id, status);
                Ok(WebhookOutcome::Ignored(status))
            }
        }
    }

    async fn apply_paid(&self, payment: &Payment, booking: &Booking, update: &InvoiceUpdate) -> Result<WebhookOutcome> {
        if payment.status != PaymentStatus::Pending {
            tracing::info!(
                "Payment {} already {}, ignoring PAID notification",
                payment.id,
                payment.status.as_str()
            );
            return Ok(WebhookOutcome::AlreadyFinal(payment.status));
        }

        let paid_cents = update.paid_amount_cents.unwrap_or(0);
        if (booking.total_cents - paid_cents).abs() > self.policy.amount_tolerance_cents {
            tracing::error!(
                "Payment amount mismatch for booking {}: expected {}, paid {}",
                booking.reference,
                booking.total_cents,
                paid_cents
            );
            self.payment_repo.mark_failed(payment.id).await?;
            return Ok(WebhookOutcome::AmountMismatch {
                expected_cents: booking.total_cents,
                paid_cents,
            });
        }

        let transition = self
            .payment_repo
            .mark_paid(payment.id, update.payment_method.as_deref())
            .await?;

        Ok(match transition {
            PaidTransition::Confirmed => {
                tracing::info!("Booking {} confirmed by invoice {}", booking.reference, update.invoice_id);
                WebhookOutcome::Confirmed
            }
            PaidTransition::BookingNotPending => {
                tracing::warn!(
                    "Invoice {} paid but booking {} is no longer pending; refund required",
                    update.invoice_id,
                    booking.reference
                );
                WebhookOutcome::PaidBookingNotPending
            }
            PaidTransition::NotPending => {
                let current = self
                    .payment_repo
                    .find_by_id(payment.id)
                    .await?
                    .map_or(PaymentStatus::Paid, |p| p.status);
                WebhookOutcome::AlreadyFinal(current)
            }
        })
    }

    async fn owned_booking(&self, user: &User, reference: &str) -> Result<Booking> {
        let booking = self
            .booking_repo
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if booking.user_id != user.id {
            return Err(AppError::Forbidden(
                "You are not authorized to create an invoice for this booking".to_string(),
            ));
        }

        Ok(booking)
    }
}
