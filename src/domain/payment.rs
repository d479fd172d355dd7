use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub invoice_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `Pending` moves to `Paid` or `Failed`; both are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(PaymentStatus::Pending),
            "Paid" => Some(PaymentStatus::Paid),
            "Failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// Invoice state as reported by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceState {
    Paid,
    Expired,
    Failed,
    Other(String),
}

impl InvoiceState {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "PAID" | "SETTLED" => InvoiceState::Paid,
            "EXPIRED" => InvoiceState::Expired,
            "FAILED" => InvoiceState::Failed,
            other => InvoiceState::Other(other.to_string()),
        }
    }
}

/// Convert a provider amount in major units to minor units.
pub fn major_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn cents_to_major(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_state_parse() {
        assert_eq!(InvoiceState::parse("PAID"), InvoiceState::Paid);
        assert_eq!(InvoiceState::parse("settled"), InvoiceState::Paid);
        assert_eq!(InvoiceState::parse("EXPIRED"), InvoiceState::Expired);
        assert_eq!(InvoiceState::parse("FAILED"), InvoiceState::Failed);
        assert_eq!(
            InvoiceState::parse("PENDING"),
            InvoiceState::Other("PENDING".to_string())
        );
    }

    #[test]
    fn test_amount_conversion() {
        assert_eq!(major_to_cents(4480.0), 448000);
        assert_eq!(major_to_cents(0.1 + 0.2), 30);
        assert_eq!(cents_to_major(448050), 4480.5);
    }
}
