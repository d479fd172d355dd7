use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{BookingStatus, Payment, PaymentStatus},
    error::{AppError, Result},
    repository::{PaidTransition, PaymentRepository},
};

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    booking_id: String,
    invoice_id: String,
    amount_cents: i64,
    currency: String,
    status: String,
    payment_method: Option<String>,
    transaction_date: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const PAYMENT_COLUMNS: &str = r#"
    id, booking_id, invoice_id, amount_cents, currency, status,
    payment_method, transaction_date, created_at, updated_at
"#;

pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: PaymentRow) -> Result<Payment> {
        Ok(Payment {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            booking_id: Uuid::parse_str(&row.booking_id).map_err(|e| AppError::Database(e.to_string()))?,
            invoice_id: row.invoice_id,
            amount_cents: row.amount_cents,
            currency: row.currency,
            status: PaymentStatus::from_str(&row.status)
                .ok_or_else(|| AppError::Database(format!("Invalid payment status: {}", row.status)))?,
            payment_method: row.payment_method,
            transaction_date: row.transaction_date.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    async fn fetch_payment(&self, column: &str, value: String) -> Result<Option<Payment>> {
        let sql = format!("SELECT {} FROM payments WHERE {} = ?", PAYMENT_COLUMNS, column);
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_payment(r)?)),
            None => Ok(None)
        }
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    async fn create(&self, payment: Payment) -> Result<Payment> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, booking_id, invoice_id, amount_cents, currency, status,
                payment_method, transaction_date, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(payment.id.to_string())
        .bind(payment.booking_id.to_string())
        .bind(&payment.invoice_id)
        .bind(payment.amount_cents)
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(&payment.payment_method)
        .bind(payment.transaction_date.map(|dt| dt.naive_utc()))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(payment.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created payment".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        self.fetch_payment("id", id.to_string()).await
    }

    async fn find_by_booking(&self, booking_id: Uuid) -> Result<Option<Payment>> {
        self.fetch_payment("booking_id", booking_id.to_string()).await
    }

    async fn find_by_invoice_id(&self, invoice_id: &str) -> Result<Option<Payment>> {
        self.fetch_payment("invoice_id", invoice_id.to_string()).await
    }

    async fn mark_paid(&self, id: Uuid, payment_method: Option<&str>) -> Result<PaidTransition> {
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await?;

        // Guarded on PENDING so duplicate deliveries race to a single winner
        let updated = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?,
                payment_method = ?,
                transaction_date = ?,
                updated_at = ?
            WHERE id = ? AND status = ?
            "#
        )
        .bind(PaymentStatus::Paid.as_str())
        .bind(payment_method)
        .bind(now)
        .bind(now)
        .bind(&id_str)
        .bind(PaymentStatus::Pending.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if updated.rows_affected() == 0 {
            return Ok(PaidTransition::NotPending);
        }

        let confirmed = sqlx::query(
            r#"
            UPDATE bookings
            SET status = ?, updated_at = ?
            WHERE id = (SELECT booking_id FROM payments WHERE id = ?)
              AND status = ?
            "#
        )
        .bind(BookingStatus::Confirmed.as_str())
        .bind(now)
        .bind(&id_str)
        .bind(BookingStatus::Pending.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit().await?;

        if confirmed.rows_affected() == 1 {
            Ok(PaidTransition::Confirmed)
        } else {
            Ok(PaidTransition::BookingNotPending)
        }
    }

    async fn mark_failed(&self, id: Uuid) -> Result<bool> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?,
                transaction_date = ?,
                updated_at = ?
            WHERE id = ? AND status = ?
            "#
        )
        .bind(PaymentStatus::Failed.as_str())
        .bind(now)
        .bind(now)
        .bind(id.to_string())
        .bind(PaymentStatus::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}
