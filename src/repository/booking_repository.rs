use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Booking, BookingStatus, BookingSummary, PaymentStatus, Stay},
    error::{AppError, Result},
    repository::BookingRepository,
};

#[derive(FromRow)]
struct BookingRow {
    id: String,
    reference: String,
    user_id: String,
    property_id: String,
    room_type_id: String,
    check_in: NaiveDate,
    check_out: NaiveDate,
    nights: i64,
    adults: i64,
    children: i64,
    subtotal_cents: i64,
    taxes_and_fees_cents: i64,
    total_cents: i64,
    status: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct BookingSummaryRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    property_name: String,
    property_address: String,
    property_city: String,
    check_in_time: String,
    check_out_time: String,
    room_type_name: String,
    bed_configuration: String,
    payment_status: Option<String>,
}

const BOOKING_COLUMNS: &str = r#"
    id, reference, user_id, property_id, room_type_id, check_in, check_out,
    nights, adults, children, subtotal_cents, taxes_and_fees_cents, total_cents,
    status, created_at, updated_at
"#;

const SUMMARY_SELECT: &str = r#"
    SELECT b.id, b.reference, b.user_id, b.property_id, b.room_type_id, b.check_in, b.check_out,
           b.nights, b.adults, b.children, b.subtotal_cents, b.taxes_and_fees_cents, b.total_cents,
           b.status, b.created_at, b.updated_at,
           p.name AS property_name, p.address AS property_address, p.city AS property_city,
           p.check_in_time, p.check_out_time,
           rt.name AS room_type_name, rt.bed_configuration,
           pay.status AS payment_status
    FROM bookings b
    JOIN properties p ON p.id = b.property_id
    JOIN room_types rt ON rt.id = b.room_type_id
    LEFT JOIN payments pay ON pay.booking_id = b.id
"#;

pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_uuid(raw: &str) -> Result<Uuid> {
        Uuid::parse_str(raw).map_err(|e| AppError::Database(e.to_string()))
    }

    fn row_to_booking(row: BookingRow) -> Result<Booking> {
        Ok(Booking {
            id: Self::parse_uuid(&row.id)?,
            reference: row.reference,
            user_id: Self::parse_uuid(&row.user_id)?,
            property_id: Self::parse_uuid(&row.property_id)?,
            room_type_id: Self::parse_uuid(&row.room_type_id)?,
            check_in: row.check_in,
            check_out: row.check_out,
            nights: row.nights,
            adults: row.adults,
            children: row.children,
            subtotal_cents: row.subtotal_cents,
            taxes_and_fees_cents: row.taxes_and_fees_cents,
            total_cents: row.total_cents,
            status: BookingStatus::from_str(&row.status)
                .ok_or_else(|| AppError::Database(format!("Invalid booking status: {}", row.status)))?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn row_to_summary(row: BookingSummaryRow) -> Result<BookingSummary> {
        let payment_status = row.payment_status
            .as_deref()
            .map(|s| {
                PaymentStatus::from_str(s)
                    .ok_or_else(|| AppError::Database(format!("Invalid payment status: {}", s)))
            })
            .transpose()?;

        Ok(BookingSummary {
            booking: Self::row_to_booking(row.booking)?,
            property_name: row.property_name,
            property_address: row.property_address,
            property_city: row.property_city,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            room_type_name: row.room_type_name,
            bed_configuration: row.bed_configuration,
            payment_status,
        })
    }

    async fn fetch_summaries(&self, sql: &str, binds: Vec<String>, page: Option<(i64, i64)>) -> Result<Vec<BookingSummary>> {
        let mut query = sqlx::query_as::<_, BookingSummaryRow>(sql);
        for value in binds {
            query = query.bind(value);
        }
        if let Some((limit, offset)) = page {
            query = query.bind(limit).bind(offset);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_summary)
            .collect()
    }

    async fn fetch_booking(&self, column: &str, value: String) -> Result<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE {} = ?", BOOKING_COLUMNS, column);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_booking).transpose()
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn count_overlapping(&self, room_type_id: Uuid, stay: Stay) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE room_type_id = ?
              AND status != ?
              AND check_in < ?
              AND check_out > ?
            "#
        )
        .bind(room_type_id.to_string())
        .bind(BookingStatus::Cancelled.as_str())
        .bind(stay.check_out)
        .bind(stay.check_in)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count)
    }

    async fn create_if_available(&self, booking: &Booking) -> Result<bool> {
        let room_type_id = booking.room_type_id.to_string();
        let created_at = booking.created_at.naive_utc();
        let updated_at = booking.updated_at.naive_utc();

        // The capacity check and the insert are one statement, so SQLite's
        // single-writer lock serialises competing requests for the last room.
        let result = sqlx::query(
            r#"
            INSERT INTO bookings (
                id, reference, user_id, property_id, room_type_id, check_in, check_out,
                nights, adults, children, subtotal_cents, taxes_and_fees_cents, total_cents,
                status, created_at, updated_at
            )
            SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
            WHERE (
                SELECT COUNT(*) FROM bookings
                WHERE room_type_id = ?
                  AND status != ?
                  AND check_in < ?
                  AND check_out > ?
            ) < (
                SELECT available_rooms FROM room_types WHERE id = ?
            )
            "#
        )
        .bind(booking.id.to_string())
        .bind(&booking.reference)
        .bind(booking.user_id.to_string())
        .bind(booking.property_id.to_string())
        .bind(&room_type_id)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.nights)
        .bind(booking.adults)
        .bind(booking.children)
        .bind(booking.subtotal_cents)
        .bind(booking.taxes_and_fees_cents)
        .bind(booking.total_cents)
        .bind(booking.status.as_str())
        .bind(created_at)
        .bind(updated_at)
        .bind(&room_type_id)
        .bind(BookingStatus::Cancelled.as_str())
        .bind(booking.check_out)
        .bind(booking.check_in)
        .bind(&room_type_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        self.fetch_booking("id", id.to_string()).await
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Booking>> {
        self.fetch_booking("reference", reference.to_string()).await
    }

    async fn summary(&self, id: Uuid) -> Result<Option<BookingSummary>> {
        let sql = format!("{} WHERE b.id = ?", SUMMARY_SELECT);
        let mut summaries = self.fetch_summaries(&sql, vec![id.to_string()], None).await?;
        Ok(summaries.pop())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<BookingSummary>> {
        let sql = format!("{} WHERE b.user_id = ? ORDER BY b.created_at DESC", SUMMARY_SELECT);
        self.fetch_summaries(&sql, vec![user_id.to_string()], None).await
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<BookingSummary>> {
        let sql = format!("{} WHERE p.owner_id = ? ORDER BY b.check_in ASC", SUMMARY_SELECT);
        self.fetch_summaries(&sql, vec![owner_id.to_string()], None).await
    }

    async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<BookingSummary>> {
        let sql = format!("{} ORDER BY b.created_at DESC LIMIT ? OFFSET ?", SUMMARY_SELECT);
        self.fetch_summaries(&sql, Vec::new(), Some((limit, offset))).await
    }

    async fn cancel(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? AND status != ?"
        )
        .bind(BookingStatus::Cancelled.as_str())
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .bind(BookingStatus::Cancelled.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}
