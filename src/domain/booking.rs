use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    /// Human readable identifier shown to guests and sent to the payment provider.
    pub reference: String,
    pub user_id: Uuid,
    pub property_id: Uuid,
    pub room_type_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub adults: i64,
    pub children: i64,
    pub subtotal_cents: i64,
    pub taxes_and_fees_cents: i64,
    pub total_cents: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn stay(&self) -> Stay {
        Stay {
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(BookingStatus::Pending),
            "Confirmed" => Some(BookingStatus::Confirmed),
            "Cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

/// A half-open `[check_in, check_out)` date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stay {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl Stay {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self> {
        if check_out <= check_in {
            return Err(AppError::InvalidRange);
        }
        Ok(Self { check_in, check_out })
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Adjacent stays (one ends the day the other starts) do not overlap.
    pub fn overlaps(&self, other: &Stay) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}

/// Outcome of the availability check for one room type and stay.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub room_type_id: Uuid,
    pub available: bool,
    pub total_rooms: i64,
    pub booked_rooms: i64,
    pub remaining_rooms: i64,
}

impl Availability {
    pub fn new(room_type_id: Uuid, total_rooms: i64, booked_rooms: i64) -> Self {
        Self {
            room_type_id,
            available: booked_rooms < total_rooms,
            total_rooms,
            booked_rooms,
            remaining_rooms: (total_rooms - booked_rooms).max(0),
        }
    }
}

/// Whole days from `now` until midnight UTC of `check_in`, rounded up.
pub fn days_until_check_in(check_in: NaiveDate, now: DateTime<Utc>) -> i64 {
    let check_in_at = DateTime::from_naive_utc_and_offset(check_in.and_time(NaiveTime::MIN), Utc);
    let seconds = (check_in_at - now).num_seconds();
    -((-seconds).div_euclid(86_400))
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub property_id: Uuid,
    pub room_type_id: Uuid,
    #[serde(deserialize_with = "deserialize_date", alias = "checkInDate")]
    pub check_in: NaiveDate,
    #[serde(deserialize_with = "deserialize_date", alias = "checkOutDate")]
    pub check_out: NaiveDate,
    #[validate(range(min = 1, message = "At least one adult is required"))]
    pub adults: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub children: i64,
}

/// Accepts a plain `YYYY-MM-DD` date or an RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
}

pub fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
}

pub fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", value))),
    }
}

/// Booking joined with the property and room type names shown in listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    #[serde(flatten)]
    pub booking: Booking,
    pub property_name: String,
    pub property_address: String,
    pub property_city: String,
    pub check_in_time: String,
    pub check_out_time: String,
    pub room_type_name: String,
    pub bed_configuration: String,
    pub payment_status: Option<crate::domain::PaymentStatus>,
}
