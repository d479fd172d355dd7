use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    domain::Stay,
    error::{AppError, Result},
};

/// Price breakdown for a stay, in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub nights: i64,
    pub subtotal_cents: i64,
    pub taxes_and_fees_cents: i64,
    pub total_cents: i64,
}

fn too_large() -> AppError {
    AppError::Validation("Booking total is too large".to_string())
}

/// Taxes and fees as a percentage of the subtotal, rounded half up.
pub fn taxes_and_fees(subtotal_cents: i64, tax_rate_percent: i64) -> Result<i64> {
    subtotal_cents
        .checked_mul(tax_rate_percent)
        .and_then(|scaled| scaled.checked_add(50))
        .map(|scaled| scaled.div_euclid(100))
        .ok_or_else(too_large)
}

pub fn quote(
    rate_per_night_cents: i64,
    check_in: NaiveDate,
    check_out: NaiveDate,
    tax_rate_percent: i64,
) -> Result<Quote> {
    let stay = Stay::new(check_in, check_out)?;
    let nights = stay.nights();
    let subtotal_cents = nights
        .checked_mul(rate_per_night_cents)
        .ok_or_else(too_large)?;
    let taxes_and_fees_cents = taxes_and_fees(subtotal_cents, tax_rate_percent)?;
    let total_cents = subtotal_cents
        .checked_add(taxes_and_fees_cents)
        .ok_or_else(too_large)?;

    Ok(Quote {
        nights,
        subtotal_cents,
        taxes_and_fees_cents,
        total_cents,
    })
}
