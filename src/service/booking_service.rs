use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::BookingPolicy,
    domain::*,
    error::{AppError, Result},
    repository::{BookingRepository, PropertyRepository},
};

const REFERENCE_ATTEMPTS: usize = 5;

pub struct BookingService {
    booking_repo: Arc<dyn BookingRepository>,
    property_repo: Arc<dyn PropertyRepository>,
    policy: BookingPolicy,
}

impl BookingService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        property_repo: Arc<dyn PropertyRepository>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            booking_repo,
            property_repo,
            policy,
        }
    }

    pub async fn check_availability(&self, room_type: &RoomType, stay: Stay) -> Result<Availability> {
        let booked = self.booking_repo.count_overlapping(room_type.id, stay).await?;
        Ok(Availability::new(room_type.id, room_type.available_rooms, booked))
    }

    pub async fn availability(&self, property_id: Uuid, room_type_id: Uuid, stay: Stay) -> Result<Availability> {
        let property = self.find_property(property_id).await?;
        let room_type = property
            .room_type(room_type_id)
            .ok_or_else(|| AppError::NotFound("Room type not found".to_string()))?;

        self.check_availability(room_type, stay).await
    }

    pub async fn create_booking(&self, user: &User, request: CreateBookingRequest) -> Result<Booking> {
        request.validate()?;
        let stay = Stay::new(request.check_in, request.check_out)?;

        let property = self.find_property(request.property_id).await?;
        let room_type = property
            .room_type(request.room_type_id)
            .ok_or_else(|| AppError::NotFound("Room type not found".to_string()))?;

        if !property.is_published() {
            return Err(AppError::PropertyUnavailable);
        }

        if !room_type.fits_party(request.adults, request.children) {
            return Err(AppError::Validation(format!(
                "Room type {} allows at most {} adults and {} children",
                room_type.name, room_type.max_adults, room_type.max_children
            )));
        }

        if !self.check_availability(room_type, stay).await?.available {
            return Err(AppError::NoRoomsAvailable);
        }

        let quote = quote(
            room_type.price_per_night_cents,
            stay.check_in,
            stay.check_out,
            self.policy.tax_rate_percent,
        )?;

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            reference: self.unique_reference(now).await?,
            user_id: user.id,
            property_id: property.id,
            room_type_id: room_type.id,
            check_in: stay.check_in,
            check_out: stay.check_out,
            nights: quote.nights,
            adults: request.adults,
            children: request.children,
            subtotal_cents: quote.subtotal_cents,
            taxes_and_fees_cents: quote.taxes_and_fees_cents,
            total_cents: quote.total_cents,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        // The pre-check above can pass for two requests at once; the
        // conditional insert is the authoritative capacity check.
        if !self.booking_repo.create_if_available(&booking).await? {
            tracing::info!(
                "Room type {} filled up while booking {} was being created",
                room_type.id,
                booking.reference
            );
            return Err(AppError::NoRoomsAvailable);
        }

        tracing::info!(
            "Created booking {} for user {} ({} nights, total {})",
            booking.reference,
            user.id,
            booking.nights,
            booking.total_cents
        );

        Ok(booking)
    }

    /// Owner of the booking or an admin.
    pub async fn get(&self, user: &User, id: Uuid) -> Result<BookingSummary> {
        let summary = self
            .booking_repo
            .summary(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if summary.booking.user_id != user.id && !user.can(Capability::ViewAnyBooking) {
            return Err(AppError::Forbidden("You can only view your own bookings".to_string()));
        }

        Ok(summary)
    }

    pub async fn list_mine(&self, user: &User) -> Result<Vec<BookingSummary>> {
        self.booking_repo.list_by_user(user.id).await
    }

    pub async fn list_for_owner(&self, user: &User) -> Result<Vec<BookingSummary>> {
        if !user.can(Capability::ViewOwnerBookings) {
            return Err(AppError::Forbidden("Only hotel owners can view property bookings".to_string()));
        }
        self.booking_repo.list_by_owner(user.id).await
    }

    pub async fn list_all(&self, user: &User, limit: i64, offset: i64) -> Result<Vec<BookingSummary>> {
        if !user.can(Capability::ViewAnyBooking) {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        self.booking_repo.list_all(limit, offset).await
    }

    pub async fn cancel(&self, user: &User, id: Uuid) -> Result<Booking> {
        self.cancel_at(user, id, Utc::now()).await
    }

    pub async fn cancel_at(&self, user: &User, id: Uuid, now: DateTime<Utc>) -> Result<Booking> {
        let booking = self
            .booking_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if booking.user_id != user.id {
            return Err(AppError::Forbidden("You can only cancel your own bookings".to_string()));
        }

        if booking.status == BookingStatus::Cancelled {
            return Err(AppError::AlreadyCancelled);
        }

        let days_remaining = days_until_check_in(booking.check_in, now);
        if days_remaining < self.policy.cancellation_lead_days {
            return Err(AppError::CancellationWindow {
                required_days: self.policy.cancellation_lead_days,
                days_remaining,
            });
        }

        if !self.booking_repo.cancel(id).await? {
            return Err(AppError::AlreadyCancelled);
        }

        tracing::info!("Cancelled booking {} ({} days before check-in)", booking.reference, days_remaining);

        self.booking_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
    }

    async fn find_property(&self, id: Uuid) -> Result<Property> {
        self.property_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))
    }

    async fn unique_reference(&self, now: DateTime<Utc>) -> Result<String> {
        for _ in 0..REFERENCE_ATTEMPTS {
            let reference = generate_reference(now);
            if self.booking_repo.find_by_reference(&reference).await?.is_none() {
                return Ok(reference);
            }
        }
        Err(AppError::Internal("Could not allocate a booking reference".to_string()))
    }
}

/// `BK-YYYYMMDD-XXXXXX` with six uppercase alphanumerics.
pub fn generate_reference(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();

    format!("BK-{}-{}", now.format("%Y%m%d"), suffix)
}
