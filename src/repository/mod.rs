use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod user_repository;
pub mod property_repository;
pub mod booking_repository;
pub mod payment_repository;

pub use user_repository::SqliteUserRepository;
pub use property_repository::SqlitePropertyRepository;
pub use booking_repository::SqliteBookingRepository;
pub use payment_repository::SqlitePaymentRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, external_id: &str, profile: UserProfile) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>>;
    async fn update_profile(&self, external_id: &str, profile: UserProfile) -> Result<Option<User>>;
    async fn set_role(&self, id: Uuid, role: Role) -> Result<User>;
    async fn soft_delete(&self, external_id: &str) -> Result<Option<User>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>>;
    async fn count(&self) -> Result<i64>;
}

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn create(&self, owner_id: Uuid, input: PropertyInput) -> Result<Property>;
    /// Replaces the property fields and reconciles its room types. Room types
    /// keep their id when the input carries it; dropping a room type that
    /// bookings still reference is refused.
    async fn update(&self, id: Uuid, input: PropertyInput) -> Result<Property>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>>;
    async fn list_published(&self) -> Result<Vec<Property>>;
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Property>>;
    async fn update_status(&self, id: Uuid, status: PropertyStatus) -> Result<Property>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Non-cancelled bookings of the room type whose stay overlaps `stay`.
    async fn count_overlapping(&self, room_type_id: Uuid, stay: Stay) -> Result<i64>;
    /// Inserts the booking only if the overlap count is still below the room
    /// type's inventory, evaluated in the same statement. Returns false when
    /// the room type is saturated.
    async fn create_if_available(&self, booking: &Booking) -> Result<bool>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>>;
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Booking>>;
    async fn summary(&self, id: Uuid) -> Result<Option<BookingSummary>>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<BookingSummary>>;
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<BookingSummary>>;
    async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<BookingSummary>>;
    /// Returns false if the booking was already cancelled.
    async fn cancel(&self, id: Uuid) -> Result<bool>;
}

/// Result of applying a verified PAID notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaidTransition {
    /// Payment moved to PAID and its booking to CONFIRMED.
    Confirmed,
    /// Payment moved to PAID but the booking was no longer PENDING.
    BookingNotPending,
    /// Payment was not PENDING, nothing changed.
    NotPending,
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: Payment) -> Result<Payment>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>>;
    async fn find_by_booking(&self, booking_id: Uuid) -> Result<Option<Payment>>;
    async fn find_by_invoice_id(&self, invoice_id: &str) -> Result<Option<Payment>>;
    /// PENDING -> PAID together with booking PENDING -> CONFIRMED, atomically.
    async fn mark_paid(&self, id: Uuid, payment_method: Option<&str>) -> Result<PaidTransition>;
    /// PENDING -> FAILED. Returns false when the payment was not PENDING.
    async fn mark_failed(&self, id: Uuid) -> Result<bool>;
}
