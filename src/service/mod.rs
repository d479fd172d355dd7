pub mod user_service;
pub mod property_service;
pub mod booking_service;
pub mod payment_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::auth::IdentityProvider;
use crate::config::Settings;
use crate::payments::PaymentGateway;
use crate::repository::*;
use user_service::UserService;
use property_service::PropertyService;
use booking_service::BookingService;
use payment_service::PaymentService;

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub property_repo: Arc<dyn PropertyRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub identity: Arc<dyn IdentityProvider>,
    pub user_service: Arc<UserService>,
    pub property_service: Arc<PropertyService>,
    pub booking_service: Arc<BookingService>,
    /// Absent when no payment gateway is configured.
    pub payment_service: Option<Arc<PaymentService>>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        db_pool: SqlitePool,
        identity: Arc<dyn IdentityProvider>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        settings: &Settings,
    ) -> Self {
        let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let property_repo: Arc<dyn PropertyRepository> = Arc::new(SqlitePropertyRepository::new(db_pool.clone()));
        let booking_repo: Arc<dyn BookingRepository> = Arc::new(SqliteBookingRepository::new(db_pool.clone()));
        let payment_repo: Arc<dyn PaymentRepository> = Arc::new(SqlitePaymentRepository::new(db_pool.clone()));

        let user_service = Arc::new(UserService::new(user_repo.clone(), identity.clone()));
        let property_service = Arc::new(PropertyService::new(
            property_repo.clone(),
            booking_repo.clone(),
            user_service.clone(),
        ));
        let booking_service = Arc::new(BookingService::new(
            booking_repo.clone(),
            property_repo.clone(),
            settings.booking.clone(),
        ));
        let payment_service = gateway.map(|gateway| {
            Arc::new(PaymentService::new(
                payment_repo.clone(),
                booking_repo.clone(),
                property_repo.clone(),
                user_service.clone(),
                gateway,
                settings.payments.clone(),
                settings.booking.clone(),
            ))
        });

        Self {
            user_repo,
            property_repo,
            booking_repo,
            payment_repo,
            identity,
            user_service,
            property_service,
            booking_service,
            payment_service,
            db_pool,
        }
    }
}
