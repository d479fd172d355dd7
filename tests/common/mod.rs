#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use skybridge::{
    auth::{IdentityClaims, StaticIdentityProvider},
    config::Settings,
    domain::{Property, PropertyInput, PropertyStatus, Role, RoomTypeInput, User, UserProfile},
    payments::FakePaymentGateway,
    repository::{PropertyRepository, UserRepository},
    service::ServiceContext,
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// Base64 key shared by the webhook tests.
pub const WEBHOOK_SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";

pub struct TestContext {
    pub pool: SqlitePool,
    pub ctx: Arc<ServiceContext>,
    pub identity: Arc<StaticIdentityProvider>,
    pub gateway: Arc<FakePaymentGateway>,
    pub settings: Settings,
}

pub async fn setup() -> anyhow::Result<TestContext> {
    // One connection so every query sees the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await?;

    let mut settings = Settings::default();
    settings.payments.enabled = true;
    settings.payments.webhook_secret = Some(WEBHOOK_SECRET.to_string());
    settings.auth.webhook_secret = Some(WEBHOOK_SECRET.to_string());

    let identity = Arc::new(StaticIdentityProvider::new());
    let gateway = Arc::new(FakePaymentGateway::new());

    let ctx = Arc::new(ServiceContext::new(
        pool.clone(),
        identity.clone(),
        Some(gateway.clone()),
        &settings,
    ));

    Ok(TestContext {
        pool,
        ctx,
        identity,
        gateway,
        settings,
    })
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub async fn user(ctx: &ServiceContext, external_id: &str, email: Option<&str>, role: Role) -> anyhow::Result<User> {
    let user = ctx
        .user_repo
        .create(external_id, UserProfile {
            email: email.map(str::to_string),
            first_name: Some("Test".to_string()),
            last_name: Some(external_id.to_string()),
        })
        .await?;

    if role != Role::Customer {
        return Ok(ctx.user_repo.set_role(user.id, role).await?);
    }
    Ok(user)
}

/// Registers a session token for `user` with the fake identity provider.
pub fn login(test: &TestContext, token: &str, user: &User) {
    test.identity.insert(token, IdentityClaims {
        sub: user.external_id.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    });
}

pub fn room_type_input(name: &str, rate_cents: i64, rooms: i64) -> RoomTypeInput {
    RoomTypeInput {
        id: None,
        name: name.to_string(),
        description: None,
        bed_configuration: "1 Queen".to_string(),
        max_adults: 2,
        max_children: 1,
        price_per_night_cents: rate_cents,
        available_rooms: rooms,
        amenities: vec!["wifi".to_string()],
    }
}

pub fn property_input(name: &str, room_types: Vec<RoomTypeInput>) -> PropertyInput {
    PropertyInput {
        name: name.to_string(),
        description: "Close to the beach".to_string(),
        property_type: "Hotel".to_string(),
        address: "1 Shore Road".to_string(),
        city: "Cebu".to_string(),
        latitude: Some(10.3),
        longitude: Some(123.9),
        amenities: vec!["wifi".to_string(), "pool".to_string()],
        images: Vec::new(),
        contact_email: Some("front@seaside.test".to_string()),
        contact_phone: None,
        check_in_time: "14:00".to_string(),
        check_out_time: "12:00".to_string(),
        room_types,
    }
}

/// A published property with a single room type.
pub async fn published_property(
    ctx: &ServiceContext,
    owner: &User,
    rate_cents: i64,
    rooms: i64,
) -> anyhow::Result<Property> {
    let property = ctx
        .property_repo
        .create(owner.id, property_input("Seaside", vec![room_type_input("Deluxe", rate_cents, rooms)]))
        .await?;

    Ok(ctx.property_repo.update_status(property.id, PropertyStatus::Published).await?)
}
