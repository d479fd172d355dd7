mod common;

use common::{setup, user};
use serde_json::json;
use skybridge::{
    auth::IdentityClaims,
    domain::Role,
    error::AppError,
    repository::UserRepository,
    service::user_service::IdentityEvent,
};

fn event(kind: &str, id: &str, email: Option<&str>) -> anyhow::Result<IdentityEvent> {
    let emails: Vec<_> = email
        .into_iter()
        .map(|e| json!({ "email_address": e }))
        .collect();

    Ok(serde_json::from_value(json!({
        "type": kind,
        "data": {
            "id": id,
            "email_addresses": emails,
            "first_name": "Ana",
            "last_name": "Reyes"
        }
    }))?)
}

#[tokio::test]
async fn test_first_request_creates_user() -> anyhow::Result<()> {
    let test = setup().await?;
    test.identity.insert("tok", IdentityClaims {
        sub: "user_abc".to_string(),
        email: None,
        first_name: Some("Ana".to_string()),
        last_name: None,
    });
    test.identity.set_email("user_abc", "ana@test.dev");

    let users = &test.ctx.user_service;
    let created = users.authenticate("tok").await?;
    assert_eq!(created.external_id, "user_abc");
    assert_eq!(created.email.as_deref(), Some("ana@test.dev"));
    assert_eq!(created.role, Role::Customer);

    let again = users.authenticate("tok").await?;
    assert_eq!(again.id, created.id);
    assert_eq!(users.count().await?, 1);

    assert!(matches!(users.authenticate("bogus").await, Err(AppError::Unauthorized)));

    Ok(())
}

#[tokio::test]
async fn test_identity_events() -> anyhow::Result<()> {
    let test = setup().await?;
    let users = &test.ctx.user_service;

    users.handle_identity_event(event("user.created", "user_1", Some("one@test.dev"))?).await?;
    let created = test.ctx.user_repo.find_by_external_id("user_1").await?.expect("created");
    assert_eq!(created.email.as_deref(), Some("one@test.dev"));

    // Redelivery keeps the existing record
    users.handle_identity_event(event("user.created", "user_1", Some("other@test.dev"))?).await?;
    let same = test.ctx.user_repo.find_by_external_id("user_1").await?.expect("still there");
    assert_eq!(same.id, created.id);
    assert_eq!(same.email.as_deref(), Some("one@test.dev"));

    let missing_email = users.handle_identity_event(event("user.created", "user_2", None)?).await;
    assert!(matches!(missing_email, Err(AppError::Validation(_))));

    users.handle_identity_event(event("user.updated", "user_1", Some("renamed@test.dev"))?).await?;
    let updated = test.ctx.user_repo.find_by_external_id("user_1").await?.expect("updated");
    assert_eq!(updated.email.as_deref(), Some("renamed@test.dev"));

    // Updates for unknown users create them
    users.handle_identity_event(event("user.updated", "user_3", Some("three@test.dev"))?).await?;
    assert!(test.ctx.user_repo.find_by_external_id("user_3").await?.is_some());

    users.handle_identity_event(event("session.created", "user_1", None)?).await?;

    Ok(())
}

#[tokio::test]
async fn test_deleted_user_is_locked_out() -> anyhow::Result<()> {
    let test = setup().await?;
    let existing = user(&test.ctx, "user_gone", Some("gone@test.dev"), Role::Customer).await?;
    common::login(&test, "tok", &existing);

    let users = &test.ctx.user_service;
    users.authenticate("tok").await?;

    users.handle_identity_event(event("user.deleted", "user_gone", None)?).await?;
    let deleted = test.ctx.user_repo.find_by_external_id("user_gone").await?.expect("kept");
    assert!(deleted.is_deleted());

    assert!(matches!(users.authenticate("tok").await, Err(AppError::Unauthorized)));

    // Deleting an unknown user is not an error
    users.handle_identity_event(event("user.deleted", "user_never", None)?).await?;

    Ok(())
}

#[tokio::test]
async fn test_first_property_promotes_customer() -> anyhow::Result<()> {
    let test = setup().await?;
    let customer = user(&test.ctx, "user_host", None, Role::Customer).await?;
    let admin = user(&test.ctx, "user_admin", None, Role::Admin).await?;
    let users = &test.ctx.user_service;

    assert_eq!(users.promote_to_owner(&customer).await?.role, Role::HotelOwner);
    assert_eq!(users.promote_to_owner(&admin).await?.role, Role::Admin);

    Ok(())
}
