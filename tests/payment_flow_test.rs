mod common;

use std::sync::Arc;

use common::{date, published_property, setup, user, TestContext};
use skybridge::{
    domain::{Booking, BookingStatus, CreateBookingRequest, PaymentStatus, Role, User},
    error::AppError,
    repository::{BookingRepository, PaymentRepository},
    service::payment_service::{PaymentNotification, PaymentService, WebhookOutcome},
};

struct Fixture {
    test: TestContext,
    payments: Arc<PaymentService>,
    guest: User,
    booking: Booking,
}

/// One pending booking for 2 nights at 2000.00 per night.
async fn booked(guest_email: Option<&str>) -> anyhow::Result<Fixture> {
    let test = setup().await?;
    let payments = test.ctx.payment_service.clone().expect("payments configured");
    let owner = user(&test.ctx, "owner", Some("owner@test.dev"), Role::HotelOwner).await?;
    let guest = user(&test.ctx, "guest", guest_email, Role::Customer).await?;
    let property = published_property(&test.ctx, &owner, 200000, 2).await?;

    let booking = test
        .ctx
        .booking_service
        .create_booking(&guest, CreateBookingRequest {
            property_id: property.id,
            room_type_id: property.room_types[0].id,
            check_in: date(2030, 1, 10),
            check_out: date(2030, 1, 12),
            adults: 2,
            children: 0,
        })
        .await?;

    Ok(Fixture { test, payments, guest, booking })
}

fn paid(invoice_id: &str, reference: &str, amount: f64) -> PaymentNotification {
    PaymentNotification {
        id: Some(invoice_id.to_string()),
        external_id: Some(reference.to_string()),
        status: Some("PAID".to_string()),
        paid_amount: Some(amount),
        payment_method: Some("EWALLET".to_string()),
    }
}

async fn booking_status(test: &TestContext, booking: &Booking) -> anyhow::Result<BookingStatus> {
    Ok(test
        .ctx
        .booking_repo
        .find_by_id(booking.id)
        .await?
        .expect("booking exists")
        .status)
}

#[tokio::test]
async fn test_issue_invoice() -> anyhow::Result<()> {
    let f = booked(Some("guest@test.dev")).await?;

    let invoice = f.payments.issue_invoice(&f.guest, &f.booking.reference).await?;
    assert_eq!(invoice.invoice_id, "inv_1");
    assert_eq!(invoice.amount_cents, 448000);
    assert_eq!(invoice.booking_id, f.booking.reference);
    assert_eq!(invoice.property_name, "Seaside");
    assert_eq!(invoice.room_type, "Deluxe");

    let requests = f.test.gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].external_id, f.booking.reference);
    assert_eq!(requests[0].amount_cents, 448000);
    assert_eq!(requests[0].payer_email, "guest@test.dev");
    assert_eq!(requests[0].description, "Hotel Booking - Seaside (Deluxe)");
    assert_eq!(requests[0].payment_methods.len(), 5);

    let payment = f
        .test
        .ctx
        .payment_repo
        .find_by_booking(f.booking.id)
        .await?
        .expect("payment stored");
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.invoice_id, "inv_1");
    assert_eq!(payment.amount_cents, 448000);

    Ok(())
}

#[tokio::test]
async fn test_identity_email_preferred_over_stored() -> anyhow::Result<()> {
    let f = booked(Some("old@test.dev")).await?;
    f.test.identity.set_email(&f.guest.external_id, "current@test.dev");

    f.payments.issue_invoice(&f.guest, &f.booking.reference).await?;
    assert_eq!(f.test.gateway.requests()[0].payer_email, "current@test.dev");

    Ok(())
}

#[tokio::test]
async fn test_invoice_rejections() -> anyhow::Result<()> {
    let f = booked(None).await?;

    let missing_email = f.payments.issue_invoice(&f.guest, &f.booking.reference).await;
    assert!(matches!(missing_email, Err(AppError::MissingEmail)));
    assert!(f.test.gateway.requests().is_empty());

    let stranger = user(&f.test.ctx, "stranger", Some("s@test.dev"), Role::Customer).await?;
    let forbidden = f.payments.issue_invoice(&stranger, &f.booking.reference).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

    let unknown = f.payments.issue_invoice(&f.guest, "BK-00000000-NOPE00").await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_second_invoice_is_rejected() -> anyhow::Result<()> {
    let f = booked(Some("guest@test.dev")).await?;

    f.payments.issue_invoice(&f.guest, &f.booking.reference).await?;
    let again = f.payments.issue_invoice(&f.guest, &f.booking.reference).await;
    match again {
        Err(AppError::DuplicateInvoice { invoice_id, status }) => {
            assert_eq!(invoice_id, "inv_1");
            assert_eq!(status, "PENDING");
        }
        other => panic!("expected duplicate invoice, got {other:?}"),
    }
    assert_eq!(f.test.gateway.requests().len(), 1);

    f.payments.reconcile(paid("inv_1", &f.booking.reference, 4480.0)).await;
    let after_payment = f.payments.issue_invoice(&f.guest, &f.booking.reference).await;
    assert!(matches!(after_payment, Err(AppError::AlreadyPaid)));

    Ok(())
}

#[tokio::test]
async fn test_provider_failure_stores_nothing() -> anyhow::Result<()> {
    let f = booked(Some("guest@test.dev")).await?;
    f.test.gateway.fail_with("INVALID_API_KEY");

    let result = f.payments.issue_invoice(&f.guest, &f.booking.reference).await;
    assert!(matches!(result, Err(AppError::PaymentProvider(_))));
    assert!(f.test.ctx.payment_repo.find_by_booking(f.booking.id).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_duplicate_paid_callbacks_confirm_once() -> anyhow::Result<()> {
    let f = booked(Some("guest@test.dev")).await?;
    f.payments.issue_invoice(&f.guest, &f.booking.reference).await?;

    let first = f.payments.reconcile(paid("inv_1", &f.booking.reference, 4480.0)).await;
    assert_eq!(first, WebhookOutcome::Confirmed);

    let second = f.payments.reconcile(paid("inv_1", &f.booking.reference, 4480.0)).await;
    assert_eq!(second, WebhookOutcome::AlreadyFinal(PaymentStatus::Paid));

    assert_eq!(booking_status(&f.test, &f.booking).await?, BookingStatus::Confirmed);
    let payment = f
        .test
        .ctx
        .payment_repo
        .find_by_invoice_id("inv_1")
        .await?
        .expect("payment stored");
    assert_eq!(payment.status, PaymentStatus::Paid);
    assert_eq!(payment.payment_method.as_deref(), Some("EWALLET"));
    assert!(payment.transaction_date.is_some());

    Ok(())
}

#[tokio::test]
async fn test_small_rounding_difference_is_tolerated() -> anyhow::Result<()> {
    let f = booked(Some("guest@test.dev")).await?;
    f.payments.issue_invoice(&f.guest, &f.booking.reference).await?;

    let outcome = f.payments.reconcile(paid("inv_1", &f.booking.reference, 4479.5)).await;
    assert_eq!(outcome, WebhookOutcome::Confirmed);

    Ok(())
}

#[tokio::test]
async fn test_amount_mismatch_fails_payment() -> anyhow::Result<()> {
    let f = booked(Some("guest@test.dev")).await?;
    f.payments.issue_invoice(&f.guest, &f.booking.reference).await?;

    let outcome = f.payments.reconcile(paid("inv_1", &f.booking.reference, 100.0)).await;
    assert_eq!(
        outcome,
        WebhookOutcome::AmountMismatch { expected_cents: 448000, paid_cents: 10000 }
    );

    let payment = f.test.ctx.payment_repo.find_by_invoice_id("inv_1").await?.expect("payment stored");
    assert_eq!(payment.status, PaymentStatus::Failed);
    assert_eq!(booking_status(&f.test, &f.booking).await?, BookingStatus::Pending);

    // Failed is terminal
    let late = f.payments.reconcile(paid("inv_1", &f.booking.reference, 4480.0)).await;
    assert_eq!(late, WebhookOutcome::AlreadyFinal(PaymentStatus::Failed));
    assert_eq!(booking_status(&f.test, &f.booking).await?, BookingStatus::Pending);

    Ok(())
}

#[tokio::test]
async fn test_expired_invoice_marks_failed() -> anyhow::Result<()> {
    let f = booked(Some("guest@test.dev")).await?;
    f.payments.issue_invoice(&f.guest, &f.booking.reference).await?;

    let mut expired = paid("inv_1", &f.booking.reference, 0.0);
    expired.status = Some("EXPIRED".to_string());
    assert_eq!(f.payments.reconcile(expired.clone()).await, WebhookOutcome::MarkedFailed);
    assert_eq!(
        f.payments.reconcile(expired).await,
        WebhookOutcome::AlreadyFinal(PaymentStatus::Failed)
    );
    assert_eq!(booking_status(&f.test, &f.booking).await?, BookingStatus::Pending);

    Ok(())
}

#[tokio::test]
async fn test_unusable_callbacks_are_acknowledged() -> anyhow::Result<()> {
    let f = booked(Some("guest@test.dev")).await?;
    f.payments.issue_invoice(&f.guest, &f.booking.reference).await?;

    let empty = f.payments.reconcile(PaymentNotification::default()).await;
    assert_eq!(empty, WebhookOutcome::MissingFields);

    let unknown = f.payments.reconcile(paid("inv_999", &f.booking.reference, 4480.0)).await;
    assert_eq!(unknown, WebhookOutcome::UnknownInvoice);

    let mismatch = f.payments.reconcile(paid("inv_1", "BK-20300101-OTHER1", 4480.0)).await;
    assert_eq!(mismatch, WebhookOutcome::ReferenceMismatch);

    let mut pending = paid("inv_1", &f.booking.reference, 0.0);
    pending.status = Some("PENDING".to_string());
    assert!(matches!(f.payments.reconcile(pending).await, WebhookOutcome::Ignored(_)));

    let payment = f.test.ctx.payment_repo.find_by_invoice_id("inv_1").await?.expect("payment stored");
    assert_eq!(payment.status, PaymentStatus::Pending);

    Ok(())
}

#[tokio::test]
async fn test_paid_after_cancellation_keeps_booking_cancelled() -> anyhow::Result<()> {
    let f = booked(Some("guest@test.dev")).await?;
    f.payments.issue_invoice(&f.guest, &f.booking.reference).await?;
    f.test.ctx.booking_service.cancel(&f.guest, f.booking.id).await?;

    let outcome = f.payments.reconcile(paid("inv_1", &f.booking.reference, 4480.0)).await;
    assert_eq!(outcome, WebhookOutcome::PaidBookingNotPending);
    assert_eq!(booking_status(&f.test, &f.booking).await?, BookingStatus::Cancelled);

    let cancelled_invoice = f.payments.issue_invoice(&f.guest, &f.booking.reference).await;
    assert!(matches!(cancelled_invoice, Err(AppError::AlreadyCancelled)));

    Ok(())
}

#[tokio::test]
async fn test_sync_pulls_provider_status() -> anyhow::Result<()> {
    let f = booked(Some("guest@test.dev")).await?;

    let no_invoice = f.payments.sync_invoice(&f.guest, &f.booking.reference).await;
    assert!(matches!(no_invoice, Err(AppError::NotFound(_))));

    f.payments.issue_invoice(&f.guest, &f.booking.reference).await?;

    let (outcome, payment) = f.payments.sync_invoice(&f.guest, &f.booking.reference).await?;
    assert!(matches!(outcome, WebhookOutcome::Ignored(_)));
    assert_eq!(payment.status, PaymentStatus::Pending);

    f.test.gateway.set_status("inv_1", "SETTLED", Some(448000));
    let (outcome, payment) = f.payments.sync_invoice(&f.guest, &f.booking.reference).await?;
    assert_eq!(outcome, WebhookOutcome::Confirmed);
    assert_eq!(payment.status, PaymentStatus::Paid);
    assert_eq!(booking_status(&f.test, &f.booking).await?, BookingStatus::Confirmed);

    Ok(())
}
