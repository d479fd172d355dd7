mod common;

use common::{date, property_input, published_property, room_type_input, setup, user};
use skybridge::{
    domain::{CreateBookingRequest, PropertySearch, PropertyStatus, Role},
    error::AppError,
    repository::{PropertyRepository, UserRepository},
};

#[tokio::test]
async fn test_submission_promotes_customer() -> anyhow::Result<()> {
    let test = setup().await?;
    let customer = user(&test.ctx, "host", Some("host@test.dev"), Role::Customer).await?;

    let property = test
        .ctx
        .property_service
        .create(&customer, property_input("Harbor Inn", vec![room_type_input("Twin", 90000, 4)]))
        .await?;
    assert_eq!(property.status, PropertyStatus::Pending);
    assert_eq!(property.owner_id, customer.id);
    assert_eq!(property.room_types.len(), 1);

    let promoted = test.ctx.user_repo.find_by_id(customer.id).await?.expect("user exists");
    assert_eq!(promoted.role, Role::HotelOwner);

    // Pending properties are hidden from the public
    let hidden = test.ctx.property_service.get_published(property.id).await;
    assert!(matches!(hidden, Err(AppError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_submission_requires_room_types() -> anyhow::Result<()> {
    let test = setup().await?;
    let owner = user(&test.ctx, "owner", None, Role::HotelOwner).await?;

    let result = test
        .ctx
        .property_service
        .create(&owner, property_input("Empty", Vec::new()))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let result = test
        .ctx
        .property_service
        .create(&owner, property_input("Free", vec![room_type_input("Cot", 0, 1)]))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let result = test
        .ctx
        .property_service
        .create(&owner, property_input("Gilded", vec![room_type_input("Vault", i64::MAX / 2, 1)]))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn test_update_keeps_room_type_ids() -> anyhow::Result<()> {
    let test = setup().await?;
    let owner = user(&test.ctx, "owner", None, Role::HotelOwner).await?;
    let stranger = user(&test.ctx, "stranger", None, Role::HotelOwner).await?;
    let property = published_property(&test.ctx, &owner, 100000, 2).await?;
    let deluxe = property.room_types[0].clone();

    let mut edited = room_type_input("Deluxe King", 120000, 3);
    edited.id = Some(deluxe.id);
    let input = property_input("Seaside", vec![edited, room_type_input("Suite", 250000, 1)]);

    let forbidden = test.ctx.property_service.update(&stranger, property.id, input.clone()).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

    let updated = test.ctx.property_service.update(&owner, property.id, input).await?;
    assert_eq!(updated.status, PropertyStatus::Pending);
    assert_eq!(updated.room_types.len(), 2);

    let kept = updated.room_type(deluxe.id).expect("room type id is stable");
    assert_eq!(kept.name, "Deluxe King");
    assert_eq!(kept.price_per_night_cents, 120000);
    assert_eq!(kept.available_rooms, 3);

    Ok(())
}

#[tokio::test]
async fn test_booked_room_type_cannot_be_removed() -> anyhow::Result<()> {
    let test = setup().await?;
    let owner = user(&test.ctx, "owner", None, Role::HotelOwner).await?;
    let guest = user(&test.ctx, "guest", None, Role::Customer).await?;
    let property = published_property(&test.ctx, &owner, 100000, 2).await?;

    test.ctx
        .booking_service
        .create_booking(&guest, CreateBookingRequest {
            property_id: property.id,
            room_type_id: property.room_types[0].id,
            check_in: date(2024, 9, 1),
            check_out: date(2024, 9, 3),
            adults: 1,
            children: 0,
        })
        .await?;

    let replacement = property_input("Seaside", vec![room_type_input("Standard", 80000, 5)]);
    let result = test.ctx.property_service.update(&owner, property.id, replacement).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    // The failed edit left the property untouched
    let unchanged = test.ctx.property_service.get_published(property.id).await?;
    assert_eq!(unchanged.room_types.len(), 1);
    assert_eq!(unchanged.room_types[0].name, "Deluxe");

    Ok(())
}

#[tokio::test]
async fn test_search_filters() -> anyhow::Result<()> {
    let test = setup().await?;
    let owner = user(&test.ctx, "owner", None, Role::HotelOwner).await?;
    let guest = user(&test.ctx, "guest", None, Role::Customer).await?;

    let seaside = published_property(&test.ctx, &owner, 100000, 1).await?;

    let mut resort_input = property_input(
        "Hilltop",
        vec![room_type_input("Villa", 500000, 2), room_type_input("Cabin", 200000, 2)],
    );
    resort_input.property_type = "Resort".to_string();
    resort_input.amenities = vec!["spa".to_string()];
    let resort = test.ctx.property_repo.create(owner.id, resort_input).await?;
    test.ctx.property_repo.update_status(resort.id, PropertyStatus::Published).await?;

    // Never listed
    test.ctx
        .property_repo
        .create(owner.id, property_input("Draft", vec![room_type_input("Room", 100000, 1)]))
        .await?;

    let service = &test.ctx.property_service;

    let all = service.search(PropertySearch::default()).await?;
    assert_eq!(all.len(), 2);

    let hotels = service
        .search(PropertySearch { property_type: Some("hotel".to_string()), ..Default::default() })
        .await?;
    assert_eq!(hotels.len(), 1);
    assert_eq!(hotels[0].id, seaside.id);

    let with_pool = service
        .search(PropertySearch { amenities: Some("wifi, pool".to_string()), ..Default::default() })
        .await?;
    assert_eq!(with_pool.len(), 1);

    let budget = service
        .search(PropertySearch { max_price: Some(250000), min_price: Some(150000), ..Default::default() })
        .await?;
    assert_eq!(budget.len(), 1);
    assert_eq!(budget[0].id, resort.id);
    assert_eq!(budget[0].room_types.len(), 1);
    assert_eq!(budget[0].room_types[0].name, "Cabin");

    test.ctx
        .booking_service
        .create_booking(&guest, CreateBookingRequest {
            property_id: seaside.id,
            room_type_id: seaside.room_types[0].id,
            check_in: date(2024, 4, 1),
            check_out: date(2024, 4, 3),
            adults: 1,
            children: 0,
        })
        .await?;

    let stay = PropertySearch {
        check_in: Some(date(2024, 4, 2)),
        check_out: Some(date(2024, 4, 4)),
        ..Default::default()
    };
    let open = service.search(stay).await?;
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, resort.id);

    let half = PropertySearch { check_in: Some(date(2024, 4, 2)), ..Default::default() };
    assert!(matches!(service.search(half).await, Err(AppError::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn test_availability_report() -> anyhow::Result<()> {
    let test = setup().await?;
    let owner = user(&test.ctx, "owner", None, Role::HotelOwner).await?;
    let guest = user(&test.ctx, "guest", None, Role::Customer).await?;
    let property = published_property(&test.ctx, &owner, 100000, 2).await?;
    let room_type_id = property.room_types[0].id;
    let bookings = &test.ctx.booking_service;

    bookings
        .create_booking(&guest, CreateBookingRequest {
            property_id: property.id,
            room_type_id,
            check_in: date(2024, 7, 1),
            check_out: date(2024, 7, 5),
            adults: 1,
            children: 0,
        })
        .await?;

    let stay = skybridge::domain::Stay::new(date(2024, 7, 4), date(2024, 7, 6))?;
    let availability = bookings.availability(property.id, room_type_id, stay).await?;
    assert!(availability.available);
    assert_eq!(availability.total_rooms, 2);
    assert_eq!(availability.booked_rooms, 1);
    assert_eq!(availability.remaining_rooms, 1);

    let after = skybridge::domain::Stay::new(date(2024, 7, 5), date(2024, 7, 6))?;
    assert_eq!(bookings.availability(property.id, room_type_id, after).await?.booked_rooms, 0);

    Ok(())
}

#[tokio::test]
async fn test_owner_listing_requires_owner_role() -> anyhow::Result<()> {
    let test = setup().await?;
    let owner = user(&test.ctx, "owner", None, Role::HotelOwner).await?;
    let customer = user(&test.ctx, "customer", None, Role::Customer).await?;
    published_property(&test.ctx, &owner, 100000, 1).await?;

    assert_eq!(test.ctx.property_service.mine(&owner).await?.len(), 1);
    assert!(matches!(
        test.ctx.property_service.mine(&customer).await,
        Err(AppError::Forbidden(_))
    ));

    Ok(())
}
