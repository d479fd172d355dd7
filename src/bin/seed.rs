use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::Parser;
use fake::{
    faker::{
        address::en::{CityName, StreetName},
        company::en::CompanyName,
        internet::en::SafeEmail,
        lorem::en::Sentence,
        name::en::{FirstName, LastName},
        phone_number::en::PhoneNumber,
    },
    Fake,
};
use rand::{seq::SliceRandom, Rng};
use skybridge::{
    config::BookingPolicy,
    domain::{CreateBookingRequest, PropertyInput, PropertyStatus, Role, RoomTypeInput, UserProfile},
    repository::{
        PropertyRepository, SqliteBookingRepository, SqlitePropertyRepository,
        SqliteUserRepository, UserRepository,
    },
    service::booking_service::BookingService,
};
use sqlx::sqlite::SqlitePoolOptions;

#[derive(Parser, Debug)]
#[command(name = "seed", about = "Populate a Skybridge database with demo data")]
struct Args {
    /// Database URL; falls back to DATABASE_URL, then the local default.
    #[arg(long)]
    database_url: Option<String>,

    /// Number of published properties to create.
    #[arg(long, default_value_t = 3)]
    properties: usize,

    /// Number of guest accounts to create, each with one booking.
    #[arg(long, default_value_t = 5)]
    guests: usize,
}

const PROPERTY_TYPES: [&str; 3] = ["Hotel", "Resort", "Inn"];
const AMENITIES: [&str; 6] = ["wifi", "pool", "parking", "breakfast", "gym", "spa"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let database_url = args
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://skybridge.db?mode=rwc".to_string());

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let user_repo = SqliteUserRepository::new(db_pool.clone());
    let property_repo = Arc::new(SqlitePropertyRepository::new(db_pool.clone()));
    let booking_repo = Arc::new(SqliteBookingRepository::new(db_pool.clone()));
    let bookings = BookingService::new(booking_repo, property_repo.clone(), BookingPolicy::default());

    println!("👥 Creating users...");

    let admin = user_repo
        .create("seed_admin", UserProfile {
            email: Some("admin@skybridge.local".to_string()),
            first_name: Some("Admin".to_string()),
            last_name: Some("User".to_string()),
        })
        .await?;
    user_repo.set_role(admin.id, Role::Admin).await?;

    let owner = user_repo
        .create("seed_owner", UserProfile {
            email: Some("owner@skybridge.local".to_string()),
            first_name: Some(FirstName().fake()),
            last_name: Some(LastName().fake()),
        })
        .await?;
    let owner = user_repo.set_role(owner.id, Role::HotelOwner).await?;

    let mut guests = Vec::with_capacity(args.guests);
    for i in 0..args.guests {
        let guest = user_repo
            .create(&format!("seed_guest_{}", i), UserProfile {
                email: Some(SafeEmail().fake()),
                first_name: Some(FirstName().fake()),
                last_name: Some(LastName().fake()),
            })
            .await?;
        guests.push(guest);
    }

    println!("  ✅ Created admin, owner and {} guests", guests.len());

    println!("🏨 Creating properties...");

    let mut rng = rand::thread_rng();
    let mut properties = Vec::with_capacity(args.properties);
    for _ in 0..args.properties {
        let mut amenities: Vec<String> = AMENITIES
            .choose_multiple(&mut rng, 3)
            .map(|a| a.to_string())
            .collect();
        amenities.sort();

        let base_rate: i64 = rng.gen_range(15..60) * 10_000;
        let input = PropertyInput {
            name: format!("{} {}", CompanyName().fake::<String>(), PROPERTY_TYPES.choose(&mut rng).unwrap_or(&"Hotel")),
            description: Sentence(8..16).fake(),
            property_type: PROPERTY_TYPES.choose(&mut rng).unwrap_or(&"Hotel").to_string(),
            address: StreetName().fake(),
            city: CityName().fake(),
            latitude: Some(rng.gen_range(5.0..19.0)),
            longitude: Some(rng.gen_range(117.0..126.0)),
            amenities,
            images: Vec::new(),
            contact_email: Some(owner.email.clone().unwrap_or_else(|| "owner@skybridge.local".to_string())),
            contact_phone: Some(PhoneNumber().fake()),
            check_in_time: "14:00".to_string(),
            check_out_time: "12:00".to_string(),
            room_types: vec![
                RoomTypeInput {
                    id: None,
                    name: "Standard".to_string(),
                    description: Some(Sentence(4..8).fake()),
                    bed_configuration: "1 Queen".to_string(),
                    max_adults: 2,
                    max_children: 1,
                    price_per_night_cents: base_rate,
                    available_rooms: rng.gen_range(2..6),
                    amenities: vec!["wifi".to_string()],
                },
                RoomTypeInput {
                    id: None,
                    name: "Family Suite".to_string(),
                    description: Some(Sentence(4..8).fake()),
                    bed_configuration: "2 Queens".to_string(),
                    max_adults: 4,
                    max_children: 2,
                    price_per_night_cents: base_rate * 2,
                    available_rooms: 1,
                    amenities: vec!["wifi".to_string(), "minibar".to_string()],
                },
            ],
        };

        let property = property_repo.create(owner.id, input).await?;
        let property = property_repo.update_status(property.id, PropertyStatus::Published).await?;
        properties.push(property);
    }

    println!("  ✅ Created {} published properties", properties.len());

    println!("🛏️  Creating bookings...");

    let mut created = 0;
    for guest in &guests {
        let Some(property) = properties.choose(&mut rng) else {
            break;
        };
        let Some(room_type) = property.room_types.first() else {
            continue;
        };

        let check_in = (Utc::now() + Duration::days(rng.gen_range(10..60))).date_naive();
        let nights = rng.gen_range(1..5);
        let request = CreateBookingRequest {
            property_id: property.id,
            room_type_id: room_type.id,
            check_in,
            check_out: check_in + Duration::days(nights),
            adults: 2,
            children: 0,
        };

        match bookings.create_booking(guest, request).await {
            Ok(booking) => {
                created += 1;
                println!("  • {} for {} night(s) at {}", booking.reference, booking.nights, property.name);
            }
            Err(e) => println!("  ⚠️  Skipped booking for {}: {}", guest.external_id, e),
        }
    }

    println!("  ✅ Created {} bookings", created);
    println!("🎉 Seeding complete!");

    Ok(())
}
