use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    domain::{Property, PropertyInput, PropertyStatus, RoomType, RoomTypeInput},
    error::{AppError, Result},
    repository::PropertyRepository,
};

#[derive(FromRow)]
struct PropertyRow {
    id: String,
    owner_id: String,
    name: String,
    description: String,
    property_type: String,
    address: String,
    city: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    amenities: String,
    images: String,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    check_in_time: String,
    check_out_time: String,
    status: String,
    submission_date: NaiveDateTime,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct RoomTypeRow {
    id: String,
    property_id: String,
    name: String,
    description: Option<String>,
    bed_configuration: String,
    max_adults: i64,
    max_children: i64,
    price_per_night_cents: i64,
    available_rooms: i64,
    amenities: String,
}

const PROPERTY_COLUMNS: &str = r#"
    id, owner_id, name, description, property_type, address, city,
    latitude, longitude, amenities, images, contact_email, contact_phone,
    check_in_time, check_out_time, status, submission_date, created_at, updated_at
"#;

pub struct SqlitePropertyRepository {
    pool: SqlitePool,
}

impl SqlitePropertyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_uuid(raw: &str) -> Result<Uuid> {
        Uuid::parse_str(raw).map_err(|e| AppError::Database(e.to_string()))
    }

    fn parse_list(raw: &str) -> Result<Vec<String>> {
        serde_json::from_str(raw).map_err(|e| AppError::Database(e.to_string()))
    }

    fn encode_list(items: &[String]) -> Result<String> {
        serde_json::to_string(items).map_err(|e| AppError::Internal(e.to_string()))
    }

    fn row_to_room_type(row: RoomTypeRow) -> Result<RoomType> {
        Ok(RoomType {
            id: Self::parse_uuid(&row.id)?,
            property_id: Self::parse_uuid(&row.property_id)?,
            name: row.name,
            description: row.description,
            bed_configuration: row.bed_configuration,
            max_adults: row.max_adults,
            max_children: row.max_children,
            price_per_night_cents: row.price_per_night_cents,
            available_rooms: row.available_rooms,
            amenities: Self::parse_list(&row.amenities)?,
        })
    }

    fn row_to_property(row: PropertyRow, room_types: Vec<RoomType>) -> Result<Property> {
        Ok(Property {
            id: Self::parse_uuid(&row.id)?,
            owner_id: Self::parse_uuid(&row.owner_id)?,
            name: row.name,
            description: row.description,
            property_type: row.property_type,
            address: row.address,
            city: row.city,
            latitude: row.latitude,
            longitude: row.longitude,
            amenities: Self::parse_list(&row.amenities)?,
            images: Self::parse_list(&row.images)?,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            status: PropertyStatus::from_str(&row.status)
                .ok_or_else(|| AppError::Database(format!("Invalid property status: {}", row.status)))?,
            submission_date: DateTime::from_naive_utc_and_offset(row.submission_date, Utc),
            room_types,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    async fn load_room_types(&self, property_id: &str) -> Result<Vec<RoomType>> {
        let rows = sqlx::query_as::<_, RoomTypeRow>(
            r#"
            SELECT id, property_id, name, description, bed_configuration,
                   max_adults, max_children, price_per_night_cents, available_rooms, amenities
            FROM room_types
            WHERE property_id = ?
            ORDER BY price_per_night_cents ASC, created_at ASC
            "#
        )
        .bind(property_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_room_type)
            .collect()
    }

    async fn hydrate(&self, rows: Vec<PropertyRow>) -> Result<Vec<Property>> {
        let mut properties = Vec::with_capacity(rows.len());
        for row in rows {
            let room_types = self.load_room_types(&row.id).await?;
            properties.push(Self::row_to_property(row, room_types)?);
        }
        Ok(properties)
    }

    async fn insert_room_type(
        conn: &mut SqliteConnection,
        id: Uuid,
        property_id: Uuid,
        input: &RoomTypeInput,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO room_types (
                id, property_id, name, description, bed_configuration,
                max_adults, max_children, price_per_night_cents, available_rooms, amenities
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(property_id.to_string())
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.bed_configuration)
        .bind(input.max_adults)
        .bind(input.max_children)
        .bind(input.price_per_night_cents)
        .bind(input.available_rooms)
        .bind(Self::encode_list(&input.amenities)?)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn update_room_type(conn: &mut SqliteConnection, id: Uuid, input: &RoomTypeInput) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE room_types
            SET name = ?,
                description = ?,
                bed_configuration = ?,
                max_adults = ?,
                max_children = ?,
                price_per_night_cents = ?,
                available_rooms = ?,
                amenities = ?
            WHERE id = ?
            "#
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.bed_configuration)
        .bind(input.max_adults)
        .bind(input.max_children)
        .bind(input.price_per_night_cents)
        .bind(input.available_rooms)
        .bind(Self::encode_list(&input.amenities)?)
        .bind(id.to_string())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl PropertyRepository for SqlitePropertyRepository {
    async fn create(&self, owner_id: Uuid, input: PropertyInput) -> Result<Property> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO properties (
                id, owner_id, name, description, property_type, address, city,
                latitude, longitude, amenities, images, contact_email, contact_phone,
                check_in_time, check_out_time, status, submission_date, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.property_type)
        .bind(&input.address)
        .bind(&input.city)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(Self::encode_list(&input.amenities)?)
        .bind(Self::encode_list(&input.images)?)
        .bind(&input.contact_email)
        .bind(&input.contact_phone)
        .bind(&input.check_in_time)
        .bind(&input.check_out_time)
        .bind(PropertyStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        for room_type in &input.room_types {
            Self::insert_room_type(&mut *tx, Uuid::new_v4(), id, room_type).await?;
        }

        tx.commit().await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created property".to_string())
        })
    }

    async fn update(&self, id: Uuid, input: PropertyInput) -> Result<Property> {
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE properties
            SET name = ?,
                description = ?,
                property_type = ?,
                address = ?,
                city = ?,
                latitude = ?,
                longitude = ?,
                amenities = ?,
                images = ?,
                contact_email = ?,
                contact_phone = ?,
                check_in_time = ?,
                check_out_time = ?,
                status = ?,
                submission_date = ?,
                updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.property_type)
        .bind(&input.address)
        .bind(&input.city)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(Self::encode_list(&input.amenities)?)
        .bind(Self::encode_list(&input.images)?)
        .bind(&input.contact_email)
        .bind(&input.contact_phone)
        .bind(&input.check_in_time)
        .bind(&input.check_out_time)
        .bind(PropertyStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .bind(&id_str)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Property not found".to_string()));
        }

        let existing: HashSet<String> = sqlx::query_scalar::<_, String>(
            "SELECT id FROM room_types WHERE property_id = ?"
        )
        .bind(&id_str)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        let mut kept = HashSet::new();
        for room_type in &input.room_types {
            match room_type.id {
                Some(room_type_id) => {
                    let key = room_type_id.to_string();
                    if !existing.contains(&key) {
                        return Err(AppError::Validation(format!(
                            "Room type {} does not belong to this property",
                            room_type_id
                        )));
                    }
                    Self::update_room_type(&mut *tx, room_type_id, room_type).await?;
                    kept.insert(key);
                }
                None => {
                    Self::insert_room_type(&mut *tx, Uuid::new_v4(), id, room_type).await?;
                }
            }
        }

        for removed in existing.difference(&kept) {
            let referenced = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM bookings WHERE room_type_id = ?"
            )
            .bind(removed)
            .fetch_one(&mut *tx)
            .await?;

            if referenced > 0 {
                return Err(AppError::Conflict(format!(
                    "Room type {} has bookings and cannot be removed",
                    removed
                )));
            }

            sqlx::query("DELETE FROM room_types WHERE id = ?")
                .bind(removed)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated property".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>> {
        let sql = format!("SELECT {} FROM properties WHERE id = ?", PROPERTY_COLUMNS);
        let row = sqlx::query_as::<_, PropertyRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => {
                let room_types = self.load_room_types(&r.id).await?;
                Ok(Some(Self::row_to_property(r, room_types)?))
            }
            None => Ok(None)
        }
    }

    async fn list_published(&self) -> Result<Vec<Property>> {
        let sql = format!(
            "SELECT {} FROM properties WHERE status = ? ORDER BY created_at DESC",
            PROPERTY_COLUMNS
        );
        let rows = sqlx::query_as::<_, PropertyRow>(&sql)
            .bind(PropertyStatus::Published.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.hydrate(rows).await
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Property>> {
        let sql = format!(
            "SELECT {} FROM properties WHERE owner_id = ? ORDER BY created_at DESC",
            PROPERTY_COLUMNS
        );
        let rows = sqlx::query_as::<_, PropertyRow>(&sql)
            .bind(owner_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.hydrate(rows).await
    }

    async fn update_status(&self, id: Uuid, status: PropertyStatus) -> Result<Property> {
        sqlx::query("UPDATE properties SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))
    }
}
