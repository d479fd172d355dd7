use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub property_type: String,
    pub address: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub check_in_time: String,
    pub check_out_time: String,
    pub status: PropertyStatus,
    pub submission_date: DateTime<Utc>,
    pub room_types: Vec<RoomType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    pub fn is_published(&self) -> bool {
        self.status == PropertyStatus::Published
    }

    pub fn room_type(&self, id: Uuid) -> Option<&RoomType> {
        self.room_types.iter().find(|rt| rt.id == id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyStatus {
    Pending,
    Published,
    Rejected,
    Archived,
}

impl PropertyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyStatus::Pending => "Pending",
            PropertyStatus::Published => "Published",
            PropertyStatus::Rejected => "Rejected",
            PropertyStatus::Archived => "Archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(PropertyStatus::Pending),
            "Published" => Some(PropertyStatus::Published),
            "Rejected" => Some(PropertyStatus::Rejected),
            "Archived" => Some(PropertyStatus::Archived),
            _ => None,
        }
    }
}

/// A bookable category of rooms. `available_rooms` is the inventory count,
/// rooms within a type are interchangeable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomType {
    pub id: Uuid,
    pub property_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub bed_configuration: String,
    pub max_adults: i64,
    pub max_children: i64,
    pub price_per_night_cents: i64,
    pub available_rooms: i64,
    pub amenities: Vec<String>,
}

impl RoomType {
    pub fn fits_party(&self, adults: i64, children: i64) -> bool {
        adults >= 1 && adults <= self.max_adults && children >= 0 && children <= self.max_children
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoomTypeInput {
    /// Present when an owner edits an existing room type.
    pub id: Option<Uuid>,
    #[validate(length(min = 1, message = "Room type name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub bed_configuration: String,
    #[validate(range(min = 1, message = "At least one adult must fit"))]
    pub max_adults: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub max_children: i64,
    #[validate(range(min = 1, max = 1_000_000_000, message = "Nightly rate must be between 0.01 and 10,000,000.00"))]
    pub price_per_night_cents: i64,
    #[validate(range(min = 0))]
    pub available_rooms: i64,
    #[serde(default)]
    pub amenities: Vec<String>,
}

/// Owner submission, used for both create and update.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInput {
    #[validate(length(min = 1, message = "Property name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1))]
    pub property_type: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    #[serde(default = "default_check_in_time")]
    pub check_in_time: String,
    #[serde(default = "default_check_out_time")]
    pub check_out_time: String,
    #[validate(length(min = 1, message = "At least one room type is required"), nested)]
    pub room_types: Vec<RoomTypeInput>,
}

fn default_check_in_time() -> String {
    "14:00".to_string()
}

fn default_check_out_time() -> String {
    "12:00".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySearch {
    pub property_type: Option<String>,
    /// Comma separated; every listed amenity must be present.
    pub amenities: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    #[serde(default, deserialize_with = "crate::domain::booking::deserialize_optional_date")]
    pub check_in: Option<chrono::NaiveDate>,
    #[serde(default, deserialize_with = "crate::domain::booking::deserialize_optional_date")]
    pub check_out: Option<chrono::NaiveDate>,
}

impl PropertySearch {
    pub fn amenity_list(&self) -> Vec<String> {
        self.amenities
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect()
    }

    pub fn has_price_filter(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }

    pub fn price_matches(&self, price_cents: i64) -> bool {
        self.min_price.map_or(true, |min| price_cents >= min)
            && self.max_price.map_or(true, |max| price_cents <= max)
    }
}
