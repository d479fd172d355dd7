use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Local mirror of an identity-provider account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    HotelOwner,
    Admin,
}

/// Actions gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SubmitProperty,
    ManageOwnProperties,
    ViewOwnerBookings,
    ViewAnyBooking,
}

impl Role {
    pub fn can(self, capability: Capability) -> bool {
        match capability {
            Capability::SubmitProperty => true,
            Capability::ManageOwnProperties | Capability::ViewOwnerBookings => {
                matches!(self, Role::HotelOwner | Role::Admin)
            }
            Capability::ViewAnyBooking => self == Role::Admin,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::HotelOwner => "HotelOwner",
            Role::Admin => "Admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Customer" => Some(Role::Customer),
            "HotelOwner" => Some(Role::HotelOwner),
            "Admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Profile fields carried by identity tokens and identity webhooks.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}
