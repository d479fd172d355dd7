use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::{BookingRepository, PropertyRepository},
    service::user_service::UserService,
};

pub struct PropertyService {
    property_repo: Arc<dyn PropertyRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    user_service: Arc<UserService>,
}

impl PropertyService {
    pub fn new(
        property_repo: Arc<dyn PropertyRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        user_service: Arc<UserService>,
    ) -> Self {
        Self {
            property_repo,
            booking_repo,
            user_service,
        }
    }

    /// Published properties matching the filters. Room types outside the
    /// price range, or without a free room for the requested stay, are
    /// dropped; properties left with no room types are dropped with them.
    pub async fn search(&self, search: PropertySearch) -> Result<Vec<Property>> {
        let stay = match (search.check_in, search.check_out) {
            (Some(check_in), Some(check_out)) => Some(Stay::new(check_in, check_out)?),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "checkIn and checkOut must be provided together".to_string(),
                ))
            }
        };

        let amenities = search.amenity_list();
        let mut results = Vec::new();

        for mut property in self.property_repo.list_published().await? {
            if let Some(kind) = &search.property_type {
                if !property.property_type.eq_ignore_ascii_case(kind) {
                    continue;
                }
            }

            if !amenities.iter().all(|wanted| {
                property.amenities.iter().any(|a| a.eq_ignore_ascii_case(wanted))
            }) {
                continue;
            }

            if search.has_price_filter() {
                property.room_types.retain(|rt| search.price_matches(rt.price_per_night_cents));
                if property.room_types.is_empty() {
                    continue;
                }
            }

            if let Some(stay) = stay {
                let mut open = Vec::with_capacity(property.room_types.len());
                for room_type in property.room_types {
                    let booked = self.booking_repo.count_overlapping(room_type.id, stay).await?;
                    if booked < room_type.available_rooms {
                        open.push(room_type);
                    }
                }
                if open.is_empty() {
                    continue;
                }
                property.room_types = open;
            }

            results.push(property);
        }

        Ok(results)
    }

    pub async fn get_published(&self, id: Uuid) -> Result<Property> {
        match self.property_repo.find_by_id(id).await? {
            Some(property) if property.is_published() => Ok(property),
            _ => Err(AppError::NotFound("Property not found".to_string())),
        }
    }

    /// Submits a new property for moderation. The submitter becomes a hotel
    /// owner if they were a customer.
    pub async fn create(&self, user: &User, input: PropertyInput) -> Result<Property> {
        if !user.can(Capability::SubmitProperty) {
            return Err(AppError::Forbidden("You cannot submit properties".to_string()));
        }
        input.validate()?;

        let property = self.property_repo.create(user.id, input).await?;
        self.user_service.promote_to_owner(user).await?;

        tracing::info!(
            "Property {} submitted by {} with {} room types",
            property.id,
            user.id,
            property.room_types.len()
        );

        Ok(property)
    }

    /// Owner edit. Sends the property back to moderation.
    pub async fn update(&self, user: &User, id: Uuid, input: PropertyInput) -> Result<Property> {
        input.validate()?;

        let existing = self
            .property_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;

        if existing.owner_id != user.id && user.role != Role::Admin {
            return Err(AppError::Forbidden("You can only edit your own properties".to_string()));
        }

        let property = self.property_repo.update(id, input).await?;
        tracing::info!("Property {} updated, status reset to {}", property.id, property.status.as_str());

        Ok(property)
    }

    pub async fn mine(&self, user: &User) -> Result<Vec<Property>> {
        if !user.can(Capability::ManageOwnProperties) {
            return Err(AppError::Forbidden("Only hotel owners can list their properties".to_string()));
        }
        self.property_repo.list_by_owner(user.id).await
    }
}
