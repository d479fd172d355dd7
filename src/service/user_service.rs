use std::sync::Arc;

use serde::Deserialize;

use crate::{
    auth::{IdentityClaims, IdentityProvider},
    domain::{Role, User, UserProfile},
    error::{AppError, Result},
    repository::UserRepository,
};

/// Event delivered by the identity provider's webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: IdentityEventUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEventUser {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<IdentityEventEmail>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEventEmail {
    pub email_address: String,
}

impl IdentityEventUser {
    fn profile(&self) -> UserProfile {
        UserProfile {
            email: self.email_addresses.first().map(|e| e.email_address.clone()),
            first_name: self.first_name.clone().filter(|s| !s.is_empty()),
            last_name: self.last_name.clone().filter(|s| !s.is_empty()),
        }
    }
}

pub struct UserService {
    repo: Arc<dyn UserRepository>,
    identity: Arc<dyn IdentityProvider>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { repo, identity }
    }

    /// Verifies a session token and maps it onto the local user, creating
    /// the user on first sight.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.identity.verify_token(token).await?;
        self.resolve(&claims).await
    }

    pub async fn resolve(&self, claims: &IdentityClaims) -> Result<User> {
        if let Some(user) = self.repo.find_by_external_id(&claims.sub).await? {
            if user.is_deleted() {
                tracing::warn!("Rejected request from deleted user {}", user.external_id);
                return Err(AppError::Unauthorized);
            }
            return Ok(user);
        }

        let mut profile = claims.profile();
        if profile.email.is_none() {
            profile.email = self.identity.primary_email(&claims.sub).await?;
        }

        let user = self.repo.create(&claims.sub, profile).await?;
        tracing::info!("Created user {} for identity {}", user.id, user.external_id);
        Ok(user)
    }

    /// Resolves the payer email, preferring the identity provider's
    /// current primary address over the stored one.
    pub async fn contact_email(&self, user: &User) -> Result<Option<String>> {
        match self.identity.primary_email(&user.external_id).await {
            Ok(Some(email)) => Ok(Some(email)),
            Ok(None) => Ok(user.email.clone()),
            Err(e) => {
                tracing::warn!("Email lookup for {} failed: {}", user.external_id, e);
                Ok(user.email.clone())
            }
        }
    }

    /// First property submission turns a customer into a hotel owner.
    pub async fn promote_to_owner(&self, user: &User) -> Result<User> {
        if user.role != Role::Customer {
            return Ok(user.clone());
        }

        let promoted = self.repo.set_role(user.id, Role::HotelOwner).await?;
        tracing::info!("Promoted user {} to hotel owner", promoted.id);
        Ok(promoted)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        self.repo.list(limit, offset).await
    }

    pub async fn count(&self) -> Result<i64> {
        self.repo.count().await
    }

    pub async fn handle_identity_event(&self, event: IdentityEvent) -> Result<()> {
        tracing::info!(
            "Identity webhook received: {} for {}",
            event.event_type,
            event.data.id
        );

        match event.event_type.as_str() {
            "user.created" => {
                self.user_created(&event.data).await?;
            }
            "user.updated" => {
                let profile = event.data.profile();
                match self.repo.update_profile(&event.data.id, profile).await? {
                    Some(user) => tracing::info!("Updated user {}", user.id),
                    None => {
                        tracing::info!("User {} not found for update, creating", event.data.id);
                        self.user_created(&event.data).await?;
                    }
                }
            }
            "user.deleted" => match self.repo.soft_delete(&event.data.id).await? {
                Some(user) => tracing::info!("Soft deleted user {}", user.id),
                None => tracing::info!("User {} not found for deletion", event.data.id),
            },
            other => {
                tracing::debug!("Unhandled identity webhook event: {}", other);
            }
        }

        Ok(())
    }

    async fn user_created(&self, data: &IdentityEventUser) -> Result<User> {
        if let Some(existing) = self.repo.find_by_external_id(&data.id).await? {
            tracing::info!("User {} already exists, skipping creation", data.id);
            return Ok(existing);
        }

        let profile = data.profile();
        if profile.email.is_none() {
            return Err(AppError::Validation("User email is required".to_string()));
        }

        let user = self.repo.create(&data.id, profile).await?;
        tracing::info!("Created user {} from identity webhook", user.id);
        Ok(user)
    }
}
