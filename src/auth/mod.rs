use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::AuthConfig,
    domain::UserProfile,
    error::{AppError, Result},
};

pub mod signature;

pub use signature::{WebhookVerifier, IDENTITY_HEADERS, PAYMENT_HEADERS};

/// Name of the cookie the identity provider's browser SDK stores the
/// session token in.
pub const SESSION_COOKIE: &str = "__session";

/// Claims extracted from a verified session token.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl IdentityClaims {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// Boundary to the external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<IdentityClaims>;
    async fn primary_email(&self, external_id: &str) -> Result<Option<String>>;
}

pub struct ClerkIdentity {
    decoding_key: DecodingKey,
    validation: Validation,
    http: Client,
    api_url: String,
    secret_key: Option<String>,
}

impl ClerkIdentity {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let (decoding_key, algorithm) = match (&config.jwt_public_key, &config.jwt_secret) {
            (Some(pem), _) => {
                let key = DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| AppError::Internal(format!("Invalid JWT public key: {}", e)))?;
                (key, Algorithm::RS256)
            }
            (None, Some(secret)) => {
                tracing::warn!("Verifying session tokens with a shared secret; use only for development");
                (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
            }
            (None, None) => {
                return Err(AppError::Internal(
                    "auth.jwt_public_key or auth.jwt_secret must be configured".to_string(),
                ))
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            decoding_key,
            validation,
            http: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }
}

#[derive(Deserialize)]
struct ProviderUser {
    #[serde(default)]
    email_addresses: Vec<ProviderEmail>,
    primary_email_address_id: Option<String>,
}

#[derive(Deserialize)]
struct ProviderEmail {
    id: String,
    email_address: String,
}

#[async_trait]
impl IdentityProvider for ClerkIdentity {
    async fn verify_token(&self, token: &str) -> Result<IdentityClaims> {
        let data = decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Session token rejected: {}", e);
                AppError::Unauthorized
            })?;

        Ok(data.claims)
    }

    async fn primary_email(&self, external_id: &str) -> Result<Option<String>> {
        let Some(secret_key) = &self.secret_key else {
            return Ok(None);
        };

        let response = self
            .http
            .get(format!("{}/v1/users/{}", self.api_url, external_id))
            .bearer_auth(secret_key)
            .send()
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let user: ProviderUser = response
            .error_for_status()
            .map_err(|e| AppError::Identity(e.to_string()))?
            .json()
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        Ok(pick_primary_email(user))
    }
}

fn pick_primary_email(user: ProviderUser) -> Option<String> {
    let primary = user.primary_email_address_id.as_deref();
    let mut emails = user.email_addresses;

    match emails.iter().position(|e| Some(e.id.as_str()) == primary) {
        Some(index) => Some(emails.swap_remove(index).email_address),
        None => emails.into_iter().next().map(|e| e.email_address),
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use fake::StaticIdentityProvider;

#[cfg(any(test, feature = "test-utils"))]
mod fake {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use async_trait::async_trait;

    use super::{IdentityClaims, IdentityProvider};
    use crate::error::{AppError, Result};

    /// Token table standing in for the identity provider. A token is
    /// accepted when it was registered with `insert`.
    #[derive(Default)]
    pub struct StaticIdentityProvider {
        tokens: RwLock<HashMap<String, IdentityClaims>>,
        emails: RwLock<HashMap<String, String>>,
    }

    impl StaticIdentityProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, token: &str, claims: IdentityClaims) {
            if let Ok(mut tokens) = self.tokens.write() {
                tokens.insert(token.to_string(), claims);
            }
        }

        pub fn set_email(&self, external_id: &str, email: &str) {
            if let Ok(mut emails) = self.emails.write() {
                emails.insert(external_id.to_string(), email.to_string());
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for StaticIdentityProvider {
        async fn verify_token(&self, token: &str) -> Result<IdentityClaims> {
            self.tokens
                .read()
                .ok()
                .and_then(|tokens| tokens.get(token).cloned())
                .ok_or(AppError::Unauthorized)
        }

        async fn primary_email(&self, external_id: &str) -> Result<Option<String>> {
            Ok(self
                .emails
                .read()
                .ok()
                .and_then(|emails| emails.get(external_id).cloned()))
        }
    }
}
