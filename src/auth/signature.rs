use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed distance between the delivery timestamp and now.
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Header names carrying the delivery id, timestamp and signature.
#[derive(Debug, Clone, Copy)]
pub struct SignatureHeaders {
    pub id: &'static str,
    pub timestamp: &'static str,
    pub signature: &'static str,
}

pub const IDENTITY_HEADERS: SignatureHeaders = SignatureHeaders {
    id: "svix-id",
    timestamp: "svix-timestamp",
    signature: "svix-signature",
};

pub const PAYMENT_HEADERS: SignatureHeaders = SignatureHeaders {
    id: "webhook-id",
    timestamp: "webhook-timestamp",
    signature: "webhook-signature",
};

/// Verifies shared-secret webhook signatures of the form
/// `v1,base64(hmac_sha256(secret, "{id}.{timestamp}.{body}"))`.
#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
    headers: SignatureHeaders,
}

impl WebhookVerifier {
    pub fn new(secret: &str, headers: SignatureHeaders) -> Result<Self> {
        let encoded = secret.strip_prefix("whsec_").unwrap_or(secret);
        let key = STANDARD
            .decode(encoded)
            .map_err(|_| AppError::Internal("Webhook secret is not valid base64".to_string()))?;

        Ok(Self { key, headers })
    }

    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<()> {
        self.verify_at(headers, body, Utc::now().timestamp())
    }

    pub fn verify_at(&self, headers: &HeaderMap, body: &[u8], now: i64) -> Result<()> {
        let id = header_value(headers, self.headers.id)?;
        let timestamp = header_value(headers, self.headers.timestamp)?;
        let signatures = header_value(headers, self.headers.signature)?;

        let sent_at: i64 = timestamp
            .parse()
            .map_err(|_| AppError::Validation("Invalid webhook timestamp".to_string()))?;
        if (now - sent_at).abs() > TIMESTAMP_TOLERANCE_SECS {
            return Err(AppError::Validation("Webhook timestamp outside tolerance".to_string()));
        }

        let expected = self.sign(id, timestamp, body)?;

        let matched = signatures
            .split_whitespace()
            .filter_map(|entry| entry.strip_prefix("v1,"))
            .filter_map(|sig| STANDARD.decode(sig).ok())
            .any(|sig| bool::from(sig.ct_eq(&expected)));

        if matched {
            Ok(())
        } else {
            Err(AppError::Validation("Invalid webhook signature".to_string()))
        }
    }

    fn sign(&self, id: &str, timestamp: &str, body: &[u8]) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::Internal(format!("Invalid webhook key: {}", e)))?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Produces the signature header value a sender would attach.
    pub fn signature_header(&self, id: &str, timestamp: i64, body: &[u8]) -> Result<String> {
        let sig = self.sign(id, &timestamp.to_string(), body)?;
        Ok(format!("v1,{}", STANDARD.encode(sig)))
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Missing {} header", name)))
}
