//! Signed bearer credentials
//!
//! Stateless HS256 tokens carrying the subject id and an expiry. The
//! secret and lifetime are injected at startup, never read from the
//! environment here.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: chrono::Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], lifetime: chrono::Duration) -> Self {
        let mut validation = Validation::default();
        // Expiry is exact; no clock-skew grace window
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        }
    }

    /// Issue a credential for `user_id`, expiring after the configured
    /// lifetime.
    pub fn sign(&self, user_id: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| Error::Internal(format!("Token signing failed: {}", e)))
    }

    /// Verify a credential and return its subject id.
    pub fn verify(&self, token: &str) -> Result<String> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Error::Expired,
                _ => Error::InvalidCredential,
            }
        })?;

        Ok(data.claims.sub)
    }
}
