//! Auth Gate
//!
//! Resolves an inbound credential into a live user record. One routine
//! backs every call site; the mode decides whether an anonymous caller
//! is acceptable.

use std::sync::Arc;

use axum::http::{header, HeaderMap};
use tracing::debug;

use crate::error::{Error, Result};
use crate::token::TokenService;
use crate::users::{User, UserDirectory};

/// Whether a resolved actor is mandatory for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Required,
    Optional,
}

pub struct AuthGate {
    tokens: Arc<TokenService>,
    users: Arc<UserDirectory>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>, users: Arc<UserDirectory>) -> Self {
        Self { tokens, users }
    }

    /// Resolve the caller. `Optional` mode yields `Ok(None)` when no
    /// credential was supplied; a credential that is present but bad
    /// fails in either mode.
    pub async fn resolve(&self, headers: &HeaderMap, mode: AuthMode) -> Result<Option<User>> {
        let token = match extract_token(headers) {
            Some(t) => t,
            None => {
                return match mode {
                    AuthMode::Optional => Ok(None),
                    AuthMode::Required => Err(Error::Unauthenticated),
                };
            }
        };

        let user_id = self.tokens.verify(&token)?;
        debug!("[Auth] Credential verified for {}", user_id);

        // The account behind the credential may have been deleted since
        // the token was issued.
        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or(Error::StaleCredential)?;

        Ok(Some(user))
    }

    /// Resolve in `Required` mode and unwrap the actor.
    pub async fn require(&self, headers: &HeaderMap) -> Result<User> {
        let user = self.resolve(headers, AuthMode::Required).await?;
        user.ok_or(Error::Unauthenticated)
    }
}

/// Find the bearer credential: the Authorization header wins over the
/// `jwt` cookie when both are present.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(value.to_string());
    }

    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(str::trim)
                .find_map(|c| c.strip_prefix("jwt="))
        })
        .map(|s| s.to_string())
}
