//! Auth handlers

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::AppState;
use crate::error::{Error, Result};
use crate::users::NewUser;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /users - register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<NewUser>,
) -> Result<Json<Value>> {
    info!("POST /users");

    let user = state.users.create(req).await?;

    Ok(Json(json!({
        "status": "success",
        "data": { "user": user },
    })))
}

/// POST /login - verify credentials and issue a token
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let (email, password) = match (req.email, req.password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => {
            return Err(Error::Validation(
                "Please provide email and password".to_string(),
            ))
        }
    };

    info!("POST /login - {}", email);

    let user = state.users.find_by_email(&email).await?;
    let user = match user {
        Some(u) => {
            if !bcrypt::verify(&password, &u.password_hash)? {
                warn!("Failed login attempt for {}", email);
                return Err(Error::NotFound("Invalid email or password".to_string()));
            }
            u
        }
        None => {
            warn!("Failed login attempt for {}", email);
            return Err(Error::NotFound("Invalid email or password".to_string()));
        }
    };

    let token = state.tokens.sign(&user.id)?;

    info!("User logged in: {}", user.username);

    Ok(Json(json!({
        "status": "success",
        "token": token,
        "data": { "user": user },
    })))
}

/// GET /me - status check for the calling credential
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>> {
    let user = state.auth.require(&headers).await?;

    Ok(Json(json!({
        "status": "success",
        "data": { "user": user },
    })))
}
