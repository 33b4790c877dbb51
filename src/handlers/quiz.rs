//! Quiz document handlers
//!
//! Thin wrappers over the opaque store. Every path, including storage
//! faults, terminates the request with an envelope response.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::config::AppState;
use crate::error::{Error, Result};
use crate::quiz::NewQuiz;

/// POST /tests
pub async fn create_test(
    State(state): State<AppState>,
    Json(req): Json<NewQuiz>,
) -> Result<Json<Value>> {
    info!("POST /tests");

    let test = state.quizzes.create(req).await?;

    Ok(Json(json!({
        "status": "success",
        "data": { "test": test },
    })))
}

/// GET /tests/{id} - answers are stripped from the projection
pub async fn get_test(
    State(state): State<AppState>,
    Path(test_id): Path<String>,
) -> Result<Json<Value>> {
    info!("GET /tests/{}", test_id);

    let test = state
        .quizzes
        .get(&test_id)
        .await?
        .ok_or_else(|| Error::NotFound("This test does not exist".to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "test": test },
    })))
}
