//! User graph handlers: listing and relation toggles

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::AuthMode;
use crate::config::AppState;
use crate::error::Result;
use crate::relations::{Relation, ToggleAction};

/// GET /users - list users, personalized for a known caller
///
/// Anonymous callers get everyone; a logged-in caller never sees users
/// who have blocked them.
pub async fn list_users(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>> {
    let caller = state.auth.resolve(&headers, AuthMode::Optional).await?;

    let users = state
        .users
        .list(caller.as_ref().map(|u| u.id.as_str()))
        .await?;

    info!("GET /users - {} users listed", users.len());

    Ok(Json(json!({
        "status": "success",
        "data": { "users": users },
    })))
}

/// POST /users/{id}/block
pub async fn toggle_block(
    State(state): State<AppState>,
    Path(target_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    toggle(state, headers, target_id, Relation::Block).await
}

/// POST /users/{id}/like
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(target_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    toggle(state, headers, target_id, Relation::Like).await
}

/// POST /users/{id}/superlike
pub async fn toggle_superlike(
    State(state): State<AppState>,
    Path(target_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    toggle(state, headers, target_id, Relation::SuperLike).await
}

async fn toggle(
    state: AppState,
    headers: HeaderMap,
    target_id: String,
    relation: Relation,
) -> Result<Json<Value>> {
    let actor = state.auth.require(&headers).await?;

    let action = state.relations.toggle(&actor.id, &target_id, relation).await?;

    let message = match action {
        ToggleAction::Added => relation.added_message(),
        ToggleAction::Removed => relation.removed_message(),
    };

    Ok(Json(json!({
        "status": "success",
        "data": { "message": message },
    })))
}
