//! Router-level tests: request in, envelope out.

use std::str::FromStr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tempfile::TempDir;
use tower::ServiceExt;

use matchpoint::auth::AuthGate;
use matchpoint::config::AppState;
use matchpoint::quiz::QuizStore;
use matchpoint::relations::RelationshipToggle;
use matchpoint::token::TokenService;
use matchpoint::users::UserDirectory;

async fn test_app() -> anyhow::Result<(TempDir, Router)> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("api.sqlite");

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    let tokens = Arc::new(TokenService::new(b"api-test-secret", chrono::Duration::hours(1)));

    let users = Arc::new(UserDirectory::new(pool.clone()));
    users.init_db().await?;
    let relations = Arc::new(RelationshipToggle::new(pool.clone()));
    relations.init_db().await?;
    let quizzes = Arc::new(QuizStore::new(pool.clone()));
    quizzes.init_db().await?;
    let auth = Arc::new(AuthGate::new(tokens.clone(), users.clone()));

    let state = AppState {
        tokens,
        users,
        auth,
        relations,
        quizzes,
    };

    Ok((dir, matchpoint::router(state)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed_post(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Register via the API and return (user_id, token).
async fn register_and_login(app: &Router, email: &str, username: &str) -> (String, String) {
    let (status, _) = send(
        app,
        json_post(
            "/users",
            serde_json::json!({
                "email": email,
                "username": username,
                "password": "password123",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app,
        json_post(
            "/login",
            serde_json::json!({ "email": email, "password": "password123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let user_id = body["data"]["user"]["id"].as_str().unwrap().to_string();
    let token = body["token"].as_str().unwrap().to_string();
    (user_id, token)
}

#[tokio::test]
async fn like_toggle_end_to_end() -> anyhow::Result<()> {
    let (_dir, app) = test_app().await?;

    let (_u1, u1_token) = register_and_login(&app, "u1@test.com", "u1").await;
    let (u2, _) = register_and_login(&app, "u2@test.com", "u2").await;

    // First call likes
    let (status, body) = send(&app, authed_post(&format!("/users/{}/like", u2), &u1_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "liked");

    // u2's liked_count is visible in the listing
    let list = Request::builder().uri("/users").body(Body::empty()).unwrap();
    let (_, body) = send(&app, list).await;
    let u2_record = body["data"]["users"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["id"] == u2.as_str())
        .unwrap()
        .clone();
    assert_eq!(u2_record["liked_count"], 1);
    assert!(u2_record.get("password_hash").is_none());

    // Second call removes the like and nets the counter back
    let (status, body) = send(&app, authed_post(&format!("/users/{}/like", u2), &u1_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "like removed");

    let list = Request::builder().uri("/users").body(Body::empty()).unwrap();
    let (_, body) = send(&app, list).await;
    let u2_record = body["data"]["users"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["id"] == u2.as_str())
        .unwrap()
        .clone();
    assert_eq!(u2_record["liked_count"], 0);

    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_missing_and_bad_tokens() -> anyhow::Result<()> {
    let (_dir, app) = test_app().await?;
    let (u1, _) = register_and_login(&app, "u1@test.com", "u1").await;

    // No credential
    let me = Request::builder().uri("/me").body(Body::empty()).unwrap();
    let (status, body) = send(&app, me).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");

    // Garbage credential
    let (status, _) = send(&app, authed_post(&format!("/users/{}/like", u1), "garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn self_like_returns_not_found_envelope() -> anyhow::Result<()> {
    let (_dir, app) = test_app().await?;
    let (u1, token) = register_and_login(&app, "u1@test.com", "u1").await;

    let (status, body) = send(&app, authed_post(&format!("/users/{}/like", u1), &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Cannot like self");

    Ok(())
}

#[tokio::test]
async fn login_validation_and_bad_credentials() -> anyhow::Result<()> {
    let (_dir, app) = test_app().await?;
    register_and_login(&app, "u1@test.com", "u1").await;

    let (status, body) = send(
        &app,
        json_post("/login", serde_json::json!({ "email": "u1@test.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please provide email and password");

    let (status, _) = send(
        &app,
        json_post(
            "/login",
            serde_json::json!({ "email": "u1@test.com", "password": "wrong" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn undefined_routes_return_envelope_404() -> anyhow::Result<()> {
    let (_dir, app) = test_app().await?;

    let request = Request::builder()
        .uri("/no/such/route")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "This route is not defined");

    Ok(())
}

#[tokio::test]
async fn me_returns_user_without_credential_material() -> anyhow::Result<()> {
    let (_dir, app) = test_app().await?;
    let (u1, token) = register_and_login(&app, "u1@test.com", "u1").await;

    let request = Request::builder()
        .uri("/me")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["id"], u1.as_str());
    assert!(body["data"]["user"].get("password_hash").is_none());

    Ok(())
}

#[tokio::test]
async fn cookie_credential_works_when_no_header() -> anyhow::Result<()> {
    let (_dir, app) = test_app().await?;
    let (u1, token) = register_and_login(&app, "u1@test.com", "u1").await;

    let request = Request::builder()
        .uri("/me")
        .header("cookie", format!("jwt={}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["id"], u1.as_str());

    Ok(())
}
