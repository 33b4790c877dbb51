//! Matchpoint Server Library
//!
//! Signed bearer auth plus pairwise social-graph toggles (block, like,
//! super-like) with a derived like counter, and an opaque quiz store.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod quiz;
pub mod relations;
pub mod token;
pub mod users;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use auth::AuthGate;
use config::{AppState, ServerConfig};
use error::Error;
use handlers::{
    create_test, get_test, list_users, login, me, register, toggle_block, toggle_like,
    toggle_superlike,
};
use quiz::QuizStore;
use relations::RelationshipToggle;
use token::TokenService;
use users::UserDirectory;

pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        // Already set, ignore
    }

    info!("=== Matchpoint Server ===");

    // Read configuration once; immutable from here on
    let config = ServerConfig::from_env()?;
    info!("Database: {:?}", config.database_path);

    let options =
        SqliteConnectOptions::from_str(&format!("sqlite:{}", config.database_path.display()))?
            .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    let tokens = Arc::new(TokenService::new(
        config.jwt_secret.as_bytes(),
        config.token_lifetime,
    ));

    let users = Arc::new(UserDirectory::new(pool.clone()));
    users.init_db().await?;

    let relations = Arc::new(RelationshipToggle::new(pool.clone()));
    relations.init_db().await?;

    let quizzes = Arc::new(QuizStore::new(pool.clone()));
    quizzes.init_db().await?;

    let auth = Arc::new(AuthGate::new(tokens.clone(), users.clone()));

    let app_state = AppState {
        tokens,
        users,
        auth,
        relations,
        quizzes,
    };

    let app = router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Auth
        .route("/users", post(register).get(list_users))
        .route("/login", post(login))
        .route("/me", get(me))
        // Relation toggles
        .route("/users/{id}/block", post(toggle_block))
        .route("/users/{id}/like", post(toggle_like))
        .route("/users/{id}/superlike", post(toggle_superlike))
        // Quiz documents
        .route("/tests", post(create_test))
        .route("/tests/{id}", get(get_test))
        .fallback(route_not_defined)
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

async fn route_not_defined() -> Error {
    Error::NotFound("This route is not defined".to_string())
}
