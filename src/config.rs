//! Server configuration and shared state

use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::AuthGate;
use crate::quiz::QuizStore;
use crate::relations::RelationshipToggle;
use crate::token::TokenService;
use crate::users::UserDirectory;

/// Startup configuration, read from the environment exactly once in
/// `run()` and immutable afterwards.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// SQLite database file
    pub database_path: PathBuf,
    /// HS256 signing secret
    pub jwt_secret: String,
    /// Credential lifetime
    pub token_lifetime: chrono::Duration,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;

        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(7000);

        let database_path = std::env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("matchpoint.sqlite"));

        let lifetime_hours: i64 = std::env::var("JWT_EXPIRES_IN_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(72);

        Ok(Self {
            port,
            database_path,
            jwt_secret,
            token_lifetime: chrono::Duration::hours(lifetime_hours),
        })
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub users: Arc<UserDirectory>,
    pub auth: Arc<AuthGate>,
    pub relations: Arc<RelationshipToggle>,
    pub quizzes: Arc<QuizStore>,
}
