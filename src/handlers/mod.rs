//! Handlers for the matchpoint server
//!
//! All responses share the `{status, data?|token?, message?}` envelope;
//! failures go through the central `Error` translator.

pub mod auth;
pub mod quiz;
pub mod users;

// Re-export AppState from config
pub use crate::config::AppState;

// Auth handlers
pub use auth::{login, me, register};

// User graph handlers
pub use users::{list_users, toggle_block, toggle_like, toggle_superlike};

// Quiz handlers
pub use quiz::{create_test, get_test};
