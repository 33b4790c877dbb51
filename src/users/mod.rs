//! User Directory
//!
//! Keyed store of user records and their referenced profiles, backed by
//! SQLite. Relation rows live in their own table (see `relations`); the
//! directory owns the users and profiles schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};

/// External profile aggregate, referenced by a user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    pub bio: Option<String>,
}

/// User record. The password hash never appears in any outbound
/// response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub liked_count: i64,
    pub profile: Option<Profile>,
    pub created_at: DateTime<Utc>,
}

/// Registration input.
#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
}

type UserRow = (
    String,         // id
    String,         // email
    String,         // username
    String,         // password_hash
    i64,            // liked_count
    String,         // created_at
    Option<String>, // profile id
    Option<String>, // display_name
    Option<String>, // bio
);

fn row_to_user(row: UserRow) -> User {
    let (id, email, username, password_hash, liked_count, created_at, pid, display_name, bio) = row;
    let profile = match (pid, display_name) {
        (Some(id), Some(display_name)) => Some(Profile {
            id,
            display_name,
            bio,
        }),
        _ => None,
    };
    User {
        id,
        email,
        username,
        password_hash,
        liked_count,
        profile,
        created_at: created_at.parse().unwrap_or_else(|_| Utc::now()),
    }
}

const USER_COLUMNS: &str = "u.id, u.email, u.username, u.password_hash, u.liked_count, \
     u.created_at, p.id, p.display_name, p.bio";

pub struct UserDirectory {
    pool: SqlitePool,
}

impl UserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create users and profiles tables.
    pub async fn init_db(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                bio TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                username TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                liked_count INTEGER NOT NULL DEFAULT 0,
                profile_id TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (profile_id) REFERENCES profiles(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("[Users] Schema initialized");
        Ok(())
    }

    /// Register a new user with a fresh profile row.
    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        let email = new_user
            .email
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Validation("A user must have an email".to_string()))?;
        let username = new_user
            .username
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Validation("A user must have a username".to_string()))?;
        let password = new_user
            .password
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Validation("A user must have a password".to_string()))?;

        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(Error::Validation("Email already registered".to_string()));
        }

        let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)?;

        let profile = Profile {
            id: Uuid::new_v4().to_string(),
            display_name: new_user.display_name.unwrap_or_else(|| username.clone()),
            bio: new_user.bio,
        };

        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            username,
            password_hash,
            liked_count: 0,
            profile: Some(profile.clone()),
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO profiles (id, display_name, bio) VALUES (?, ?, ?)")
            .bind(&profile.id)
            .bind(&profile.display_name)
            .bind(&profile.bio)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "INSERT INTO users (id, email, username, password_hash, liked_count, profile_id, created_at) \
             VALUES (?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&profile.id)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        info!("[Users] Registered: {} ({})", user.username, user.email);

        Ok(user)
    }

    /// Look up a user by id, profile included.
    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users u \
             LEFT JOIN profiles p ON u.profile_id = p.id WHERE u.id = ?"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_user))
    }

    /// Look up a user by email, profile included. Used by login, so the
    /// password hash is returned for verification.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users u \
             LEFT JOIN profiles p ON u.profile_id = p.id WHERE u.email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_user))
    }

    /// List users. When a caller is known, any user whose block set
    /// contains the caller is excluded from the listing.
    pub async fn list(&self, caller_id: Option<&str>) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = match caller_id {
            Some(caller) => {
                sqlx::query_as(&format!(
                    "SELECT {USER_COLUMNS} FROM users u \
                     LEFT JOIN profiles p ON u.profile_id = p.id \
                     WHERE NOT EXISTS (\
                         SELECT 1 FROM relations r \
                         WHERE r.user_id = u.id AND r.relation = 'block' AND r.target_id = ?\
                     ) \
                     ORDER BY u.created_at"
                ))
                .bind(caller)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {USER_COLUMNS} FROM users u \
                     LEFT JOIN profiles p ON u.profile_id = p.id \
                     ORDER BY u.created_at"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(row_to_user).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_never_serialized() {
        let user = User {
            id: "u1".to_string(),
            email: "a@b.c".to_string(),
            username: "a".to_string(),
            password_hash: "sensitive".to_string(),
            liked_count: 0,
            profile: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("sensitive"));
        assert!(!json.contains("password_hash"));
    }
}
