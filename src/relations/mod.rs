//! Relationship Toggle Engine
//!
//! One generic engine behind the block, like, and super-like routes.
//! A toggle flips membership of (actor, target) in the named relation
//! set; repeated identical calls strictly alternate Added / Removed.
//!
//! The membership flip and the like-counter adjustment run in a single
//! SQLite transaction, so concurrent toggles on the same pair cannot
//! drift the counter away from the set.

use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;

use crate::error::{Error, Result};

/// Directed relation kinds a user can hold toward another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Block,
    Like,
    SuperLike,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Block => "block",
            Relation::Like => "like",
            Relation::SuperLike => "superlike",
        }
    }

    /// Response message when the target was added to the set.
    pub fn added_message(&self) -> &'static str {
        match self {
            Relation::Block => "blocked",
            Relation::Like => "liked",
            Relation::SuperLike => "super liked",
        }
    }

    /// Response message when the target was removed from the set.
    pub fn removed_message(&self) -> &'static str {
        match self {
            Relation::Block => "unblocked",
            Relation::Like => "like removed",
            Relation::SuperLike => "super like removed",
        }
    }
}

/// Outcome of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Added,
    Removed,
}

pub struct RelationshipToggle {
    pool: SqlitePool,
}

impl RelationshipToggle {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the relations table. The UNIQUE constraint gives set
    /// semantics: one row per (actor, target, relation).
    pub async fn init_db(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS relations (
                user_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                relation TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (target_id) REFERENCES users(id),
                UNIQUE(user_id, target_id, relation)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("[Relations] Schema initialized");
        Ok(())
    }

    /// Flip membership of `target_id` in the actor's set for
    /// `relation`. Likes also adjust the target's derived counter,
    /// inside the same transaction.
    pub async fn toggle(
        &self,
        actor_id: &str,
        target_id: &str,
        relation: Relation,
    ) -> Result<ToggleAction> {
        if actor_id == target_id {
            return Err(Error::SelfReference(format!(
                "Cannot {} self",
                relation.as_str()
            )));
        }

        let mut tx = self.pool.begin().await?;

        let target_exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ?")
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?;
        if target_exists.is_none() {
            return Err(Error::OperationFailed(format!(
                "Unable to {} user, please try again",
                relation.as_str()
            )));
        }

        // Membership-guarded flip: a delete that removed a row means
        // the pair was present; otherwise insert it.
        let removed = sqlx::query(
            "DELETE FROM relations WHERE user_id = ? AND target_id = ? AND relation = ?",
        )
        .bind(actor_id)
        .bind(target_id)
        .bind(relation.as_str())
        .execute(&mut *tx)
        .await?;

        let action = if removed.rows_affected() > 0 {
            ToggleAction::Removed
        } else {
            let inserted = sqlx::query(
                "INSERT OR IGNORE INTO relations (user_id, target_id, relation, created_at) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(actor_id)
            .bind(target_id)
            .bind(relation.as_str())
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;

            if inserted.rows_affected() == 0 {
                return Err(Error::OperationFailed(format!(
                    "Unable to {} user, please try again",
                    relation.as_str()
                )));
            }
            ToggleAction::Added
        };

        if relation == Relation::Like {
            let delta = match action {
                ToggleAction::Added => 1,
                ToggleAction::Removed => -1,
            };
            adjust_liked_count(&mut tx, target_id, delta).await?;
        }

        tx.commit().await?;

        info!(
            "[Relations] {} {} {} ({:?})",
            actor_id,
            relation.as_str(),
            target_id,
            action
        );

        Ok(action)
    }

    /// Whether `target_id` is currently in the actor's set for
    /// `relation`.
    pub async fn contains(
        &self,
        actor_id: &str,
        target_id: &str,
        relation: Relation,
    ) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM relations WHERE user_id = ? AND target_id = ? AND relation = ?",
        )
        .bind(actor_id)
        .bind(target_id)
        .bind(relation.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }
}

/// Atomic derived-counter update, applied directly at the storage layer
/// rather than read-then-write. Knows nothing about relations.
async fn adjust_liked_count(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    delta: i64,
) -> Result<()> {
    let updated = sqlx::query("UPDATE users SET liked_count = liked_count + ? WHERE id = ?")
        .bind(delta)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(Error::OperationFailed(
            "Unable to like user, please try again".to_string(),
        ));
    }

    Ok(())
}
