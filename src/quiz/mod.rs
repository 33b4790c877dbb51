//! Quiz Document Store
//!
//! Opaque create / read-by-id collaborator. Documents are stored whole
//! as JSON; the read projection strips answer fields so a fetched quiz
//! never reveals them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    /// Present in storage, stripped from read projections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewQuiz {
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

pub struct QuizStore {
    pool: SqlitePool,
}

impl QuizStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init_db(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tests (
                id TEXT PRIMARY KEY,
                description TEXT NOT NULL,
                questions TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("[Quiz] Schema initialized");
        Ok(())
    }

    /// Validate and store a new quiz document.
    pub async fn create(&self, doc: NewQuiz) -> Result<Quiz> {
        let description = doc
            .description
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Validation("A test must have a description".to_string()))?;

        for question in &doc.questions {
            if question.question.trim().is_empty() {
                return Err(Error::Validation(
                    "A question must have a question description".to_string(),
                ));
            }
            if question.answer.as_deref().unwrap_or("").trim().is_empty() {
                return Err(Error::Validation("Answer must be provided".to_string()));
            }
        }

        let quiz = Quiz {
            id: Uuid::new_v4().to_string(),
            description,
            questions: doc.questions,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO tests (id, description, questions, created_at) VALUES (?, ?, ?, ?)")
            .bind(&quiz.id)
            .bind(&quiz.description)
            .bind(serde_json::to_string(&quiz.questions)?)
            .bind(quiz.created_at.to_rfc3339())
            .execute(&self.pool)
            .await?;

        info!("[Quiz] Created test {}", quiz.id);

        Ok(quiz)
    }

    /// Fetch a quiz by id with answers stripped.
    pub async fn get(&self, quiz_id: &str) -> Result<Option<Quiz>> {
        let row: Option<(String, String, String, String)> =
            sqlx::query_as("SELECT id, description, questions, created_at FROM tests WHERE id = ?")
                .bind(quiz_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some((id, description, questions, created_at)) = row else {
            return Ok(None);
        };

        let mut questions: Vec<Question> = serde_json::from_str(&questions)?;
        for question in &mut questions {
            question.answer = None;
        }

        Ok(Some(Quiz {
            id,
            description,
            questions,
            created_at: created_at.parse().unwrap_or_else(|_| Utc::now()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_omitted_when_stripped() {
        let question = Question {
            question: "What are tapables?".to_string(),
            options: vec![QuestionOption {
                option: Some("b".to_string()),
                desc: Some("web workers".to_string()),
            }],
            answer: None,
        };
        let json = serde_json::to_string(&question).unwrap();
        assert!(!json.contains("answer"));
    }
}
