//! services/api/src/adapters/registry.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `PaperRegistry` port from the core crate. It stores one row per paper
//! in PostgreSQL using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use question_paper_core::domain::{Paper, TopicSelection};
use question_paper_core::ports::{PaperRegistry, PortError, PortResult};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `PaperRegistry` port.
#[derive(Clone)]
pub struct PgPaperRegistry {
    pool: PgPool,
    table: String,
}

impl PgPaperRegistry {
    /// Creates a new `PgPaperRegistry`.
    ///
    /// `table` must already be validated as a plain identifier; it is quoted, not escaped.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    /// Creates the papers table at startup if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        let statement = format!(
            r#"CREATE TABLE IF NOT EXISTS "{}" (
                paper_id UUID PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                subject TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL,
                topics JSONB NOT NULL,
                storage_key TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )"#,
            self.table
        );
        sqlx::query(&statement).execute(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
struct TopicSelectionRecord {
    topic_id: String,
    question_count: u32,
}

#[derive(FromRow)]
struct PaperRecord {
    paper_id: Uuid,
    user_id: String,
    title: String,
    subject: String,
    duration_minutes: i32,
    topics: Json<Vec<TopicSelectionRecord>>,
    storage_key: String,
    created_at: DateTime<Utc>,
}

impl PaperRecord {
    fn from_domain(paper: &Paper) -> PortResult<Self> {
        let duration_minutes = i32::try_from(paper.duration_minutes)
            .map_err(|_| PortError::Unexpected("duration_minutes out of range".to_string()))?;

        Ok(Self {
            paper_id: paper.id,
            user_id: paper.user_id.clone(),
            title: paper.title.clone(),
            subject: paper.subject.clone(),
            duration_minutes,
            topics: Json(
                paper
                    .topics
                    .iter()
                    .map(|t| TopicSelectionRecord {
                        topic_id: t.topic_id.clone(),
                        question_count: t.question_count,
                    })
                    .collect(),
            ),
            storage_key: paper.storage_key.clone(),
            created_at: paper.created_at,
        })
    }

    fn to_domain(self) -> Paper {
        Paper {
            id: self.paper_id,
            user_id: self.user_id,
            title: self.title,
            subject: self.subject,
            duration_minutes: self.duration_minutes.max(0) as u32,
            topics: self
                .topics
                .0
                .into_iter()
                .map(|t| TopicSelection {
                    topic_id: t.topic_id,
                    question_count: t.question_count,
                })
                .collect(),
            storage_key: self.storage_key,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `PaperRegistry` Trait Implementation
//=========================================================================================

#[async_trait]
impl PaperRegistry for PgPaperRegistry {
    async fn save(&self, paper: &Paper) -> PortResult<()> {
        let record = PaperRecord::from_domain(paper)?;
        let statement = format!(
            r#"INSERT INTO "{}"
                (paper_id, user_id, title, subject, duration_minutes, topics, storage_key, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (paper_id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                title = EXCLUDED.title,
                subject = EXCLUDED.subject,
                duration_minutes = EXCLUDED.duration_minutes,
                topics = EXCLUDED.topics,
                storage_key = EXCLUDED.storage_key,
                created_at = EXCLUDED.created_at"#,
            self.table
        );

        sqlx::query(&statement)
            .bind(record.paper_id)
            .bind(record.user_id)
            .bind(record.title)
            .bind(record.subject)
            .bind(record.duration_minutes)
            .bind(record.topics)
            .bind(record.storage_key)
            .bind(record.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, paper_id: Uuid) -> PortResult<Paper> {
        let statement = format!(
            r#"SELECT paper_id, user_id, title, subject, duration_minutes, topics, storage_key, created_at
            FROM "{}" WHERE paper_id = $1"#,
            self.table
        );

        let record = sqlx::query_as::<_, PaperRecord>(&statement)
            .bind(paper_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Paper {} not found", paper_id))
                }
                _ => PortError::Unexpected(e.to_string()),
            })?;

        Ok(record.to_domain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips_topic_selections() {
        let paper = Paper {
            id: Uuid::new_v4(),
            user_id: "user-a".to_string(),
            title: "Math Midterm".to_string(),
            subject: "mathematics".to_string(),
            duration_minutes: 60,
            topics: vec![
                TopicSelection {
                    topic_id: "algebra".to_string(),
                    question_count: 2,
                },
                TopicSelection {
                    topic_id: "geometry".to_string(),
                    question_count: 1,
                },
            ],
            storage_key: "paper.pdf".to_string(),
            created_at: Utc::now(),
        };

        let record = PaperRecord::from_domain(&paper).unwrap();

        assert_eq!(record.to_domain(), paper);
    }

    #[test]
    fn topics_serialize_with_api_field_names() {
        let json = serde_json::to_value(TopicSelectionRecord {
            topic_id: "algebra".to_string(),
            question_count: 2,
        })
        .unwrap();

        assert_eq!(json, serde_json::json!({ "topic_id": "algebra", "question_count": 2 }));
    }
}
