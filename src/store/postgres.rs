//! Postgres-backed store.
//!
//! Expected schema (ids are opaque text; `position` is a record's place in
//! its parent's collection, which defines store order):
//!
//! ```sql
//! CREATE TABLE users (
//!     id TEXT PRIMARY KEY, name TEXT NOT NULL, email TEXT NOT NULL,
//!     learning_parameters JSONB, survey_parameters JSONB,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT now());
//! CREATE TABLE roadmaps (
//!     id TEXT PRIMARY KEY, user_id TEXT NOT NULL REFERENCES users(id),
//!     position INT NOT NULL DEFAULT 0, main_topic TEXT NOT NULL,
//!     description TEXT, difficulty TEXT, estimated_duration TEXT,
//!     total_progress DOUBLE PRECISION, status TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL);
//! CREATE TABLE checkpoints (
//!     id TEXT PRIMARY KEY, roadmap_id TEXT NOT NULL REFERENCES roadmaps(id),
//!     position INT NOT NULL DEFAULT 0, title TEXT NOT NULL, description TEXT,
//!     sort_order INT NOT NULL, status TEXT NOT NULL,
//!     completed_at TIMESTAMPTZ, resources JSONB);
//! CREATE TABLE quizzes (
//!     id TEXT PRIMARY KEY, title TEXT NOT NULL, topic TEXT NOT NULL,
//!     difficulty TEXT, domain TEXT, tags TEXT[] NOT NULL DEFAULT '{}',
//!     questions JSONB, created_at TIMESTAMPTZ NOT NULL);
//! CREATE TABLE quiz_attempts (
//!     id TEXT PRIMARY KEY, user_id TEXT NOT NULL REFERENCES users(id),
//!     quiz_id TEXT NOT NULL REFERENCES quizzes(id),
//!     score DOUBLE PRECISION NOT NULL, total_questions INT NOT NULL,
//!     correct_answers INT NOT NULL, completed_at TIMESTAMPTZ,
//!     time_taken BIGINT);
//! ```

use std::future::Future;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::Settings;
use crate::errors::ExportError;
use crate::metrics::record_query;
use crate::models::{Checkpoint, Entity, Quiz, QuizAttempt, Roadmap, User};
use crate::stats::DomainCount;

use super::PathwayStore;

const USER_COLS: &str = "id, name, email, learning_parameters, survey_parameters";
const ROADMAP_COLS: &str = "id, user_id, main_topic, description, difficulty, \
     estimated_duration, total_progress, status, created_at";
const CHECKPOINT_COLS: &str = "id, roadmap_id, title, description, sort_order AS \"order\", \
     status, completed_at, resources";
const QUIZ_COLS: &str = "id, title, topic, difficulty, domain, tags, questions, created_at";
const ATTEMPT_COLS: &str = "id, user_id, quiz_id, score, total_questions, correct_answers, \
     completed_at, time_taken";

/// A [`PathwayStore`] over a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    query_timeout: Option<Duration>,
}

impl PgStore {
    pub fn new(pool: PgPool, query_timeout: Option<Duration>) -> Self {
        PgStore {
            pool,
            query_timeout,
        }
    }

    /// Open a pool sized and timed per `settings`.
    pub async fn connect(settings: &Settings) -> Result<Self, ExportError> {
        let url = settings.require_database_url()?;
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(url)
            .await?;
        info!(max_connections = settings.max_connections, "Connected to Postgres");
        Ok(PgStore::new(pool, settings.query_timeout))
    }

    /// Release every pooled connection. Pending queries finish first.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection closed");
    }

    /// Run one query, counted, under the configured timeout (if any).
    async fn run<T, F>(&self, operation: &'static str, query: F) -> Result<T, ExportError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        record_query(operation);
        match self.query_timeout {
            Some(after) => tokio::time::timeout(after, query)
                .await
                .map_err(|_| ExportError::StoreTimeout { operation, after })?
                .map_err(ExportError::from),
            None => query.await.map_err(ExportError::from),
        }
    }
}

impl PathwayStore for PgStore {
    async fn users(&self) -> Result<Vec<User>, ExportError> {
        let sql = format!("SELECT {USER_COLS} FROM users ORDER BY created_at, id");
        self.run("users", sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool))
            .await
    }

    async fn user(&self, id: &str) -> Result<Option<User>, ExportError> {
        let sql = format!("SELECT {USER_COLS} FROM users WHERE id = $1");
        self.run(
            "user",
            sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool),
        )
        .await
    }

    async fn roadmaps_for_user(&self, user_id: &str) -> Result<Vec<Roadmap>, ExportError> {
        let sql = format!(
            "SELECT {ROADMAP_COLS} FROM roadmaps WHERE user_id = $1 \
             ORDER BY position, created_at, id"
        );
        self.run(
            "roadmaps_for_user",
            sqlx::query_as::<_, Roadmap>(&sql)
                .bind(user_id)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn checkpoints_for_roadmap(
        &self,
        roadmap_id: &str,
    ) -> Result<Vec<Checkpoint>, ExportError> {
        let sql = format!(
            "SELECT {CHECKPOINT_COLS} FROM checkpoints WHERE roadmap_id = $1 ORDER BY position, id"
        );
        self.run(
            "checkpoints_for_roadmap",
            sqlx::query_as::<_, Checkpoint>(&sql)
                .bind(roadmap_id)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn quizzes_matching_topic(&self, topic: &str) -> Result<Vec<Quiz>, ExportError> {
        // strpos keeps the match literal: `%`, `_` or regex syntax in a topic
        // carry no special meaning.
        let sql = format!(
            "SELECT {QUIZ_COLS} FROM quizzes WHERE strpos(lower(topic), lower($1)) > 0 \
             ORDER BY created_at, id"
        );
        self.run(
            "quizzes_matching_topic",
            sqlx::query_as::<_, Quiz>(&sql).bind(topic).fetch_all(&self.pool),
        )
        .await
    }

    async fn attempts_for_user(
        &self,
        user_id: &str,
        quiz_ids: &[String],
    ) -> Result<Vec<QuizAttempt>, ExportError> {
        if quiz_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {ATTEMPT_COLS} FROM quiz_attempts WHERE user_id = $1 AND quiz_id = ANY($2) \
             ORDER BY completed_at NULLS LAST, id"
        );
        self.run(
            "attempts_for_user",
            sqlx::query_as::<_, QuizAttempt>(&sql)
                .bind(user_id)
                .bind(quiz_ids)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn count(&self, entity: Entity) -> Result<u64, ExportError> {
        let sql = format!("SELECT COUNT(*) FROM {}", entity.table());
        let n: i64 = self
            .run("count", sqlx::query_scalar(&sql).fetch_one(&self.pool))
            .await?;
        Ok(n.max(0) as u64)
    }

    async fn completed_checkpoint_count(&self) -> Result<u64, ExportError> {
        let n: i64 = self
            .run(
                "completed_checkpoint_count",
                sqlx::query_scalar("SELECT COUNT(*) FROM checkpoints WHERE status = 'completed'")
                    .fetch_one(&self.pool),
            )
            .await?;
        Ok(n.max(0) as u64)
    }

    async fn roadmap_progress_values(&self) -> Result<Vec<Option<f64>>, ExportError> {
        self.run(
            "roadmap_progress_values",
            sqlx::query_scalar("SELECT total_progress FROM roadmaps").fetch_all(&self.pool),
        )
        .await
    }

    async fn attempt_scores(&self) -> Result<Vec<f64>, ExportError> {
        self.run(
            "attempt_scores",
            sqlx::query_scalar("SELECT score FROM quiz_attempts").fetch_all(&self.pool),
        )
        .await
    }

    async fn quiz_domain_counts(&self) -> Result<Vec<DomainCount>, ExportError> {
        let rows: Vec<(Option<String>, i64)> = self
            .run(
                "quiz_domain_counts",
                sqlx::query_as(
                    "SELECT domain, COUNT(*) FROM quizzes GROUP BY domain ORDER BY MIN(created_at)",
                )
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|(domain, count)| DomainCount {
                domain,
                count: count.max(0) as u64,
            })
            .collect())
    }
}
