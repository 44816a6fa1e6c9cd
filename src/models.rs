//! models.rs
//!
//! Stored entity records as the exporter reads them. None of these are ever
//! written back; the exporter only derives new documents from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// A learner. Owned roadmaps are fetched separately through the store.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub learning_parameters: Option<Value>,
    #[serde(default)]
    pub survey_parameters: Option<Value>,
}

/// A user's learning plan for one main topic.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roadmap {
    pub id: String,
    pub user_id: String,
    pub main_topic: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub estimated_duration: Option<String>,
    #[serde(default)]
    pub total_progress: Option<f64>,
    #[sqlx(try_from = "String")]
    pub status: ProgressStatus,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

/// A milestone within a roadmap.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub id: String,
    pub roadmap_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub order: i32,
    #[sqlx(try_from = "String")]
    pub status: ProgressStatus,
    #[serde(default, with = "iso_millis::option")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resources: Option<Value>,
}

/// An assessment. Not linked to roadmaps except by topic text.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub topic: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub questions: Option<Value>,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

/// One user's scored attempt at a quiz.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub score: f64,
    pub total_questions: i32,
    pub correct_answers: i32,
    #[serde(default, with = "iso_millis::option")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Elapsed seconds
    #[serde(default)]
    pub time_taken: Option<i64>,
}

/// Lifecycle status shared by roadmaps and checkpoints.
///
/// Values outside the known set are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
    Other(String),
}

impl ProgressStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
            ProgressStatus::Other(s) => s,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ProgressStatus::Completed)
    }
}

impl From<String> for ProgressStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "not_started" => ProgressStatus::NotStarted,
            "in_progress" => ProgressStatus::InProgress,
            "completed" => ProgressStatus::Completed,
            _ => ProgressStatus::Other(s),
        }
    }
}

impl From<ProgressStatus> for String {
    fn from(status: ProgressStatus) -> Self {
        match status {
            ProgressStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The stored entity collections, for count queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Users,
    Roadmaps,
    Checkpoints,
    Quizzes,
    QuizAttempts,
}

impl Entity {
    pub fn table(self) -> &'static str {
        match self {
            Entity::Users => "users",
            Entity::Roadmaps => "roadmaps",
            Entity::Checkpoints => "checkpoints",
            Entity::Quizzes => "quizzes",
            Entity::QuizAttempts => "quiz_attempts",
        }
    }
}

/// Render a timestamp as RFC 3339 UTC with millisecond precision,
/// e.g. `2026-10-19T08:30:00.000Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Serde glue so every timestamp in an artifact has one textual shape.
pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(d)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => s.serialize_str(&super::super::format_timestamp(ts)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<DateTime<Utc>>::deserialize(d)
        }
    }
}
