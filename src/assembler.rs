//! assembler.rs
//!
//! Build the denormalized export documents: each user's profile, every owned
//! roadmap with its checkpoints, and the quizzes and attempts joined to that
//! roadmap by topic. Roadmaps are processed one at a time, in store order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::errors::ExportError;
use crate::joiner::{join_roadmap, TopicMatches};
use crate::loader::{RecordLoader, RoadmapRecord, UserRecord};
use crate::metrics::{ASSEMBLY_HISTOGRAM, USERS_EXPORTED};
use crate::models::{iso_millis, Checkpoint, ProgressStatus, Quiz, QuizAttempt};
use crate::store::PathwayStore;

/// Export of every user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwayExport {
    #[serde(with = "iso_millis")]
    pub export_date: DateTime<Utc>,
    pub total_users: usize,
    pub users: Vec<UserPathway>,
}

/// Export of a single user; the user's fields sit beside `exportDate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPathwayExport {
    #[serde(with = "iso_millis")]
    pub export_date: DateTime<Utc>,
    #[serde(flatten)]
    pub user: UserPathway,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPathway {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub learning_parameters: Option<Value>,
    pub survey_parameters: Option<Value>,
    pub roadmaps: Vec<RoadmapPathway>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapPathway {
    pub roadmap_id: String,
    pub main_topic: String,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub estimated_duration: Option<String>,
    pub total_progress: Option<f64>,
    pub status: ProgressStatus,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    pub checkpoints: Vec<CheckpointExport>,
    pub quizzes: Vec<QuizExport>,
    pub quiz_attempts: Vec<AttemptExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointExport {
    pub checkpoint_id: String,
    pub title: String,
    pub description: Option<String>,
    pub order: i32,
    pub status: ProgressStatus,
    #[serde(with = "iso_millis::option")]
    pub completed_at: Option<DateTime<Utc>>,
    pub resources: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizExport {
    pub quiz_id: String,
    pub title: String,
    pub topic: String,
    pub difficulty: Option<String>,
    pub domain: Option<String>,
    pub tags: Vec<String>,
    pub questions: Option<Value>,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptExport {
    pub attempt_id: String,
    pub quiz_id: String,
    pub score: f64,
    pub total_questions: i32,
    pub correct_answers: i32,
    #[serde(with = "iso_millis::option")]
    pub completed_at: Option<DateTime<Utc>>,
    pub time_taken: Option<i64>,
}

impl From<Checkpoint> for CheckpointExport {
    fn from(c: Checkpoint) -> Self {
        CheckpointExport {
            checkpoint_id: c.id,
            title: c.title,
            description: c.description,
            order: c.order,
            status: c.status,
            completed_at: c.completed_at,
            resources: c.resources,
        }
    }
}

impl From<Quiz> for QuizExport {
    fn from(q: Quiz) -> Self {
        QuizExport {
            quiz_id: q.id,
            title: q.title,
            topic: q.topic,
            difficulty: q.difficulty,
            domain: q.domain,
            tags: q.tags,
            questions: q.questions,
            created_at: q.created_at,
        }
    }
}

impl From<QuizAttempt> for AttemptExport {
    fn from(a: QuizAttempt) -> Self {
        AttemptExport {
            attempt_id: a.id,
            quiz_id: a.quiz_id,
            score: a.score,
            total_questions: a.total_questions,
            correct_answers: a.correct_answers,
            completed_at: a.completed_at,
            time_taken: a.time_taken,
        }
    }
}

/// Composes loaded records and topic joins into export documents.
pub struct PathwayAssembler<'a, S> {
    loader: RecordLoader<'a, S>,
}

impl<'a, S: PathwayStore> PathwayAssembler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        PathwayAssembler {
            loader: RecordLoader::new(store),
        }
    }

    /// Assemble every user, stamped with `export_date`.
    pub async fn assemble_all(
        &self,
        export_date: DateTime<Utc>,
    ) -> Result<PathwayExport, ExportError> {
        let _timer = ASSEMBLY_HISTOGRAM.start_timer();
        let records = self.loader.all_users().await?;

        let mut users = Vec::with_capacity(records.len());
        for record in records {
            users.push(self.assemble_pathway(record).await?);
        }
        USERS_EXPORTED.inc_by(users.len() as u64);
        info!(total_users = users.len(), "Assembled pathway export");

        Ok(PathwayExport {
            export_date,
            total_users: users.len(),
            users,
        })
    }

    /// Assemble one user, or fail with [`ExportError::UserNotFound`].
    pub async fn assemble_user(
        &self,
        user_id: &str,
        export_date: DateTime<Utc>,
    ) -> Result<UserPathwayExport, ExportError> {
        let _timer = ASSEMBLY_HISTOGRAM.start_timer();
        let record = self.loader.user(user_id).await?;
        let user = self.assemble_pathway(record).await?;
        USERS_EXPORTED.inc();
        info!(user_id, roadmaps = user.roadmaps.len(), "Assembled user pathway");

        Ok(UserPathwayExport { export_date, user })
    }

    async fn assemble_pathway(&self, record: UserRecord) -> Result<UserPathway, ExportError> {
        let UserRecord { user, roadmaps } = record;

        let mut assembled = Vec::with_capacity(roadmaps.len());
        for roadmap in roadmaps {
            let matches = join_roadmap(&self.loader, &roadmap.roadmap).await?;
            assembled.push(assemble_roadmap(roadmap, matches));
        }

        Ok(UserPathway {
            user_id: user.id,
            name: user.name,
            email: user.email,
            learning_parameters: user.learning_parameters,
            survey_parameters: user.survey_parameters,
            roadmaps: assembled,
        })
    }
}

fn assemble_roadmap(record: RoadmapRecord, matches: TopicMatches) -> RoadmapPathway {
    let RoadmapRecord {
        roadmap,
        mut checkpoints,
    } = record;

    // Stable: equal order indexes keep store order.
    checkpoints.sort_by_key(|c| c.order);

    RoadmapPathway {
        roadmap_id: roadmap.id,
        main_topic: roadmap.main_topic,
        description: roadmap.description,
        difficulty: roadmap.difficulty,
        estimated_duration: roadmap.estimated_duration,
        total_progress: roadmap.total_progress,
        status: roadmap.status,
        created_at: roadmap.created_at,
        checkpoints: checkpoints.into_iter().map(CheckpointExport::from).collect(),
        quizzes: matches.quizzes.into_iter().map(QuizExport::from).collect(),
        quiz_attempts: matches.attempts.into_iter().map(AttemptExport::from).collect(),
    }
}
