//! In-memory store, loadable from a JSON snapshot of the five collections.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ExportError;
use crate::joiner::topic_matches;
use crate::metrics::record_query;
use crate::models::{Checkpoint, Entity, Quiz, QuizAttempt, Roadmap, User};
use crate::stats::DomainCount;

use super::PathwayStore;

/// All five collections, each in store order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub roadmaps: Vec<Roadmap>,
    pub checkpoints: Vec<Checkpoint>,
    pub quizzes: Vec<Quiz>,
    pub quiz_attempts: Vec<QuizAttempt>,
}

/// A [`PathwayStore`] over a [`Snapshot`] held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Snapshot,
}

impl MemoryStore {
    pub fn new(data: Snapshot) -> Self {
        MemoryStore { data }
    }

    /// Load a snapshot file written as camelCase JSON.
    pub fn from_snapshot_file(path: &Path) -> Result<Self, ExportError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
        let data: Snapshot = serde_json::from_str(&raw)?;
        Ok(MemoryStore { data })
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.data
    }
}

impl PathwayStore for MemoryStore {
    async fn users(&self) -> Result<Vec<User>, ExportError> {
        record_query("users");
        Ok(self.data.users.clone())
    }

    async fn user(&self, id: &str) -> Result<Option<User>, ExportError> {
        record_query("user");
        Ok(self.data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn roadmaps_for_user(&self, user_id: &str) -> Result<Vec<Roadmap>, ExportError> {
        record_query("roadmaps_for_user");
        Ok(self
            .data
            .roadmaps
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn checkpoints_for_roadmap(
        &self,
        roadmap_id: &str,
    ) -> Result<Vec<Checkpoint>, ExportError> {
        record_query("checkpoints_for_roadmap");
        Ok(self
            .data
            .checkpoints
            .iter()
            .filter(|c| c.roadmap_id == roadmap_id)
            .cloned()
            .collect())
    }

    async fn quizzes_matching_topic(&self, topic: &str) -> Result<Vec<Quiz>, ExportError> {
        record_query("quizzes_matching_topic");
        Ok(self
            .data
            .quizzes
            .iter()
            .filter(|q| topic_matches(&q.topic, topic))
            .cloned()
            .collect())
    }

    async fn attempts_for_user(
        &self,
        user_id: &str,
        quiz_ids: &[String],
    ) -> Result<Vec<QuizAttempt>, ExportError> {
        record_query("attempts_for_user");
        Ok(self
            .data
            .quiz_attempts
            .iter()
            .filter(|a| a.user_id == user_id && quiz_ids.contains(&a.quiz_id))
            .cloned()
            .collect())
    }

    async fn count(&self, entity: Entity) -> Result<u64, ExportError> {
        record_query("count");
        let n = match entity {
            Entity::Users => self.data.users.len(),
            Entity::Roadmaps => self.data.roadmaps.len(),
            Entity::Checkpoints => self.data.checkpoints.len(),
            Entity::Quizzes => self.data.quizzes.len(),
            Entity::QuizAttempts => self.data.quiz_attempts.len(),
        };
        Ok(n as u64)
    }

    async fn completed_checkpoint_count(&self) -> Result<u64, ExportError> {
        record_query("completed_checkpoint_count");
        Ok(self
            .data
            .checkpoints
            .iter()
            .filter(|c| c.status.is_completed())
            .count() as u64)
    }

    async fn roadmap_progress_values(&self) -> Result<Vec<Option<f64>>, ExportError> {
        record_query("roadmap_progress_values");
        Ok(self.data.roadmaps.iter().map(|r| r.total_progress).collect())
    }

    async fn attempt_scores(&self) -> Result<Vec<f64>, ExportError> {
        record_query("attempt_scores");
        Ok(self.data.quiz_attempts.iter().map(|a| a.score).collect())
    }

    async fn quiz_domain_counts(&self) -> Result<Vec<DomainCount>, ExportError> {
        record_query("quiz_domain_counts");
        // Groups appear in first-seen order; ranking is the caller's job.
        let mut groups: Vec<DomainCount> = Vec::new();
        for quiz in &self.data.quizzes {
            match groups.iter_mut().find(|g| g.domain == quiz.domain) {
                Some(group) => group.count += 1,
                None => groups.push(DomainCount {
                    domain: quiz.domain.clone(),
                    count: 1,
                }),
            }
        }
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProgressStatus;
    use chrono::{TimeZone, Utc};
    use tokio_test::block_on;

    fn quiz(id: &str, topic: &str, domain: Option<&str>) -> Quiz {
        Quiz {
            id: id.into(),
            title: format!("{topic} quiz"),
            topic: topic.into(),
            difficulty: None,
            domain: domain.map(str::to_string),
            tags: vec![],
            questions: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn topic_lookup_is_case_insensitive_substring() {
        let store = MemoryStore::new(Snapshot {
            quizzes: vec![
                quiz("q1", "Intro to ALGORITHMS", None),
                quiz("q2", "Graph algorithms", None),
                quiz("q3", "Databases", None),
            ],
            ..Snapshot::default()
        });

        let found = block_on(store.quizzes_matching_topic("algorithms")).unwrap();
        let ids: Vec<_> = found.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, ["q1", "q2"]);
    }

    #[test]
    fn domain_groups_keep_first_seen_order() {
        let store = MemoryStore::new(Snapshot {
            quizzes: vec![
                quiz("q1", "a", Some("math")),
                quiz("q2", "b", None),
                quiz("q3", "c", Some("math")),
            ],
            ..Snapshot::default()
        });

        let groups = block_on(store.quiz_domain_counts()).unwrap();
        assert_eq!(
            groups,
            vec![
                DomainCount { domain: Some("math".into()), count: 2 },
                DomainCount { domain: None, count: 1 },
            ]
        );
    }

    #[test]
    fn completed_count_only_counts_completed() {
        let cp = |id: &str, status: ProgressStatus| Checkpoint {
            id: id.into(),
            roadmap_id: "r1".into(),
            title: id.into(),
            description: None,
            order: 0,
            status,
            completed_at: None,
            resources: None,
        };
        let store = MemoryStore::new(Snapshot {
            checkpoints: vec![
                cp("c1", ProgressStatus::Completed),
                cp("c2", ProgressStatus::InProgress),
                cp("c3", ProgressStatus::Other("Completed".into())),
            ],
            ..Snapshot::default()
        });

        assert_eq!(block_on(store.completed_checkpoint_count()).unwrap(), 1);
        assert_eq!(block_on(store.count(Entity::Checkpoints)).unwrap(), 3);
    }
}
