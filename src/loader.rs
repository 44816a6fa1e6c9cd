//! loader.rs
//!
//! Fetch raw entities from the store and expand the user → roadmap →
//! checkpoint ownership tree. No caching: every call goes back to the store.

use tracing::debug;

use crate::errors::ExportError;
use crate::models::{Checkpoint, Quiz, QuizAttempt, Roadmap, User};
use crate::store::PathwayStore;

/// A roadmap with its checkpoints, both in store order.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadmapRecord {
    pub roadmap: Roadmap,
    pub checkpoints: Vec<Checkpoint>,
}

/// A user with the full roadmap subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub user: User,
    pub roadmaps: Vec<RoadmapRecord>,
}

/// Read-only entity access over a borrowed store handle.
#[derive(Debug)]
pub struct RecordLoader<'a, S> {
    store: &'a S,
}

impl<S> Clone for RecordLoader<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for RecordLoader<'_, S> {}

impl<'a, S: PathwayStore> RecordLoader<'a, S> {
    pub fn new(store: &'a S) -> Self {
        RecordLoader { store }
    }

    /// Every user with their roadmaps and checkpoints.
    pub async fn all_users(&self) -> Result<Vec<UserRecord>, ExportError> {
        let users = self.store.users().await?;
        let mut records = Vec::with_capacity(users.len());
        for user in users {
            records.push(self.expand(user).await?);
        }
        Ok(records)
    }

    /// One user's subtree, or [`ExportError::UserNotFound`].
    pub async fn user(&self, user_id: &str) -> Result<UserRecord, ExportError> {
        let user = self
            .store
            .user(user_id)
            .await?
            .ok_or_else(|| ExportError::UserNotFound(user_id.to_string()))?;
        self.expand(user).await
    }

    /// Quizzes whose topic contains `topic` (case-insensitive).
    pub async fn quizzes_for_topic(&self, topic: &str) -> Result<Vec<Quiz>, ExportError> {
        self.store.quizzes_matching_topic(topic).await
    }

    /// Attempts by `user_id` restricted to `quiz_ids`.
    pub async fn attempts_for(
        &self,
        user_id: &str,
        quiz_ids: &[String],
    ) -> Result<Vec<QuizAttempt>, ExportError> {
        if quiz_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.store.attempts_for_user(user_id, quiz_ids).await
    }

    async fn expand(&self, user: User) -> Result<UserRecord, ExportError> {
        let roadmaps = self.store.roadmaps_for_user(&user.id).await?;
        let mut expanded = Vec::with_capacity(roadmaps.len());
        for roadmap in roadmaps {
            let checkpoints = self.store.checkpoints_for_roadmap(&roadmap.id).await?;
            expanded.push(RoadmapRecord {
                roadmap,
                checkpoints,
            });
        }
        debug!(user_id = %user.id, roadmaps = expanded.len(), "Loaded user subtree");
        Ok(UserRecord {
            user,
            roadmaps: expanded,
        })
    }
}
