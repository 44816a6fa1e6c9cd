//! Read-only access to the stored learner records.
//!
//! Every method re-queries its backend; nothing is cached between calls.

mod memory;
mod postgres;

pub use memory::{MemoryStore, Snapshot};
pub use postgres::PgStore;

use crate::errors::ExportError;
use crate::models::{Checkpoint, Entity, Quiz, QuizAttempt, Roadmap, User};
use crate::stats::DomainCount;

/// The queries the export pipeline needs from a backing store.
///
/// Collections come back in store order, which the pipeline preserves.
#[allow(async_fn_in_trait)]
pub trait PathwayStore {
    /// All users.
    async fn users(&self) -> Result<Vec<User>, ExportError>;

    /// One user by id, `None` when absent.
    async fn user(&self, id: &str) -> Result<Option<User>, ExportError>;

    /// Roadmaps owned by `user_id`.
    async fn roadmaps_for_user(&self, user_id: &str) -> Result<Vec<Roadmap>, ExportError>;

    /// Checkpoints owned by `roadmap_id`.
    async fn checkpoints_for_roadmap(&self, roadmap_id: &str)
        -> Result<Vec<Checkpoint>, ExportError>;

    /// Quizzes whose topic contains `topic`, case-insensitively.
    async fn quizzes_matching_topic(&self, topic: &str) -> Result<Vec<Quiz>, ExportError>;

    /// Attempts by `user_id` against any quiz in `quiz_ids`.
    async fn attempts_for_user(
        &self,
        user_id: &str,
        quiz_ids: &[String],
    ) -> Result<Vec<QuizAttempt>, ExportError>;

    async fn count(&self, entity: Entity) -> Result<u64, ExportError>;

    async fn completed_checkpoint_count(&self) -> Result<u64, ExportError>;

    /// Each roadmap's `total_progress`, absent values included as `None`.
    async fn roadmap_progress_values(&self) -> Result<Vec<Option<f64>>, ExportError>;

    async fn attempt_scores(&self) -> Result<Vec<f64>, ExportError>;

    /// Quiz count per domain classifier.
    async fn quiz_domain_counts(&self) -> Result<Vec<DomainCount>, ExportError>;
}
