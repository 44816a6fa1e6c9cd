#[path = "common/mod.rs"]
mod common;

use std::fs;
use std::path::Path;

use common::*;
use pathway_exporter::errors::ExportError;
use pathway_exporter::exporter::{ExportFormat, Exporter};
use pathway_exporter::models::{Checkpoint, Entity, Quiz, QuizAttempt, Roadmap, User};
use pathway_exporter::stats::DomainCount;
use pathway_exporter::store::{MemoryStore, PathwayStore};
use tokio_test::block_on;

/// Serves the Ada corpus, except that the named query fails with a closed
/// pool. Each call to that query is counted so retries would show up.
struct BrokenStore {
    inner: MemoryStore,
    failing: &'static str,
    failures: std::cell::Cell<u32>,
}

impl BrokenStore {
    fn failing(failing: &'static str) -> Self {
        BrokenStore {
            inner: ada_store(),
            failing,
            failures: std::cell::Cell::new(0),
        }
    }

    fn check(&self, operation: &'static str) -> Result<(), ExportError> {
        if operation == self.failing {
            self.failures.set(self.failures.get() + 1);
            return Err(ExportError::Store(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

impl PathwayStore for BrokenStore {
    async fn users(&self) -> Result<Vec<User>, ExportError> {
        self.check("users")?;
        self.inner.users().await
    }

    async fn user(&self, id: &str) -> Result<Option<User>, ExportError> {
        self.check("user")?;
        self.inner.user(id).await
    }

    async fn roadmaps_for_user(&self, user_id: &str) -> Result<Vec<Roadmap>, ExportError> {
        self.check("roadmaps_for_user")?;
        self.inner.roadmaps_for_user(user_id).await
    }

    async fn checkpoints_for_roadmap(
        &self,
        roadmap_id: &str,
    ) -> Result<Vec<Checkpoint>, ExportError> {
        self.check("checkpoints_for_roadmap")?;
        self.inner.checkpoints_for_roadmap(roadmap_id).await
    }

    async fn quizzes_matching_topic(&self, topic: &str) -> Result<Vec<Quiz>, ExportError> {
        self.check("quizzes_matching_topic")?;
        self.inner.quizzes_matching_topic(topic).await
    }

    async fn attempts_for_user(
        &self,
        user_id: &str,
        quiz_ids: &[String],
    ) -> Result<Vec<QuizAttempt>, ExportError> {
        self.check("attempts_for_user")?;
        self.inner.attempts_for_user(user_id, quiz_ids).await
    }

    async fn count(&self, entity: Entity) -> Result<u64, ExportError> {
        self.check("count")?;
        self.inner.count(entity).await
    }

    async fn completed_checkpoint_count(&self) -> Result<u64, ExportError> {
        self.check("completed_checkpoint_count")?;
        self.inner.completed_checkpoint_count().await
    }

    async fn roadmap_progress_values(&self) -> Result<Vec<Option<f64>>, ExportError> {
        self.check("roadmap_progress_values")?;
        self.inner.roadmap_progress_values().await
    }

    async fn attempt_scores(&self) -> Result<Vec<f64>, ExportError> {
        self.check("attempt_scores")?;
        self.inner.attempt_scores().await
    }

    async fn quiz_domain_counts(&self) -> Result<Vec<DomainCount>, ExportError> {
        self.check("quiz_domain_counts")?;
        self.inner.quiz_domain_counts().await
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn store_error_during_export_all_writes_nothing() {
    let store = BrokenStore::failing("quizzes_matching_topic");
    let out = tempfile::tempdir().unwrap();
    let exporter = Exporter::new(&store, out.path());

    let err = block_on(exporter.save_all(at(2026, 10, 19, 8))).unwrap_err();

    assert!(matches!(err, ExportError::Store(sqlx::Error::PoolClosed)), "{err:?}");
    assert_eq!(store.failures.get(), 1);
    let names = file_names(out.path());
    assert!(!names.iter().any(|n| n.starts_with("pathway_data_")), "{names:?}");
    assert!(!names.iter().any(|n| n.ends_with(".tmp")), "{names:?}");
}

#[test]
fn store_error_during_single_user_export_propagates() {
    let store = BrokenStore::failing("attempts_for_user");
    let out = tempfile::tempdir().unwrap();
    let exporter = Exporter::new(&store, out.path());

    let err = block_on(exporter.export(ExportFormat::Csv, Some("u1"), at(2026, 10, 19, 8)))
        .unwrap_err();

    assert!(matches!(err, ExportError::Store(_)), "{err:?}");
    assert_eq!(store.failures.get(), 1);
    assert!(file_names(out.path()).is_empty());
}

#[test]
fn store_error_during_stats_writes_nothing() {
    let store = BrokenStore::failing("attempt_scores");
    let out = tempfile::tempdir().unwrap();
    let exporter = Exporter::new(&store, out.path());

    let err = block_on(exporter.save_stats(at(2026, 10, 19, 8))).unwrap_err();

    assert!(matches!(err, ExportError::Store(_)), "{err:?}");
    assert_eq!(store.failures.get(), 1);
    assert!(file_names(out.path()).is_empty());
}

#[test]
fn full_run_stops_at_first_store_error() {
    let store = BrokenStore::failing("users");
    let out = tempfile::tempdir().unwrap();
    let exporter = Exporter::new(&store, out.path());

    let err = block_on(exporter.run_all(at(2026, 10, 19, 8))).unwrap_err();

    assert!(matches!(err, ExportError::Store(_)), "{err:?}");
    assert_eq!(store.failures.get(), 1);
    // Statistics come first and do not touch `users`, so only they land.
    assert_eq!(file_names(out.path()), ["pathway_stats_2026-10-19.json"]);
}
