//! stats.rs
//!
//! Corpus-wide statistics, computed straight from the store and independent
//! of any per-user assembly.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::errors::ExportError;
use crate::models::{iso_millis, Entity};
use crate::store::PathwayStore;

/// Quizzes sharing one domain classifier. `None` groups quizzes without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainCount {
    pub domain: Option<String>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwayStats {
    #[serde(with = "iso_millis")]
    pub generated_at: DateTime<Utc>,
    pub totals: Totals,
    pub performance: Performance,
    pub domain_distribution: Vec<DomainCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub users: u64,
    pub roadmaps: u64,
    pub quizzes: u64,
    pub checkpoints: u64,
    pub quiz_attempts: u64,
}

/// Derived metrics, pre-formatted to two decimal places.
///
/// Every field is always a string. A zero denominator renders as `"0.00"`
/// (or `"0.00%"`), not as the bare number `0` or `"0%"` that earlier
/// exports of this data produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    /// e.g. `"62.50%"`
    pub checkpoint_completion_rate: String,
    pub average_roadmap_progress: String,
    pub average_quiz_score: String,
}

/// Completed share of all checkpoints, as a percentage. Zero when there
/// are no checkpoints.
pub fn completion_rate(completed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}

/// Mean roadmap progress, absent values counting as zero.
pub fn average_progress(values: &[Option<f64>]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| v.unwrap_or(0.0)).sum::<f64>() / values.len() as f64
}

/// Mean attempt score. Zero when there are no attempts.
pub fn average_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Two-decimal rendering used by every derived metric. Halves round away
/// from zero, so 8.125 becomes "8.13" rather than the banker's "8.12".
pub fn two_decimals(value: f64) -> String {
    format!("{:.2}", (value * 100.0).round() / 100.0)
}

/// Order domain groups by descending count; ties keep store order.
pub fn rank_domains(mut groups: Vec<DomainCount>) -> Vec<DomainCount> {
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

/// Query the store and compute the statistics document.
pub async fn calculate<S: PathwayStore>(
    store: &S,
    generated_at: DateTime<Utc>,
) -> Result<PathwayStats, ExportError> {
    let totals = Totals {
        users: store.count(Entity::Users).await?,
        roadmaps: store.count(Entity::Roadmaps).await?,
        quizzes: store.count(Entity::Quizzes).await?,
        checkpoints: store.count(Entity::Checkpoints).await?,
        quiz_attempts: store.count(Entity::QuizAttempts).await?,
    };

    let completed = store.completed_checkpoint_count().await?;
    let progress = store.roadmap_progress_values().await?;
    let scores = store.attempt_scores().await?;
    let domains = rank_domains(store.quiz_domain_counts().await?);

    let performance = Performance {
        checkpoint_completion_rate: format!(
            "{}%",
            two_decimals(completion_rate(completed, totals.checkpoints))
        ),
        average_roadmap_progress: two_decimals(average_progress(&progress)),
        average_quiz_score: two_decimals(average_score(&scores)),
    };

    info!(
        users = totals.users,
        roadmaps = totals.roadmaps,
        quizzes = totals.quizzes,
        checkpoints = totals.checkpoints,
        quiz_attempts = totals.quiz_attempts,
        completion_rate = %performance.checkpoint_completion_rate,
        "Computed pathway statistics"
    );

    Ok(PathwayStats {
        generated_at,
        totals,
        performance,
        domain_distribution: domains,
    })
}
