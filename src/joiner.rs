//! joiner.rs
//!
//! Quizzes are never linked to roadmaps by key. A quiz belongs to a roadmap
//! when its topic contains the roadmap's main topic, ignoring case. The
//! relation is many-to-many and derived fresh on every export.

use tracing::{debug, warn};

use crate::errors::ExportError;
use crate::loader::RecordLoader;
use crate::models::{Quiz, QuizAttempt, Roadmap};
use crate::store::PathwayStore;

/// The quizzes associated with one roadmap, and the owner's attempts at them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicMatches {
    pub quizzes: Vec<Quiz>,
    pub attempts: Vec<QuizAttempt>,
}

/// Unanchored, case-insensitive containment of `main_topic` in `quiz_topic`.
///
/// Only this direction is checked: a quiz on "Algorithms" does not match a
/// roadmap on "Intro to Algorithms".
pub fn topic_matches(quiz_topic: &str, main_topic: &str) -> bool {
    quiz_topic
        .to_lowercase()
        .contains(&main_topic.to_lowercase())
}

/// Resolve the topic-matched quizzes for `roadmap`, then the attempts its
/// owning user made against exactly that quiz set.
///
/// No match is not an error: both lists simply come back empty.
pub async fn join_roadmap<S: PathwayStore>(
    loader: &RecordLoader<'_, S>,
    roadmap: &Roadmap,
) -> Result<TopicMatches, ExportError> {
    if roadmap.main_topic.trim().is_empty() {
        warn!(
            roadmap_id = %roadmap.id,
            "Roadmap has an empty main topic; every quiz will match"
        );
    }

    let quizzes = loader.quizzes_for_topic(&roadmap.main_topic).await?;
    if quizzes.is_empty() {
        debug!(roadmap_id = %roadmap.id, topic = %roadmap.main_topic, "No quizzes match topic");
        return Ok(TopicMatches::default());
    }

    let quiz_ids: Vec<String> = quizzes.iter().map(|q| q.id.clone()).collect();
    let attempts = loader.attempts_for(&roadmap.user_id, &quiz_ids).await?;

    debug!(
        roadmap_id = %roadmap.id,
        topic = %roadmap.main_topic,
        quizzes = quizzes.len(),
        attempts = attempts.len(),
        "Joined roadmap to quizzes"
    );

    Ok(TopicMatches { quizzes, attempts })
}
