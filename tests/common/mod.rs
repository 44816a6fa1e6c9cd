#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use pathway_exporter::models::{Checkpoint, ProgressStatus, Quiz, QuizAttempt, Roadmap, User};
use pathway_exporter::store::{MemoryStore, Snapshot};
use serde_json::json;

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// The single-learner corpus:
/// - user `u1` "Ada" with one roadmap "Algorithms" at 40% progress,
/// - one completed checkpoint "Intro",
/// - one quiz on "Intro to Algorithms",
/// - one attempt by Ada scoring 8 of 10.
pub fn ada_snapshot() -> Snapshot {
    Snapshot {
        users: vec![User {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.org".into(),
            learning_parameters: Some(json!({"style": "visual", "hoursPerWeek": 6})),
            survey_parameters: Some(json!({"experience": "beginner"})),
        }],
        roadmaps: vec![Roadmap {
            id: "r1".into(),
            user_id: "u1".into(),
            main_topic: "Algorithms".into(),
            description: Some("Sorting, searching and graphs".into()),
            difficulty: Some("intermediate".into()),
            estimated_duration: Some("6 weeks".into()),
            total_progress: Some(40.0),
            status: ProgressStatus::InProgress,
            created_at: at(2026, 9, 1, 10),
        }],
        checkpoints: vec![Checkpoint {
            id: "c1".into(),
            roadmap_id: "r1".into(),
            title: "Intro".into(),
            description: Some("Big-O notation".into()),
            order: 1,
            status: ProgressStatus::Completed,
            completed_at: Some(at(2026, 9, 3, 18)),
            resources: Some(json!([{"type": "video", "url": "https://example.org/bigo"}])),
        }],
        quizzes: vec![Quiz {
            id: "q1".into(),
            title: "Algorithms basics".into(),
            topic: "Intro to Algorithms".into(),
            difficulty: Some("easy".into()),
            domain: Some("computer-science".into()),
            tags: vec!["big-o".into(), "sorting".into()],
            questions: Some(json!([{"prompt": "What is O(n log n)?"}])),
            created_at: at(2026, 8, 20, 9),
        }],
        quiz_attempts: vec![QuizAttempt {
            id: "a1".into(),
            user_id: "u1".into(),
            quiz_id: "q1".into(),
            score: 8.0,
            total_questions: 10,
            correct_answers: 8,
            completed_at: Some(at(2026, 9, 4, 20)),
            time_taken: Some(540),
        }],
    }
}

pub fn ada_store() -> MemoryStore {
    MemoryStore::new(ada_snapshot())
}

/// Ada's corpus plus a second learner whose roadmap has no checkpoints and
/// whose topic matches no quiz.
pub fn two_learner_store() -> MemoryStore {
    let mut snap = ada_snapshot();
    snap.users.push(User {
        id: "u2".into(),
        name: "Alan  Mathison\tTuring".into(),
        email: "alan@example.org".into(),
        learning_parameters: None,
        survey_parameters: None,
    });
    snap.roadmaps.push(Roadmap {
        id: "r2".into(),
        user_id: "u2".into(),
        main_topic: "Cryptanalysis".into(),
        description: None,
        difficulty: None,
        estimated_duration: None,
        total_progress: None,
        status: ProgressStatus::NotStarted,
        created_at: at(2026, 9, 2, 10),
    });
    MemoryStore::new(snap)
}
