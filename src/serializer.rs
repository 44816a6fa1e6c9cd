//! serializer.rs
//!
//! Render assembled documents as pretty JSON, or flatten them to CSV with
//! one row per (user, roadmap, checkpoint).

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::assembler::UserPathway;
use crate::errors::ExportError;
use crate::models::format_timestamp;

/// Pretty JSON, two-space indent, keys in declaration order.
pub fn to_json<T: Serialize>(doc: &T) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Header of the flattened view, in column order.
pub const TABULAR_COLUMNS: [&str; 11] = [
    "userId",
    "userName",
    "userEmail",
    "roadmapId",
    "roadmapTopic",
    "roadmapProgress",
    "checkpointId",
    "checkpointTitle",
    "checkpointStatus",
    "checkpointOrder",
    "completedAt",
];

/// One flattened (user, roadmap, checkpoint) row.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularRow {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub roadmap_id: String,
    pub roadmap_topic: String,
    pub roadmap_progress: Option<f64>,
    pub checkpoint_id: String,
    pub checkpoint_title: String,
    pub checkpoint_status: String,
    pub checkpoint_order: i32,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A typed cell. Only `Text` is quoted when rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell<'a> {
    Text(Cow<'a, str>),
    Integer(i64),
    Number(f64),
    /// Bare ISO 8601; never contains a comma or quote.
    Timestamp(DateTime<Utc>),
    Empty,
}

impl TabularRow {
    /// Cells in [`TABULAR_COLUMNS`] order.
    pub fn cells(&self) -> [Cell<'_>; 11] {
        [
            Cell::Text(Cow::Borrowed(&self.user_id)),
            Cell::Text(Cow::Borrowed(&self.user_name)),
            Cell::Text(Cow::Borrowed(&self.user_email)),
            Cell::Text(Cow::Borrowed(&self.roadmap_id)),
            Cell::Text(Cow::Borrowed(&self.roadmap_topic)),
            self.roadmap_progress.map_or(Cell::Empty, Cell::Number),
            Cell::Text(Cow::Borrowed(&self.checkpoint_id)),
            Cell::Text(Cow::Borrowed(&self.checkpoint_title)),
            Cell::Text(Cow::Borrowed(&self.checkpoint_status)),
            Cell::Integer(i64::from(self.checkpoint_order)),
            self.completed_at.map_or(Cell::Empty, Cell::Timestamp),
        ]
    }
}

/// Flatten users into rows. Roadmaps without checkpoints produce no rows.
pub fn flatten(users: &[UserPathway]) -> Vec<TabularRow> {
    let mut rows = Vec::new();
    for user in users {
        for roadmap in &user.roadmaps {
            for checkpoint in &roadmap.checkpoints {
                rows.push(TabularRow {
                    user_id: user.user_id.clone(),
                    user_name: user.name.clone(),
                    user_email: user.email.clone(),
                    roadmap_id: roadmap.roadmap_id.clone(),
                    roadmap_topic: roadmap.main_topic.clone(),
                    roadmap_progress: roadmap.total_progress,
                    checkpoint_id: checkpoint.checkpoint_id.clone(),
                    checkpoint_title: checkpoint.title.clone(),
                    checkpoint_status: checkpoint.status.to_string(),
                    checkpoint_order: checkpoint.order,
                    completed_at: checkpoint.completed_at,
                });
            }
        }
    }
    rows
}

/// Render rows as CSV: header first, `\n` between lines, no trailing
/// newline. No rows renders as the empty string, not a lone header.
pub fn render_csv(rows: &[TabularRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(TABULAR_COLUMNS.join(","));
    for row in rows {
        let rendered: Vec<Cow<'_, str>> = row.cells().iter().map(render_cell).collect();
        lines.push(rendered.join(","));
    }
    lines.join("\n")
}

fn render_cell<'a>(cell: &Cell<'a>) -> Cow<'a, str> {
    match cell {
        Cell::Text(s) => Cow::Owned(quote(s)),
        Cell::Integer(n) => Cow::Owned(n.to_string()),
        Cell::Number(n) => Cow::Owned(format_number(*n)),
        Cell::Timestamp(ts) => Cow::Owned(format_timestamp(ts)),
        Cell::Empty => Cow::Borrowed(""),
    }
}

/// Wrap in double quotes, doubling any embedded quote.
pub fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Shortest round-trip text for `n`; whole numbers print without a fraction.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
