//! exporter.rs
//!
//! The invocable operations: export all users, export one user, compute
//! statistics, and export with an optional CSV rendering. Each one
//! assembles its document, serializes it and writes its own artifacts.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use tracing::info;

use crate::assembler::{PathwayAssembler, PathwayExport, UserPathway, UserPathwayExport};
use crate::errors::ExportError;
use crate::serializer::{flatten, render_csv, to_json};
use crate::sink::write_artifact;
use crate::stats::{self, PathwayStats};
use crate::store::PathwayStore;

/// Output rendering for [`Exporter::export`]. JSON is always written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

/// A document together with where it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Saved<T> {
    pub document: T,
    pub path: PathBuf,
}

/// Either export shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportDocument {
    All(PathwayExport),
    User(UserPathwayExport),
}

impl ExportDocument {
    pub fn users(&self) -> &[UserPathway] {
        match self {
            ExportDocument::All(doc) => &doc.users,
            ExportDocument::User(doc) => std::slice::from_ref(&doc.user),
        }
    }
}

/// Result of [`Exporter::export`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    pub document: ExportDocument,
    pub json_path: PathBuf,
    pub csv_path: Option<PathBuf>,
}

/// Runs export operations against one store, writing under one directory.
pub struct Exporter<'a, S> {
    store: &'a S,
    export_dir: PathBuf,
}

impl<'a, S: PathwayStore> Exporter<'a, S> {
    pub fn new(store: &'a S, export_dir: impl Into<PathBuf>) -> Self {
        Exporter {
            store,
            export_dir: export_dir.into(),
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Export every user to `pathway_data_<date>.json`.
    pub async fn save_all(&self, now: DateTime<Utc>) -> Result<Saved<PathwayExport>, ExportError> {
        info!("Starting complete pathway data export");
        let document = PathwayAssembler::new(self.store).assemble_all(now).await?;
        let path = write_artifact(&self.export_dir, &all_json_name(now), &to_json(&document)?)?;
        info!(total_users = document.total_users, path = %path.display(), "Complete pathway data saved");
        Ok(Saved { document, path })
    }

    /// Export one user to `user_pathway_<name>_<id>_<date>.json`.
    pub async fn save_user(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Saved<UserPathwayExport>, ExportError> {
        info!(user_id, "Saving pathway data for user");
        let document = PathwayAssembler::new(self.store)
            .assemble_user(user_id, now)
            .await?;
        let name = user_json_name(&document.user.name, user_id, now);
        let path = write_artifact(&self.export_dir, &name, &to_json(&document)?)?;
        Ok(Saved { document, path })
    }

    /// Compute statistics into `pathway_stats_<date>.json`.
    pub async fn save_stats(&self, now: DateTime<Utc>) -> Result<Saved<PathwayStats>, ExportError> {
        info!("Generating pathway statistics");
        let document = stats::calculate(self.store, now).await?;
        let path = write_artifact(&self.export_dir, &stats_json_name(now), &to_json(&document)?)?;
        Ok(Saved { document, path })
    }

    /// Export all users, or one when `user_id` is given, as JSON; with
    /// [`ExportFormat::Csv`] also write the flattened CSV alongside.
    pub async fn export(
        &self,
        format: ExportFormat,
        user_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ExportOutcome, ExportError> {
        let (document, json_path) = match user_id {
            Some(id) => {
                let saved = self.save_user(id, now).await?;
                (ExportDocument::User(saved.document), saved.path)
            }
            None => {
                let saved = self.save_all(now).await?;
                (ExportDocument::All(saved.document), saved.path)
            }
        };

        let csv_path = match format {
            ExportFormat::Json => None,
            ExportFormat::Csv => {
                let csv = render_csv(&flatten(document.users()));
                let name = match user_id {
                    Some(id) => user_csv_name(id, now),
                    None => all_csv_name(now),
                };
                Some(write_artifact(&self.export_dir, &name, &csv)?)
            }
        };

        Ok(ExportOutcome {
            document,
            json_path,
            csv_path,
        })
    }

    /// Statistics, then the full export in both JSON and CSV.
    pub async fn run_all(&self, now: DateTime<Utc>) -> Result<(), ExportError> {
        info!("Starting pathway data export process");
        self.save_stats(now).await?;
        self.export(ExportFormat::Csv, None, now).await?;
        info!("Pathway data export completed successfully");
        Ok(())
    }
}

/// `YYYY-MM-DD` of `now` in UTC.
pub fn date_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Collapse each whitespace run to one `_`. Path separators also become
/// `_` so a name can never escape the export directory.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        out.push(if ch == '/' || ch == '\\' { '_' } else { ch });
    }
    out
}

pub fn all_json_name(now: DateTime<Utc>) -> String {
    format!("pathway_data_{}.json", date_stamp(now))
}

pub fn all_csv_name(now: DateTime<Utc>) -> String {
    format!("pathway_data_{}.csv", date_stamp(now))
}

pub fn user_json_name(user_name: &str, user_id: &str, now: DateTime<Utc>) -> String {
    format!(
        "user_pathway_{}_{}_{}.json",
        sanitize_name(user_name),
        sanitize_name(user_id),
        date_stamp(now)
    )
}

pub fn user_csv_name(user_id: &str, now: DateTime<Utc>) -> String {
    format!("user_pathway_{}_{}.csv", sanitize_name(user_id), date_stamp(now))
}

pub fn stats_json_name(now: DateTime<Utc>) -> String {
    format!("pathway_stats_{}.json", date_stamp(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn whitespace_runs_collapse_to_one_separator() {
        assert_eq!(sanitize_name("Ada  Lovelace"), "Ada_Lovelace");
        assert_eq!(sanitize_name(" Ada\t\nL "), "_Ada_L_");
        assert_eq!(sanitize_name("a/b\\c"), "a_b_c");
    }

    #[test]
    fn artifact_names_carry_date_stamp() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 23, 59, 59).unwrap();
        assert_eq!(all_json_name(now), "pathway_data_2026-10-19.json");
        assert_eq!(all_csv_name(now), "pathway_data_2026-10-19.csv");
        assert_eq!(stats_json_name(now), "pathway_stats_2026-10-19.json");
        assert_eq!(
            user_json_name("Ada Lovelace", "u42", now),
            "user_pathway_Ada_Lovelace_u42_2026-10-19.json"
        );
        assert_eq!(user_csv_name("u42", now), "user_pathway_u42_2026-10-19.csv");
    }
}
