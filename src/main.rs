//! Entrypoint: set up tracing, load configuration, open the store, and run
//! one export operation.
//!
//! Configuration comes from `Config.toml` plus `APP__…` overrides (see
//! `config.rs`). The store is Postgres unless `--snapshot` points at a JSON
//! snapshot of the five collections.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use pathway_exporter::config::Settings;
use pathway_exporter::errors::ExportError;
use pathway_exporter::exporter::{ExportFormat, Exporter};
use pathway_exporter::metrics;
use pathway_exporter::sink::write_artifact;
use pathway_exporter::store::{MemoryStore, PathwayStore, PgStore};

/// Export learner pathways and statistics to dated JSON/CSV artifacts.
#[derive(Debug, Parser)]
#[command(name = "pathway-exporter", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Config file name, extension optional
    #[arg(short, long, global = true, default_value = "Config")]
    config: String,

    /// Read from a JSON snapshot instead of Postgres
    #[arg(long, global = true, value_name = "PATH")]
    snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Statistics, then every user as JSON and CSV (default)
    Run,
    /// Every user as JSON
    All,
    /// One user as JSON
    User {
        user_id: String,
    },
    /// Corpus statistics as JSON
    Stats,
    /// Every user, or one, as JSON with optional CSV
    Export {
        #[arg(short, long, value_enum, default_value_t)]
        format: ExportFormat,
        #[arg(short, long, value_name = "USER_ID")]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // ───────────────────────────────────────────────────────────────
    // 1. Initialise tracing / logging
    // ───────────────────────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Pathway export failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // ───────────────────────────────────────────────────────────────
    // 2. Load configuration
    // ───────────────────────────────────────────────────────────────
    let settings = Settings::load(&cli.config).context("loading configuration")?;
    info!(
        export_dir = %settings.export_dir.display(),
        query_timeout = ?settings.query_timeout,
        "Loaded configuration"
    );

    let command = cli.command.unwrap_or(Command::Run);
    let now = Utc::now();

    // ───────────────────────────────────────────────────────────────
    // 3. Acquire the store, run, and always release it
    // ───────────────────────────────────────────────────────────────
    let result = match &cli.snapshot {
        Some(path) => {
            let store = MemoryStore::from_snapshot_file(path)
                .with_context(|| format!("reading snapshot {}", path.display()))?;
            info!(path = %path.display(), "Loaded snapshot store");
            execute(&store, &settings, command, now).await
        }
        None => {
            let store = PgStore::connect(&settings)
                .await
                .context("connecting to Postgres")?;
            let result = execute(&store, &settings, command, now).await;
            store.close().await;
            result
        }
    };

    // ───────────────────────────────────────────────────────────────
    // 4. Metrics textfile (written on failure too)
    // ───────────────────────────────────────────────────────────────
    if let Some(path) = &settings.metrics_file {
        if let Err(e) = write_metrics(path) {
            warn!(path = %path.display(), error = %e, "Failed to write metrics file");
        }
    }

    result.map_err(anyhow::Error::from)
}

async fn execute<S: PathwayStore>(
    store: &S,
    settings: &Settings,
    command: Command,
    now: DateTime<Utc>,
) -> Result<(), ExportError> {
    let exporter = Exporter::new(store, &settings.export_dir);
    match command {
        Command::Run => exporter.run_all(now).await,
        Command::All => exporter.save_all(now).await.map(|_| ()),
        Command::User { user_id } => exporter.save_user(&user_id, now).await.map(|_| ()),
        Command::Stats => exporter.save_stats(now).await.map(|_| ()),
        Command::Export { format, user } => {
            let outcome = exporter.export(format, user.as_deref(), now).await?;
            if let Some(csv) = outcome.csv_path {
                info!(path = %csv.display(), "CSV data saved");
            }
            Ok(())
        }
    }
}

fn write_metrics(path: &Path) -> Result<(), ExportError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("pathway_exporter.prom");
    write_artifact(dir, name, &metrics::gather_metrics()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_full_run() {
        let cli = Cli::try_parse_from(["pathway-exporter"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, "Config");
    }

    #[test]
    fn export_accepts_format_and_user() {
        let cli = Cli::try_parse_from([
            "pathway-exporter",
            "export",
            "--format",
            "csv",
            "--user",
            "u1",
            "--snapshot",
            "fixture.json",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Export { format, user }) => {
                assert_eq!(format, ExportFormat::Csv);
                assert_eq!(user.as_deref(), Some("u1"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.snapshot, Some(PathBuf::from("fixture.json")));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["pathway-exporter", "export", "--format", "xml"]).is_err());
    }
}
