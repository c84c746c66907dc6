//! Run a node migration over an exported event log
//!
//! Imports the events into a fresh in-memory repository, migrates the
//! workspace and writes the target workspace's events back out.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cim_content_graph::migration::MigrationConfiguration;
use cim_content_graph::{
    ContentRepository, ContentRepositorySettings, EventExporter, EventImporter, ExecuteMigration,
    NodeMigrationService, WorkspaceName,
};

#[derive(Debug, Parser)]
#[command(name = "content-graph-migrate", about = "Apply a node migration to an exported content stream")]
struct Args {
    /// Repository settings (.toml or .json) with dimensions and node types
    #[arg(long)]
    settings: PathBuf,

    /// Event log in JSON lines format
    #[arg(long)]
    events: PathBuf,

    /// Migration file (.toml or .json)
    #[arg(long)]
    migration: PathBuf,

    /// Workspace the events are imported into
    #[arg(long, default_value = "live")]
    workspace: String,

    /// Workspace receiving the migrated content; defaults to the imported one
    #[arg(long)]
    target: Option<String>,

    /// Where to write the migrated events; stdout if omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let settings = ContentRepositorySettings::from_file(&args.settings)
        .with_context(|| format!("loading settings from {}", args.settings.display()))?;
    let migration = MigrationConfiguration::from_file(&args.migration)
        .with_context(|| format!("loading migration from {}", args.migration.display()))?;
    let source = WorkspaceName::new(args.workspace.as_str())?;
    let target = match args.target.as_deref() {
        Some(target) => WorkspaceName::new(target)?,
        None => source.clone(),
    };

    let repository = Arc::new(ContentRepository::new(settings)?);

    let events = File::open(&args.events).with_context(|| format!("opening {}", args.events.display()))?;
    EventImporter::new(&repository)
        .import(source.clone(), BufReader::new(events))
        .await
        .context("importing events")?;

    let report = NodeMigrationService::new(Arc::clone(&repository))
        .execute_migration(
            &migration,
            ExecuteMigration {
                source_workspace_name: source,
                target_workspace_name: target.clone(),
            },
        )
        .await
        .context("executing migration")?;
    info!(
        steps = report.steps.len(),
        commands = report.total_commands(),
        "Migration complete"
    );

    let content_stream_id = repository
        .find_workspace(&target)
        .map(|workspace| workspace.current_content_stream_id)
        .with_context(|| format!("workspace {target} vanished"))?;
    let exporter = EventExporter::new(repository.event_store());
    let written = match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let written = exporter.export(&content_stream_id, &mut writer).await?;
            writer.flush()?;
            written
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            let written = exporter.export(&content_stream_id, &mut writer).await?;
            writer.flush()?;
            written
        }
    };
    info!(events = written, "Exported migrated events");
    Ok(())
}
