use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tabletalk_core::document::DocumentTarget;
use tabletalk_infrastructure::{LocalStore, StorageConfig, StoragePaths, WriteScheduler};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "tabletalk")]
#[command(about = "Tabletalk - inspect and maintain local chat/document storage", long_about = None)]
struct Cli {
    /// Path to config.toml (default: <config dir>/tabletalk/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory, overriding configuration and TABLETALK_DATA_DIR
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot the store and print the repaired application state as JSON
    Status,
    /// Import the legacy single-file format
    ImportLegacy {
        /// Legacy JSON file
        file: PathBuf,
    },
    /// Copy a file into a project or global thread
    Attach {
        #[command(flatten)]
        target: TargetArgs,
        file: PathBuf,
    },
    /// Remove a document from a project or global thread
    Detach {
        #[command(flatten)]
        target: TargetArgs,
        document_id: String,
    },
    /// Delete a project with all of its threads and documents
    DeleteProject { id: String },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct TargetArgs {
    /// Project id
    #[arg(long)]
    project: Option<String>,
    /// Global thread id
    #[arg(long)]
    thread: Option<String>,
}

impl TargetArgs {
    fn into_target(self) -> Result<DocumentTarget> {
        match (self.project, self.thread) {
            (Some(id), None) => Ok(DocumentTarget::Project(id)),
            (None, Some(id)) => Ok(DocumentTarget::Thread(id)),
            _ => anyhow::bail!("Exactly one of --project or --thread is required"),
        }
    }
}

fn init_logging(level: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = StorageConfig::load(cli.config.as_deref())?;
    init_logging(&config.logging.level);

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => config.data_dir()?,
    };
    let store = LocalStore::with_scheduler(
        StoragePaths::new(data_dir),
        WriteScheduler::new(config.debounce()),
    );

    let outcome = match cli.command {
        Commands::Status => commands::status::run(&store).await,
        Commands::ImportLegacy { file } => commands::legacy::run(&store, &file).await,
        Commands::Attach { target, file } => {
            commands::documents::attach(&store, target.into_target()?, &file).await
        }
        Commands::Detach {
            target,
            document_id,
        } => commands::documents::detach(&store, target.into_target()?, &document_id).await,
        Commands::DeleteProject { id } => commands::projects::delete(&store, &id).await,
    };

    // Pending edits are lost unless this completes
    let flushed = store.flush_all().await;
    if let Err(e) = &flushed {
        tracing::error!("Failed to flush pending writes: {}", e);
    }

    outcome?;
    flushed.context("Failed to flush pending writes")?;
    Ok(())
}
