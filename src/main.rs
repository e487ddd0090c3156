//! # Insightmate CLI
//!
//! The `insightmate` binary serves the HTTP API and provides operational
//! commands over the same user-data store.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `insightmate serve` | Start the HTTP API server |
//! | `insightmate ingest file <path>` | Ingest a local file into the store |
//! | `insightmate ingest link <url>` | Ingest a portfolio link |
//! | `insightmate summary` | Show stored-data counts and types |
//! | `insightmate context` | Print the assembled LLM context block |
//! | `insightmate backup [path]` | Write a full copy of the record |
//! | `insightmate restore <path>` | Replace the record from a backup |
//! | `insightmate reset` | Reset the record to the empty shape |
//! | `insightmate stats` | Upload-directory statistics |
//! | `insightmate cleanup` | Remove stored artifacts older than N days |
//!
//! All commands accept a `--config` flag pointing to a TOML file; when
//! the file does not exist, built-in defaults apply.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use insightmate::store::UserDataStore;
use insightmate::{config, context, ingest, server};

/// Insightmate — a personal-assistant backend with document ingestion
/// and personalized chat.
#[derive(Parser)]
#[command(
    name = "insightmate",
    about = "Insightmate — a personal-assistant backend with document ingestion and personalized chat",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply if absent.
    #[arg(long, global = true, default_value = "./config/insightmate.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server.
    Serve,

    /// Ingest a file or portfolio link into the user-data store.
    Ingest {
        #[command(subcommand)]
        source: IngestSource,
    },

    /// Show a summary of the stored record.
    Summary,

    /// Print the assembled context block the personalized chat mode uses.
    Context,

    /// Write a full copy of the record.
    ///
    /// Without a path the copy lands in the data directory under a
    /// timestamp-derived name.
    Backup {
        /// Destination path for the backup file.
        path: Option<PathBuf>,
    },

    /// Replace the current record with a previously written backup.
    Restore {
        /// Path of the backup file.
        path: PathBuf,
    },

    /// Reset the record to the empty shape.
    Reset,

    /// Show upload-directory statistics.
    Stats,

    /// Remove stored upload artifacts older than the given age.
    Cleanup {
        /// Age threshold in days.
        #[arg(long, default_value_t = 30)]
        days: u64,
    },
}

/// Ingestion sources.
#[derive(Subcommand)]
enum IngestSource {
    /// Validate, store, and extract a local file.
    File {
        /// Path of the file to ingest.
        path: PathBuf,
    },
    /// Fetch and extract a portfolio link.
    Link {
        /// The URL to ingest.
        url: String,
        /// Link type (`linkedin`, `github`, `website`, or any label).
        #[arg(long = "type", default_value = "website")]
        link_type: String,
        /// Optional description stored with the link.
        #[arg(long)]
        description: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        config::Config::minimal()
    };

    match cli.command {
        Commands::Serve => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .init();
            server::run_server(&cfg).await?;
        }
        Commands::Ingest { source } => match source {
            IngestSource::File { path } => {
                let bytes = std::fs::read(&path)
                    .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
                let filename = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", path.display()))?;

                let stored = ingest::save_upload(&cfg.storage, filename, &bytes)?;
                let content = ingest::process_file(&stored);

                let store = UserDataStore::open(&cfg.storage)?;
                store.add_file_data(filename, content.clone()).await?;

                println!("ingest file {}", filename);
                println!("  stored: {}", stored.display());
                println!("  content: {} chars", content.chars().count());
                println!("ok");
            }
            IngestSource::Link {
                url,
                link_type,
                description,
            } => {
                let content = ingest::ingest_link(&url).await;

                let store = UserDataStore::open(&cfg.storage)?;
                let id = store
                    .add_portfolio_link(&url, &link_type, description, content.clone())
                    .await?;

                println!("ingest link {}", url);
                println!("  id: {}", id);
                println!("  content: {} chars", content.chars().count());
                println!("ok");
            }
        },
        Commands::Summary => {
            let store = UserDataStore::open(&cfg.storage)?;
            let summary = store.summary().await?;
            println!("portfolio links: {}", summary.total_portfolio_links);
            println!("files:           {}", summary.total_files);
            println!("link types:      {}", summary.portfolio_types.join(", "));
            println!("file types:      {}", summary.file_types.join(", "));
            println!("created at:      {}", summary.created_at.to_rfc3339());
            println!("updated at:      {}", summary.updated_at.to_rfc3339());
        }
        Commands::Context => {
            let store = UserDataStore::open(&cfg.storage)?;
            let data = store.get_user_data().await?;
            println!("{}", context::build_context(&data));
        }
        Commands::Backup { path } => {
            let store = UserDataStore::open(&cfg.storage)?;
            let written = store.backup(path).await?;
            println!("backup written: {}", written.display());
        }
        Commands::Restore { path } => {
            let store = UserDataStore::open(&cfg.storage)?;
            if store.restore(&path).await? {
                println!("restored from {}", path.display());
            } else {
                anyhow::bail!(
                    "Restore failed: {} is missing, malformed, or lacks the required structure",
                    path.display()
                );
            }
        }
        Commands::Reset => {
            let store = UserDataStore::open(&cfg.storage)?;
            store.reset().await?;
            println!("user data reset to empty state");
        }
        Commands::Stats => {
            let stats = ingest::upload_stats(&cfg.storage)?;
            println!("uploaded files: {}", stats.total_files);
            println!("total bytes:    {}", stats.total_size_bytes);
            println!("total MB:       {}", stats.total_size_mb);
        }
        Commands::Cleanup { days } => {
            let removed = ingest::cleanup_old_uploads(&cfg.storage, days)?;
            println!("removed {} stale upload(s)", removed);
        }
    }

    Ok(())
}
