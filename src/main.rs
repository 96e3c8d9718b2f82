use anyhow::Result;
use arcunpack::config::{CatalogBackend, Paths};
use arcunpack::{App, Config};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "arcunpack")]
#[command(
    author,
    version = arcunpack::APP_VERSION,
    about = "Migrates a packed rhythm-game archive into a content-addressed level catalog"
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output root for staging, working and store directories
    #[arg(long, global = true)]
    out: Option<String>,

    /// Catalog backend override: tool, sqlite
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Path to the external catalog tool
    #[arg(long, global = true)]
    catalog_tool: Option<String>,

    /// Load configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full migration into a copy of the given catalog
    Migrate {
        /// Directory containing *.pack files and their *.json indices
        input: PathBuf,
        /// Existing catalog file to extend
        catalog: PathBuf,
    },

    /// Only extract packs into the staging tree
    Extract {
        /// Directory containing *.pack files and their *.json indices
        input: PathBuf,
    },

    /// Show level and pack counts of a catalog
    Counts { catalog: PathBuf },
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "arcunpack=info",
        1 => "arcunpack=debug",
        2 => "arcunpack=trace",
        _ => "trace",
    };

    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    // Keep a log of every run next to the data directory
    let log_file = Paths::new().log_file();
    let file = log_file
        .parent()
        .map(std::fs::create_dir_all)
        .transpose()
        .ok()
        .and_then(|_| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .ok()
        });

    match file {
        Some(file) => tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(std::sync::Arc::new(file)),
            )
            .init(),
        None => tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    // Load configuration
    let mut config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path).await?,
        None => Config::load().await?,
    };
    if let Some(out) = cli.out.as_deref() {
        let trimmed = out.trim();
        if trimmed.is_empty() {
            anyhow::bail!("--out cannot be empty");
        }
        config.output_dir = Some(trimmed.to_string());
    }
    if let Some(backend) = cli.backend.as_deref() {
        config.backend = CatalogBackend::from_cli(backend)?;
    }
    if let Some(tool) = cli.catalog_tool {
        config.catalog_tool = Some(tool);
    }
    tracing::debug!("Catalog backend: {}", config.backend.as_str());

    let app = App::new(config);

    match cli.command {
        Commands::Migrate { input, catalog } => app.cmd_migrate(&input, &catalog).await?,
        Commands::Extract { input } => app.cmd_extract(&input).await?,
        Commands::Counts { catalog } => app.cmd_counts(&catalog).await?,
    }

    Ok(())
}
