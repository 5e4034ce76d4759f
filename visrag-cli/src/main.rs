//! visrag CLI - Visual RAG photo gallery client.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use visrag_core::GalleryConfig;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

/// Output format for listings and search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Text,
    /// JSON, as returned by the service
    Json,
}

#[derive(Parser)]
#[command(name = "visrag")]
#[command(author, version, about = "Visual RAG photo gallery client", long_about = None)]
#[command(after_help = "Exit codes:
  0   Success
  1   General error
  64  Usage error (empty search query)
  65  Upload failed
  66  Cannot read input file
  69  Image store service unavailable")]
struct Cli {
    /// Image Store Service base URL (overrides VISRAG_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Do not poll the service for images that are still processing
    #[arg(long, global = true)]
    no_auto_refresh: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all images, newest first
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Follow processing images until every one has a description
    Watch {
        /// Give up after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Show one image, waiting for its description if it is still processing
    Show {
        /// Image id
        #[arg(value_name = "ID")]
        id: String,

        /// Print the current state without waiting
        #[arg(long)]
        no_wait: bool,
    },

    /// Upload images, then follow them until they are annotated
    Upload {
        /// Image files to upload, in order
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Return as soon as the uploads are accepted
        #[arg(long)]
        no_wait: bool,

        /// Stop following after this many seconds
        #[arg(long, value_name = "SECS", conflicts_with = "no_wait")]
        timeout: Option<u64>,
    },

    /// Semantic search over annotated images
    Search {
        /// Natural-language query
        #[arg(value_name = "QUERY")]
        query: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Check that the image store service is up
    Health {
        /// Retry with backoff until healthy (VISRAG_HEALTH_WAIT_SECS bounds the wait)
        #[arg(long)]
        wait: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "visrag=debug,visrag_core=debug,info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Environment first, flags on top.
fn load_config(cli: &Cli) -> Result<GalleryConfig> {
    let mut config = GalleryConfig::from_env();
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    if cli.no_auto_refresh {
        config.auto_refresh = false;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::List { format } => commands::list::execute(&config, format).await,
        Commands::Watch { timeout } => commands::watch::execute(&config, timeout).await,
        Commands::Show { id, no_wait } => commands::show::execute(&config, id, no_wait).await,
        Commands::Upload {
            files,
            no_wait,
            timeout,
        } => commands::upload::execute(&config, files, no_wait, timeout).await,
        Commands::Search { query, format } => {
            commands::search::execute(&config, query, format).await
        }
        Commands::Health { wait } => commands::health::execute(&config, wait).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let exit = ExitCode::from_anyhow(&err);
        if let Some(message) = &exit.message {
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
        std::process::exit(exit.code);
    }
}
