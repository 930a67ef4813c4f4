pub mod config;
pub mod export;
pub mod model;
pub mod search;
pub mod sources;
pub mod ui;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use config::SearchConfig;
use export::{ExportFormat, ExportOptions, export_results};
use model::types::Candidate;
use search::orchestrator::SearchOrchestrator;
use sources::{CandidateSource, json_file::JsonFileSource};

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "skillswap-search",
    version,
    about = "Debounced, cached skill search over marketplace profiles"
)]
pub struct Cli {
    /// Path to the search config (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one query immediately and print the ranked matches
    Search {
        /// Skill to search for
        query: String,

        /// JSON file with candidate profiles
        #[arg(long)]
        candidates: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = ExportFormat::PlainText)]
        format: ExportFormat,

        /// Maximum number of matches
        #[arg(long)]
        limit: Option<usize>,

        /// Write the results to this file instead of stdout; the format's
        /// extension is added when the path has none
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Read search-box contents line by line from stdin and print debounced results
    Live {
        /// JSON file with candidate profiles
        #[arg(long)]
        candidates: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = ExportFormat::PlainText)]
        format: ExportFormat,
    },
    /// Print the effective configuration
    Config {
        /// Write the configuration to this path instead of printing it
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Search {
            query,
            candidates,
            format,
            limit,
            output,
        } => {
            if let Some(limit) = limit {
                config.matching.max_results = limit.max(1);
            }
            run_search(&config, &query, &candidates, format, output.as_deref())
        }
        Commands::Live { candidates, format } => run_live(&config, &candidates, format).await,
        Commands::Config { write } => run_config(&config, write.as_deref()),
    }
}

/// Install the stderr log subscriber. Safe to call more than once.
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<SearchConfig> {
    let config = match path {
        Some(path) => SearchConfig::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SearchConfig::load().context("loading config")?,
    };
    Ok(config)
}

fn load_candidates(path: &Path) -> Result<Vec<Candidate>> {
    JsonFileSource::new(path)
        .load()
        .with_context(|| format!("loading candidates from {}", path.display()))
}

fn run_search(
    config: &SearchConfig,
    query: &str,
    candidates_path: &Path,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let candidates = load_candidates(candidates_path)?;
    let mut orchestrator = SearchOrchestrator::new(config, candidates);
    let result = orchestrator.search_now(query);

    let rendered = export_results(result, format, &ExportOptions::default());
    match output {
        Some(path) => {
            let path = format.output_path(path);
            std::fs::write(&path, format!("{rendered}\n"))
                .with_context(|| format!("writing results to {}", path.display()))?;
            tracing::info!(format = format.name(), path = %path.display(), "export_written");
            eprintln!("wrote {} export to {}", format.name(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{rendered}")?;
        }
    }
    Ok(())
}

async fn run_live(config: &SearchConfig, candidates_path: &Path, format: ExportFormat) -> Result<()> {
    let candidates = load_candidates(candidates_path)?;
    let mut orchestrator = SearchOrchestrator::new(config, candidates);

    let shutdown = orchestrator.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    ui::live::run_live(
        &mut orchestrator,
        stdin,
        &mut stdout,
        format,
        &ExportOptions::default(),
    )
    .await?;
    Ok(())
}

fn run_config(config: &SearchConfig, write: Option<&Path>) -> Result<()> {
    match write {
        Some(path) => {
            config
                .save_to(path)
                .with_context(|| format!("writing config to {}", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            write!(stdout, "{}", config.to_toml()?)?;
        }
    }
    Ok(())
}
