//! Standings Crawler CLI
//!
//! Local entry point: watch a standings page, poll it once, or inspect
//! stored and saved documents.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use standings_crawler::{
    error::{AppError, Result},
    models::{Config, Snapshot},
    pipeline::{LogNotifier, Poller},
    services::StandingsExtractor,
    storage::{LocalStorage, SnapshotStorage},
};

/// How long `watch` waits for the poller to finish its cycle on shutdown.
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Tournament standings change tracker
#[derive(Parser, Debug)]
#[command(name = "standings", version, about = "Tournament standings change tracker")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "storage/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the configured page until interrupted
    Watch {
        /// Start paused; polling begins after the first resume
        #[arg(long)]
        paused: bool,
    },

    /// Run a single poll cycle against the stored snapshot
    Poll,

    /// Extract records from a saved HTML file
    Parse {
        /// HTML document to parse
        file: PathBuf,
    },

    /// Show the stored snapshot
    Show,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging; `RUST_LOG` overrides the configured level.
fn init_logging(level: &str, verbose: bool) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Load the config before logging is up, reporting a fallback afterwards.
fn load_config(path: &Path) -> (Config, Option<AppError>) {
    if !path.exists() {
        return (Config::default(), None);
    }
    match Config::load(path) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    }
}

fn print_snapshot(snapshot: &Snapshot) {
    println!(
        "{} | {} records | captured {} | {}",
        snapshot.source_name(),
        snapshot.len(),
        snapshot.captured_at().to_rfc3339(),
        snapshot.short_fingerprint()
    );

    for record in snapshot.records() {
        println!(
            "{:>4}  {:<32} {:<20} {:>5}  {}",
            record.board.as_deref().unwrap_or("-"),
            record.name(),
            record.affiliation.as_deref().unwrap_or(""),
            record
                .score
                .map(|s| s.to_string())
                .unwrap_or_default(),
            record.outcome.as_deref().unwrap_or("")
        );
    }
}

async fn watch(config: &Config, paused: bool) -> Result<()> {
    let poller = Poller::from_config(config, Arc::new(LogNotifier)).await?;
    let handle = poller.spawn(paused);
    let reader = handle.reader();

    if paused {
        log::info!("Started paused; send SIGINT to stop");
    }

    tokio::signal::ctrl_c().await?;
    log::info!("Interrupt received, stopping...");

    if !handle.stop(STOP_TIMEOUT).await {
        log::warn!("Poller was aborted before finishing its cycle");
    }

    let current = reader.current();
    log::info!(
        "Last snapshot: {} records ({})",
        current.len(),
        current.short_fingerprint()
    );
    Ok(())
}

async fn poll_once(config: &Config) -> Result<()> {
    let mut poller = Poller::from_config(config, Arc::new(LogNotifier)).await?;
    let report = poller.run_cycle().await?;

    log::info!(
        "{} records, {} changes{}",
        report.record_count,
        report.events.len(),
        if report.saved { "" } else { " (not saved)" }
    );
    println!("{}", serde_json::to_string_pretty(&report.events)?);
    Ok(())
}

fn parse_file(config: &Config, file: &Path) -> Result<()> {
    let html = std::fs::read_to_string(file)?;
    let extractor = StandingsExtractor::new(&config.extraction, &config.source.name)?;
    let snapshot = extractor.extract(&html);
    log::info!(
        "{}: {} records ({})",
        snapshot.source_name(),
        snapshot.len(),
        snapshot.short_fingerprint()
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn show(config: &Config) -> Result<()> {
    let storage = LocalStorage::new(&config.storage.dir, &config.source.name);
    log::info!("Storage: {}", storage.location());

    match storage.load().await? {
        Some(snapshot) => print_snapshot(&snapshot),
        None => log::info!("No snapshot stored yet."),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, load_error) = load_config(&cli.config);
    init_logging(&config.logging.level, cli.verbose);

    match load_error {
        Some(e) => log::warn!(
            "Failed to load {}: {}; using defaults",
            cli.config.display(),
            e
        ),
        None => log::debug!("Configuration: {}", cli.config.display()),
    }

    let command_result = match cli.command {
        Command::Watch { paused } => {
            config.validate()?;
            watch(&config, paused).await
        }
        Command::Poll => {
            config.validate()?;
            poll_once(&config).await
        }
        Command::Parse { file } => parse_file(&config, &file),
        Command::Show => show(&config).await,
        Command::Validate => {
            log::info!("Validating configuration...");
            config.validate().inspect(|_| log::info!("✓ Config OK"))
        }
    };

    if let Err(e) = &command_result {
        log::error!("{}", e);
    }
    command_result
}
