//! heard - combine LMAS report fragments
//!
//! A CLI tool that merges the reports of several LMAS pipeline runs
//! (performance metrics, result tables, plots and the values embedded in
//! each rendered report page) into one combined report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Usage error, inconsistent fragments, or I/O failure

mod cli;
mod config;
mod error;
mod fragment;
mod merge;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use fragment::FragmentScanner;
use models::ReportMetadata;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration decides the log level, so it is read first
    let (mut config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("heard v{}", env!("CARGO_PKG_VERSION"));
    origin.log();
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args, &config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .heard.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber is already installed");
    }
}

/// Merge the fragments below the report directory and write the report.
fn run(args: &Args, config: &Config) -> Result<()> {
    let start_time = Instant::now();

    let scanner = FragmentScanner::new(args.report_dir(), config.fragments.clone());

    if args.dry_run {
        return handle_dry_run(&scanner);
    }

    let fragments = scanner.load(!args.quiet)?;
    let metadata = ReportMetadata {
        generated_at: Utc::now(),
        mode: config.general.mode,
        fragments: fragments.iter().map(|f| f.name.clone()).collect(),
    };

    info!(
        "Merging {} fragments in {} mode",
        metadata.fragments.len(),
        metadata.mode
    );
    let report = merge::aggregate(fragments, config.general.mode)?;

    let output = match args.format {
        OutputFormat::Html => report::generate_html_report(&report, &config.report)?,
        OutputFormat::Json => report::generate_json_report(&report, &metadata)?,
    };

    let output_path = PathBuf::from(&config.general.output);
    info!("Writing {:?} report to {}", args.format, output_path.display());
    report::write_report(&output_path, &output)?;

    info!(
        "Combined {} fragments ({} tables, {} assemblers) in {:.2}s",
        metadata.fragments.len(),
        report.table_keys.len(),
        report.performance.len(),
        start_time.elapsed().as_secs_f64()
    );
    if !args.quiet {
        println!("Report saved to: {}", output_path.display());
    }

    Ok(())
}

/// Handle --dry-run: list the fragments that would be merged.
fn handle_dry_run(scanner: &FragmentScanner) -> Result<()> {
    let dirs = scanner.discover()?;

    println!("Found {} report folders that would be merged:", dirs.len());
    for dir in &dirs {
        println!("  {}", dir.display());
    }

    Ok(())
}

/// Where the configuration came from; logged once logging is set up.
enum ConfigOrigin {
    File(PathBuf),
    Defaults,
    Unreadable(anyhow::Error),
}

impl ConfigOrigin {
    fn log(&self) {
        match self {
            ConfigOrigin::File(path) => info!("Loaded config from {}", path.display()),
            ConfigOrigin::Defaults => debug!("No config file found, using defaults"),
            ConfigOrigin::Unreadable(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
///
/// An explicit `--config` must load; a broken default file falls back to
/// the defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::File(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigOrigin::File(PathBuf::from(DEFAULT_CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), ConfigOrigin::Defaults)),
        Err(e) => Ok((Config::default(), ConfigOrigin::Unreadable(e))),
    }
}
