//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::MergeMode;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;

/// heard - combine LMAS report fragments into a single report
///
/// Every subdirectory of REPORT_DIR holding a rendered LMAS report page is
/// one fragment. Performance metrics, result tables and plots of all
/// fragments are merged into one report page.
///
/// Examples:
///   heard ./reports
///   heard ./reports --mode samples --output combined/index.html
///   heard ./reports --format json --output combined.json
///   heard ./reports --dry-run
///   heard --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory with LMAS report folders
    #[arg(value_name = "REPORT_DIR", required_unless_present = "init_config")]
    pub report_dir: Option<PathBuf>,

    /// Output file path for the combined report
    ///
    /// Default: from config or src/index.html
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// How repeated table and plot entries are combined
    ///
    /// assemblers: fragments are runs over the same samples, entries merge.
    /// samples: fragments cover different samples, later entries replace earlier ones.
    #[arg(short, long, value_name = "MODE", env = "HEARD_MODE")]
    pub mode: Option<MergeMode>,

    /// Output format (html, json)
    #[arg(long, default_value = "html", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .heard.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// List the fragments that would be merged and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .heard.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the combined report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// HTML page for the report front-end (default)
    #[default]
    Html,
    /// The merged values as JSON
    Json,
}

impl Args {
    /// Parse command-line arguments.
    ///
    /// Usage errors and `--help` exit with status 1 so that wrapper
    /// pipelines never mistake a usage message for a finished report.
    pub fn parse_args() -> Self {
        match Self::try_parse() {
            Ok(args) => args,
            Err(e) => {
                let code = match e.kind() {
                    ErrorKind::DisplayVersion => 0,
                    _ => 1,
                };
                let _ = e.print();
                std::process::exit(code);
            }
        }
    }

    /// Get the report directory (should be validated first).
    pub fn report_dir(&self) -> PathBuf {
        self.report_dir.clone().unwrap_or_default()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        let Some(ref report_dir) = self.report_dir else {
            return Err("A directory with LMAS report folders is required".to_string());
        };

        if !report_dir.exists() {
            return Err(format!(
                "Report directory does not exist: {}",
                report_dir.display()
            ));
        }
        if !report_dir.is_dir() {
            return Err(format!(
                "Report path is not a directory: {}",
                report_dir.display()
            ));
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet` wins
    /// over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
