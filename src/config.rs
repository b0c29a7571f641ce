//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.heard.toml` files.

use crate::models::MergeMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".heard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Names of the files inside each fragment directory.
    #[serde(default)]
    pub fragments: FragmentsConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// How repeated table and plot entries are combined.
    #[serde(default)]
    pub mode: MergeMode,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            mode: MergeMode::default(),
        }
    }
}

fn default_output() -> String {
    "src/index.html".to_string()
}

/// File names looked up in every fragment directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentsConfig {
    /// Performance records.
    #[serde(default = "default_performance_file")]
    pub performance: String,

    /// Result tables.
    #[serde(default = "default_tables_file")]
    pub tables: String,

    /// Plot series.
    #[serde(default = "default_plots_file")]
    pub plots: String,

    /// Rendered report page; a directory without one is not a fragment.
    #[serde(default = "default_page_file")]
    pub page: String,
}

impl Default for FragmentsConfig {
    fn default() -> Self {
        Self {
            performance: default_performance_file(),
            tables: default_tables_file(),
            plots: default_plots_file(),
            page: default_page_file(),
        }
    }
}

fn default_performance_file() -> String {
    "performance_metadata.json".to_string()
}

fn default_tables_file() -> String {
    "pipeline_report_tables.json".to_string()
}

fn default_plots_file() -> String {
    "pipeline_report_plots.json".to_string()
}

fn default_page_file() -> String {
    "index.html".to_string()
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Page title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Front-end bundle loaded by the page.
    #[serde(default = "default_script")]
    pub script: String,

    /// Custom template with `{0}`..`{7}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            script: default_script(),
            template: None,
        }
    }
}

fn default_title() -> String {
    "LMAS Report".to_string()
}

fn default_script() -> String {
    "./main.js".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.to_string_lossy().to_string();
        }

        if let Some(mode) = args.mode {
            self.general.mode = mode;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
