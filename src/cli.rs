//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::{FacilityFilter, TypeFilter};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Health Intel - facility occupancy analytics
///
/// Fetches hospitals from the monitoring API (or a saved JSON export),
/// groups them by state, flags facilities at 80% occupancy or more, and
/// writes a Markdown or JSON report.
///
/// Examples:
///   health-intel
///   health-intel --email admin@health.gov --format json -o report.json
///   health-intel --input hospitals.json --type public --search general
///   health-intel --input hospitals.json --fail-on-critical -o -
///   health-intel --email admin@health.gov --facility 7f1c0d2e
///   health-intel --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Read facilities from a JSON file instead of the API
    ///
    /// Accepts an API response envelope or a bare array of hospitals.
    #[arg(short, long, value_name = "FILE", conflicts_with_all = ["email", "api_url"])]
    pub input: Option<PathBuf>,

    /// Monitoring API base URL
    ///
    /// Overrides the [api] base_url config setting.
    #[arg(long, value_name = "URL", env = "HEALTH_INTEL_API_URL")]
    pub api_url: Option<String>,

    /// Administrator email to log in with
    #[arg(short, long, value_name = "EMAIL", env = "HEALTH_INTEL_EMAIL", requires = "password")]
    pub email: Option<String>,

    /// Administrator password
    #[arg(long, env = "HEALTH_INTEL_PASSWORD", hide_env_values = true, requires = "email")]
    pub password: Option<String>,

    /// Output file path for the report ("-" for stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Only include facilities of this type
    #[arg(long = "type", value_name = "TYPE", default_value = "all")]
    pub facility_type: TypeFilter,

    /// Only include facilities whose name contains this text
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Add the detail view (departments and staff) of one facility
    #[arg(long, value_name = "ID", conflicts_with = "input")]
    pub facility: Option<String>,

    /// Leave the per-facility table out of the report
    #[arg(long)]
    pub no_facilities: bool,

    /// Leave the map marker table out of the report
    #[arg(long)]
    pub no_markers: bool,

    /// Exit with code 2 when any reported facility is critical
    #[arg(long)]
    pub fail_on_critical: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .health-intel.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .health-intel.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            if !input.is_file() {
                return Err(format!("Input path is not a file: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// The list filter selected on the command line.
    pub fn filter(&self) -> FacilityFilter {
        FacilityFilter {
            facility_type: self.facility_type,
            search: self.search.clone(),
        }
    }
}
