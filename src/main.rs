//! Health Intel - facility occupancy analytics
//!
//! A CLI tool that loads hospitals from the health-facility monitoring
//! API (or a saved export), groups them by state, classifies occupancy
//! and writes the analytics as a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, login, config, bad input, etc.)
//!   2 - Critical facilities found while --fail-on-critical is set

mod analysis;
mod cli;
mod client;
mod config;
mod error;
mod models;
mod normalize;
mod report;
mod session;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use client::ApiClient;
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use models::{FacilityDetail, FacilityRecord, Overview, Report, ReportMetadata};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Health Intel v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .health-intel.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE_NAME);
    println!("   Edit it to set the API URL, timeout and report options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load, aggregate and report. Returns the exit code (0 or 2).
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let Loaded {
        source,
        facilities,
        detail,
    } = load_facilities(&args, &config).await?;
    let loaded = facilities.len();

    let filter = args.filter();
    let selected: Vec<FacilityRecord> = analysis::filter_facilities(&facilities, &filter)
        .into_iter()
        .cloned()
        .collect();
    if !filter.is_empty() {
        info!("Filter ({}) kept {} of {} facilities", filter, selected.len(), loaded);
    }

    let mut report = build_report(&selected, &config, source, loaded, filter.to_string());
    report.detail = detail;

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = PathBuf::from(&config.report.output);
    report::write_report(&output, &output_path)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    let to_stdout = output_path == std::path::Path::new("-");
    if !args.quiet && !to_stdout {
        print_summary(&report, &output_path);
    }

    if args.fail_on_critical && report.overview.critical_facilities > 0 {
        eprintln!(
            "\n⛔ {} critical facilities found. Failing (exit code 2).",
            report.overview.critical_facilities
        );
        return Ok(2);
    }

    Ok(0)
}

/// Assemble the report from the selected facilities.
fn build_report(
    facilities: &[FacilityRecord],
    config: &Config,
    source: String,
    loaded: usize,
    filter: String,
) -> Report {
    let regions = analysis::aggregate_by_region(facilities);
    let classified = analysis::classify_facilities(facilities);
    let most_occupied = analysis::most_occupied(&classified, config.report.top_facilities)
        .into_iter()
        .cloned()
        .collect();

    let overview = Overview::from_facilities(facilities);
    debug_assert_eq!(
        analysis::critical_facility_count(&regions),
        overview.critical_facilities
    );

    let markers = if config.report.include_markers {
        analysis::map_markers(facilities)
    } else {
        Vec::new()
    };
    let facilities = if config.report.include_facilities {
        classified
    } else {
        Vec::new()
    };

    Report {
        metadata: ReportMetadata {
            source,
            generated_at: Utc::now(),
            facilities_loaded: loaded,
            facilities_reported: overview.total_facilities,
            filter,
        },
        overview,
        regions,
        most_occupied,
        facilities,
        markers,
        detail: None,
    }
}

/// What one run loaded.
struct Loaded {
    source: String,
    facilities: Vec<FacilityRecord>,
    detail: Option<FacilityDetail>,
}

/// Load facilities from --input or from the API, plus the --facility detail.
async fn load_facilities(args: &Args, config: &Config) -> Result<Loaded> {
    if let Some(ref input) = args.input {
        info!("Reading facilities from {}", input.display());
        let body = std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let facilities = normalize::facilities_from_envelope(&body)
            .with_context(|| format!("Failed to load facilities from {}", input.display()))?;
        return Ok(Loaded {
            source: input.display().to_string(),
            facilities,
            detail: None,
        });
    }

    let api = ApiClient::new(&config.api).context("Failed to create HTTP client")?;
    info!("Using monitoring API at {}", api.base_url());

    let mut session = match (args.email.as_deref(), args.password.as_deref()) {
        (Some(email), Some(password)) => Some(
            api.login(email, password)
                .await
                .context("Login failed")?,
        ),
        _ => None,
    };

    let spinner = fetch_spinner(args.quiet);
    let result = api.fetch_facilities(session.as_mut()).await;
    spinner.finish_and_clear();

    let fetched = match result {
        Ok(fetched) => fetched,
        Err(e) if e.requires_login() => {
            return Err(e).context("Session rejected by the API; log in again with --email/--password");
        }
        Err(e) => return Err(e).context("Failed to fetch facilities"),
    };

    if !api.is_current(&fetched) {
        warn!("Discarding stale facility list (generation {})", fetched.generation);
        anyhow::bail!("A newer fetch superseded this one");
    }

    let detail = match args.facility.as_deref() {
        Some(id) => Some(
            api.fetch_facility_detail(id, session.as_mut())
                .await
                .with_context(|| format!("Failed to fetch detail for facility {}", id))?,
        ),
        None => None,
    };

    if let Some(ref mut s) = session {
        s.logout();
        debug!(
            "Session for {} (started {}) ended: {:?}",
            s.user().email,
            s.created_at().format("%H:%M:%S"),
            s.state()
        );
    }

    Ok(Loaded {
        source: format!("{}/hospitals", api.base_url()),
        facilities: fetched.data,
        detail,
    })
}

/// Spinner shown while the API request is in flight.
fn fetch_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Fetching facilities...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Print the console summary.
fn print_summary(report: &Report, output_path: &std::path::Path) {
    let overview = &report.overview;
    let occupancy = overview.occupancy();

    println!("\n📊 Facility Summary:");
    println!(
        "   Facilities: {} ({} public, {} private)",
        overview.total_facilities, overview.public_facilities, overview.private_facilities
    );
    println!(
        "   Beds: {} occupied of {} ({} {}%)",
        overview.occupied_beds,
        overview.total_beds,
        occupancy.severity.emoji(),
        occupancy.ratio_percent
    );
    println!("   States: {}", report.regions.len());
    println!("   🔴 Critical facilities: {}", overview.critical_facilities);

    if let Some(top) = report.regions.first().filter(|r| r.critical_count > 0) {
        println!(
            "   Most critical state: {} ({} facilities)",
            top.region_name, top.critical_count
        );
    }

    if let Some(ref detail) = report.detail {
        println!(
            "   Detail: {} ({} departments, {} staff)",
            detail.facility.name,
            detail.departments.len(),
            detail.staff.len()
        );
    }

    println!("\n✅ Report saved to: {}", output_path.display());
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
