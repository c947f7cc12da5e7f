//! Main application entry point for the Vantage workload simulator.
//!
//! Provides the CLI, configuration loading, and logging setup around the
//! workload engine, then hands off to the frame-loop simulation.

use clap::{Arg, Command};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod simulation;

use config::{AppConfig, LoggingSettings};
use simulation::Simulation;

// ============================================================================
// CLI Interface
// ============================================================================

/// Command line arguments
#[derive(Debug, Clone)]
pub struct CliArgs {
    pub config_path: PathBuf,
    pub log_level: Option<String>,
    pub json_logs: bool,
    pub ticks: Option<u64>,
    pub proxies: Option<usize>,
}

impl CliArgs {
    /// Parse command line arguments
    pub fn parse() -> Self {
        let matches = Command::new("Vantage Workload Simulator")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Distance-based interest classification engine with a deterministic world simulation")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("vantage.toml"),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("ticks")
                    .short('t')
                    .long("ticks")
                    .value_name("N")
                    .help("Run exactly N frames then exit (0 = until interrupted)")
                    .value_parser(clap::value_parser!(u64)),
            )
            .arg(
                Arg::new("proxies")
                    .short('n')
                    .long("proxies")
                    .value_name("N")
                    .help("Override the simulated proxy population")
                    .value_parser(clap::value_parser!(usize)),
            )
            .get_matches();

        Self {
            config_path: PathBuf::from(
                matches
                    .get_one::<String>("config")
                    .expect("config has a default value"),
            ),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            ticks: matches.get_one::<u64>("ticks").copied(),
            proxies: matches.get_one::<usize>("proxies").copied(),
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

/// Initialize the tracing subscriber from config and CLI flags.
fn setup_logging(settings: &LoggingSettings, json_format: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    if json_format || settings.json_format {
        registry
            .with(fmt::layer().json().with_file(false).with_line_number(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_ansi(true).with_file(false).with_line_number(false))
            .init();
    }
}

// ============================================================================
// Entry point
// ============================================================================

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let mut config = match AppConfig::load_from_file(&args.config_path).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load {}: {e}", args.config_path.display());
            std::process::exit(1);
        }
    };

    // Apply CLI overrides.
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(ticks) = args.ticks {
        config.simulation.ticks = ticks;
    }
    if let Some(proxies) = args.proxies {
        config.simulation.proxies = proxies;
    }

    setup_logging(&config.logging, args.json_logs);

    if let Err(e) = config.validate() {
        error!("configuration invalid: {e}");
        std::process::exit(1);
    }

    info!(
        config = %args.config_path.display(),
        "starting vantage v{}",
        env!("CARGO_PKG_VERSION")
    );

    let simulation = match Simulation::new(config) {
        Ok(simulation) => simulation,
        Err(e) => {
            error!("engine configuration rejected: {e}");
            std::process::exit(1);
        }
    };

    let snapshot = simulation.run().await;
    info!(
        frames = snapshot.frames,
        transitions = snapshot.total_changes,
        r1 = snapshot.region_counts[0],
        r2 = snapshot.region_counts[1],
        r3 = snapshot.region_counts[2],
        "final summary"
    );
}
