//! timeslice CLI - Duration-aware scenario ordering and slicing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use timeslice::config::{self, Config};
use timeslice::history::HistoryAggregator;
use timeslice::plugin::{CloudPlugin, Dispatcher, ScenarioScheduler};
use timeslice::report::{PlanReport, print_plan};
use timeslice::scenario::{load_results, load_scenarios};
use timeslice::scheduling::Direction;
use timeslice::timing::{CloudClient, TimingStore};

const DEFAULT_CONFIG: &str = "timeslice.toml";

#[derive(Parser)]
#[command(name = "timeslice")]
#[command(about = "Duration-aware scenario ordering and slicing", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (default: timeslice.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the scenarios this worker runs
    Plan {
        /// JSON file with the discovered scenarios
        #[arg(short, long)]
        scenarios: PathBuf,

        /// Order by duration (asc, desc)
        #[arg(long)]
        order: Option<Direction>,

        /// Total number of workers
        #[arg(long)]
        slicer_total: Option<usize>,

        /// Index of this worker
        #[arg(long)]
        slicer_index: Option<usize>,

        /// Report to scope timings to
        #[arg(long)]
        report_id: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Submit execution history for finished scenarios
    Submit {
        /// JSON file with the scenario results
        #[arg(short, long)]
        results: PathBuf,

        /// Launch id to record under (default: a fresh one)
        #[arg(long)]
        launch_id: Option<String>,

        /// Report to group the launch under
        #[arg(long)]
        report_id: Option<String>,
    },

    /// Validate configuration file
    Validate,

    /// Initialize a new configuration file
    Init,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Scenario hashes, one per line, and a summary on stderr
    Text,
    /// The plan as a JSON object
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Plan {
            scenarios,
            order,
            slicer_total,
            slicer_index,
            report_id,
            format,
        } => {
            let mut config = load(config_path, cli.verbose)?;
            if order.is_some() {
                config.order.direction = order;
            }
            if slicer_total.is_some() {
                config.slicer.total = slicer_total;
            }
            if slicer_index.is_some() {
                config.slicer.index = slicer_index;
            }
            if report_id.is_some() {
                config.cloud.report_id = report_id;
            }
            plan(config, &scenarios, format).await
        }
        Commands::Submit {
            results,
            launch_id,
            report_id,
        } => {
            let mut config = load(config_path, cli.verbose)?;
            if report_id.is_some() {
                config.cloud.report_id = report_id;
            }
            submit(config, &results, launch_id).await
        }
        Commands::Validate => validate_config(config_path),
        Commands::Init => init_config(),
    }
}

/// Loads the configuration file, falling back to defaults when none exists.
fn load(config_path: Option<&Path>, verbose: bool) -> Result<Config> {
    let mut config = match config_path {
        Some(path) => config::load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).exists() => {
            config::load_config(Path::new(DEFAULT_CONFIG))?
        }
        None => Config::default(),
    };

    if let Some(path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }
    config.cloud.verbose |= verbose;
    Ok(config)
}

async fn plan(config: Config, scenarios_path: &Path, format: OutputFormat) -> Result<()> {
    let scenarios = load_scenarios(scenarios_path)?;
    let verbose = config.cloud.verbose;

    let client = CloudClient::from_config(&config.cloud)?;
    let plugin = CloudPlugin::new(client, &config)?;
    let selector = plugin.selector();
    let mut dispatcher = Dispatcher::new().with_plugin(plugin);

    let mut scheduler = match dispatcher.order(scenarios).await {
        Ok(ordered) => ScenarioScheduler::new(ordered),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    };
    if let Err(e) = dispatcher.startup(&mut scheduler).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&PlanReport::new(&scheduler, selector))?;
            println!("{}", json);
        }
        OutputFormat::Text => print_plan(&scheduler, selector, verbose),
    }

    Ok(())
}

async fn submit(config: Config, results_path: &Path, launch_id: Option<String>) -> Result<()> {
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }
    let results = load_results(results_path)?;

    let report_id = config.cloud.report_id.clone();
    let client = CloudClient::from_config(&config.cloud)?;
    let store = TimingStore::new(client, report_id.clone());

    let mut history = HistoryAggregator::new(report_id);
    if let Some(launch_id) = launch_id {
        history = history.with_launch_id(launch_id);
    }
    for result in &results {
        history.record(result);
    }

    match history.flush(&store).await {
        Ok(sent) => println!("Submitted {} records (launch {})", sent, history.launch_id()),
        Err(e) => warn!("Failed to send history: {}", e),
    }

    Ok(())
}

fn validate_config(config_path: Option<&Path>) -> Result<()> {
    let config = match load(config_path, false) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    match config.validate() {
        Ok(()) => {
            println!("Configuration is valid!");
            println!();
            println!("Settings:");
            println!("  API URL: {}", config.cloud.api_url);
            println!("  Timeout: {}s", config.cloud.timeout_secs);
            println!("  Project: {}", config.cloud.project_id);
            println!(
                "  Report: {}",
                config.cloud.report_id.as_deref().unwrap_or("-")
            );
            println!(
                "  Retry: {} attempts, {}s apart",
                config.cloud.retry.attempts, config.cloud.retry.delay_secs
            );
            println!("  Exit code: {}", config.cloud.exit_code);

            match (config.slicer.total, config.slicer.index) {
                (Some(total), Some(index)) => println!("  Slicer: {}/{}", index + 1, total),
                _ => println!("  Slicer: off"),
            }
            match config.order.direction {
                Some(direction) => println!("  Order: {}", direction),
                None => println!("  Order: off"),
            }

            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_config() -> Result<()> {
    let config = r#"# timeslice configuration file

[cloud]
api_url = "http://localhost:8080"
timeout_secs = 5.0
project_id = "default"
# report_id = "nightly"
verbose = false
exit_code = 1

[cloud.retry]
attempts = 3
delay_secs = 1.0

# Split scenarios across workers (report_id is required when total > 1)
# [slicer]
# total = 2
# index = 0

# Order scenarios by duration: "ascending" or "descending"
# [order]
# direction = "descending"
"#;

    let path = PathBuf::from(DEFAULT_CONFIG);
    if path.exists() {
        eprintln!("timeslice.toml already exists. Remove it first or edit manually.");
        std::process::exit(1);
    }

    std::fs::write(&path, config)?;
    println!("Created timeslice.toml");
    println!();
    println!("Edit the configuration as needed, then run:");
    println!("  timeslice plan --scenarios scenarios.json");

    Ok(())
}
