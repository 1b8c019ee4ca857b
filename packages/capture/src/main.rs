//! Docshot CLI
//!
//! A thin glue layer for capturing API documentation screenshots.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use docshot_capture::{
    CaptureOrchestrator, CaptureSettings, ChromeOptions, ChromeSession, DocshotConfig, Locator,
    ResponseFetcher, DEFAULT_CONFIG_NAME,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docshot")]
#[command(author, version, about = "Screenshot capture for REST API documentation", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture every configured endpoint
    Capture {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_NAME)]
        config: PathBuf,

        /// Output directory for screenshots (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base URL of the running service (overrides config)
        #[arg(long)]
        base_url: Option<String>,

        /// Only capture these artifacts (comma-separated names)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
    },

    /// Write the default configuration file
    Init {
        /// Output file path
        #[arg(short, long, default_value = DEFAULT_CONFIG_NAME)]
        output: PathBuf,
    },

    /// List configured capture targets
    List {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_NAME)]
        config: PathBuf,
    },
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Capture {
            config,
            output,
            base_url,
            only,
        } => run_capture(config, output, base_url, only),
        Commands::Init { output } => run_init(output),
        Commands::List { config } => run_list(config),
    };

    if let Err(e) = outcome {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run_capture(
    config_path: PathBuf,
    output: Option<PathBuf>,
    base_url: Option<String>,
    only: Vec<String>,
) -> Result<()> {
    let mut config = DocshotConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    if let Some(output) = output {
        config.output_dir = output;
    }
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }

    let descriptors = config.select(&only);
    if descriptors.is_empty() {
        bail!("No capture targets selected");
    }

    info!("Base URL: {}", config.base_url);
    info!("Output: {}", config.output_dir.display());
    info!("Capturing {} target(s)", descriptors.len());

    let settings = CaptureSettings::from_config(&config).context("Invalid configuration")?;
    let session = ChromeSession::launch(&ChromeOptions::from_config(&config))
        .context("Failed to launch browser")?;
    let fetcher = ResponseFetcher::new().context("Failed to create HTTP client")?;

    let orchestrator = CaptureOrchestrator::new(&session, &fetcher, settings)
        .context("Failed to prepare output directory")?;
    let report = orchestrator.run(&descriptors);

    if let Some(path) = report.manifest_path() {
        info!("Manifest: {}", path.display());
    }

    if !report.all_succeeded() {
        bail!(
            "{} of {} capture(s) failed",
            report.failed(),
            report.results().len()
        );
    }

    info!("Capture complete");
    Ok(())
}

fn run_init(output: PathBuf) -> Result<()> {
    if output.exists() {
        bail!("{} already exists", output.display());
    }

    let json = DocshotConfig::default().to_json()?;
    std::fs::write(&output, json)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Wrote {}", output.display());
    Ok(())
}

fn run_list(config_path: PathBuf) -> Result<()> {
    let config = DocshotConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    println!("Targets ({}):", config.endpoints.len());
    for descriptor in &config.endpoints {
        let (kind, target) = match &descriptor.locator {
            Locator::Selector(selector) => ("ui", selector),
            Locator::Url(url) => ("json", url),
        };

        println!(
            "  {:<28} {:<5} {}  ({})",
            descriptor.output_artifact_name, kind, target, descriptor.display_name
        );
    }

    Ok(())
}
