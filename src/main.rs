use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;

use argus::aggregator::Aggregator;
use argus::config::Config;
use argus::domain::{RunRecord, RunStatus};
use argus::executor::StepExecutor;
use argus::id::analyst_label;
use argus::imaging::{SessionPool, TileClient};
use argus::ingest;
use argus::llm::GeminiClient;
use argus::orchestrator::Orchestrator;
use argus::registry::{JsonlRegistry, RunRegistry};
use cli::Cli;
use cli::commands::Commands;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("argus")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("argus.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None => handle_list_command(None, config),
        Some(Commands::Run {
            csv,
            limit,
            max_steps,
        }) => handle_run_command(csv, *limit, *max_steps, config).await,
        Some(Commands::List { status }) => handle_list_command(status.as_deref(), config),
        Some(Commands::Show { key }) => handle_show_command(key, config),
    }
}

async fn handle_run_command(
    csv: &Path,
    limit: Option<usize>,
    max_steps: Option<u32>,
    config: &Config,
) -> Result<()> {
    let api_key = std::env::var("GEMINI_API_KEY")
        .context("GEMINI_API_KEY is not set; the run command needs model access")?;

    let targets = ingest::load_targets(csv, limit)
        .context(format!("Failed to load targets from {}", csv.display()))?;
    if targets.is_empty() {
        println!("{}", "Input file contains no targets".yellow());
        return Ok(());
    }
    println!("{} {} targets", "Loaded:".green(), targets.len());

    let analyst = Arc::new(GeminiClient::new(api_key, config.gemini_config())?);
    let tiles = Arc::new(TileClient::new(config.tile_config())?);
    let imaging = Arc::new(SessionPool::new(tiles, config.imaging.sessions));

    let executor = Arc::new(StepExecutor::new(
        Arc::clone(&analyst),
        imaging,
        config.executor_config(),
    ));
    let aggregator = Arc::new(Aggregator::new(analyst));
    let registry = Arc::new(JsonlRegistry::new(&config.storage.registry_path)?);

    let orchestrator = Orchestrator::new(
        executor,
        aggregator,
        registry,
        config.batch.parallel_targets,
    );

    let max_steps = max_steps.unwrap_or(config.batch.max_steps);
    let summary = orchestrator.process_batch(&targets, max_steps).await?;

    println!(
        "{} {} processed, {} skipped, {} failed",
        "Batch complete:".green(),
        summary.processed,
        summary.skipped,
        summary.failed
    );
    Ok(())
}

fn handle_list_command(status: Option<&str>, config: &Config) -> Result<()> {
    let filter = status.map(parse_status).transpose()?;
    let registry = JsonlRegistry::new(&config.storage.registry_path)?;

    let mut records = registry.load_all()?;
    if let Some(wanted) = filter {
        records.retain(|r| r.status == wanted);
    }

    if records.is_empty() {
        println!("{}", "No runs recorded".yellow());
        return Ok(());
    }

    for record in &records {
        println!(
            "{:30} {} {:2} steps{}",
            record.key(),
            status_label(record.status),
            record.steps.len(),
            record
                .verdict
                .as_ref()
                .map(|v| format!("  confidence {:?}", v.confidence_score))
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn handle_show_command(key: &str, config: &Config) -> Result<()> {
    let registry = JsonlRegistry::new(&config.storage.registry_path)?;
    let records = registry.load_all()?;
    let record = records
        .iter()
        .find(|r| r.key() == key)
        .ok_or_else(|| eyre::eyre!("no run recorded for {}", key))?;

    print_record(record);
    Ok(())
}

fn print_record(record: &RunRecord) {
    println!(
        "{} {} ({}, {})",
        "Target:".green(),
        record.target.country,
        record.target.latitude,
        record.target.longitude
    );
    println!("{} {}", "Status:".green(), status_label(record.status));

    for (i, step) in record.steps.iter().enumerate() {
        println!("\n{}  action: {}", analyst_label(i).cyan(), step.action);
        println!("  {}", step.analysis);
        for finding in &step.findings {
            println!("    - {}", finding);
        }
        for follow_up in &step.follow_ups {
            println!("    ? {}", follow_up);
        }
    }

    if let Some(verdict) = &record.verdict {
        println!("\n{} {}", "Verdict:".green(), verdict.overall_assessment);
        println!("  Confidence: {:?}", verdict.confidence_score);
        for asset in &verdict.key_confirmed_assets {
            println!("  Confirmed: {}", asset);
        }
        for item in &verdict.unresolved_items {
            println!("  Unresolved: {}", item);
        }
        for action in &verdict.recommended_actions {
            println!("  Recommended: {}", action);
        }
    }
}

fn parse_status(s: &str) -> Result<RunStatus> {
    match s {
        "in_progress" => Ok(RunStatus::InProgress),
        "finished" => Ok(RunStatus::Finished),
        "max_steps_reached" => Ok(RunStatus::MaxStepsReached),
        "failed" => Ok(RunStatus::Failed),
        other => Err(eyre::eyre!("unknown status: {}", other)),
    }
}

fn status_label(status: RunStatus) -> ColoredString {
    match status {
        RunStatus::InProgress => "in_progress".yellow(),
        RunStatus::Finished => "finished".green(),
        RunStatus::MaxStepsReached => "max_steps_reached".cyan(),
        RunStatus::Failed => "failed".red(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
