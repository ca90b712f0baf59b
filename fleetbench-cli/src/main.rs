use anyhow::{Context, Result};
use clap::Parser;
use fleetbench_config::{ConfigLoader, FleetbenchConfig};
use fleetbench_core::{RunStatus, TestDocument};
use fleetbench_execution::BenchmarkOrchestrator;
use fleetbench_resilience::AbortCoordinator;
use fleetbench_sim::SimulatedFleet;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

mod cli;

use cli::{Cli, Commands, ConfigCommands, OutputFormat, TestSource};

/// Load configuration from file or environment
fn load_config(config_path: Option<&PathBuf>) -> Result<FleetbenchConfig> {
    let loader = ConfigLoader::new();
    if let Some(path) = config_path {
        if !path.exists() {
            anyhow::bail!("Configuration file not found: {:?}", path);
        }
    }
    loader
        .load(config_path)
        .context("Failed to load configuration")
}

fn init_logging(log_level: Option<&String>, config: &FleetbenchConfig) -> Result<()> {
    match log_level {
        Some(level) => fleetbench_logging::init_simple_tracing(level),
        None => fleetbench_logging::init_logging_from_config(&config.logging),
    }
}

fn load_document(source: &TestSource) -> Result<TestDocument> {
    let content = fs::read_to_string(&source.tests)
        .with_context(|| format!("Failed to read test document {:?}", source.tests))?;

    let document = BenchmarkOrchestrator::parse_document(&content, source.base64)
        .with_context(|| format!("Invalid test document {:?}", source.tests))?;

    info!("Loaded {} test(s) from {:?}", document.len(), source.tests);
    Ok(document)
}

fn build_orchestrator(
    config: &FleetbenchConfig,
    fleet_path: &Path,
    abort: &AbortCoordinator,
) -> Result<BenchmarkOrchestrator> {
    let fleet = Arc::new(
        SimulatedFleet::from_file(fleet_path)
            .with_context(|| format!("Failed to load fleet {:?}", fleet_path))?,
    );

    let orchestrator = BenchmarkOrchestrator::from_config(fleet.clone(), fleet, config)
        .context("Failed to set up benchmark")?;
    Ok(orchestrator.with_abort_signal(abort.subscribe()))
}

fn print_output<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?
        }
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to serialize to YAML")?,
    };
    println!("{}", rendered);
    Ok(())
}

async fn run_command(config: &FleetbenchConfig, source: &TestSource, output: OutputFormat) -> Result<()> {
    let document = load_document(source)?;
    let abort = AbortCoordinator::new();
    let orchestrator = build_orchestrator(config, &source.fleet, &abort)?;

    let interrupt = abort.abort_on_ctrl_c();
    let report = orchestrator.run_all(&document).await;
    interrupt.abort();
    let report = report.context("Benchmark invocation failed")?;

    print_output(&report, output)?;

    if let Some((test, e)) = report.validation_failure() {
        error!("Test '{}' failed validation: {}", test, e);
        anyhow::bail!("Test '{}' failed validation: {}", test, e);
    }
    if report.aborted {
        anyhow::bail!("Benchmark aborted after {} test(s)", report.len());
    }

    let unsuccessful = report
        .summaries()
        .filter(|summary| summary.status != RunStatus::Completed)
        .count();
    if unsuccessful > 0 {
        anyhow::bail!("{} of {} test(s) did not complete", unsuccessful, report.len());
    }

    Ok(())
}

async fn validate_command(config: &FleetbenchConfig, source: &TestSource) -> Result<()> {
    let document = load_document(source)?;
    let orchestrator = build_orchestrator(config, &source.fleet, &AbortCoordinator::new())?;

    let mut invalid = 0;
    for (name, result) in orchestrator.validate_all(&document).await {
        match result {
            Ok(group) => println!(
                "✅ {}: {} unit(s) available in {}",
                name,
                group.unit_count(),
                group.app_name
            ),
            Err(e) => {
                invalid += 1;
                println!("❌ {}: {}", name, e);
            }
        }
    }

    if invalid > 0 {
        anyhow::bail!("{} of {} test(s) failed validation", invalid, document.len());
    }
    Ok(())
}

async fn plan_command(config: &FleetbenchConfig, source: &TestSource, output: OutputFormat) -> Result<()> {
    let document = load_document(source)?;
    let orchestrator = build_orchestrator(config, &source.fleet, &AbortCoordinator::new())?;

    let plans: Vec<serde_json::Value> = orchestrator
        .plan_all(&document)
        .await
        .context("Planning failed")?
        .into_iter()
        .map(|(name, result)| match result {
            Ok(plan) => serde_json::json!({
                "test": name,
                "ramp_secs": plan.ramp_duration().as_secs_f64(),
                "batches": plan.batches,
            }),
            Err(e) => serde_json::json!({
                "test": name,
                "kind": e.kind(),
                "error": e.to_string(),
            }),
        })
        .collect();

    print_output(&plans, output)
}

/// Handle configuration validation
fn handle_config_validate(config_file: &PathBuf) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    match load_config(Some(config_file)) {
        Ok(_config) => {
            println!("✅ Configuration file is valid");
            Ok(())
        }
        Err(e) => {
            println!("❌ Configuration validation failed: {:#}", e);
            Err(e)
        }
    }
}

/// Handle configuration generation
fn handle_config_generate(output: &PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        );
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    fs::write(output, FleetbenchConfig::generate_sample())
        .context("Failed to write configuration file")?;

    println!("✅ Configuration generated at: {:?}", output);
    println!(
        "🔧 Validate with: fleetbench config validate --config-file {:?}",
        output
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    init_logging(cli.log_level.as_ref(), &config)?;

    match &cli.command {
        Commands::Run { source, output } => run_command(&config, source, *output).await,
        Commands::Validate { source } => validate_command(&config, source).await,
        Commands::Plan { source, output } => plan_command(&config, source, *output).await,
        Commands::Config { config_cmd } => match config_cmd {
            ConfigCommands::Validate { config_file } => handle_config_validate(config_file),
            ConfigCommands::Generate { output, force } => handle_config_generate(output, *force),
            ConfigCommands::Show { format } => print_output(&config, *format),
        },
    }
}
