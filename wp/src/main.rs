//! wp - workout plan generator
//!
//! CLI entry point for generating and checking workout plans.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use workoutplan::cli::{Cli, Command, get_log_dir, get_log_path};
use workoutplan::config::Config;
use workoutplan::error::GenerationError;
use workoutplan::generator::PlanGenerator;
use workoutplan::plan;
use workoutplan::prompts::PromptComposer;
use workoutplan::request;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = get_log_dir();
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(get_log_path()).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "workoutplan loaded config: provider={}, model={}",
        config.llm.provider, config.llm.model
    );

    match cli.command {
        Command::Generate {
            request,
            output,
            compact,
        } => cmd_generate(&config, &request, output, compact).await,
        Command::Prompt { request, json } => cmd_prompt(&config, &request, json),
        Command::Check { plan } => cmd_check(&plan),
        Command::Config => cmd_config(&config),
    }
}

/// Read a file, or stdin when the path is "-"
fn read_input(source: &str) -> Result<String> {
    debug!(%source, "read_input: called");
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(source).context(format!("Failed to read {}", source))
}

fn read_json(source: &str) -> Result<Value> {
    let text = read_input(source)?;
    serde_json::from_str(&text).context(format!("{} is not valid JSON", source))
}

/// Report a generation error the way an HTTP caller would see it, then exit
fn fail(err: &GenerationError) -> ! {
    eprintln!(
        "{} {} (status {})",
        "Error:".red().bold(),
        err.public_message(),
        err.http_status()
    );
    if err.is_retryable() {
        eprintln!("{}", "The provider may recover; try again later.".yellow());
    }
    std::process::exit(1);
}

/// Run the full pipeline for one request
async fn cmd_generate(config: &Config, source: &str, output: Option<PathBuf>, compact: bool) -> Result<()> {
    let raw = read_json(source)?;
    config.validate().context("Invalid configuration")?;
    let generator = PlanGenerator::from_config(config)?;

    let document = match generator.generate(&raw).await {
        Ok(document) => document,
        Err(e) => fail(&e),
    };

    let rendered = if compact {
        serde_json::to_string(&document)?
    } else {
        serde_json::to_string_pretty(&document)?
    };

    match output {
        Some(path) => {
            fs::write(&path, format!("{}\n", rendered)).context(format!("Failed to write {}", path.display()))?;
            let summary = document.summary();
            eprintln!(
                "{} {} ({} weeks, {} training days, {} exercises)",
                "Wrote".green(),
                path.display(),
                summary.weeks,
                summary.training_days,
                summary.exercises
            );
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

/// Validate a request and show the prompt pair without calling the provider
fn cmd_prompt(config: &Config, source: &str, json: bool) -> Result<()> {
    let raw = read_json(source)?;
    let composer = PromptComposer::from_dir(config.prompts.expanded_dir().as_deref())?;

    let prompt = match request::validate(&raw).and_then(|r| composer.compose(&r)) {
        Ok(prompt) => prompt,
        Err(e) => fail(&e),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&prompt)?);
    } else {
        println!("{}", "=== system ===".cyan().bold());
        println!("{}", prompt.system);
        println!();
        println!("{}", "=== user ===".cyan().bold());
        println!("{}", prompt.user);
    }
    Ok(())
}

/// Check a plan document against the contract
fn cmd_check(source: &str) -> Result<()> {
    let text = read_input(source)?;
    match plan::parse(&text) {
        Ok(document) => {
            let summary = document.summary();
            println!(
                "{} {}: {} weeks, {} training days, {} rest days, {} exercises",
                "OK".green().bold(),
                document.plan().metadata.name,
                summary.weeks,
                summary.training_days,
                summary.rest_days,
                summary.exercises
            );
            Ok(())
        }
        Err(GenerationError::SchemaViolation { path, message }) => {
            eprintln!("{} {}: {}", "Invalid:".red().bold(), path.yellow(), message);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{} {}", "Invalid:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Print the effective configuration; the API key itself is never part of it
fn cmd_config(config: &Config) -> Result<()> {
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}
