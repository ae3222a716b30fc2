//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// wp - workout plan generator
#[derive(Parser)]
#[command(
    name = "wp",
    about = "Generate structured workout plans with an LLM",
    version,
    after_help = "Logs are written to: ~/.local/share/workoutplan/logs/workoutplan.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a workout plan from a request JSON file
    Generate {
        /// Request JSON file, or "-" for stdin
        #[arg(value_name = "REQUEST")]
        request: String,

        /// Write the plan to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },

    /// Validate a request and print the prompts that would be sent
    Prompt {
        /// Request JSON file, or "-" for stdin
        #[arg(value_name = "REQUEST")]
        request: String,

        /// Print the prompt pair as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a plan JSON file against the plan contract
    Check {
        /// Plan JSON file, or "-" for stdin
        #[arg(value_name = "PLAN")]
        plan: String,
    },

    /// Print the effective configuration
    Config,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    get_log_dir().join("workoutplan.log")
}

/// Get the log directory
pub fn get_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("workoutplan")
        .join("logs")
}
