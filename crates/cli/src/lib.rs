pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use meddpicc_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "meddpicc",
    about = "MEDDPICC qualification scoring CLI",
    long_about = "Score MEDDPICC answer sets, surface ranked deal insights, and inspect the active framework and configuration.",
    after_help = "Examples:\n  meddpicc pillars\n  meddpicc assess --answers deal.json --format summary\n  meddpicc insights --answers deal.json --limit 5\n  meddpicc doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a meddpicc.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List the framework's pillars, questions and stage gates")]
    Pillars,
    #[command(about = "Score an answers file and render the assessment")]
    Assess {
        #[arg(long, help = "JSON file with the recorded answers")]
        answers: PathBuf,
        #[arg(long, default_value = "json", help = "Output format: json, csv or summary")]
        format: String,
        #[arg(long, help = "Opportunity id, overriding the one in the answers file")]
        opportunity: Option<String>,
    },
    #[command(about = "Rank insights and coaching prompts for an answers file")]
    Insights {
        #[arg(long, help = "JSON file with the recorded answers")]
        answers: PathBuf,
        #[arg(long, help = "Maximum number of insights (defaults to scoring.insight_limit)")]
        limit: Option<usize>,
        #[arg(long, help = "Opportunity id, overriding the one in the answers file")]
        opportunity: Option<String>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate configuration and the active framework")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.config.clone());

    let result = match cli.command {
        Command::Pillars => commands::pillars::run(cli.config),
        Command::Assess { answers, format, opportunity } => {
            commands::assess::run(cli.config, &answers, &format, opportunity)
        }
        Command::Insights { answers, limit, opportunity } => {
            commands::insights::run(cli.config, &answers, limit, opportunity)
        }
        Command::Config => commands::config::run(cli.config),
        Command::Doctor { json } => commands::doctor::run(cli.config, json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so command output on stdout stays machine-readable.
/// `RUST_LOG` wins over the configured level; a config that fails to load
/// falls back to defaults and is reported by the command itself.
fn init_logging(config_path: Option<PathBuf>) {
    let config =
        AppConfig::load(LoadOptions { config_path, ..LoadOptions::default() }).unwrap_or_default();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
