pub mod bootstrap;
pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reviewlens_core::config::{AppConfig, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "reviewlens",
    about = "Restaurant review analysis agent",
    long_about = "Route free-text requests to the report, chart or reply agent and inspect runtime readiness.",
    after_help = "Examples:\n  reviewlens ask \"Show me the sentiment trend for 2019\"\n  reviewlens charts --start 2019-01-01 --end 2019-12-31\n  reviewlens doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a reviewlens.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Answer one free-text request and print the outcome as JSON")]
    Ask {
        #[arg(required = true, num_args = 1.., help = "Request text")]
        request: Vec<String>,
    },
    #[command(about = "Render every chart kind for a date range with per-chart timing")]
    Charts {
        #[arg(long, help = "First day of the range (YYYY-MM-DD); defaults to the dataset span")]
        start: Option<String>,
        #[arg(long, help = "Last day of the range (YYYY-MM-DD); defaults to the dataset span")]
        end: Option<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, dataset, PDF converter and LLM client readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = load_options(cli.config.clone());

    // Commands report config errors themselves; logging falls back to defaults.
    let logging_config = AppConfig::load(options.clone()).unwrap_or_default();
    bootstrap::init_logging(&logging_config);

    let result = match cli.command {
        Command::Ask { request } => commands::ask::run(options, &request.join(" ")),
        Command::Charts { start, end } => {
            commands::charts::run(options, start.as_deref(), end.as_deref())
        }
        Command::Config => commands::config::run(options),
        Command::Doctor { json } => commands::CommandResult {
            exit_code: 0,
            output: commands::doctor::run(options, json),
        },
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn load_options(config_path: Option<PathBuf>) -> LoadOptions {
    let require_file = config_path.is_some();
    LoadOptions { config_path, require_file, ..LoadOptions::default() }
}
