pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "bidwright",
    about = "Bidwright bid estimator CLI",
    long_about = "Extract structured line items from bid descriptions and price them against the trade rate table.",
    after_help = "Examples:\n  bidwright estimate --file job.txt\n  bidwright price --input bid.json --json\n  bidwright rates"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Extract a bid from a text description via the LLM and price it")]
    Estimate {
        #[arg(long, short = 'f', help = "Text file holding the project description (stdin if omitted)")]
        file: Option<PathBuf>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Price an already-structured bid input JSON document")]
    Price {
        #[arg(long, short = 'i', help = "Path to the bid input JSON, or `-` for stdin")]
        input: String,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List the trade categories and their per-man-hour rates")]
    Rates {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Estimate { file, json } => commands::estimate::run(file.as_deref(), json),
        Command::Price { input, json } => commands::price::run(&input, json),
        Command::Rates { json } => commands::rates::run(json),
        Command::Config => commands::CommandResult::ok(commands::config::run()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
