mod commands;
mod input;
mod output;
mod telemetry;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::amortization::{PaymentArgs, ScheduleArgs, TermArgs};
use commands::refinance::{BlendArgs, RangeArgs, ScenariosArgs, ValidateArgs};

/// Mortgage refinancing calculations
#[derive(Parser)]
#[command(
    name = "mpulse",
    version,
    about = "Mortgage refinancing calculations",
    long_about = "A CLI for the mortgage refinancing engine with decimal precision. \
                  Computes payments and terms, blends loan rates, checks regulatory \
                  constraints and searches refinancing scenarios."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level or filter directive (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly payment for an amortizing loan
    Payment(PaymentArgs),
    /// Term implied by a monthly payment
    Term(TermArgs),
    /// Yearly amortization schedule
    Schedule(ScheduleArgs),
    /// Blend mortgage categories and other loans into one rate
    Blend(BlendArgs),
    /// Check a candidate loan against regulatory constraints
    Validate(ValidateArgs),
    /// Admissible term window and payment curve
    Range(RangeArgs),
    /// Generate refinancing scenarios for a household
    Scenarios(ScenariosArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = telemetry::init(&cli.log_level) {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(2);
    }

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Payment(args) => commands::amortization::run_payment(args),
        Commands::Term(args) => commands::amortization::run_term(args),
        Commands::Schedule(args) => commands::amortization::run_schedule(args),
        Commands::Blend(args) => commands::refinance::run_blend(args),
        Commands::Validate(args) => commands::refinance::run_validate(args),
        Commands::Range(args) => commands::refinance::run_range(args),
        Commands::Scenarios(args) => commands::refinance::run_scenarios(args),
        Commands::Version => {
            println!("mpulse {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
