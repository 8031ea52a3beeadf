mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::debt::{DebtArgs, DebtCompareArgs};
use commands::deposit::DepositArgs;
use commands::fx::FxArgs;
use commands::loan::EmiArgs;
use commands::tax::{RegimesArgs, TaxArgs, TaxCompareArgs};

/// Personal finance calculations with decimal precision
#[derive(Parser)]
#[command(
    name = "pfin",
    version,
    about = "Personal finance calculations with decimal precision",
    long_about = "A CLI for everyday personal finance calculations with decimal precision. \
                  Supports loan EMIs and amortization schedules, fixed-deposit growth, \
                  progressive income tax under several regimes, debt payoff strategies \
                  and currency conversion."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log more (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Loan EMI, totals and amortization schedule
    Emi(EmiArgs),
    /// Fixed-deposit maturity, yearly breakdown or simple-interest comparison
    Deposit(DepositArgs),
    /// Income tax under one regime
    Tax(TaxArgs),
    /// Compare income tax across regimes
    TaxCompare(TaxCompareArgs),
    /// List the built-in tax regimes
    Regimes(RegimesArgs),
    /// Simulate a debt payoff strategy
    Debt(DebtArgs),
    /// Compare minimum, snowball and avalanche payoff strategies
    DebtCompare(DebtCompareArgs),
    /// Convert between currencies
    Fx(FxArgs),
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

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // stdout carries the result; logs go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Emi(args) => commands::loan::run_emi(args),
        Commands::Deposit(args) => commands::deposit::run_deposit(args),
        Commands::Tax(args) => commands::tax::run_tax(args),
        Commands::TaxCompare(args) => commands::tax::run_tax_compare(args),
        Commands::Regimes(args) => commands::tax::run_regimes(args),
        Commands::Debt(args) => commands::debt::run_debt(args),
        Commands::DebtCompare(args) => commands::debt::run_debt_compare(args),
        Commands::Fx(args) => commands::fx::run_fx(args),
        Commands::Version => {
            println!("pfin {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
