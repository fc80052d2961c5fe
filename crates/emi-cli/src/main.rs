mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::loan::{CalculateArgs, ValidateArgs};
use commands::rates::{ConvertArgs, RatesArgs};
use commands::Context;

/// Loan EMI calculator
#[derive(Parser)]
#[command(
    name = "emi",
    version,
    about = "Loan EMI and amortization schedule calculator",
    long_about = "Computes the equated monthly installment and month-by-month \
                  amortization schedule for a fixed-rate loan. Monetary values \
                  are calculated in USD and can be displayed in EUR, INR, GBP, \
                  JPY, AUD or CAD using live exchange rates."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Rate source config file (YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip the network and use the built-in fallback rates
    #[arg(long, global = true)]
    offline: bool,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the monthly payment and amortization schedule
    Calculate(CalculateArgs),
    /// Validate a single loan form field
    Validate(ValidateArgs),
    /// Convert a USD amount into a display currency
    Convert(ConvertArgs),
    /// List current exchange rates (base USD)
    Rates(RatesArgs),
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

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "emi_core=debug,emi=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    let ctx = Context {
        config_path: cli.config,
        offline: cli.offline,
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Calculate(args) => commands::loan::run_calculate(args, &ctx).await,
        Commands::Validate(args) => commands::loan::run_validate(args),
        Commands::Convert(args) => commands::rates::run_convert(args, &ctx).await,
        Commands::Rates(args) => commands::rates::run_rates(args, &ctx).await,
        Commands::Version => {
            println!("emi {}", env!("CARGO_PKG_VERSION"));
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
