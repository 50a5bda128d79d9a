mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::margin::MarginArgs;
use commands::report::{LiveArgs, ReportArgs};

/// Seller profitability reports for marketplace businesses
#[derive(Parser)]
#[command(
    name = "irving",
    version,
    about = "Seller profitability reports for marketplace businesses",
    long_about = "Merges a seller's paid marketplace orders with their cost settings and \
                  advertising spend, then reports per-product contribution margins, KPI \
                  totals and a daily revenue/profit series. Runs from JSON fixtures on \
                  disk or against the live Mercado Libre API."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a profitability report from order fixtures on disk
    Report(ReportArgs),
    /// Build a profitability report against the live marketplace API
    Live(LiveArgs),
    /// Per-unit cost breakdown and contribution margin for one listing
    Margin(MarginArgs),
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
    init_tracing();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Report(args) => commands::report::run_report(args),
        Commands::Live(args) => commands::report::run_live(args),
        Commands::Margin(args) => commands::margin::run_margin(args),
        Commands::Version => {
            println!("irving {}", env!("CARGO_PKG_VERSION"));
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

/// Diagnostics go to stderr so the report payload on stdout stays parseable.
/// Silent unless RUST_LOG says otherwise.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
