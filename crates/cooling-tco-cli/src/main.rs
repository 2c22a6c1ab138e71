mod cache;
mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::assumptions::{load_assumptions, AssumptionsArgs};
use commands::compare::CompareArgs;
use commands::pue::PueArgs;
use commands::sensitivity::SensitivityArgs;
use output::OutputFormat;

/// Air vs immersion cooling total cost of ownership
#[derive(Parser)]
#[command(
    name = "tco",
    version,
    about = "Air vs immersion cooling total cost of ownership",
    long_about = "Compares the total cost of ownership of air-cooled and immersion-cooled \
                  data-center deployments with decimal precision: CAPEX, PUE, escalated OPEX, \
                  NPV of savings, payback period and sensitivity grids."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// JSON or YAML file overriding the built-in assumption set
    #[arg(long, global = true)]
    assumptions: Option<String>,

    /// Log calculation steps to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a baseline and an alternative cooling configuration
    Compare(CompareArgs),
    /// Sweep one or two financial variables over a comparison
    Sensitivity(SensitivityArgs),
    /// Estimate PUE, IT power and CAPEX for one configuration
    Pue(PueArgs),
    /// Print the active assumption set
    Assumptions(AssumptionsArgs),
    /// Print version information
    Version,
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let assumptions = || load_assumptions(cli.assumptions.as_deref());
    let result = match cli.command {
        Commands::Compare(args) => {
            assumptions().and_then(|a| commands::compare::run_compare(args, &a))
        }
        Commands::Sensitivity(args) => {
            assumptions().and_then(|a| commands::sensitivity::run_sensitivity(args, &a))
        }
        Commands::Pue(args) => assumptions().and_then(|a| commands::pue::run_pue(args, &a)),
        Commands::Assumptions(args) => {
            assumptions().and_then(|a| commands::assumptions::run_assumptions(args, &a))
        }
        Commands::Version => {
            println!("tco {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
