//! covshrink CLI binary.
//!
//! Reads observations from CSV and prints shrinkage covariance estimates as
//! JSON.

mod error;
mod input;
mod report;

use clap::{Parser, Subcommand};
use covshrink::covariance::{Dims, Shrinkage, ShrinkageMethod};
use error::CliError;
use report::{EstimatorSettings, TargetArg};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "covshrink")]
#[command(about = "Shrinkage estimators of covariance matrices", long_about = None)]
#[command(version)]
struct Cli {
    /// Log estimator diagnostics to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate a covariance matrix with one method
    Estimate {
        /// CSV file of observations
        input: PathBuf,

        /// Shrinkage method (lw, rblw, oas or nonlinear)
        #[arg(long, default_value = "nonlinear")]
        method: ShrinkageMethod,

        /// 1 if observations are rows, 2 if they are columns
        #[arg(long, default_value = "1", value_parser = parse_dims)]
        dims: Dims,

        /// Linear shrinkage intensity: "auto" or a number in [0, 1]
        #[arg(long, default_value = "auto")]
        shrinkage: Shrinkage,

        /// Ledoit-Wolf shrinkage target
        #[arg(long, value_enum, default_value_t = TargetArg::Identity)]
        target: TargetArg,

        /// Divide the sample covariance by n - 1 (nonlinear method)
        #[arg(long)]
        corrected: bool,

        /// The first CSV row is data, not a header
        #[arg(long)]
        no_header: bool,
    },

    /// Run every method and compare conditioning
    Compare {
        /// CSV file of observations
        input: PathBuf,

        /// 1 if observations are rows, 2 if they are columns
        #[arg(long, default_value = "1", value_parser = parse_dims)]
        dims: Dims,

        /// Divide the sample covariance by n - 1
        #[arg(long)]
        corrected: bool,

        /// The first CSV row is data, not a header
        #[arg(long)]
        no_header: bool,
    },
}

fn parse_dims(value: &str) -> Result<Dims, String> {
    let index: usize = value
        .parse()
        .map_err(|_| format!("dims should be 1 or 2, got {value:?}"))?;
    Dims::try_from(index).map_err(|e| e.to_string())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    let output = match command {
        Commands::Estimate {
            input,
            method,
            dims,
            shrinkage,
            target,
            corrected,
            no_header,
        } => {
            let observations = input::read_csv_file(&input, !no_header)?;
            let settings = EstimatorSettings {
                method,
                shrinkage,
                target: target.into(),
                corrected,
            };
            let report = report::estimate(&observations, dims, &settings)?;
            serde_json::to_string_pretty(&report)?
        }
        Commands::Compare {
            input,
            dims,
            corrected,
            no_header,
        } => {
            let observations = input::read_csv_file(&input, !no_header)?;
            let report = report::compare(&observations, dims, corrected)?;
            serde_json::to_string_pretty(&report)?
        }
    };

    println!("{}", output);
    Ok(())
}
