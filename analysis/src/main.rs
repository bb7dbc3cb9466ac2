use clap::{ArgAction, Parser};
use ntran_analysis::{
    config::AnalyzerConfig,
    pipeline::{error_chain, generate, Outcome},
};
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;


/// reads the results directory and crafts figures
#[derive(Parser, Debug)]
#[command(name = "ntran-analyze", version)]
struct Args {
    /// directory holding the benchmark result CSV files
    #[arg(short, long, default_value = "./ntran/results")]
    results: PathBuf,

    /// directory the figures are written to, created if missing
    #[arg(short, long, default_value = "./ntran/figures")]
    figures: PathBuf,

    /// YAML file describing the figures, the built-in figures are used otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// only render the named figure, can be repeated
    #[arg(long = "only", value_name = "FIGURE")]
    only: Vec<String>,

    /// print the effective figure configuration and exit
    #[arg(long)]
    dump_config: bool,

    /// more verbose logging, can be repeated; RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let loaded = match &args.config {
        Some(path) => AnalyzerConfig::load(path),
        None => AnalyzerConfig::builtin(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(error) => {
            error!(error = ?error, "Failed to load the figure configuration: {error}");

            return ExitCode::FAILURE;
        }
    };

    if !args.only.is_empty() && config.select(&args.only).is_err() {
        return ExitCode::FAILURE;
    }

    if config.preflight_checks() {
        error!("The figure configuration contains errors, see above");

        return ExitCode::FAILURE;
    }

    if args.dump_config {
        return match config.to_yaml() {
            Ok(yaml) => {
                print!("{yaml}");

                ExitCode::SUCCESS
            }
            Err(error) => {
                error!(error = ?error, "Failed to serialize configuration: {error}");

                ExitCode::FAILURE
            }
        };
    }

    let report = match generate(&config, &args.results, &args.figures) {
        Ok(report) => report,
        Err(error) => {
            error!(error = ?error, figures = ?args.figures, "{error}");

            return ExitCode::FAILURE;
        }
    };

    for (name, outcome) in report.iter() {
        match outcome {
            Outcome::Rendered(path) => info!(figure = %name, path = ?path, "Rendered"),
            Outcome::Skipped => warn!(figure = %name, "Skipped, no results"),
            Outcome::Failed(error) => {
                error!(figure = %name, "Failed: {}", error_chain(error))
            }
        }
    }

    info!(
        "Done with {}/{} figures",
        report.rendered(),
        report.outcomes.len()
    );

    if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
