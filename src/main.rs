//! photospots CLI entry point

use clap::Parser;
use photospots::config::cli::Command;
use photospots::config::{Cli, Settings};
use photospots::pipeline;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli);

    // Validate inputs
    let common = cli.command.common();
    if let Err(e) = validate_inputs(&common.input, &common.output) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    // Build settings from CLI and the optional config file
    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = match &cli.command {
        Command::Classify(_) => {
            pipeline::run_classify(&settings).map(|r| pipeline::print_classify_summary(&r))
        }
        Command::Sweep(_) => {
            pipeline::run_sweep(&settings).map(|r| pipeline::print_sweep_summary(&r))
        }
        Command::Compare(_) => {
            pipeline::run_compare(&settings).map(|r| pipeline::print_compare_summary(&r))
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = if cli.quiet { "error" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

fn validate_inputs(input: &Path, output: &Path) -> Result<(), String> {
    if !input.is_file() {
        return Err(format!(
            "Input file does not exist: {}\n\n  Tip: Pass a CSV or JSON photo table.\n  Examples:\n    photospots classify -i ./flickr_lyon.csv -o ./results\n    photospots sweep -i ./photos.json -o ./search --algorithm dbscan",
            input.display()
        ));
    }

    // The output directory itself is created by the pipeline
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(format!(
                "Output parent directory does not exist: {}\n\n  Tip: The output directory will be created automatically,\n  but its parent directory must exist.\n  Example: mkdir -p {}",
                parent.display(),
                parent.display()
            ));
        }
    }

    Ok(())
}
