/**
 * file: main.rs
 * desc: Fit an empirical sequencing error model from aligned reads.
 */
mod alignment;
mod cli;
mod diagnostics;
mod dispatch;
mod fit;
mod kde;
mod log;
mod matrix;
mod sam;
mod tables;

use std::path::Path;
use tracing::{error, info, warn};

use shared::encoding;

use crate::diagnostics::Diagnostic;

// Log the diagnostics worth seeing individually and a count of the rest
fn report_diagnostics(diagnostics: &[Diagnostic]) {
    let (per_position, notable): (Vec<&Diagnostic>, Vec<&Diagnostic>) =
        diagnostics.iter().partition(|d| d.is_per_position());

    for d in notable {
        warn!("{}", d);
    }

    if !per_position.is_empty() {
        info!(
            "{} positions used fallback values, rerun with --verbose for details",
            per_position.len()
        );
    }
}

fn run_main(args: &cli::CliArgs) -> shared::error::Result<()> {
    let config = args.fit_config();

    let (accumulator, summary) = sam::accumulate_alignments(Path::new(&args.sam_file), &config)?;

    summary.log();

    info!("Generating quality score, substitution and indel distributions");

    let fitted = fit::fit_profile(accumulator)?;

    report_diagnostics(&fitted.diagnostics);

    let profile = fitted.value;

    info!("Model parameters:");
    info!("  read length: {}", profile.read_length);
    match &profile.insert_size {
        Some(insert) => info!("  insert size mean: {:.2}", insert.mean),
        None => info!("  insert size: none"),
    }
    info!("  deletion cursor: {:?}", config.deletion_cursor);

    encoding::serialize_profile_to_path(Path::new(&args.output), &profile)?;

    info!("Wrote sequence error model to {}", args.output);

    Ok(())
}

fn main() {
    let args = cli::parse_cli_args();

    // Setup stderr logging
    log::setup_logging(args.verbose);

    // Setup threads
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
    {
        error!("Failed to set up the thread pool: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run_main(&args) {
        error!("Failed to build the error model: {}", e);
        std::process::exit(1);
    }
}
