/**
 * file: main.rs
 * desc: Simulate paired end reads using a fitted sequencing error model.
 */
mod cli;
mod error_model;
mod fastq;
mod genome;
mod log;
mod simulate;

use std::path::Path;
use tracing::{error, info};

use shared::encoding;

use crate::error_model::ErrorModel;

fn run_main(args: &cli::CliArgs) -> shared::error::Result<()> {
    info!("Loading error model");

    let profile = encoding::deserialize_profile_from_path(Path::new(&args.model))?;
    let model = ErrorModel::new(profile, args.mutation_rule.into())?;

    info!(
        "Model read length: {}, mutation rule: {:?}",
        model.read_length(),
        model.rule()
    );
    if model.profile().insert_size.is_none() {
        info!("Model has no insert size distribution, fragments will be twice the read length");
    }

    info!("Loading genome");

    let genome = genome::Genome::from_fasta(Path::new(&args.genome))?;

    info!("Loaded {}", genome);

    let seed = args.seed.unwrap_or_else(rand::random);

    info!("Simulating {} reads (seed = {})", args.num_reads, seed);

    let reads = simulate::simulate_reads(
        &genome,
        args.num_reads,
        &model,
        &args.simulation_options(),
        seed,
    )?;

    let (r1, r2) = fastq::write_fastq_pairs(&reads, &args.output, &args.read_header_format)?;

    info!(
        "Wrote simulated reads to {} and {}",
        r1.display(),
        r2.display()
    );

    Ok(())
}

fn main() {
    let args = cli::parse_cli_args();

    // Set up logging
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
        error!("Failed to simulate reads: {}", e);
        std::process::exit(1);
    }
}
