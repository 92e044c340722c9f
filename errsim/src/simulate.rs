/**
 * file: simulate.rs
 * desc: Simulate paired end reads.
 */
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::warn;

use shared::error::{ModelError, Result};
use shared::nucleotide::Orientation;
use shared::util;

use crate::error_model::ErrorModel;
use crate::genome;

/**
 * STRUCTS
 */

/**
 Models a single read which is a sequence of nucleotides and their corresponding quality scores.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct SingleRead {
    pub sequence: Vec<u8>,
    pub quality: Vec<u8>,
}

/**
 * Captures metadata for a simulated read. The metadata tracks the provenance of the read, i.e.
 * which sequence the fragment came from and where.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct ReadMetadata {
    pub sequence_id: Vec<u8>,
    pub fragment_start: usize,
    pub fragment_length: usize,
}

/**
 Models a single PE read consisting of a unique ID and forward/reverse reads.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedRead {
    pub id: usize,
    pub forward: SingleRead,
    pub reverse: SingleRead,
    pub metadata: ReadMetadata,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulationOptions {
    // Introduce insertions and deletions in addition to substitutions
    pub indels: bool,
}

/**
 * FUNCTIONS
 */

// Spread read indices across the seed space so neighbouring reads get unrelated streams
fn read_seed(seed: u64, read: usize) -> u64 {
    seed ^ (read as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/**
 * Run a read template, in sequencing order, through the error model. When indels are on the
 * edited read is trimmed back to the read length, or extended with the bases that follow the
 * template in the fragment.
 *
 * args
 *  template:    the oriented fragment, the read is taken from its start
 *  read_length: read length
 *  orientation: forward (R1) or reverse (R2)
 */
fn sequence_read<R: Rng + ?Sized>(
    template: &[u8],
    read_length: usize,
    orientation: Orientation,
    model: &ErrorModel,
    options: &SimulationOptions,
    rng: &mut R,
) -> Result<SingleRead> {
    let mut sequence = if options.indels {
        let mut edited = model.introduce_indels(&template[..read_length], orientation, rng)?;

        edited.truncate(read_length);

        if edited.len() < read_length {
            let missing = read_length - edited.len();

            edited.extend(template[read_length..].iter().take(missing));
            // Fragment ran out
            edited.resize(read_length, b'N');
        }

        edited
    } else {
        template[..read_length].to_vec()
    };

    let quality = model.gen_phred_scores(orientation, read_length, rng)?;

    sequence = model.mutate_sequence(&sequence, &quality, orientation, rng)?;

    Ok(SingleRead { sequence, quality })
}

/**
 * Simulate a single paired end read from the given sequence. A fragment is drawn from the
 * model's insert size distribution (twice the read length when the model has none), the
 * forward read comes from the start of the fragment and the reverse read is the reverse
 * complement of its end.
 *
 * args
 *  id:       read ID
 *  sequence: a sequence record from a genome
 *  model:    error model to use when simulating sequencing errors
 *  options:  simulation options
 *  rng:      random number generator
 *
 * returns
 *  the simulated PE read or an error if the sequence is shorter than a single read
 */
pub fn simulate_pe_read<R: Rng + ?Sized>(
    id: usize,
    sequence: &genome::Seq,
    model: &ErrorModel,
    options: &SimulationOptions,
    rng: &mut R,
) -> Result<SimulatedRead> {
    let read_length = model.read_length();

    if sequence.size < read_length {
        return Err(ModelError::SequenceTooShort {
            size: sequence.size,
            required: read_length,
        });
    }

    let fragment_length = model
        .random_insert_size(rng)
        .unwrap_or(2 * read_length)
        .max(read_length)
        .min(sequence.size);
    let fragment_start = rng.gen_range(0..=(sequence.size - fragment_length));
    let fragment = &sequence.seq[fragment_start..fragment_start + fragment_length];

    // The reverse read is sequenced from the other strand, 3' -> 5'
    let reverse_template = util::reverse_complement(fragment);

    let forward = sequence_read(
        fragment,
        read_length,
        Orientation::Forward,
        model,
        options,
        rng,
    )?;
    let reverse = sequence_read(
        &reverse_template,
        read_length,
        Orientation::Reverse,
        model,
        options,
        rng,
    )?;

    Ok(SimulatedRead {
        id,
        forward,
        reverse,
        metadata: ReadMetadata {
            sequence_id: sequence.id.clone(),
            fragment_start,
            fragment_length,
        },
    })
}

/**
 * Simulate a set of paired end reads from the given genome. Each read picks a random sequence
 * and is generated with its own RNG derived from the seed and the read's index, so the output
 * is the same regardless of the number of threads.
 *
 * args
 *  genome:    genome to use for simulation
 *  num_reads: the number of PE reads to generate
 *  model:     error model to use when simulating sequencing errors
 *  options:   simulation options
 *  seed:      seed for reproducibility
 *
 * returns
 *  the simulated reads in ID order
 */
pub fn simulate_reads(
    genome: &genome::Genome,
    num_reads: usize,
    model: &ErrorModel,
    options: &SimulationOptions,
    seed: u64,
) -> Result<Vec<SimulatedRead>> {
    let read_length = model.read_length();
    let sequences = genome.usable_sequences(read_length);

    for s in genome.sequence.iter().filter(|s| s.size < read_length) {
        warn!(
            "({}) Sequence {} is shorter than the read length ({} < {}), skipping it",
            genome,
            s.name(),
            s.size,
            read_length
        );
    }

    if sequences.is_empty() {
        return Err(ModelError::SequenceTooShort {
            size: genome.sequence.iter().map(|s| s.size).max().unwrap_or(0),
            required: read_length,
        });
    }

    (0..num_reads)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(read_seed(seed, i));
            let sequence = sequences[rng.gen_range(0..sequences.len())];

            simulate_pe_read(i, sequence, model, options, &mut rng)
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/simulate_tests.rs"]
mod simulate_tests;
