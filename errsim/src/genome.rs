/**
 * file: genome.rs
 * desc: Model a genome and its sequence.
 */
use needletail::parse_fastx_file;
use needletail::Sequence;
use std::path;

use shared::error::{ModelError, Result};
use shared::util;

#[derive(Debug, Clone, PartialEq)]
pub struct Seq {
    pub id: Vec<u8>,
    pub seq: Vec<u8>,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct Genome {
    // Genome (FASTA) filepath
    pub filepath: path::PathBuf,
    // Sequence records
    pub sequence: Vec<Seq>,
    // Total genome size in bp
    pub size: usize,
}

impl std::fmt::Display for Genome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Genome ({}) {} sequences, {}bp>",
            self.filepath.display(),
            self.sequence.len(),
            self.size
        )
    }
}

impl Seq {
    pub fn name(&self) -> String {
        util::bytes_to_string(&self.id)
    }
}

impl Genome {
    /**
     * Constructs a new Genome object from the given FASTA file. Sequences are normalized to
     * uppercase and anything that isn't A, C, G or T becomes an N.
     */
    pub fn from_fasta(filepath: &path::Path) -> Result<Genome> {
        let mut sequences: Vec<Seq> = Vec::new();
        // Record iterator, any parse errors get returned to the caller
        let mut fasta_reader = parse_fastx_file(filepath)
            .map_err(|e| ModelError::InvalidFasta(format!("{}: {}", filepath.display(), e)))?;

        while let Some(record_wrap) = fasta_reader.next() {
            // Fail on any parse errors even if all other records are fine
            let record = record_wrap
                .map_err(|e| ModelError::InvalidFasta(format!("{}: {}", filepath.display(), e)))?;
            // Normalized sequences, removes softmasking, etc.
            let seq = record.normalize(false).to_vec();

            sequences.push(Seq {
                id: record.id().to_vec(),
                size: seq.len(),
                seq,
            })
        }

        Ok(Genome {
            filepath: filepath.to_path_buf(),
            size: sequences.iter().map(|s| s.size).sum(),
            sequence: sequences,
        })
    }

    /**
     * Sequences long enough to hold a fragment of at least `min_size` bases.
     */
    pub fn usable_sequences(&self, min_size: usize) -> Vec<&Seq> {
        self.sequence.iter().filter(|s| s.size >= min_size).collect()
    }
}

#[cfg(test)]
#[path = "tests/genome_tests.rs"]
mod genome_tests;
