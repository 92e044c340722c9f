/**
 * file: error.rs
 * desc: Error type shared by the fitting and simulation crates.
 */
use thiserror::Error;

use crate::nucleotide::Orientation;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid orientation '{0}', expected 'forward' or 'reverse'")]
    InvalidOrientation(String),

    #[error("CIGAR string ({cigar}) is malformed: {reason}")]
    InvalidCigar { cigar: String, reason: String },

    #[error("alignment could not be reconstructed: {0}")]
    AlignmentMismatch(String),

    #[error("cannot fit a distribution to an empty sample")]
    EmptySample,

    #[error("sample contains a non-finite value ({0})")]
    NonFiniteSample(f64),

    #[error("sample standard deviation must be positive (got {0})")]
    DegenerateSample(f64),

    #[error("density evaluated to zero over the entire grid")]
    DegenerateDensity,

    #[error("read length {read_length} exceeds the matrix height ({rows})")]
    InvalidReadLength { read_length: usize, rows: usize },

    #[error("no quality scores were observed")]
    NoQualityData,

    #[error("sequence length ({sequence}) differs from quality length ({quality})")]
    LengthMismatch { sequence: usize, quality: usize },

    #[error("{orientation} reads are limited to {read_length}bp, got {requested}bp")]
    SequenceTooLong {
        orientation: Orientation,
        read_length: usize,
        requested: usize,
    },

    #[error("invalid error profile: {0}")]
    InvalidProfile(String),

    #[error("genome could not be parsed: {0}")]
    InvalidFasta(String),

    #[error("sequence is too short ({size}nt) to simulate a fragment of {required}nt")]
    SequenceTooShort { size: usize, required: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("model archive could not be encoded or decoded: {0}")]
    Encoding(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
