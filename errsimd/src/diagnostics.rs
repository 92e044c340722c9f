/**
 * file: diagnostics.rs
 * desc: Non-fatal events recorded while fitting a profile. Every fitting step returns the
 *       diagnostics it produced alongside its result so callers (and tests) can inspect
 *       fallbacks and skipped events.
 */
use tracing::debug;

use shared::nucleotide::{Nucleotide, Orientation};

#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    // No mismatches were observed for a base, substitutions fall back to 1/3 each
    UniformFallback {
        orientation: Orientation,
        position: usize,
        base: Nucleotide,
    },
    // No aligned bases at a position, indel rates fall back to zero
    NoAlignedBases {
        orientation: Orientation,
        position: usize,
    },
    // Inserted or deleted base isn't A, C, G or T
    AmbiguousIndelBase {
        position: usize,
        base: u8,
        deletion: bool,
    },
    // The indel cursor points outside of the read
    CursorOutOfRange { cursor: isize },
    // Events at positions past the end of the count matrices
    EventsBeyondMatrix { count: usize, max_read_length: usize },
    // All reads share the same score at a position, fitted as a step function
    ConstantQuality {
        orientation: Orientation,
        position: usize,
        score: u8,
    },
    // Quality arrays shorter than the read length, left out of quality fitting
    ShortQualityArrays {
        orientation: Orientation,
        count: usize,
    },
    // No qualities for an orientation, the other orientation's histograms are reused
    OrientationMissing { orientation: Orientation },
    InsertSizeUnavailable { reason: String },
}

impl Diagnostic {
    /**
     * Diagnostics tied to a single read position or event. These can number in the
     * thousands and are summarized rather than logged one by one.
     */
    pub fn is_per_position(&self) -> bool {
        matches!(
            self,
            Diagnostic::UniformFallback { .. }
                | Diagnostic::NoAlignedBases { .. }
                | Diagnostic::AmbiguousIndelBase { .. }
                | Diagnostic::CursorOutOfRange { .. }
                | Diagnostic::ConstantQuality { .. }
        )
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UniformFallback {
                orientation,
                position,
                base,
            } => write!(
                f,
                "no {} mismatches at {} position {}, using uniform substitution rates",
                base, orientation, position
            ),
            Diagnostic::NoAlignedBases {
                orientation,
                position,
            } => write!(
                f,
                "no aligned bases at {} position {}, using zero indel rates",
                orientation, position
            ),
            Diagnostic::AmbiguousIndelBase {
                position,
                base,
                deletion,
            } => write!(
                f,
                "skipping {} of ambiguous base '{}' at position {}",
                if *deletion { "deletion" } else { "insertion" },
                *base as char,
                position
            ),
            Diagnostic::CursorOutOfRange { cursor } => {
                write!(f, "indel cursor {} is outside of the read", cursor)
            }
            Diagnostic::EventsBeyondMatrix {
                count,
                max_read_length,
            } => write!(
                f,
                "dropped {} events past the maximum read length ({})",
                count, max_read_length
            ),
            Diagnostic::ConstantQuality {
                orientation,
                position,
                score,
            } => write!(
                f,
                "all {} qualities at position {} are {}",
                orientation, position, score
            ),
            Diagnostic::ShortQualityArrays { orientation, count } => write!(
                f,
                "{} {} quality arrays are shorter than the read length",
                count, orientation
            ),
            Diagnostic::OrientationMissing { orientation } => write!(
                f,
                "no {} reads observed, reusing the other orientation's qualities",
                orientation
            ),
            Diagnostic::InsertSizeUnavailable { reason } => {
                write!(f, "no insert size distribution: {}", reason)
            }
        }
    }
}

/**
 * A fitting result together with the diagnostics produced while computing it.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct Fitted<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Fitted<T> {
    pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Fitted { value, diagnostics }
    }
}

/**
 * Log a diagnostic at debug level and keep it.
 */
pub fn record(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    debug!("{}", diagnostic);
    diagnostics.push(diagnostic);
}
