/**
 * file: matrix.rs
 * desc: Position indexed count matrices and the accumulator that fills them from aligned
 *       reads, qualities and insert sizes.
 */
use shared::nucleotide::Orientation;

use crate::alignment::AlignmentRecord;
use crate::diagnostics::Diagnostic;
use crate::dispatch::{self, DeletionCursor};

/**
 * CONSTANTS
 */

pub const SUBSTITUTION_COLUMNS: usize = 16;
pub const INDEL_COLUMNS: usize = 9;

// Column of the indel matrix counting matches and substitutions
pub const ALIGNED_COLUMN: usize = 0;

// Matrix height used when no maximum read length is given
pub const DEFAULT_MAX_READ_LENGTH: usize = 301;

/**
 * STRUCTS
 */

/**
 * Fixed width matrix of counts, one row per read position.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct CountMatrix<const W: usize> {
    rows: Vec<[u64; W]>,
}

pub type SubstitutionMatrix = CountMatrix<SUBSTITUTION_COLUMNS>;
pub type IndelMatrix = CountMatrix<INDEL_COLUMNS>;

impl<const W: usize> CountMatrix<W> {
    pub fn zeros(rows: usize) -> Self {
        CountMatrix {
            rows: vec![[0; W]; rows],
        }
    }

    #[cfg(test)]
    pub fn from_rows(rows: Vec<[u64; W]>) -> Self {
        CountMatrix { rows }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, position: usize) -> Option<&[u64; W]> {
        self.rows.get(position)
    }

    pub fn get(&self, position: usize, column: usize) -> u64 {
        self.rows
            .get(position)
            .and_then(|r| r.get(column))
            .copied()
            .unwrap_or(0)
    }

    /**
     * Add one to a cell. Returns false, and leaves the matrix untouched, if the position is
     * past the last row.
     */
    pub fn increment(&mut self, position: usize, column: usize) -> bool {
        match self.rows.get_mut(position) {
            Some(row) => {
                row[column] += 1;
                true
            }
            None => false,
        }
    }
}

/**
 * Counts for a single orientation.
 *
 * fields
 *  substitutions: substitution matrix
 *  indels:        indel matrix, column 0 counts the bases that went into the substitution matrix
 *  qualities:     raw quality arrays, one per read
 */
#[derive(Clone, Debug, PartialEq)]
pub struct OrientedCounts {
    pub substitutions: SubstitutionMatrix,
    pub indels: IndelMatrix,
    pub qualities: Vec<Vec<u8>>,
}

impl OrientedCounts {
    fn new(max_read_length: usize) -> Self {
        OrientedCounts {
            substitutions: SubstitutionMatrix::zeros(max_read_length),
            indels: IndelMatrix::zeros(max_read_length),
            qualities: Vec::new(),
        }
    }
}

/**
 * Collects everything needed to fit a profile during a single pass over the alignments.
 * The accumulator is consumed by fit::fit_profile.
 */
#[derive(Clone, Debug)]
pub struct CountAccumulator {
    pub(crate) max_read_length: usize,
    pub(crate) deletion_cursor: DeletionCursor,
    pub(crate) forward: OrientedCounts,
    pub(crate) reverse: OrientedCounts,
    pub(crate) insert_sizes: Vec<f64>,
    pub(crate) read_lengths: Vec<usize>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) dropped_events: usize,
    alignments: usize,
    indel_reads: usize,
}

impl CountAccumulator {
    pub fn new(max_read_length: usize, deletion_cursor: DeletionCursor) -> Self {
        CountAccumulator {
            max_read_length,
            deletion_cursor,
            forward: OrientedCounts::new(max_read_length),
            reverse: OrientedCounts::new(max_read_length),
            insert_sizes: Vec::new(),
            read_lengths: Vec::new(),
            diagnostics: Vec::new(),
            dropped_events: 0,
            alignments: 0,
            indel_reads: 0,
        }
    }

    pub fn counts(&self, orientation: Orientation) -> &OrientedCounts {
        match orientation {
            Orientation::Forward => &self.forward,
            Orientation::Reverse => &self.reverse,
        }
    }

    fn counts_mut(&mut self, orientation: Orientation) -> &mut OrientedCounts {
        match orientation {
            Orientation::Forward => &mut self.forward,
            Orientation::Reverse => &mut self.reverse,
        }
    }

    /**
     * Dispatch one aligned read into the orientation's matrices. Every recognized base adds
     * to the substitution matrix and to the aligned column of the indel matrix. Reads
     * flagged by the substitution scan are then walked for indels.
     *
     * returns
     *  true if the read was flagged as carrying indels
     */
    pub fn add_alignment(&mut self, record: &AlignmentRecord, orientation: Orientation) -> bool {
        let scan = dispatch::dispatch_substitutions(record);
        let mut dropped = 0;

        {
            let counts = self.counts_mut(orientation);

            for event in scan.events.iter() {
                if counts
                    .substitutions
                    .increment(event.position, event.category.code())
                {
                    counts.indels.increment(event.position, ALIGNED_COLUMN);
                } else {
                    dropped += 1;
                }
            }
        }

        if scan.has_indels {
            let indels = dispatch::dispatch_indels(record, self.deletion_cursor);
            let counts = self.counts_mut(orientation);

            for event in indels.iter() {
                if !counts.indels.increment(event.position, event.category.code()) {
                    dropped += 1;
                }
            }

            self.diagnostics.extend(indels.diagnostics);
            self.indel_reads += 1;
        }

        self.dropped_events += dropped;
        self.alignments += 1;

        scan.has_indels
    }

    pub fn add_qualities(&mut self, qualities: Vec<u8>, orientation: Orientation) {
        self.counts_mut(orientation).qualities.push(qualities);
    }

    pub fn add_insert_size(&mut self, insert_size: u32) {
        self.insert_sizes.push(insert_size as f64);
    }

    pub fn add_read_length(&mut self, read_length: usize) {
        self.read_lengths.push(read_length);
    }

    pub fn num_alignments(&self) -> usize {
        self.alignments
    }

    pub fn num_indel_reads(&self) -> usize {
        self.indel_reads
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
