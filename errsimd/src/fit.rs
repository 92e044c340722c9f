/**
 * file: fit.rs
 * desc: Assemble a complete error profile from a finished count accumulator.
 */
use itertools::Itertools;
use tracing::info;

use shared::error::{ModelError, Result};
use shared::nucleotide::Orientation;
use shared::profile::{
    ErrorProfile, IndelRates, InsertSizeDistribution, QualityHistogram, SubstitutionChoices,
    MAX_QUALITY,
};
use shared::util;

use crate::diagnostics::{self, Diagnostic, Fitted};
use crate::dispatch::DeletionCursor;
use crate::kde;
use crate::matrix::{CountAccumulator, DEFAULT_MAX_READ_LENGTH};
use crate::tables;

/**
 * CONSTANTS
 */

pub const DEFAULT_MAX_INSERT_SIZE: u32 = 5000;

/**
 * STRUCTS
 */

/**
 * Settings for a fitting run.
 *
 * fields
 *  max_read_length: height of the count matrices, longer read lengths are capped to this
 *  deletion_cursor: how the indel dispatcher moves over deletions
 *  max_insert_size: insert sizes above this are left out of the insert size distribution
 *  mapq_threshold:  alignments with a mapping quality below this are skipped
 *  max_alignments:  stop after this many SAM records
 *  single_reads:    the alignments are single-end, no insert sizes are collected
 */
#[derive(Clone, Debug, PartialEq)]
pub struct FitConfig {
    pub max_read_length: usize,
    pub deletion_cursor: DeletionCursor,
    pub max_insert_size: u32,
    pub mapq_threshold: Option<u8>,
    pub max_alignments: Option<usize>,
    pub single_reads: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            max_read_length: DEFAULT_MAX_READ_LENGTH,
            deletion_cursor: DeletionCursor::default(),
            max_insert_size: DEFAULT_MAX_INSERT_SIZE,
            mapq_threshold: None,
            max_alignments: None,
            single_reads: false,
        }
    }
}

impl FitConfig {
    pub fn accumulator(&self) -> CountAccumulator {
        CountAccumulator::new(self.max_read_length, self.deletion_cursor)
    }
}

// Every per position table for one orientation
#[derive(Clone, Debug)]
struct OrientedTables {
    qualities: Vec<QualityHistogram>,
    substitutions: Vec<SubstitutionChoices>,
    indels: Vec<IndelRates>,
}

/**
 * FUNCTIONS
 */

/**
 * The most frequently observed read length, ties go to the longer length. The result is
 * capped at the maximum read length.
 */
pub fn derive_read_length(read_lengths: &[usize], max_read_length: usize) -> Option<usize> {
    read_lengths
        .iter()
        .sorted()
        .dedup_with_count()
        .max_by_key(|(count, len)| (*count, **len))
        .map(|(_, len)| (*len).min(max_read_length))
}

// The shared score when every sample at a position is identical
fn constant_score(samples: &[f64]) -> Option<u8> {
    let first = *samples.first()?;

    if samples.iter().all(|s| *s == first) {
        Some(first as u8)
    } else {
        None
    }
}

// CDF that jumps from 0 to 1 at the given score
fn step_cdf(score: u8) -> Vec<f64> {
    (0..=MAX_QUALITY)
        .map(|q| if q < score { 0.0 } else { 1.0 })
        .collect()
}

/**
 * Fit the per position quality histograms for one orientation. Quality arrays shorter than
 * the read length are left out and longer ones are truncated.
 *
 * returns
 *  the histograms, or None if no usable quality arrays were observed
 */
fn fit_qualities(
    qualities: &[Vec<u8>],
    read_length: usize,
    orientation: Orientation,
    diags: &mut Vec<Diagnostic>,
) -> Result<Option<Vec<QualityHistogram>>> {
    let (usable, short): (Vec<_>, Vec<_>) =
        qualities.iter().partition(|q| q.len() >= read_length);

    if !short.is_empty() {
        diagnostics::record(
            diags,
            Diagnostic::ShortQualityArrays {
                orientation,
                count: short.len(),
            },
        );
    }

    if usable.is_empty() {
        return Ok(None);
    }

    let truncated: Vec<Vec<u8>> = usable.iter().map(|q| q[..read_length].to_vec()).collect();
    let positions = kde::transpose_qualities(&truncated);
    let cdfs = kde::quality_cdfs(&positions);
    let grid = kde::quality_grid();

    let mut histograms = Vec::with_capacity(read_length);

    for (position, (samples, cdf)) in positions.iter().zip(cdfs.into_iter()).enumerate() {
        let cdf = match constant_score(samples) {
            Some(score) => {
                diagnostics::record(
                    diags,
                    Diagnostic::ConstantQuality {
                        orientation,
                        position,
                        score,
                    },
                );
                step_cdf(score)
            }
            None => cdf?,
        };

        histograms.push(QualityHistogram {
            scores: grid.clone(),
            weights: kde::cdf_to_weights(&cdf),
        });
    }

    Ok(Some(histograms))
}

fn fit_orientation(
    acc: &CountAccumulator,
    read_length: usize,
    orientation: Orientation,
    diags: &mut Vec<Diagnostic>,
) -> Result<Option<OrientedTables>> {
    let counts = acc.counts(orientation);

    let qualities = match fit_qualities(&counts.qualities, read_length, orientation, diags)? {
        Some(q) => q,
        None => return Ok(None),
    };

    let substitutions =
        tables::substitution_choices(&counts.substitutions, read_length, orientation)?;
    let indels = tables::indel_rates(&counts.indels, read_length, orientation)?;

    diags.extend(substitutions.diagnostics);
    diags.extend(indels.diagnostics);

    Ok(Some(OrientedTables {
        qualities,
        substitutions: substitutions.value,
        indels: indels.value,
    }))
}

/**
 * Smooth the collected insert sizes. Single-end data, or a sample the KDE can't be fitted
 * to, leaves the profile without an insert size distribution.
 */
fn fit_insert_size(
    insert_sizes: &[f64],
    diags: &mut Vec<Diagnostic>,
) -> Option<InsertSizeDistribution> {
    if insert_sizes.is_empty() {
        diagnostics::record(
            diags,
            Diagnostic::InsertSizeUnavailable {
                reason: "no paired alignments were observed".to_string(),
            },
        );
        return None;
    }

    match kde::insert_size_cdf(insert_sizes) {
        Ok((grid, cdf)) => Some(InsertSizeDistribution {
            grid,
            cdf,
            mean: util::mean(insert_sizes),
        }),
        Err(e) => {
            diagnostics::record(
                diags,
                Diagnostic::InsertSizeUnavailable {
                    reason: e.to_string(),
                },
            );
            None
        }
    }
}

/**
 * Build the error profile from everything the accumulator collected. The accumulator is
 * consumed, its matrices are not needed once the tables are built.
 *
 * args
 *  acc: accumulator holding a complete pass over the alignments
 *
 * returns
 *  the validated profile and every diagnostic recorded while accumulating and fitting
 */
pub fn fit_profile(acc: CountAccumulator) -> Result<Fitted<ErrorProfile>> {
    let mut diags = acc.diagnostics().to_vec();

    if acc.dropped_events > 0 {
        diagnostics::record(
            &mut diags,
            Diagnostic::EventsBeyondMatrix {
                count: acc.dropped_events,
                max_read_length: acc.max_read_length,
            },
        );
    }

    let read_length = derive_read_length(&acc.read_lengths, acc.max_read_length)
        .ok_or(ModelError::NoQualityData)?;

    info!(
        "Fitting tables for {}bp reads from {} alignments ({} with indels)",
        read_length,
        acc.num_alignments(),
        acc.num_indel_reads()
    );

    let forward = fit_orientation(&acc, read_length, Orientation::Forward, &mut diags)?;
    let reverse = fit_orientation(&acc, read_length, Orientation::Reverse, &mut diags)?;

    let (forward, reverse) = match (forward, reverse) {
        (Some(f), Some(r)) => (f, r),
        (Some(f), None) => {
            diagnostics::record(
                &mut diags,
                Diagnostic::OrientationMissing {
                    orientation: Orientation::Reverse,
                },
            );
            (f.clone(), f)
        }
        (None, Some(r)) => {
            diagnostics::record(
                &mut diags,
                Diagnostic::OrientationMissing {
                    orientation: Orientation::Forward,
                },
            );
            (r.clone(), r)
        }
        (None, None) => return Err(ModelError::NoQualityData),
    };

    let profile = ErrorProfile {
        read_length,
        insert_size: fit_insert_size(&acc.insert_sizes, &mut diags),
        quality_hist_forward: forward.qualities,
        quality_hist_reverse: reverse.qualities,
        subst_choices_forward: forward.substitutions,
        subst_choices_reverse: reverse.substitutions,
        indel_rates_forward: forward.indels,
        indel_rates_reverse: reverse.indels,
    };

    profile.validate()?;

    Ok(Fitted::new(profile, diags))
}

#[cfg(test)]
#[path = "tests/fit_tests.rs"]
mod fit_tests;
