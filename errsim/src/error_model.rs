/**
 * file: error_model.rs
 * desc: Sample quality scores, substitutions, indels and insert sizes from a fitted error
 *       profile.
 */
use rand::Rng;
use rand_distr::{Distribution, WeightedAliasIndex};

use shared::error::{ModelError, Result};
use shared::nucleotide::{Nucleotide, Orientation};
use shared::profile::ErrorProfile;
use shared::util;

/**
 * STRUCTS
 */

/**
 * Decides whether a base is substituted given a uniform draw and the base's error
 * probability.
 */
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MutationRule {
    // Substitute when the draw falls below the error probability, low quality bases mutate
    // more often
    #[default]
    ErrorProbability,
    // Substitute when the draw exceeds the error probability, the behavior of older models
    Legacy,
}

impl MutationRule {
    pub fn should_mutate(self, draw: f64, error_probability: f64) -> bool {
        match self {
            MutationRule::ErrorProbability => draw < error_probability,
            MutationRule::Legacy => draw > error_probability,
        }
    }
}

/**
 * Read-only sampler over a fitted profile. Every sampling method takes the caller's RNG so
 * a single model can be shared between threads.
 *
 * fields
 *  profile:         the fitted profile
 *  quality_forward: one weighted sampler over the quality grid per forward read position
 *  quality_reverse: one weighted sampler over the quality grid per reverse read position
 *  rule:            substitution decision rule
 */
pub struct ErrorModel {
    profile: ErrorProfile,
    quality_forward: Vec<WeightedAliasIndex<f64>>,
    quality_reverse: Vec<WeightedAliasIndex<f64>>,
    rule: MutationRule,
}

/**
 * FUNCTIONS
 */

fn build_samplers(
    profile: &ErrorProfile,
    orientation: Orientation,
) -> Result<Vec<WeightedAliasIndex<f64>>> {
    profile
        .quality_histograms(orientation)
        .iter()
        .enumerate()
        .map(|(position, hist)| {
            WeightedAliasIndex::new(hist.weights.clone()).map_err(|e| {
                ModelError::InvalidProfile(format!(
                    "{} quality weights at position {} can't be sampled: {}",
                    orientation, position, e
                ))
            })
        })
        .collect()
}

impl ErrorModel {
    /**
     * Validate the profile and build the per position quality samplers.
     */
    pub fn new(profile: ErrorProfile, rule: MutationRule) -> Result<Self> {
        profile.validate()?;

        let quality_forward = build_samplers(&profile, Orientation::Forward)?;
        let quality_reverse = build_samplers(&profile, Orientation::Reverse)?;

        Ok(ErrorModel {
            profile,
            quality_forward,
            quality_reverse,
            rule,
        })
    }

    pub fn read_length(&self) -> usize {
        self.profile.read_length
    }

    pub fn profile(&self) -> &ErrorProfile {
        &self.profile
    }

    pub fn rule(&self) -> MutationRule {
        self.rule
    }

    fn check_length(&self, orientation: Orientation, requested: usize) -> Result<()> {
        if requested > self.profile.read_length {
            return Err(ModelError::SequenceTooLong {
                orientation,
                read_length: self.profile.read_length,
                requested,
            });
        }

        Ok(())
    }

    /**
     * Draw a quality score for each of the first `length` read positions. Positions are
     * independent, each score comes from that position's histogram.
     *
     * args
     *  orientation: forward (R1) or reverse (R2) histograms
     *  length:      number of scores, at most the profile's read length
     *  rng:         random number generator
     */
    pub fn gen_phred_scores<R: Rng + ?Sized>(
        &self,
        orientation: Orientation,
        length: usize,
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        self.check_length(orientation, length)?;

        let samplers = match orientation {
            Orientation::Forward => &self.quality_forward,
            Orientation::Reverse => &self.quality_reverse,
        };
        let histograms = self.profile.quality_histograms(orientation);

        Ok(samplers
            .iter()
            .zip(histograms.iter())
            .take(length)
            .map(|(dist, hist)| hist.scores[dist.sample(rng)].round() as u8)
            .collect())
    }

    /**
     * Introduce substitutions. Each base is considered independently: its quality score is
     * turned into an error probability and compared against a uniform draw using the
     * model's mutation rule. Mutated bases are replaced with an alternative picked from the
     * position's substitution table. Anything other than A, C, G or T is left alone.
     *
     * args
     *  sequence:    bases to mutate
     *  qualities:   phred score for each base
     *  orientation: forward (R1) or reverse (R2) tables
     *  rng:         random number generator
     *
     * returns
     *  the mutated sequence, always the same length as the input
     */
    pub fn mutate_sequence<R: Rng + ?Sized>(
        &self,
        sequence: &[u8],
        qualities: &[u8],
        orientation: Orientation,
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        if sequence.len() != qualities.len() {
            return Err(ModelError::LengthMismatch {
                sequence: sequence.len(),
                quality: qualities.len(),
            });
        }

        self.check_length(orientation, sequence.len())?;

        let choices = self.profile.substitution_choices(orientation);

        Ok(sequence
            .iter()
            .zip(qualities.iter())
            .zip(choices.iter())
            .map(|((nt, q), choice)| {
                let draw: f64 = rng.gen();

                if !self
                    .rule
                    .should_mutate(draw, util::convert_phred_to_probability(*q))
                {
                    return *nt;
                }

                match Nucleotide::from_byte(*nt) {
                    Some(base) => choice.get(base).pick(rng.gen()).to_byte(),
                    None => *nt,
                }
            })
            .collect())
    }

    /**
     * Introduce insertions and deletions. After each base, every nucleotide is inserted
     * with its insertion rate at that position, then the base itself is removed with its
     * deletion rate.
     *
     * returns
     *  the edited sequence, its length can differ from the input
     */
    pub fn introduce_indels<R: Rng + ?Sized>(
        &self,
        sequence: &[u8],
        orientation: Orientation,
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        self.check_length(orientation, sequence.len())?;

        let rates = self.profile.indel_rates(orientation);
        let mut edited = Vec::with_capacity(sequence.len());

        for (nt, rate) in sequence.iter().zip(rates.iter()) {
            let mut inserted = Vec::new();

            for n in Nucleotide::ALL {
                if rng.gen::<f64>() < rate.insertion(n) {
                    inserted.push(n.to_byte());
                }
            }

            let deleted = match Nucleotide::from_byte(*nt) {
                Some(base) => rng.gen::<f64>() < rate.deletion(base),
                None => false,
            };

            if !deleted {
                edited.push(*nt);
            }

            edited.extend(inserted);
        }

        Ok(edited)
    }

    /**
     * Draw an insert size from the fitted distribution by inverting its CDF.
     *
     * returns
     *  the insert size, or None if the profile was fitted without paired reads
     */
    pub fn random_insert_size<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        let insert = self.profile.insert_size.as_ref()?;
        let u: f64 = rng.gen();
        let idx = insert
            .cdf
            .partition_point(|c| *c < u)
            .min(insert.grid.len().saturating_sub(1));

        insert.grid.get(idx).map(|size| size.round().max(0.0) as usize)
    }
}

#[cfg(test)]
#[path = "tests/error_model_tests.rs"]
mod error_model_tests;
