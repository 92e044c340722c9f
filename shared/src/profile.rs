/**
 * file: profile.rs
 * desc: The fitted error profile and the tables it is made of. errsimd produces these, errsim
 *       reads them. Nothing in here is mutated once a profile has been built.
 */
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::nucleotide::{Nucleotide, Orientation};

/**
 * CONSTANTS
 */

// Highest phred score on the quality grid, the grid is 0..=MAX_QUALITY
pub const MAX_QUALITY: u8 = 40;

// Tolerance used when checking that probabilities or CDFs are normalized
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/**
 * STRUCTS
 */

/**
 * Discrete distribution over the three bases a given base can be miscalled as.
 *
 * fields
 *  alternatives:  the three alternative bases, in substitution category order
 *  probabilities: probability of each alternative, sums to 1
 */
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ProbabilityTable {
    pub alternatives: [Nucleotide; 3],
    pub probabilities: [f64; 3],
}

impl ProbabilityTable {
    /**
     * The alternative bases for the given base, ordered the same way as the mismatch columns
     * of the substitution matrix (e.g. A -> T, G, C).
     */
    pub fn alternatives_for(base: Nucleotide) -> [Nucleotide; 3] {
        match base {
            Nucleotide::A => [Nucleotide::T, Nucleotide::G, Nucleotide::C],
            Nucleotide::T => [Nucleotide::A, Nucleotide::G, Nucleotide::C],
            Nucleotide::C => [Nucleotide::A, Nucleotide::T, Nucleotide::G],
            Nucleotide::G => [Nucleotide::A, Nucleotide::T, Nucleotide::C],
        }
    }

    pub fn new(base: Nucleotide, probabilities: [f64; 3]) -> Self {
        ProbabilityTable {
            alternatives: Self::alternatives_for(base),
            probabilities,
        }
    }

    // Equal rate of substitution to each alternative
    pub fn uniform(base: Nucleotide) -> Self {
        Self::new(base, [1.0 / 3.0; 3])
    }

    pub fn total(&self) -> f64 {
        self.probabilities.iter().sum()
    }

    /**
     * Select an alternative base using a uniform value in [0, 1). Rounding can leave the
     * cumulative sum slightly short of 1, in which case the last alternative with a non-zero
     * probability is returned.
     */
    pub fn pick(&self, u: f64) -> Nucleotide {
        let mut cumulative = 0.0;

        for (alt, p) in self.alternatives.iter().zip(self.probabilities.iter()) {
            cumulative += p;

            if u < cumulative {
                return *alt;
            }
        }

        self.alternatives
            .iter()
            .zip(self.probabilities.iter())
            .rev()
            .find(|(_, p)| **p > 0.0)
            .map(|(alt, _)| *alt)
            .unwrap_or(self.alternatives[2])
    }
}

/**
 * Substitution tables for every base at a single read position.
 */
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SubstitutionChoices {
    pub tables: [ProbabilityTable; 4],
}

impl SubstitutionChoices {
    pub fn uniform() -> Self {
        SubstitutionChoices {
            tables: Nucleotide::ALL.map(ProbabilityTable::uniform),
        }
    }

    pub fn get(&self, base: Nucleotide) -> &ProbabilityTable {
        &self.tables[base.index()]
    }
}

/**
 * Insertion and deletion rates at a single read position, indexed by Nucleotide::index.
 */
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct IndelRates {
    pub insertion: [f64; 4],
    pub deletion: [f64; 4],
}

impl IndelRates {
    pub fn insertion(&self, base: Nucleotide) -> f64 {
        self.insertion[base.index()]
    }

    pub fn deletion(&self, base: Nucleotide) -> f64 {
        self.deletion[base.index()]
    }
}

/**
 * Quality score distribution for a single read position.
 *
 * fields
 *  scores:  candidate phred scores (the fitting grid, 0..=40)
 *  weights: probability of each candidate score, sums to 1
 */
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct QualityHistogram {
    pub scores: Vec<f64>,
    pub weights: Vec<f64>,
}

/**
 * Smoothed insert size distribution.
 *
 * fields
 *  grid: evenly spaced insert sizes spanning the observed minimum and maximum
 *  cdf:  cumulative probability at each grid point, ends at 1
 *  mean: mean of the observed insert sizes
 */
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct InsertSizeDistribution {
    pub grid: Vec<f64>,
    pub cdf: Vec<f64>,
    pub mean: f64,
}

/**
 * The fitted error model. This is what gets written to and read from the model archive.
 *
 * fields
 *  read_length:           read length the tables were fitted for
 *  insert_size:           insert size distribution, None for single-end data
 *  quality_hist_forward:  per position quality distributions for forward (R1) reads
 *  quality_hist_reverse:  per position quality distributions for reverse (R2) reads
 *  subst_choices_forward: per position substitution tables for forward reads
 *  subst_choices_reverse: per position substitution tables for reverse reads
 *  indel_rates_forward:   per position insertion/deletion rates for forward reads
 *  indel_rates_reverse:   per position insertion/deletion rates for reverse reads
 */
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ErrorProfile {
    pub read_length: usize,
    pub insert_size: Option<InsertSizeDistribution>,
    pub quality_hist_forward: Vec<QualityHistogram>,
    pub quality_hist_reverse: Vec<QualityHistogram>,
    pub subst_choices_forward: Vec<SubstitutionChoices>,
    pub subst_choices_reverse: Vec<SubstitutionChoices>,
    pub indel_rates_forward: Vec<IndelRates>,
    pub indel_rates_reverse: Vec<IndelRates>,
}

impl ErrorProfile {
    pub fn quality_histograms(&self, orientation: Orientation) -> &[QualityHistogram] {
        match orientation {
            Orientation::Forward => &self.quality_hist_forward,
            Orientation::Reverse => &self.quality_hist_reverse,
        }
    }

    pub fn substitution_choices(&self, orientation: Orientation) -> &[SubstitutionChoices] {
        match orientation {
            Orientation::Forward => &self.subst_choices_forward,
            Orientation::Reverse => &self.subst_choices_reverse,
        }
    }

    pub fn indel_rates(&self, orientation: Orientation) -> &[IndelRates] {
        match orientation {
            Orientation::Forward => &self.indel_rates_forward,
            Orientation::Reverse => &self.indel_rates_reverse,
        }
    }

    /**
     * Check the structural invariants of the profile: every per-position table has exactly
     * read_length entries, substitution tables and quality weights are normalized, and the
     * insert size CDF is non-decreasing and ends at 1.
     */
    pub fn validate(&self) -> Result<()> {
        if self.read_length == 0 {
            return Err(ModelError::InvalidProfile("read length is zero".to_string()));
        }

        for orientation in Orientation::BOTH {
            let tables = [
                ("quality", self.quality_histograms(orientation).len()),
                ("substitution", self.substitution_choices(orientation).len()),
                ("indel", self.indel_rates(orientation).len()),
            ];

            for (name, len) in tables {
                if len != self.read_length {
                    return Err(ModelError::InvalidProfile(format!(
                        "{} {} tables cover {} positions, expected {}",
                        orientation, name, len, self.read_length
                    )));
                }
            }

            for (pos, hist) in self.quality_histograms(orientation).iter().enumerate() {
                let total: f64 = hist.weights.iter().sum();

                if hist.scores.len() != hist.weights.len()
                    || (total - 1.0).abs() > PROBABILITY_TOLERANCE
                {
                    return Err(ModelError::InvalidProfile(format!(
                        "{} quality histogram at position {} is not normalized",
                        orientation, pos
                    )));
                }
            }

            for (pos, choices) in self.substitution_choices(orientation).iter().enumerate() {
                if let Some(t) = choices
                    .tables
                    .iter()
                    .find(|t| (t.total() - 1.0).abs() > PROBABILITY_TOLERANCE)
                {
                    return Err(ModelError::InvalidProfile(format!(
                        "{} substitution table at position {} sums to {}",
                        orientation,
                        pos,
                        t.total()
                    )));
                }
            }
        }

        if let Some(insert) = &self.insert_size {
            let monotonic = insert.cdf.windows(2).all(|w| w[0] <= w[1]);
            let normalized = insert
                .cdf
                .last()
                .map(|last| (last - 1.0).abs() <= PROBABILITY_TOLERANCE)
                .unwrap_or(false);

            if insert.grid.len() != insert.cdf.len() || !monotonic || !normalized {
                return Err(ModelError::InvalidProfile(
                    "insert size CDF is malformed".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl std::fmt::Display for ErrorProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = String::new();

        s.push_str("<Error Profile>\n");
        s.push_str(&format!("read_length: {}\n", self.read_length));
        match &self.insert_size {
            Some(insert) => {
                s.push_str(&format!("insert_size_mean: {:.2}\n", insert.mean));
                s.push_str(&format!("insert_size_grid_points: {}\n", insert.grid.len()));
            }
            None => s.push_str("insert_size: none (single-end)\n"),
        }
        s.push_str(&format!(
            "quality_positions: {} forward, {} reverse\n",
            self.quality_hist_forward.len(),
            self.quality_hist_reverse.len()
        ));

        write!(f, "{}", s)
    }
}
