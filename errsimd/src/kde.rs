/**
 * file: kde.rs
 * desc: Gaussian kernel density estimation used to smooth insert size and quality score
 *       samples into cumulative distributions.
 */
use std::f64::consts::PI;

use rayon::prelude::*;

use shared::error::{ModelError, Result};
use shared::profile::MAX_QUALITY;
use shared::util;

/**
 * CONSTANTS
 */

// Points on the insert size grid
pub const INSERT_SIZE_GRID_POINTS: usize = 1000;

// Numerator of the bandwidth factor, the factor is this over the sample std. deviation
const BANDWIDTH_NUMERATOR: f64 = 0.2;

/**
 * STRUCTS
 */

/**
 * One dimensional gaussian KDE.
 *
 * fields
 *  samples:   the observed values
 *  bandwidth: standard deviation of each kernel
 */
#[derive(Clone, Debug)]
pub struct GaussianKde {
    samples: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /**
     * Fit a KDE to the given samples. The bandwidth factor is 0.2 / std and the kernel
     * width is that factor scaled by the sample standard deviation (n - 1 denominator).
     *
     * args
     *  samples: finite values with a positive standard deviation
     */
    pub fn new(samples: &[f64]) -> Result<Self> {
        if samples.is_empty() {
            return Err(ModelError::EmptySample);
        }

        if let Some(x) = samples.iter().find(|x| !x.is_finite()) {
            return Err(ModelError::NonFiniteSample(*x));
        }

        let std = util::sample_std_deviation(samples);

        if std <= 0.0 || !std.is_finite() {
            return Err(ModelError::DegenerateSample(std));
        }

        let factor = BANDWIDTH_NUMERATOR / std;

        Ok(GaussianKde {
            samples: samples.to_vec(),
            bandwidth: factor * std,
        })
    }

    #[cfg(test)]
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        gaussian(x, &self.samples, self.bandwidth)
    }
}

/**
 * FUNCTIONS
 */

/**
 * Density of a gaussian KDE at x.
 */
fn gaussian(x: f64, xs: &[f64], bandwidth: f64) -> f64 {
    let sum: f64 = xs
        .iter()
        .map(|f| (x - f) / bandwidth)
        .map(|f| (-0.5 * f.powi(2)).exp())
        .sum();

    sum / ((2.0 * PI).sqrt() * xs.len() as f64 * bandwidth)
}

/**
 * Fit a KDE to the samples, evaluate it on the grid and return the normalized cumulative
 * sum of the densities.
 *
 * args
 *  samples: observed values
 *  grid:    points the density is evaluated at
 *
 * returns
 *  a non-decreasing CDF, one value per grid point, ending at 1
 */
pub fn cdf_on_grid(samples: &[f64], grid: &[f64]) -> Result<Vec<f64>> {
    let kde = GaussianKde::new(samples)?;

    let mut cdf = Vec::with_capacity(grid.len());
    let mut total = 0.0;

    for x in grid {
        total += kde.evaluate(*x);
        cdf.push(total);
    }

    if total <= 0.0 || !total.is_finite() {
        return Err(ModelError::DegenerateDensity);
    }

    Ok(cdf.into_iter().map(|c| c / total).collect())
}

/**
 * Smooth the observed insert sizes over an evenly spaced grid spanning their range.
 *
 * returns
 *  a tuple containing
 *      0: the grid
 *      1: the CDF at each grid point
 */
pub fn insert_size_cdf(samples: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
    if samples.is_empty() {
        return Err(ModelError::EmptySample);
    }

    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let grid = util::linspace(min, max, INSERT_SIZE_GRID_POINTS);
    let cdf = cdf_on_grid(samples, &grid)?;

    Ok((grid, cdf))
}

/**
 * Candidate phred scores, 0 through 40.
 */
pub fn quality_grid() -> Vec<f64> {
    (0..=MAX_QUALITY).map(f64::from).collect()
}

/**
 * Turn per-read quality arrays into per-position samples. Scores above the top of the
 * quality grid are clamped to it and every read is cut to the shortest array.
 *
 * args
 *  qualities: one quality array per read
 *
 * returns
 *  one sample per read position, each holding a score from every read
 */
pub fn transpose_qualities(qualities: &[Vec<u8>]) -> Vec<Vec<f64>> {
    let positions = qualities.iter().map(|q| q.len()).min().unwrap_or(0);

    (0..positions)
        .map(|p| {
            qualities
                .iter()
                .map(|q| f64::from(q[p].min(MAX_QUALITY)))
                .collect()
        })
        .collect()
}

/**
 * Fit a quality CDF on the quality grid for every read position. Positions are fitted in
 * parallel and returned in position order.
 */
pub fn quality_cdfs(positions: &[Vec<f64>]) -> Vec<Result<Vec<f64>>> {
    let grid = quality_grid();

    positions
        .par_iter()
        .map(|samples| cdf_on_grid(samples, &grid))
        .collect()
}

/**
 * Convert a CDF into per grid point weights, i.e. its first differences.
 */
pub fn cdf_to_weights(cdf: &[f64]) -> Vec<f64> {
    let mut previous = 0.0;

    cdf.iter()
        .map(|c| {
            let w = (c - previous).max(0.0);
            previous = *c;
            w
        })
        .collect()
}

#[cfg(test)]
mod tests {

    use super::*;

    fn assert_valid_cdf(cdf: &[f64]) {
        assert!(cdf.windows(2).all(|w| w[0] <= w[1]));
        assert!((cdf.last().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bandwidth_is_factor_times_std() {
        let kde = GaussianKde::new(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        assert!((kde.bandwidth() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_density_peaks_at_the_samples() {
        let kde = GaussianKde::new(&[10.0, 20.0]).unwrap();

        assert!(kde.evaluate(10.0) > kde.evaluate(15.0));
        assert!((kde.evaluate(10.0) - kde.evaluate(20.0)).abs() < 1e-12);
    }

    #[test]
    fn test_cdf_is_monotonic_and_normalized() {
        let samples = vec![30.0, 32.0, 35.0, 35.0, 36.0, 38.0, 40.0, 12.0];
        let cdf = cdf_on_grid(&samples, &quality_grid()).unwrap();

        assert_eq!(cdf.len(), 41);
        assert_valid_cdf(&cdf);
        // No mass below the lowest sample
        assert!(cdf[5] < 1e-6);
    }

    #[test]
    fn test_insert_size_cdf_spans_the_sample_range() {
        let samples: Vec<f64> = (0..200).map(|i| 300.0 + (i % 50) as f64).collect();
        let (grid, cdf) = insert_size_cdf(&samples).unwrap();

        assert_eq!(grid.len(), INSERT_SIZE_GRID_POINTS);
        assert_eq!(grid[0], 300.0);
        assert_eq!(grid[INSERT_SIZE_GRID_POINTS - 1], 349.0);
        assert_valid_cdf(&cdf);
    }

    #[test]
    fn test_degenerate_samples_are_rejected() {
        assert!(matches!(GaussianKde::new(&[]), Err(ModelError::EmptySample)));
        assert!(matches!(
            GaussianKde::new(&[3.0]),
            Err(ModelError::DegenerateSample(_))
        ));
        assert!(matches!(
            GaussianKde::new(&[3.0, 3.0, 3.0]),
            Err(ModelError::DegenerateSample(_))
        ));
        assert!(matches!(
            GaussianKde::new(&[3.0, f64::NAN]),
            Err(ModelError::NonFiniteSample(_))
        ));
    }

    #[test]
    fn test_density_far_from_the_grid_is_degenerate() {
        // Kernels of width 0.2 centered a long way from the grid underflow to zero
        let samples = vec![1.0e6, 1.0e6 + 1.0];

        assert!(matches!(
            cdf_on_grid(&samples, &quality_grid()),
            Err(ModelError::DegenerateDensity)
        ));
    }

    #[test]
    fn test_transpose_clamps_and_truncates() {
        let qualities = vec![vec![10, 41, 30], vec![20, 35]];
        let positions = transpose_qualities(&qualities);

        assert_eq!(positions, vec![vec![10.0, 20.0], vec![40.0, 35.0]]);
    }

    #[test]
    fn test_quality_cdfs_keep_position_order() {
        let positions = vec![vec![10.0, 11.0, 12.0], vec![30.0, 31.0, 32.0], vec![5.0]];
        let cdfs = quality_cdfs(&positions);

        assert_eq!(cdfs.len(), 3);
        let first = cdfs[0].as_ref().unwrap();
        let second = cdfs[1].as_ref().unwrap();
        // Mass sits lower for the first position
        assert!(first[20] > 0.99);
        assert!(second[20] < 0.01);
        assert!(matches!(cdfs[2], Err(ModelError::DegenerateSample(_))));
    }

    #[test]
    fn test_weights_sum_to_one() {
        let cdf = cdf_on_grid(&[20.0, 25.0, 30.0], &quality_grid()).unwrap();
        let weights = cdf_to_weights(&cdf);

        assert_eq!(weights.len(), cdf.len());
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(cdf_to_weights(&[0.25, 0.5, 1.0]), vec![0.25, 0.25, 0.5]);
    }
}
