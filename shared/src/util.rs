/**
 * file: util.rs
 * desc: Misc. utility functions.
 */
use num_traits::Float;

/**
 * Sequence related functions
 */

/**
 * Generate the complement of the given nucleotide.
 * TODO: IUPAC support
 */
pub fn complement(n: u8) -> u8 {
    match n {
        b'A' => b'T',
        b'a' => b't',
        b'T' => b'A',
        b't' => b'a',
        b'C' => b'G',
        b'c' => b'g',
        b'G' => b'C',
        b'g' => b'c',
        x => x,
    }
}

/**
 * Given a sequence of nucleotides, generate the reverse complement.
 */
pub fn reverse_complement(nucs: &[u8]) -> Vec<u8> {
    nucs.iter()
        .rev()
        .map(|n| complement(*n))
        .collect::<Vec<u8>>()
}

/**
 * Convert a byte array into a string.
 *
 * args
 *  bs: byte array
 *
 * returns
 *  a string representation of the given bytes or an empty string if the conversion failed
 */
pub fn bytes_to_string(bs: &[u8]) -> String {
    std::str::from_utf8(bs).unwrap_or("").to_string()
}

/**
 * quality score functions
 */

/**
 * Encode a phred quality score into its ascii equivalent.
 */
pub fn encode_quality_score(s: u8) -> u8 {
    const PHRED_OFFSET: u8 = 33;

    s + PHRED_OFFSET
}

/**
 * Encode an array of phred quality score into their ascii representations.
 */
pub fn encode_quality_scores(scores: &[u8]) -> Vec<u8> {
    scores.iter().map(|q| encode_quality_score(*q)).collect()
}

/**
 * Convert a phred quality score to an error probability.
 * https://gatk.broadinstitute.org/hc/en-us/articles/360035531872-Phred-scaled-quality-scores
 *
 * args
 *  score: a phred quality score
 *
 * returns
 *  an error probability (miscalled base)
 */
pub fn convert_phred_to_probability(score: u8) -> f64 {
    10.0_f64.powf(-(score as f64) / 10.0)
}

/**
 * maths
 */

pub fn mean<T>(vs: &[T]) -> T
where
    T: Float,
{
    if vs.is_empty() {
        return T::zero();
    }

    vs.iter().fold(T::zero(), |ac: T, v| ac + *v)
        / num_traits::cast(vs.len()).unwrap_or_else(T::one)
}

/**
 * Variance with n - 1 in the denominator. Fewer than two values have no sample variance,
 * zero is returned.
 */
pub fn sample_variance<T>(vs: &[T]) -> T
where
    T: Float,
{
    if vs.len() < 2 {
        return T::zero();
    }

    let avg = mean(vs);

    vs.iter()
        .fold(T::zero(), |ac: T, v| ac + (*v - avg) * (*v - avg))
        / num_traits::cast(vs.len() - 1).unwrap_or_else(T::one)
}

pub fn sample_std_deviation<T>(vs: &[T]) -> T
where
    T: Float,
{
    sample_variance(vs).sqrt()
}

/**
 * Generate n evenly spaced values over [start, stop], both ends included.
 */
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;

            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}
