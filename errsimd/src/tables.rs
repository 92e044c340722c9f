/**
 * file: tables.rs
 * desc: Turn accumulated count matrices into per position substitution tables and indel
 *       rates.
 */
use shared::error::{ModelError, Result};
use shared::nucleotide::{Nucleotide, Orientation};
use shared::profile::{IndelRates, ProbabilityTable, SubstitutionChoices};

use crate::diagnostics::{self, Diagnostic, Fitted};
use crate::dispatch::{IndelCategory, SubstitutionCategory};
use crate::matrix::{IndelMatrix, SubstitutionMatrix, ALIGNED_COLUMN, SUBSTITUTION_COLUMNS};

/**
 * FUNCTIONS
 */

fn check_read_length(read_length: usize, rows: usize) -> Result<()> {
    if read_length > rows {
        return Err(ModelError::InvalidReadLength { read_length, rows });
    }

    Ok(())
}

/**
 * Build the substitution tables for a single orientation. For every position and base, the
 * three mismatch counts are divided by their sum. Bases without any mismatches get a
 * uniform table.
 *
 * args
 *  matrix:      substitution counts for the orientation
 *  read_length: number of positions to build tables for
 *  orientation: orientation the counts came from, only used for diagnostics
 *
 * returns
 *  one set of tables per position and the positions that fell back to uniform tables
 */
pub fn substitution_choices(
    matrix: &SubstitutionMatrix,
    read_length: usize,
    orientation: Orientation,
) -> Result<Fitted<Vec<SubstitutionChoices>>> {
    check_read_length(read_length, matrix.num_rows())?;

    let mut diags = Vec::new();
    let mut choices = Vec::with_capacity(read_length);

    for position in 0..read_length {
        let row = matrix
            .row(position)
            .copied()
            .unwrap_or([0; SUBSTITUTION_COLUMNS]);

        let tables = Nucleotide::ALL.map(|base| {
            // Mismatch columns of the base, in the same order as its table's alternatives
            let mut counts = [0u64; 3];
            let mismatches = SubstitutionCategory::ALL
                .iter()
                .filter(|c| c.reference() == base && !c.is_match());

            for (count, category) in counts.iter_mut().zip(mismatches) {
                *count = row[category.code()];
            }

            let total: u64 = counts.iter().sum();

            if total == 0 {
                diagnostics::record(
                    &mut diags,
                    Diagnostic::UniformFallback {
                        orientation,
                        position,
                        base,
                    },
                );

                return ProbabilityTable::uniform(base);
            }

            ProbabilityTable::new(base, counts.map(|c| c as f64 / total as f64))
        });

        choices.push(SubstitutionChoices { tables });
    }

    Ok(Fitted::new(choices, diags))
}

/**
 * Build the indel rates for a single orientation. Rates are the insertion and deletion
 * counts divided by the number of aligned bases at the position. Positions without aligned
 * bases get zero rates.
 *
 * args
 *  matrix:      indel counts for the orientation
 *  read_length: number of positions to build rates for
 *  orientation: orientation the counts came from, only used for diagnostics
 */
pub fn indel_rates(
    matrix: &IndelMatrix,
    read_length: usize,
    orientation: Orientation,
) -> Result<Fitted<Vec<IndelRates>>> {
    check_read_length(read_length, matrix.num_rows())?;

    let mut diags = Vec::new();
    let mut rates = Vec::with_capacity(read_length);

    for position in 0..read_length {
        let aligned = matrix.get(position, ALIGNED_COLUMN);

        if aligned == 0 {
            diagnostics::record(
                &mut diags,
                Diagnostic::NoAlignedBases {
                    orientation,
                    position,
                },
            );
            rates.push(IndelRates::default());
            continue;
        }

        let rate = |category: IndelCategory| {
            matrix.get(position, category.code()) as f64 / aligned as f64
        };

        rates.push(IndelRates {
            insertion: Nucleotide::ALL.map(|n| rate(IndelCategory::Insertion(n))),
            deletion: Nucleotide::ALL.map(|n| rate(IndelCategory::Deletion(n))),
        });
    }

    Ok(Fitted::new(rates, diags))
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::matrix::INDEL_COLUMNS;

    fn substitution_row(counts: &[(SubstitutionCategory, u64)]) -> [u64; SUBSTITUTION_COLUMNS] {
        let mut row = [0; SUBSTITUTION_COLUMNS];

        for (category, count) in counts {
            row[category.code()] = *count;
        }

        row
    }

    #[test]
    fn test_substitution_probabilities_follow_counts() {
        use SubstitutionCategory::*;

        let matrix = SubstitutionMatrix::from_rows(vec![substitution_row(&[
            (MatchA, 1000),
            (AToT, 30),
            (AToC, 10),
            (AToG, 10),
        ])]);
        let fitted = substitution_choices(&matrix, 1, Orientation::Forward).unwrap();
        let table = fitted.value[0].get(Nucleotide::A);

        assert_eq!(
            table.alternatives,
            [Nucleotide::T, Nucleotide::G, Nucleotide::C]
        );
        assert!((table.probabilities[0] - 0.6).abs() < 1e-12);
        assert!((table.probabilities[1] - 0.2).abs() < 1e-12);
        assert!((table.probabilities[2] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_bases_without_mismatches_fall_back_to_uniform() {
        use SubstitutionCategory::*;

        // Only A has mismatches, the other three bases are uniform
        let matrix = SubstitutionMatrix::from_rows(vec![substitution_row(&[
            (MatchA, 50),
            (MatchT, 50),
            (AToG, 3),
        ])]);
        let fitted = substitution_choices(&matrix, 1, Orientation::Reverse).unwrap();

        assert_eq!(fitted.value[0].get(Nucleotide::A).probabilities, [0.0, 1.0, 0.0]);
        assert_eq!(fitted.value[0].get(Nucleotide::T).probabilities, [1.0 / 3.0; 3]);
        assert_eq!(fitted.diagnostics.len(), 3);
        assert!(fitted.diagnostics.contains(&Diagnostic::UniformFallback {
            orientation: Orientation::Reverse,
            position: 0,
            base: Nucleotide::G
        }));
    }

    #[test]
    fn test_every_table_sums_to_one() {
        let rows = (0..20u64)
            .map(|i| {
                let mut row = [0; SUBSTITUTION_COLUMNS];
                for (c, cell) in row.iter_mut().enumerate() {
                    *cell = (i * 7 + c as u64 * 13) % 11;
                }
                row
            })
            .collect();
        let matrix = SubstitutionMatrix::from_rows(rows);
        let fitted = substitution_choices(&matrix, 20, Orientation::Forward).unwrap();

        for choices in fitted.value.iter() {
            for table in choices.tables.iter() {
                assert!((table.total() - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_read_length_past_the_matrix_is_an_error() {
        let matrix = SubstitutionMatrix::zeros(5);

        assert!(matches!(
            substitution_choices(&matrix, 6, Orientation::Forward),
            Err(ModelError::InvalidReadLength {
                read_length: 6,
                rows: 5
            })
        ));
        assert!(matches!(
            indel_rates(&IndelMatrix::zeros(5), 6, Orientation::Forward),
            Err(ModelError::InvalidReadLength { .. })
        ));
    }

    #[test]
    fn test_indel_rates_divide_by_aligned_bases() {
        let mut row = [0; INDEL_COLUMNS];
        row[ALIGNED_COLUMN] = 200;
        row[IndelCategory::Insertion(Nucleotide::C).code()] = 2;
        row[IndelCategory::Deletion(Nucleotide::A).code()] = 1;

        let matrix = IndelMatrix::from_rows(vec![row]);
        let fitted = indel_rates(&matrix, 1, Orientation::Forward).unwrap();
        let rates = &fitted.value[0];

        assert!(fitted.diagnostics.is_empty());
        assert!((rates.insertion(Nucleotide::C) - 0.01).abs() < 1e-12);
        assert!((rates.deletion(Nucleotide::A) - 0.005).abs() < 1e-12);
        assert_eq!(rates.insertion(Nucleotide::G), 0.0);
    }

    #[test]
    fn test_zero_aligned_bases_give_zero_rates() {
        let mut row = [0; INDEL_COLUMNS];
        row[IndelCategory::Insertion(Nucleotide::T).code()] = 4;

        let matrix = IndelMatrix::from_rows(vec![row]);
        let fitted = indel_rates(&matrix, 1, Orientation::Reverse).unwrap();

        assert_eq!(fitted.value[0], IndelRates::default());
        assert_eq!(
            fitted.diagnostics,
            vec![Diagnostic::NoAlignedBases {
                orientation: Orientation::Reverse,
                position: 0
            }]
        );
    }
}
