/**
 * file: dispatch.rs
 * desc: Classify the bases and gaps of an aligned read into substitution and indel
 *       categories, keyed by their position in the read.
 */
use shared::nucleotide::Nucleotide;

use crate::alignment::{AlignmentRecord, CigarKind};
use crate::diagnostics::{self, Diagnostic};

/**
 * STRUCTS
 */

/**
 * Column of the substitution matrix. Each reference base owns four consecutive columns: the
 * match and its three mismatches.
 */
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SubstitutionCategory {
    MatchA,
    AToT,
    AToG,
    AToC,
    MatchT,
    TToA,
    TToG,
    TToC,
    MatchC,
    CToA,
    CToT,
    CToG,
    MatchG,
    GToA,
    GToT,
    GToC,
}

impl SubstitutionCategory {
    pub const ALL: [SubstitutionCategory; 16] = [
        SubstitutionCategory::MatchA,
        SubstitutionCategory::AToT,
        SubstitutionCategory::AToG,
        SubstitutionCategory::AToC,
        SubstitutionCategory::MatchT,
        SubstitutionCategory::TToA,
        SubstitutionCategory::TToG,
        SubstitutionCategory::TToC,
        SubstitutionCategory::MatchC,
        SubstitutionCategory::CToA,
        SubstitutionCategory::CToT,
        SubstitutionCategory::CToG,
        SubstitutionCategory::MatchG,
        SubstitutionCategory::GToA,
        SubstitutionCategory::GToT,
        SubstitutionCategory::GToC,
    ];

    /**
     * Look up a (reference base, read base) pair. An uppercase reference base marks a match
     * and must equal the read base, a lowercase reference base marks a mismatch against an
     * uppercase read base. Any other pair (N, IUPAC codes, gaps) has no category.
     */
    pub fn from_pair(reference: u8, query: u8) -> Option<SubstitutionCategory> {
        use SubstitutionCategory::*;

        match (reference, query) {
            (b'A', b'A') => Some(MatchA),
            (b'a', b'T') => Some(AToT),
            (b'a', b'G') => Some(AToG),
            (b'a', b'C') => Some(AToC),
            (b'T', b'T') => Some(MatchT),
            (b't', b'A') => Some(TToA),
            (b't', b'G') => Some(TToG),
            (b't', b'C') => Some(TToC),
            (b'C', b'C') => Some(MatchC),
            (b'c', b'A') => Some(CToA),
            (b'c', b'T') => Some(CToT),
            (b'c', b'G') => Some(CToG),
            (b'G', b'G') => Some(MatchG),
            (b'g', b'A') => Some(GToA),
            (b'g', b'T') => Some(GToT),
            (b'g', b'C') => Some(GToC),
            _ => None,
        }
    }

    // Column in the substitution matrix
    pub fn code(self) -> usize {
        self as usize
    }

    pub fn reference(self) -> Nucleotide {
        Nucleotide::ALL[self.code() / 4]
    }

    pub fn is_match(self) -> bool {
        self.code() % 4 == 0
    }
}

/**
 * Column of the indel matrix. Column 0 holds the match/substitution count and has no
 * category.
 */
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IndelCategory {
    Insertion(Nucleotide),
    Deletion(Nucleotide),
}

impl IndelCategory {
    pub fn code(self) -> usize {
        match self {
            IndelCategory::Insertion(n) => 1 + n.index(),
            IndelCategory::Deletion(n) => 5 + n.index(),
        }
    }
}

/**
 * How the query cursor moves over a deletion. Deletions don't consume read bases, but the
 * model this replaces moved the cursor backwards over them, which Retreat reproduces.
 */
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DeletionCursor {
    #[default]
    Retreat,
    Hold,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SubstitutionEvent {
    pub position: usize,
    pub category: SubstitutionCategory,
}

/**
 * Result of scanning a read's aligned bases.
 *
 * fields
 *  events:     one event per recognized (reference, read) pair
 *  has_indels: true if any pair was not recognized, which flags the read for indel dispatch
 */
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubstitutionScan {
    pub events: Vec<SubstitutionEvent>,
    pub has_indels: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IndelEvent {
    pub position: usize,
    pub category: IndelCategory,
}

/**
 * Indel events for one read. The events are computed up front, so the dispatch can be
 * iterated as many times as needed.
 */
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndelDispatch {
    pub events: Vec<IndelEvent>,
    pub diagnostics: Vec<Diagnostic>,
}

impl IndelDispatch {
    pub fn iter(&self) -> std::slice::Iter<'_, IndelEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<'a> IntoIterator for &'a IndelDispatch {
    type Item = &'a IndelEvent;
    type IntoIter = std::slice::Iter<'a, IndelEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/**
 * FUNCTIONS
 */

/**
 * Classify every aligned base of the read. Unrecognized pairs are dropped and flag the read
 * as carrying indels.
 */
pub fn dispatch_substitutions(record: &AlignmentRecord) -> SubstitutionScan {
    let mut scan = SubstitutionScan::default();

    for base in record.aligned_bases.iter() {
        match SubstitutionCategory::from_pair(base.reference_base, base.query_base) {
            Some(category) => scan.events.push(SubstitutionEvent {
                position: base.query_position,
                category,
            }),
            None => scan.has_indels = true,
        }
    }

    scan
}

// Base at the cursor if the cursor is inside the sequence
fn base_at(sequence: &[u8], cursor: isize) -> Option<u8> {
    usize::try_from(cursor)
        .ok()
        .and_then(|i| sequence.get(i))
        .copied()
}

/**
 * Walk the CIGAR operations of a read and emit one event per insertion or deletion.
 * Insertions are keyed by the first inserted base, deletions by the base of the query
 * alignment at the cursor. Ambiguous bases and cursors outside the read are skipped.
 *
 * args
 *  record: the aligned read
 *  cursor: how deletions move the query cursor
 *
 * returns
 *  the indel events, in CIGAR order, and any diagnostics
 */
pub fn dispatch_indels(record: &AlignmentRecord, cursor: DeletionCursor) -> IndelDispatch {
    let mut dispatch = IndelDispatch::default();
    let mut position: isize = 0;

    for op in record.cigar.iter() {
        let len = op.len as isize;

        let (sequence, deletion) = match op.kind {
            CigarKind::Match => {
                position += len;
                continue;
            }
            CigarKind::Insertion => (&record.query_sequence, false),
            CigarKind::Deletion => (&record.query_alignment_sequence, true),
            CigarKind::SoftClip | CigarKind::HardClip | CigarKind::Skip | CigarKind::Padding => {
                continue
            }
        };

        match base_at(sequence, position) {
            Some(b) => match Nucleotide::from_byte(b) {
                Some(n) => dispatch.events.push(IndelEvent {
                    position: position as usize,
                    category: if deletion {
                        IndelCategory::Deletion(n)
                    } else {
                        IndelCategory::Insertion(n)
                    },
                }),
                None => diagnostics::record(
                    &mut dispatch.diagnostics,
                    Diagnostic::AmbiguousIndelBase {
                        position: position as usize,
                        base: b,
                        deletion,
                    },
                ),
            },
            None => diagnostics::record(
                &mut dispatch.diagnostics,
                Diagnostic::CursorOutOfRange { cursor: position },
            ),
        }

        if !deletion {
            position += len;
        } else if cursor == DeletionCursor::Retreat {
            position -= len;
        }
    }

    dispatch
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::alignment::{parse_cigar, AlignedBase};
    use shared::profile::ProbabilityTable;

    fn record_from(cigar: &[u8], md: &[u8], seq: &[u8]) -> AlignmentRecord {
        AlignmentRecord::from_parts(parse_cigar(cigar).unwrap(), md, seq).unwrap()
    }

    fn single_pair(reference: u8, query: u8) -> AlignmentRecord {
        AlignmentRecord {
            cigar: vec![],
            query_sequence: vec![query],
            query_alignment_sequence: vec![query],
            aligned_bases: vec![AlignedBase {
                query_position: 0,
                query_base: query,
                reference_base: reference,
            }],
        }
    }

    #[test]
    fn test_category_codes_follow_declaration_order() {
        for (i, c) in SubstitutionCategory::ALL.iter().enumerate() {
            assert_eq!(c.code(), i);
        }
        assert!(SubstitutionCategory::MatchG.is_match());
        assert_eq!(SubstitutionCategory::CToG.reference(), Nucleotide::C);
    }

    #[test]
    fn test_mismatch_columns_line_up_with_table_alternatives() {
        // The probability table builder relies on the mismatch columns of each reference base
        // being ordered the same way as ProbabilityTable::alternatives_for
        for base in Nucleotide::ALL {
            let alternatives = ProbabilityTable::alternatives_for(base);

            for (offset, alt) in alternatives.iter().enumerate() {
                let category = SubstitutionCategory::from_pair(
                    base.to_byte().to_ascii_lowercase(),
                    alt.to_byte(),
                )
                .unwrap();

                assert_eq!(category.code(), base.index() * 4 + 1 + offset);
            }
        }
    }

    #[test]
    fn test_substitution_dispatch_recognizes_mismatch() {
        let scan = dispatch_substitutions(&single_pair(b'a', b'T'));

        assert!(!scan.has_indels);
        assert_eq!(
            scan.events,
            vec![SubstitutionEvent {
                position: 0,
                category: SubstitutionCategory::AToT
            }]
        );
    }

    #[test]
    fn test_substitution_dispatch_flags_unrecognized_pair() {
        let scan = dispatch_substitutions(&single_pair(b'n', b'A'));

        assert!(scan.has_indels);
        assert!(scan.events.is_empty());

        // Uppercase reference against a different read base isn't a valid key either
        assert!(dispatch_substitutions(&single_pair(b'A', b'T')).has_indels);
    }

    #[test]
    fn test_substitution_dispatch_over_whole_read() {
        let scan = dispatch_substitutions(&record_from(b"5M", b"1T3", b"ACGTA"));

        assert!(!scan.has_indels);
        assert_eq!(scan.events.len(), 5);
        assert_eq!(scan.events[1].category, SubstitutionCategory::TToC);
        assert!(scan
            .events
            .iter()
            .enumerate()
            .all(|(i, e)| e.position == i));
    }

    #[test]
    fn test_gaps_flag_the_read() {
        let scan = dispatch_substitutions(&record_from(b"2M1I2M", b"4", b"ACGTT"));

        assert!(scan.has_indels);
        assert_eq!(scan.events.len(), 4);
    }

    #[test]
    fn test_insertion_uses_first_inserted_base() {
        // AC + inserted GT + TA
        let record = record_from(b"2M2I2M", b"4", b"ACGTTA");
        let dispatch = dispatch_indels(&record, DeletionCursor::Retreat);

        assert_eq!(
            dispatch.events,
            vec![IndelEvent {
                position: 2,
                category: IndelCategory::Insertion(Nucleotide::G)
            }]
        );
        // Restartable, a second pass sees the same events
        assert_eq!((&dispatch).into_iter().count(), dispatch.iter().count());
    }

    #[test]
    fn test_deletion_cursor_retreats() {
        // 3M 2D 2M 1I 1M
        // retreat: 3M -> 3, D at 3 then 1, 2M -> 3, I at 3 then 4
        let record = record_from(b"3M2D2M1I1M", b"3^GG3", b"ACGTATC");
        let dispatch = dispatch_indels(&record, DeletionCursor::Retreat);

        assert_eq!(
            dispatch.events,
            vec![
                IndelEvent {
                    position: 3,
                    category: IndelCategory::Deletion(Nucleotide::T)
                },
                IndelEvent {
                    position: 3,
                    category: IndelCategory::Insertion(Nucleotide::T)
                },
            ]
        );
    }

    #[test]
    fn test_deletion_cursor_holds() {
        // hold: 3M -> 3, D at 3, 2M -> 5, I at 5 keyed by the inserted T
        let record = record_from(b"3M2D2M1I1M", b"3^GG3", b"ACGTATC");
        let dispatch = dispatch_indels(&record, DeletionCursor::Hold);

        assert_eq!(
            dispatch.events,
            vec![
                IndelEvent {
                    position: 3,
                    category: IndelCategory::Deletion(Nucleotide::T)
                },
                IndelEvent {
                    position: 5,
                    category: IndelCategory::Insertion(Nucleotide::T)
                },
            ]
        );
    }

    #[test]
    fn test_ambiguous_insertion_is_skipped() {
        let record = record_from(b"2M1I2M", b"4", b"ACNTT");
        let dispatch = dispatch_indels(&record, DeletionCursor::Retreat);

        assert!(dispatch.is_empty());
        assert_eq!(
            dispatch.diagnostics,
            vec![Diagnostic::AmbiguousIndelBase {
                position: 2,
                base: b'N',
                deletion: false
            }]
        );
    }

    #[test]
    fn test_negative_cursor_is_skipped() {
        // 1M 3D 1D: the first deletion moves the cursor to -2
        let record = AlignmentRecord {
            cigar: parse_cigar(b"1M3D1D1M").unwrap(),
            query_sequence: b"AC".to_vec(),
            query_alignment_sequence: b"AC".to_vec(),
            aligned_bases: vec![],
        };
        let dispatch = dispatch_indels(&record, DeletionCursor::Retreat);

        assert_eq!(dispatch.len(), 1);
        assert_eq!(
            dispatch.diagnostics,
            vec![Diagnostic::CursorOutOfRange { cursor: -2 }]
        );
    }

    #[test]
    fn test_indel_codes() {
        assert_eq!(IndelCategory::Insertion(Nucleotide::A).code(), 1);
        assert_eq!(IndelCategory::Insertion(Nucleotide::G).code(), 4);
        assert_eq!(IndelCategory::Deletion(Nucleotide::A).code(), 5);
        assert_eq!(IndelCategory::Deletion(Nucleotide::G).code(), 8);
    }
}
