/**
 * file: alignment.rs
 * desc: Functions related to parsing alignment data. Turns the CIGAR string, MD tag and read
 *       sequence of a SAM record into the aligned record used by the event dispatcher.
 */
use shared::error::{ModelError, Result};
use shared::util;

/**
 * STRUCTS
 */

/**
 * CIGAR operation types. '=' and 'X' are folded into Match since mismatches are recovered
 * from the MD tag.
 */
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CigarKind {
    Match,
    Insertion,
    Deletion,
    SoftClip,
    HardClip,
    Skip,
    Padding,
}

impl CigarKind {
    pub fn from_code(code: u8) -> Option<CigarKind> {
        match code {
            b'M' | b'=' | b'X' => Some(CigarKind::Match),
            b'I' => Some(CigarKind::Insertion),
            b'D' => Some(CigarKind::Deletion),
            b'S' => Some(CigarKind::SoftClip),
            b'H' => Some(CigarKind::HardClip),
            b'N' => Some(CigarKind::Skip),
            b'P' => Some(CigarKind::Padding),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CigarOp {
    pub kind: CigarKind,
    pub len: usize,
}

impl CigarOp {
    pub fn new(kind: CigarKind, len: usize) -> Self {
        CigarOp { kind, len }
    }
}

/**
 * One operation from an expanded MD tag, one per reference base in the alignment.
 */
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MdOp {
    Match,
    // Reference base at a mismatch
    Mismatch(u8),
    // Reference base removed by a deletion
    Deleted(u8),
}

/**
 * A single column of the pairwise alignment.
 *
 * fields
 *  query_position: 0-indexed position in the read (soft clipped bases included)
 *  query_base:     read base, '-' when the column is a deletion
 *  reference_base: reference base, uppercase when it matches the read, lowercase at
 *                  mismatches and '-' when the column is an insertion
 */
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AlignedBase {
    pub query_position: usize,
    pub query_base: u8,
    pub reference_base: u8,
}

/**
 * Everything the dispatcher needs to know about one aligned read.
 *
 * fields
 *  cigar:                    ordered CIGAR operations
 *  query_sequence:           full read sequence
 *  query_alignment_sequence: read sequence without soft clipped bases
 *  aligned_bases:            columns of the pairwise alignment
 */
#[derive(Clone, Debug, PartialEq)]
pub struct AlignmentRecord {
    pub cigar: Vec<CigarOp>,
    pub query_sequence: Vec<u8>,
    pub query_alignment_sequence: Vec<u8>,
    pub aligned_bases: Vec<AlignedBase>,
}

impl AlignmentRecord {
    /**
     * Build an aligned record from its CIGAR operations, the raw MD tag and the read
     * sequence.
     */
    pub fn from_parts(cigar: Vec<CigarOp>, md_tag: &[u8], sequence: &[u8]) -> Result<Self> {
        let md = expand_md_tag(md_tag, reference_span(&cigar)?)?;
        let (reference, query) = reconstruct_alignment(&cigar, &md, sequence)?;

        let leading_clip = clipped_bases(cigar.iter());
        let trailing_clip = clipped_bases(cigar.iter().rev());

        if leading_clip + trailing_clip > sequence.len() {
            return Err(ModelError::AlignmentMismatch(format!(
                "soft clips ({}) are longer than the read ({})",
                leading_clip + trailing_clip,
                sequence.len()
            )));
        }

        let mut aligned_bases = Vec::with_capacity(reference.len());
        let mut query_position = leading_clip;

        for (r, q) in reference.iter().zip(query.iter()) {
            let reference_base = if *r == b'-' || *q == b'-' {
                *r
            } else if r.eq_ignore_ascii_case(q) {
                r.to_ascii_uppercase()
            } else {
                r.to_ascii_lowercase()
            };

            aligned_bases.push(AlignedBase {
                query_position,
                query_base: *q,
                reference_base,
            });

            // Deletions don't consume read bases
            if *q != b'-' {
                query_position += 1;
            }
        }

        Ok(AlignmentRecord {
            query_alignment_sequence: sequence[leading_clip..sequence.len() - trailing_clip]
                .to_vec(),
            query_sequence: sequence.to_vec(),
            cigar,
            aligned_bases,
        })
    }

    /**
     * The same alignment seen from the other strand, i.e. in the order the bases were
     * sequenced for a read that aligned to the reverse strand. CIGAR operations and columns
     * are reversed, bases are complemented and read positions are mirrored.
     */
    pub fn reverse_complement(&self) -> AlignmentRecord {
        let len = self.query_sequence.len();

        let aligned_bases = self
            .aligned_bases
            .iter()
            .rev()
            .map(|b| AlignedBase {
                // A deletion sits in front of the read base at its position, once mirrored
                // that's the base following the mirrored previous base
                query_position: if b.query_base == b'-' {
                    len - b.query_position
                } else {
                    len - 1 - b.query_position
                },
                query_base: util::complement(b.query_base),
                reference_base: util::complement(b.reference_base),
            })
            .collect();

        AlignmentRecord {
            cigar: self.cigar.iter().rev().copied().collect(),
            query_sequence: util::reverse_complement(&self.query_sequence),
            query_alignment_sequence: util::reverse_complement(&self.query_alignment_sequence),
            aligned_bases,
        }
    }
}

/**
 * FUNCTIONS
 */

// Soft clipped bases at one end of the read, hard clips can sit outside soft clips
fn clipped_bases<'a, I: Iterator<Item = &'a CigarOp>>(ops: I) -> usize {
    ops.take_while(|op| matches!(op.kind, CigarKind::SoftClip | CigarKind::HardClip))
        .filter(|op| op.kind == CigarKind::SoftClip)
        .map(|op| op.len)
        .sum()
}

/**
 * Parse a CIGAR string, e.g. 2M1I3M2D, into a list of operations.
 *
 * args
 *  cigar: the original, unexpanded CIGAR string
 *
 * returns
 *  the CIGAR operations in order, or an error if the string is malformed
 */
pub fn parse_cigar(cigar: &[u8]) -> Result<Vec<CigarOp>> {
    let malformed = |reason: &str| ModelError::InvalidCigar {
        cigar: util::bytes_to_string(cigar),
        reason: reason.to_string(),
    };
    let mut ops = Vec::new();
    let mut run: Option<usize> = None;

    for c in cigar {
        if c.is_ascii_digit() {
            let digit = (*c - b'0') as usize;

            run = Some(
                run.unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|r| r.checked_add(digit))
                    .ok_or_else(|| malformed("run length overflows"))?,
            );
            continue;
        }

        let kind = CigarKind::from_code(*c)
            .ok_or_else(|| malformed(&format!("unknown operation '{}'", *c as char)))?;
        let len = run
            .take()
            .ok_or_else(|| malformed(&format!("operation '{}' has no length", *c as char)))?;

        ops.push(CigarOp::new(kind, len));
    }

    if run.is_some() {
        return Err(malformed("trailing run length without an operation"));
    }

    Ok(ops)
}

/**
 * Fully expand the given CIGAR operations. e.g., 2M1I3M2D into MMIMMMDD
 */
pub fn expand_cigar(cigar: &[CigarOp]) -> Vec<CigarKind> {
    cigar
        .iter()
        .flat_map(|op| std::iter::repeat(op.kind).take(op.len))
        .collect()
}

/**
 * Number of reference bases covered by the CIGAR operations the MD tag describes, i.e.
 * matches and deletions.
 */
pub fn reference_span(cigar: &[CigarOp]) -> Result<usize> {
    cigar
        .iter()
        .filter(|op| matches!(op.kind, CigarKind::Match | CigarKind::Deletion))
        .try_fold(0usize, |span, op| span.checked_add(op.len))
        .ok_or_else(|| ModelError::AlignmentMismatch("CIGAR reference span overflows".into()))
}

/**
 * Fully expand the given MD tag.
 * e.g., 2C1^GC into [Match, Match, Mismatch(C), Match, Deleted(G), Deleted(C)]
 *
 * args
 *  md:             the original, raw MD tag
 *  reference_span: reference bases covered by the alignment, the tag can't describe more
 *
 * returns
 *  an expanded MD tag, one operation per reference base
 */
pub fn expand_md_tag(md: &[u8], reference_span: usize) -> Result<Vec<MdOp>> {
    let malformed = |reason: &str| {
        ModelError::AlignmentMismatch(format!(
            "MD tag {} {}",
            util::bytes_to_string(md),
            reason
        ))
    };
    let too_long = || malformed(&format!("covers more than {} reference bases", reference_span));

    let mut new_md = Vec::new();
    let mut md_iter = md.iter().peekable();

    while let Some(c) = md_iter.next() {
        match *c {
            b'0'..=b'9' => {
                // It could be more than a single number...
                let mut matches = (*c - b'0') as usize;

                while let Some(d) = md_iter.peek().filter(|d| d.is_ascii_digit()) {
                    matches = matches
                        .checked_mul(10)
                        .and_then(|m| m.checked_add((**d - b'0') as usize))
                        .ok_or_else(|| malformed("has a run length that overflows"))?;
                    md_iter.next();
                }

                if new_md.len() + matches > reference_span {
                    return Err(too_long());
                }

                new_md.extend(std::iter::repeat(MdOp::Match).take(matches));
            }
            // This is a deletion, the deletion character should be followed by a string of bases
            b'^' => {
                while let Some(b) = md_iter.peek().filter(|b| b.is_ascii_alphabetic()) {
                    new_md.push(MdOp::Deleted(b.to_ascii_uppercase()));
                    md_iter.next();
                }
            }
            b if b.is_ascii_alphabetic() => new_md.push(MdOp::Mismatch(b.to_ascii_uppercase())),
            other => {
                return Err(malformed(&format!(
                    "has an unexpected character '{}'",
                    other as char
                )))
            }
        }

        if new_md.len() > reference_span {
            return Err(too_long());
        }
    }

    Ok(new_md)
}

/**
 * This uses the CIGAR operations, MD tag, and read (query) sequence to reconstruct the
 * reference sequence and its alignment to the query sequence. Soft clipped bases are
 * consumed from the read but left out of the alignment.
 *
 * args
 *  cigar:    CIGAR operations
 *  md:       an expanded MD tag
 *  sequence: the read (query) sequence
 *
 * returns
 *  a tuple containing
 *      0: the aligned and reconstructed reference sequence
 *      1: the aligned query sequence
 * both returned sequences are aligned to one another and are equal length
 */
pub fn reconstruct_alignment(
    cigar: &[CigarOp],
    md: &[MdOp],
    sequence: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut reference = Vec::new();
    let mut query = Vec::new();
    let mut md_iter = md.iter();
    let mut seq_iter = sequence.iter();

    let short_read =
        || ModelError::AlignmentMismatch("CIGAR consumes more bases than the read has".into());
    let short_md = || {
        ModelError::AlignmentMismatch("CIGAR covers more reference bases than the MD tag".into())
    };

    for kind in expand_cigar(cigar) {
        match kind {
            // Deletion from reference
            CigarKind::Deletion => match md_iter.next().ok_or_else(short_md)? {
                MdOp::Deleted(b) | MdOp::Mismatch(b) => {
                    reference.push(*b);
                    query.push(b'-');
                }
                MdOp::Match => {
                    return Err(ModelError::AlignmentMismatch(
                        "MD tag has no reference base for a deletion".into(),
                    ))
                }
            },
            // Insertion into reference
            CigarKind::Insertion => {
                reference.push(b'-');
                query.push(*seq_iter.next().ok_or_else(short_read)?);
            }
            CigarKind::Match => {
                let q = *seq_iter.next().ok_or_else(short_read)?;

                match md_iter.next().ok_or_else(short_md)? {
                    MdOp::Match => reference.push(q),
                    MdOp::Mismatch(b) => reference.push(*b),
                    MdOp::Deleted(_) => {
                        return Err(ModelError::AlignmentMismatch(
                            "MD tag has a deletion where the CIGAR has a match".into(),
                        ))
                    }
                }

                query.push(q);
            }
            // Soft mask, read base is not part of the alignment
            CigarKind::SoftClip => {
                seq_iter.next().ok_or_else(short_read)?;
            }
            // Hard mask, skipped regions and padding, nothing to do
            CigarKind::HardClip | CigarKind::Skip | CigarKind::Padding => continue,
        }
    }

    Ok((reference, query))
}
