/**
 * file: nucleotide.rs
 * desc: Nucleotide and read orientation types.
 */
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ModelError;

/**
 * The four unambiguous nucleotides. The declaration order (A, T, C, G) is the order used by
 * the substitution and indel count matrices.
 */
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Nucleotide {
    A,
    T,
    C,
    G,
}

impl Nucleotide {
    pub const ALL: [Nucleotide; 4] = [Nucleotide::A, Nucleotide::T, Nucleotide::C, Nucleotide::G];

    /**
     * Parse a single base, ignoring case. Anything other than A, T, C or G (N, IUPAC codes,
     * gaps) returns None.
     */
    pub fn from_byte(b: u8) -> Option<Nucleotide> {
        match b {
            b'A' | b'a' => Some(Nucleotide::A),
            b'T' | b't' => Some(Nucleotide::T),
            b'C' | b'c' => Some(Nucleotide::C),
            b'G' | b'g' => Some(Nucleotide::G),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Nucleotide::A => b'A',
            Nucleotide::T => b'T',
            Nucleotide::C => b'C',
            Nucleotide::G => b'G',
        }
    }

    // Position of this base in Nucleotide::ALL
    pub fn index(self) -> usize {
        match self {
            Nucleotide::A => 0,
            Nucleotide::T => 1,
            Nucleotide::C => 2,
            Nucleotide::G => 3,
        }
    }
}

impl std::fmt::Display for Nucleotide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_byte() as char)
    }
}

/**
 * Which mate a read (or a fitted table) belongs to. Forward is the first segment (R1) and is
 * also used for single-end reads, reverse is the last segment (R2).
 */
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    pub const BOTH: [Orientation; 2] = [Orientation::Forward, Orientation::Reverse];
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Forward => write!(f, "forward"),
            Orientation::Reverse => write!(f, "reverse"),
        }
    }
}

impl FromStr for Orientation {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" | "f" | "1" | "r1" => Ok(Orientation::Forward),
            "reverse" | "r" | "2" | "r2" => Ok(Orientation::Reverse),
            _ => Err(ModelError::InvalidOrientation(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_nucleotide_from_byte() {
        assert_eq!(Nucleotide::from_byte(b'a'), Some(Nucleotide::A));
        assert_eq!(Nucleotide::from_byte(b'G'), Some(Nucleotide::G));
        assert_eq!(Nucleotide::from_byte(b'N'), None);
        assert_eq!(Nucleotide::from_byte(b'-'), None);
    }

    #[test]
    fn test_nucleotide_index_matches_order() {
        for (i, n) in Nucleotide::ALL.iter().enumerate() {
            assert_eq!(n.index(), i);
        }
    }

    #[test]
    fn test_orientation_from_str() {
        assert_eq!("forward".parse::<Orientation>().unwrap(), Orientation::Forward);
        assert_eq!("R2".parse::<Orientation>().unwrap(), Orientation::Reverse);
        assert_eq!(Orientation::Reverse.to_string(), "reverse");
    }

    #[test]
    fn test_invalid_orientation_is_an_error() {
        match "sideways".parse::<Orientation>() {
            Err(ModelError::InvalidOrientation(s)) => assert_eq!(s, "sideways"),
            other => panic!("expected InvalidOrientation, got {:?}", other),
        }
    }
}
