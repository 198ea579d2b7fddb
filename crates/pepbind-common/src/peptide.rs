//! Peptide sequences and the canonical residue alphabet.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{BindError, Result};

/// Number of residues in the canonical alphabet.
pub const ALPHABET_SIZE: usize = 20;

/// One of the 20 canonical amino acids.
///
/// Variant order is the canonical alphabet order `ACDEFGHIKLMNPQRSTVWY`;
/// [`Residue::index`] is the matrix column for the residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Residue {
    Ala,
    Cys,
    Asp,
    Glu,
    Phe,
    Gly,
    His,
    Ile,
    Lys,
    Leu,
    Met,
    Asn,
    Pro,
    Gln,
    Arg,
    Ser,
    Thr,
    Val,
    Trp,
    Tyr,
}

impl Residue {
    /// All residues in canonical order.
    pub const ALL: [Residue; ALPHABET_SIZE] = [
        Residue::Ala,
        Residue::Cys,
        Residue::Asp,
        Residue::Glu,
        Residue::Phe,
        Residue::Gly,
        Residue::His,
        Residue::Ile,
        Residue::Lys,
        Residue::Leu,
        Residue::Met,
        Residue::Asn,
        Residue::Pro,
        Residue::Gln,
        Residue::Arg,
        Residue::Ser,
        Residue::Thr,
        Residue::Val,
        Residue::Trp,
        Residue::Tyr,
    ];

    /// Parse a one-letter code (case-insensitive).
    pub fn from_code(code: char) -> Option<Self> {
        let residue = match code.to_ascii_uppercase() {
            'A' => Residue::Ala,
            'C' => Residue::Cys,
            'D' => Residue::Asp,
            'E' => Residue::Glu,
            'F' => Residue::Phe,
            'G' => Residue::Gly,
            'H' => Residue::His,
            'I' => Residue::Ile,
            'K' => Residue::Lys,
            'L' => Residue::Leu,
            'M' => Residue::Met,
            'N' => Residue::Asn,
            'P' => Residue::Pro,
            'Q' => Residue::Gln,
            'R' => Residue::Arg,
            'S' => Residue::Ser,
            'T' => Residue::Thr,
            'V' => Residue::Val,
            'W' => Residue::Trp,
            'Y' => Residue::Tyr,
            _ => return None,
        };
        Some(residue)
    }

    /// Upper-case one-letter code.
    pub fn code(self) -> char {
        match self {
            Residue::Ala => 'A',
            Residue::Cys => 'C',
            Residue::Asp => 'D',
            Residue::Glu => 'E',
            Residue::Phe => 'F',
            Residue::Gly => 'G',
            Residue::His => 'H',
            Residue::Ile => 'I',
            Residue::Lys => 'K',
            Residue::Leu => 'L',
            Residue::Met => 'M',
            Residue::Asn => 'N',
            Residue::Pro => 'P',
            Residue::Gln => 'Q',
            Residue::Arg => 'R',
            Residue::Ser => 'S',
            Residue::Thr => 'T',
            Residue::Val => 'V',
            Residue::Trp => 'W',
            Residue::Tyr => 'Y',
        }
    }

    /// Position in the canonical alphabet.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Residue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// An immutable peptide sequence.
///
/// Equality, ordering and hashing use the canonical (upper-case) text only.
/// Clones share the underlying buffers.
#[derive(Clone)]
pub struct Peptide {
    sequence: Arc<str>,
    residues: Arc<[Residue]>,
}

impl Peptide {
    /// Validate and build a peptide from its one-letter sequence.
    pub fn new(sequence: &str) -> Result<Self> {
        if sequence.is_empty() {
            return Err(BindError::InvalidPeptide {
                sequence: sequence.to_string(),
                reason: "empty sequence".to_string(),
            });
        }

        let residues = sequence
            .chars()
            .enumerate()
            .map(|(i, c)| {
                Residue::from_code(c).ok_or_else(|| BindError::InvalidPeptide {
                    sequence: sequence.to_string(),
                    reason: format!("invalid residue {:?} at position {}", c, i),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let canonical: String = residues.iter().map(|r| r.code()).collect();

        Ok(Self {
            sequence: Arc::from(canonical),
            residues: Arc::from(residues),
        })
    }

    /// Parse many sequences, failing on the first invalid one.
    pub fn parse_all<I, S>(sequences: I) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        sequences.into_iter().map(|s| Self::new(s.as_ref())).collect()
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    /// Always false; peptides are never empty.
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.sequence
    }

    /// Residue at `position`. Panics if `position >= len()`.
    pub fn residue_at(&self, position: usize) -> Residue {
        self.residues[position]
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }
}

impl PartialEq for Peptide {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for Peptide {}

impl Hash for Peptide {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sequence.hash(state);
    }
}

impl PartialOrd for Peptide {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Peptide {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sequence.cmp(&other.sequence)
    }
}

impl fmt::Debug for Peptide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Peptide").field(&&*self.sequence).finish()
    }
}

impl fmt::Display for Peptide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sequence)
    }
}

impl FromStr for Peptide {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Peptide {
    type Error = BindError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(&s)
    }
}

impl Serialize for Peptide {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.sequence)
    }
}

impl<'de> Deserialize<'de> for Peptide {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Peptide::new(&s).map_err(serde::de::Error::custom)
    }
}
