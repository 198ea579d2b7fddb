//! Binding prediction results.

use serde::{Deserialize, Serialize};

use crate::error::{BindError, Result};
use crate::peptide::Peptide;

/// One resolved binding measurement for a peptide.
///
/// `strength` is an IC50 (nM) for affinity methods or a half-life (hours) for
/// stability methods. `percentile` is `None` when the rank is unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBindRecord", into = "RawBindRecord")]
pub struct BindRecord {
    peptide: Peptide,
    strength: f64,
    percentile: Option<f64>,
}

impl BindRecord {
    /// Build a record, rejecting non-positive strengths and out-of-range ranks.
    ///
    /// `Some(NaN)` for the percentile is treated as unknown.
    pub fn new(peptide: Peptide, strength: f64, percentile: Option<f64>) -> Result<Self> {
        if !strength.is_finite() || strength <= 0.0 {
            return Err(BindError::InvalidRecord {
                peptide: peptide.to_string(),
                reason: format!("strength must be a positive finite number, got {}", strength),
            });
        }

        let percentile = percentile.filter(|p| !p.is_nan());
        if let Some(p) = percentile {
            if !(0.0..=100.0).contains(&p) {
                return Err(BindError::InvalidRecord {
                    peptide: peptide.to_string(),
                    reason: format!("percentile must be within [0, 100], got {}", p),
                });
            }
        }

        Ok(Self {
            peptide,
            strength,
            percentile,
        })
    }

    /// Record with an unknown percentile rank.
    pub fn with_strength(peptide: Peptide, strength: f64) -> Result<Self> {
        Self::new(peptide, strength, None)
    }

    pub fn peptide(&self) -> &Peptide {
        &self.peptide
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn percentile(&self) -> Option<f64> {
        self.percentile
    }

    pub fn has_percentile(&self) -> bool {
        self.percentile.is_some()
    }
}

#[derive(Serialize, Deserialize)]
struct RawBindRecord {
    peptide: Peptide,
    strength: f64,
    percentile: Option<f64>,
}

impl TryFrom<RawBindRecord> for BindRecord {
    type Error = BindError;

    fn try_from(raw: RawBindRecord) -> Result<Self> {
        BindRecord::new(raw.peptide, raw.strength, raw.percentile)
    }
}

impl From<BindRecord> for RawBindRecord {
    fn from(record: BindRecord) -> Self {
        Self {
            peptide: record.peptide,
            strength: record.strength,
            percentile: record.percentile,
        }
    }
}
