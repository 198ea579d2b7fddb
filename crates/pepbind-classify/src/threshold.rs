//! Affinity / percentile binder thresholds.

use serde::{Deserialize, Serialize};

use pepbind_common::{BindError, BindRecord, Result};

/// An affinity bound (nM), a percentile bound, or both.
///
/// A record is bound if it satisfies either bound that is set. A record with
/// an unknown percentile can only pass through the affinity bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThreshold", into = "RawThreshold")]
pub struct Threshold {
    affinity: Option<f64>,
    percentile: Option<f64>,
}

impl Threshold {
    pub fn new(affinity: Option<f64>, percentile: Option<f64>) -> Result<Self> {
        if affinity.is_none() && percentile.is_none() {
            return Err(BindError::InvalidThreshold(
                "at least one of affinity or percentile must be set".to_string(),
            ));
        }
        if let Some(nm) = affinity {
            if !nm.is_finite() || nm <= 0.0 {
                return Err(BindError::InvalidThreshold(format!(
                    "affinity bound must be positive, got {}",
                    nm
                )));
            }
        }
        if let Some(rank) = percentile {
            if !rank.is_finite() || rank <= 0.0 || rank > 100.0 {
                return Err(BindError::InvalidThreshold(format!(
                    "percentile bound must be in (0, 100], got {}",
                    rank
                )));
            }
        }
        Ok(Self { affinity, percentile })
    }

    pub fn affinity(nm: f64) -> Result<Self> {
        Self::new(Some(nm), None)
    }

    pub fn percentile(rank: f64) -> Result<Self> {
        Self::new(None, Some(rank))
    }

    pub fn both(nm: f64, rank: f64) -> Result<Self> {
        Self::new(Some(nm), Some(rank))
    }

    pub fn affinity_bound(&self) -> Option<f64> {
        self.affinity
    }

    pub fn percentile_bound(&self) -> Option<f64> {
        self.percentile
    }

    pub fn is_bound(&self, record: &BindRecord) -> bool {
        let by_affinity = self.affinity.is_some_and(|nm| record.strength() <= nm);
        let by_percentile = match (self.percentile, record.percentile()) {
            (Some(bound), Some(rank)) => rank <= bound,
            _ => false,
        };
        by_affinity || by_percentile
    }

    pub fn count_binders<'a, I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = &'a BindRecord>,
    {
        records.into_iter().filter(|r| self.is_bound(r)).count()
    }

    /// Bound records, in input order.
    pub fn get_binders<'a, I>(&self, records: I) -> Vec<&'a BindRecord>
    where
        I: IntoIterator<Item = &'a BindRecord>,
    {
        records.into_iter().filter(|r| self.is_bound(r)).collect()
    }
}

#[derive(Serialize, Deserialize)]
struct RawThreshold {
    #[serde(default)]
    affinity: Option<f64>,
    #[serde(default)]
    percentile: Option<f64>,
}

impl TryFrom<RawThreshold> for Threshold {
    type Error = BindError;

    fn try_from(raw: RawThreshold) -> Result<Self> {
        Threshold::new(raw.affinity, raw.percentile)
    }
}

impl From<Threshold> for RawThreshold {
    fn from(t: Threshold) -> Self {
        Self {
            affinity: t.affinity,
            percentile: t.percentile,
        }
    }
}
