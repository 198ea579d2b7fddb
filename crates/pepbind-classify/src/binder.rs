//! Three-level binder classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use pepbind_common::{BindError, BindRecord, MeasureKind, Method, Result};

fn default_strong_percentile() -> f64 {
    0.5
}

fn default_weak_percentile() -> f64 {
    2.0
}

fn default_strong_affinity() -> f64 {
    50.0
}

fn default_weak_affinity() -> f64 {
    500.0
}

/// Cutoffs for [`BinderType::classify`]. A value at a cutoff passes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinderCutoffs {
    #[serde(default = "default_strong_percentile")]
    pub strong_percentile: f64,
    #[serde(default = "default_weak_percentile")]
    pub weak_percentile: f64,
    /// nM
    #[serde(default = "default_strong_affinity")]
    pub strong_affinity: f64,
    /// nM
    #[serde(default = "default_weak_affinity")]
    pub weak_affinity: f64,
}

impl Default for BinderCutoffs {
    fn default() -> Self {
        Self {
            strong_percentile: default_strong_percentile(),
            weak_percentile: default_weak_percentile(),
            strong_affinity: default_strong_affinity(),
            weak_affinity: default_weak_affinity(),
        }
    }
}

impl BinderCutoffs {
    /// Every cutoff positive and finite, strong no looser than weak.
    pub fn validate(&self) -> Result<()> {
        let all = [
            ("strong_percentile", self.strong_percentile),
            ("weak_percentile", self.weak_percentile),
            ("strong_affinity", self.strong_affinity),
            ("weak_affinity", self.weak_affinity),
        ];
        if let Some((name, value)) = all.iter().find(|(_, v)| !v.is_finite() || *v <= 0.0) {
            return Err(BindError::InvalidThreshold(format!("{} must be positive, got {}", name, value)));
        }
        if self.strong_percentile > self.weak_percentile {
            return Err(BindError::InvalidThreshold(format!(
                "strong_percentile {} is looser than weak_percentile {}",
                self.strong_percentile, self.weak_percentile
            )));
        }
        if self.strong_affinity > self.weak_affinity {
            return Err(BindError::InvalidThreshold(format!(
                "strong_affinity {} is looser than weak_affinity {}",
                self.strong_affinity, self.weak_affinity
            )));
        }
        Ok(())
    }
}

/// Fail unless `method` reports IC50 affinities.
pub fn require_affinity(method: Method) -> Result<()> {
    match method.kind() {
        MeasureKind::Affinity => Ok(()),
        kind => Err(BindError::WrongMeasure {
            method,
            kind,
            expected: MeasureKind::Affinity,
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BinderType {
    Strong,
    Weak,
    Unbound,
}

impl BinderType {
    /// Classify by percentile rank when known, falling back to affinity.
    ///
    /// The percentile is checked against the strong then weak cutoffs first.
    /// Only when it is unknown or fails both is the strength checked, so a
    /// record with a low rank is STRONG even if its IC50 alone is UNBOUND.
    /// The strength is read as an IC50 in nM; see [`BinderType::classify_for`]
    /// when the producing method is known.
    pub fn classify(record: &BindRecord, cutoffs: &BinderCutoffs) -> Self {
        if let Some(rank) = record.percentile() {
            if rank <= cutoffs.strong_percentile {
                return BinderType::Strong;
            }
            if rank <= cutoffs.weak_percentile {
                return BinderType::Weak;
            }
        }

        let nm = record.strength();
        if nm <= cutoffs.strong_affinity {
            BinderType::Strong
        } else if nm <= cutoffs.weak_affinity {
            BinderType::Weak
        } else {
            BinderType::Unbound
        }
    }

    /// [`BinderType::classify`] for records produced by `method`, which must
    /// measure affinity. A half-life is not an IC50.
    pub fn classify_for(method: Method, record: &BindRecord, cutoffs: &BinderCutoffs) -> Result<Self> {
        require_affinity(method)?;
        Ok(Self::classify(record, cutoffs))
    }

    pub fn is_binder(self) -> bool {
        self != BinderType::Unbound
    }
}

impl fmt::Display for BinderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinderType::Strong => write!(f, "STRONG"),
            BinderType::Weak => write!(f, "WEAK"),
            BinderType::Unbound => write!(f, "UNBOUND"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pepbind_common::Peptide;
    use pretty_assertions::assert_eq;

    fn record(strength: f64, percentile: Option<f64>) -> BindRecord {
        BindRecord::new(Peptide::new("GILGFVFTL").unwrap(), strength, percentile).unwrap()
    }

    fn classify(strength: f64, percentile: Option<f64>) -> BinderType {
        BinderType::classify(&record(strength, percentile), &BinderCutoffs::default())
    }

    #[test]
    fn test_stability_records_are_not_classified() {
        // 0.1 h half-life would pass the 50 nM cutoff if read as an IC50
        let short_lived = record(0.1, None);
        let err = BinderType::classify_for(Method::NetMhcStabPan, &short_lived, &BinderCutoffs::default())
            .unwrap_err();
        assert!(matches!(
            err,
            BindError::WrongMeasure { method: Method::NetMhcStabPan, kind: MeasureKind::Stability, .. }
        ));

        let binder = BinderType::classify_for(Method::NetMhcPan, &short_lived, &BinderCutoffs::default());
        assert_eq!(binder.unwrap(), BinderType::Strong);
    }

    #[test]
    fn test_percentile_takes_precedence() {
        assert_eq!(classify(10000.0, Some(0.4)), BinderType::Strong);
        assert_eq!(classify(10000.0, Some(1.0)), BinderType::Weak);
    }

    #[test]
    fn test_falls_back_to_affinity() {
        // Rank fails both cutoffs, affinity still applies
        assert_eq!(classify(20.0, Some(40.0)), BinderType::Strong);
        assert_eq!(classify(300.0, None), BinderType::Weak);
        assert_eq!(classify(10000.0, Some(40.0)), BinderType::Unbound);
        assert_eq!(classify(10000.0, None), BinderType::Unbound);
    }

    #[test]
    fn test_cutoffs_are_inclusive() {
        assert_eq!(classify(10000.0, Some(0.5)), BinderType::Strong);
        assert_eq!(classify(500.0, None), BinderType::Weak);
    }

    #[test]
    fn test_is_binder() {
        assert!(BinderType::Strong.is_binder());
        assert!(BinderType::Weak.is_binder());
        assert!(!BinderType::Unbound.is_binder());
        assert_eq!(BinderType::Unbound.to_string(), "UNBOUND");
    }

    #[test]
    fn test_cutoffs_validation() {
        assert!(BinderCutoffs::default().validate().is_ok());

        let swapped = BinderCutoffs {
            strong_percentile: 3.0,
            ..BinderCutoffs::default()
        };
        assert!(swapped.validate().is_err());

        let negative = BinderCutoffs {
            weak_affinity: -1.0,
            ..BinderCutoffs::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_partial_cutoffs_deserialize_with_defaults() {
        let cutoffs: BinderCutoffs = serde_json::from_str(r#"{"weak_affinity": 1000.0}"#).unwrap();
        assert_eq!(
            cutoffs,
            BinderCutoffs {
                weak_affinity: 1000.0,
                ..BinderCutoffs::default()
            }
        );
        assert_eq!(serde_json::to_string(&BinderType::Weak).unwrap(), "\"WEAK\"");
    }
}
