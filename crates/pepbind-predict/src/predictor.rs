//! Trait for binding prediction engines.
//!
//! Provides an abstraction over every way a binding record can be produced,
//! allowing the store layer to compute missing peptides without knowing
//! whether the numbers come from an in-process matrix or an external tool.

use pepbind_common::{Allele, BindError, BindRecord, Method, Peptide, Result};

/// A binding prediction engine for one [`Method`].
///
/// Implementations can use:
/// - stabilized scoring matrices (in-process)
/// - third-party executables (NetMHC family)
/// - canned data (testing)
pub trait Predictor: Send + Sync {
    /// Method whose records this engine produces.
    fn method(&self) -> Method;

    /// Whether the engine is usable, checked without running a prediction.
    fn is_installed(&self) -> bool;

    /// Predict one record per peptide.
    ///
    /// The output has exactly the length and order of `peptides`; duplicate
    /// inputs yield duplicate outputs at the same positions. An engine that
    /// cannot score every peptide fails the whole batch.
    fn predict_batch(&self, allele: &Allele, peptides: &[Peptide]) -> Result<Vec<BindRecord>>;

    /// Predict a single record (a batch of one).
    fn predict_one(&self, allele: &Allele, peptide: &Peptide) -> Result<BindRecord> {
        let records = self.predict_batch(allele, std::slice::from_ref(peptide))?;
        check_batch(self.method(), allele, std::slice::from_ref(peptide), &records)?;
        records.into_iter().next().ok_or_else(|| {
            BindError::Internal(format!("{} returned no record for {}", self.method(), peptide))
        })
    }
}

/// Verify that `records` answers `peptides` position by position.
///
/// A count mismatch or a record for the wrong peptide is an integration
/// error for the whole batch, never a per-item failure.
pub fn check_batch(
    method: Method,
    allele: &Allele,
    peptides: &[Peptide],
    records: &[BindRecord],
) -> Result<()> {
    if peptides.len() != records.len() {
        return Err(BindError::BatchSizeMismatch {
            method,
            allele: allele.to_string(),
            expected: peptides.len(),
            actual: records.len(),
        });
    }

    for (position, (peptide, record)) in peptides.iter().zip(records).enumerate() {
        if record.peptide() != peptide {
            return Err(BindError::PeptideMismatch {
                method,
                allele: allele.to_string(),
                position,
                expected: peptide.to_string(),
                actual: record.peptide().to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drops every peptide it is asked about.
    struct ShortPredictor;

    impl Predictor for ShortPredictor {
        fn method(&self) -> Method {
            Method::NetMhc
        }

        fn is_installed(&self) -> bool {
            true
        }

        fn predict_batch(&self, _allele: &Allele, _peptides: &[Peptide]) -> Result<Vec<BindRecord>> {
            Ok(vec![])
        }
    }

    fn allele() -> Allele {
        Allele::new("HLA-A*02:01").unwrap()
    }

    #[test]
    fn test_check_batch_accepts_matching_records() {
        let peptides = Peptide::parse_all(["SIINFEKL", "SIINFEKL"]).unwrap();
        let records: Vec<BindRecord> = peptides
            .iter()
            .map(|p| BindRecord::with_strength(p.clone(), 10.0).unwrap())
            .collect();
        assert!(check_batch(Method::Smm, &allele(), &peptides, &records).is_ok());
    }

    #[test]
    fn test_check_batch_rejects_count_mismatch() {
        let peptides = Peptide::parse_all(["SIINFEKL", "GILGFVFTL"]).unwrap();
        let records = vec![BindRecord::with_strength(peptides[0].clone(), 10.0).unwrap()];
        let err = check_batch(Method::Smm, &allele(), &peptides, &records).unwrap_err();
        assert!(matches!(err, BindError::BatchSizeMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_check_batch_rejects_reordered_records() {
        let peptides = Peptide::parse_all(["SIINFEKL", "GILGFVFTL"]).unwrap();
        let records = vec![
            BindRecord::with_strength(peptides[1].clone(), 10.0).unwrap(),
            BindRecord::with_strength(peptides[0].clone(), 10.0).unwrap(),
        ];
        let err = check_batch(Method::Smm, &allele(), &peptides, &records).unwrap_err();
        assert!(matches!(err, BindError::PeptideMismatch { position: 0, .. }));
    }

    #[test]
    fn test_predict_one_surfaces_empty_batch() {
        let peptide = Peptide::new("SIINFEKL").unwrap();
        let err = ShortPredictor.predict_one(&allele(), &peptide).unwrap_err();
        assert!(matches!(err, BindError::BatchSizeMismatch { expected: 1, actual: 0, .. }));
    }
}
