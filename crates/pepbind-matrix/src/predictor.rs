//! Matrix-backed predictor for the SMM family.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use pepbind_common::{Allele, BindRecord, Method, Peptide, Result};
use pepbind_predict::FixedLengthPredictor;

use crate::cache::{MatrixCache, MatrixKey};
use crate::matrix::StabilizedMatrix;

/// Peptide lengths scored when none are configured.
pub const DEFAULT_LENGTHS: [usize; 4] = [8, 9, 10, 11];

/// Scores uniform-length batches against the matrix for (method, allele, length).
///
/// Records carry no percentile rank. Wrap in
/// [`LengthBucketed`](pepbind_predict::LengthBucketed) to accept mixed lengths.
#[derive(Debug, Clone)]
pub struct MatrixPredictor {
    method: Method,
    matrices: Arc<MatrixCache>,
    lengths: BTreeSet<usize>,
}

impl MatrixPredictor {
    pub fn new(method: Method, matrices: Arc<MatrixCache>) -> Self {
        Self {
            method,
            matrices,
            lengths: DEFAULT_LENGTHS.into_iter().collect(),
        }
    }

    pub fn with_lengths<I: IntoIterator<Item = usize>>(mut self, lengths: I) -> Self {
        self.lengths = lengths.into_iter().collect();
        self
    }

    pub fn matrices(&self) -> &Arc<MatrixCache> {
        &self.matrices
    }
}

fn score_record(matrix: &StabilizedMatrix, peptide: &Peptide) -> Result<BindRecord> {
    BindRecord::with_strength(peptide.clone(), matrix.score(peptide)?)
}

impl FixedLengthPredictor for MatrixPredictor {
    fn method(&self) -> Method {
        self.method
    }

    fn is_installed(&self) -> bool {
        self.matrices.root().join(self.method.name()).is_dir()
    }

    fn supports_length(&self, length: usize) -> bool {
        self.lengths.contains(&length)
    }

    fn predict_uniform(
        &self,
        allele: &Allele,
        length: usize,
        peptides: &[Peptide],
    ) -> Result<Vec<BindRecord>> {
        let key = MatrixKey::new(self.method, allele.clone(), length);
        let matrix = self.matrices.get_or_load(&key)?;
        debug!(%key, n = peptides.len(), "Scoring with matrix");

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            peptides
                .par_iter()
                .map(|p| score_record(&matrix, p))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            peptides.iter().map(|p| score_record(&matrix, p)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pepbind_common::BindError;
    use pepbind_predict::{LengthBucketed, Predictor};
    use pepbind_test_utils::fixtures::write_uniform_matrix;

    fn setup() -> (tempfile::TempDir, Allele, LengthBucketed<MatrixPredictor>) {
        let dir = tempfile::tempdir().unwrap();
        let allele = Allele::new("HLA-A*02:01").unwrap();
        write_uniform_matrix(dir.path(), Method::Smm, &allele, 8, 0.25, 0.0);
        write_uniform_matrix(dir.path(), Method::Smm, &allele, 9, 0.25, 0.0);
        let cache = Arc::new(MatrixCache::new(dir.path()));
        let predictor = LengthBucketed::new(MatrixPredictor::new(Method::Smm, cache));
        (dir, allele, predictor)
    }

    #[test]
    fn test_mixed_lengths_scored_in_input_order() {
        let (_dir, allele, predictor) = setup();
        let peptides = Peptide::parse_all(["GILGFVFTL", "SIINFEKL", "YWDRNTQIY"]).unwrap();

        let records = predictor.predict_batch(&allele, &peptides).unwrap();

        // 10^(0.25 * len)
        assert_eq!(records.len(), 3);
        assert!((records[0].strength() - 10f64.powf(2.25)).abs() < 1e-9);
        assert!((records[1].strength() - 100.0).abs() < 1e-9);
        assert_eq!(records[2].peptide().as_str(), "YWDRNTQIY");
        assert!(records.iter().all(|r| r.percentile().is_none()));

        // Only the two lengths seen were loaded
        assert_eq!(predictor.inner().matrices().len(), 2);
    }

    #[test]
    fn test_unsupported_length_loads_nothing() {
        let (_dir, allele, predictor) = setup();
        let peptides = Peptide::parse_all(["GILGFVFTL", "SIINFEKLSIINFEKL"]).unwrap();

        let err = predictor.predict_batch(&allele, &peptides).unwrap_err();
        assert!(matches!(err, BindError::UnsupportedLength { length: 16, .. }));
        assert!(predictor.inner().matrices().is_empty());
    }

    #[test]
    fn test_missing_matrix_fails_the_batch() {
        let (_dir, allele, predictor) = setup();
        let peptides = Peptide::parse_all(["GILGFVFTLA"]).unwrap();
        assert!(matches!(
            predictor.predict_batch(&allele, &peptides),
            Err(BindError::MatrixNotFound(_))
        ));
    }

    #[test]
    fn test_installed_when_method_directory_exists() {
        let (_dir, _allele, predictor) = setup();
        assert!(predictor.is_installed());

        let empty = tempfile::tempdir().unwrap();
        let other = MatrixPredictor::new(Method::SmmPmbec, Arc::new(MatrixCache::new(empty.path())));
        assert!(!other.is_installed());
    }

    /// Needs the published SMM matrices under `$PEPBIND_MATRIX_DIR`.
    #[test]
    #[ignore]
    fn test_published_smm_reference_value() {
        let root = std::env::var("PEPBIND_MATRIX_DIR").expect("PEPBIND_MATRIX_DIR not set");
        let predictor = LengthBucketed::new(MatrixPredictor::new(
            Method::Smm,
            Arc::new(MatrixCache::new(root)),
        ));
        let allele = Allele::new("HLA-A*01:01").unwrap();
        let record = predictor
            .predict_one(&allele, &Peptide::new("YWDRNTQIY").unwrap())
            .unwrap();
        assert!((record.strength() - 167.70654039).abs() < 1e-8, "{}", record.strength());
    }
}
