//! Length-bucketed batch dispatch.
//!
//! Several engines accept only one peptide length per invocation (a matrix is
//! trained for one length; the NetMHC tools take `-l` once per run). The cache
//! layer, however, asks for arbitrary mixes of lengths and expects the answer
//! in its own order. [`LengthBucketed`] bridges the two:
//!
//! 1. every length in the request is checked up front; one unsupported length
//!    fails the request before any engine call is made
//! 2. peptides are grouped by length, keeping their relative order
//! 3. each non-empty bucket is predicted with one engine call
//! 4. results are popped from their bucket queue in input order
//! 5. leftover or missing records are an internal-consistency error

use std::collections::{BTreeMap, VecDeque};

use tracing::debug;

use pepbind_common::{Allele, BindError, BindRecord, Method, Peptide, Result};

use crate::predictor::{check_batch, Predictor};

/// An engine that scores batches of a single peptide length.
pub trait FixedLengthPredictor: Send + Sync {
    fn method(&self) -> Method;

    fn is_installed(&self) -> bool;

    /// Whether `length` can be scored at all.
    fn supports_length(&self, length: usize) -> bool;

    /// Predict a batch whose peptides all have length `length`.
    fn predict_uniform(
        &self,
        allele: &Allele,
        length: usize,
        peptides: &[Peptide],
    ) -> Result<Vec<BindRecord>>;
}

/// Adapts a [`FixedLengthPredictor`] to the mixed-length [`Predictor`] contract.
pub struct LengthBucketed<P> {
    inner: P,
}

impl<P: FixedLengthPredictor> LengthBucketed<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Fail on the first peptide (in input order) whose length is unsupported.
    fn check_lengths(&self, allele: &Allele, peptides: &[Peptide]) -> Result<()> {
        match peptides.iter().find(|p| !self.inner.supports_length(p.len())) {
            Some(peptide) => Err(BindError::UnsupportedLength {
                method: self.inner.method(),
                allele: allele.to_string(),
                peptide: peptide.to_string(),
                length: peptide.len(),
            }),
            None => Ok(()),
        }
    }
}

/// Group peptides by length, preserving relative order inside each group.
fn bucket_by_length(peptides: &[Peptide]) -> BTreeMap<usize, Vec<Peptide>> {
    let mut buckets: BTreeMap<usize, Vec<Peptide>> = BTreeMap::new();
    for peptide in peptides {
        buckets.entry(peptide.len()).or_default().push(peptide.clone());
    }
    buckets
}

impl<P: FixedLengthPredictor> Predictor for LengthBucketed<P> {
    fn method(&self) -> Method {
        self.inner.method()
    }

    fn is_installed(&self) -> bool {
        self.inner.is_installed()
    }

    fn predict_batch(&self, allele: &Allele, peptides: &[Peptide]) -> Result<Vec<BindRecord>> {
        if peptides.is_empty() {
            return Ok(Vec::new());
        }

        let method = self.inner.method();
        self.check_lengths(allele, peptides)?;

        let mut queues: BTreeMap<usize, VecDeque<BindRecord>> = BTreeMap::new();
        for (length, bucket) in bucket_by_length(peptides) {
            debug!(%method, %allele, length, n = bucket.len(), "Dispatching length bucket");
            let records = self.inner.predict_uniform(allele, length, &bucket)?;
            check_batch(method, allele, &bucket, &records)?;
            queues.insert(length, VecDeque::from(records));
        }

        let mut output = Vec::with_capacity(peptides.len());
        for peptide in peptides {
            let record = queues
                .get_mut(&peptide.len())
                .and_then(VecDeque::pop_front)
                .ok_or_else(|| {
                    BindError::Internal(format!(
                        "{} bucket for length {} exhausted before {}",
                        method,
                        peptide.len(),
                        peptide
                    ))
                })?;
            output.push(record);
        }

        if let Some((length, queue)) = queues.iter().find(|(_, q)| !q.is_empty()) {
            return Err(BindError::Internal(format!(
                "{} bucket for length {} has {} undelivered records",
                method,
                length,
                queue.len()
            )));
        }
        if output.len() != peptides.len() {
            return Err(BindError::Internal(format!(
                "{} reassembled {} records for {} peptides",
                method,
                output.len(),
                peptides.len()
            )));
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    /// Scores a peptide by its length and first residue; records every call.
    struct RecordingEngine {
        lengths: Vec<usize>,
        calls: Mutex<Vec<(usize, Vec<String>)>>,
        drop_last: bool,
    }

    impl RecordingEngine {
        fn new(lengths: &[usize]) -> Self {
            Self {
                lengths: lengths.to_vec(),
                calls: Mutex::new(Vec::new()),
                drop_last: false,
            }
        }
    }

    impl FixedLengthPredictor for RecordingEngine {
        fn method(&self) -> Method {
            Method::NetMhcPan
        }

        fn is_installed(&self) -> bool {
            true
        }

        fn supports_length(&self, length: usize) -> bool {
            self.lengths.contains(&length)
        }

        fn predict_uniform(
            &self,
            _allele: &Allele,
            length: usize,
            peptides: &[Peptide],
        ) -> Result<Vec<BindRecord>> {
            assert!(peptides.iter().all(|p| p.len() == length), "mixed bucket");
            self.calls
                .lock()
                .push((length, peptides.iter().map(|p| p.to_string()).collect()));
            let mut records: Vec<BindRecord> = peptides
                .iter()
                .map(|p| {
                    let strength = (p.len() * 100 + p.residue_at(0).index()) as f64;
                    BindRecord::with_strength(p.clone(), strength).unwrap()
                })
                .collect();
            if self.drop_last {
                records.pop();
            }
            Ok(records)
        }
    }

    fn allele() -> Allele {
        Allele::new("HLA-A*02:01").unwrap()
    }

    #[test]
    fn test_results_follow_input_order() {
        let dispatcher = LengthBucketed::new(RecordingEngine::new(&[8, 9]));
        let peptides = Peptide::parse_all(["GILGFVFTL", "SIINFEKL", "YWDRNTQIY"]).unwrap();

        let records = dispatcher.predict_batch(&allele(), &peptides).unwrap();

        let got: Vec<&str> = records.iter().map(|r| r.peptide().as_str()).collect();
        assert_eq!(got, vec!["GILGFVFTL", "SIINFEKL", "YWDRNTQIY"]);

        // One call per length, ascending, relative order kept
        let calls = dispatcher.inner().calls.lock().clone();
        assert_eq!(
            calls,
            vec![
                (8, vec!["SIINFEKL".to_string()]),
                (9, vec!["GILGFVFTL".to_string(), "YWDRNTQIY".to_string()]),
            ]
        );
    }

    #[test]
    fn test_duplicates_get_their_own_positions() {
        let dispatcher = LengthBucketed::new(RecordingEngine::new(&[8, 9]));
        let peptides = Peptide::parse_all(["SIINFEKL", "GILGFVFTL", "SIINFEKL"]).unwrap();

        let records = dispatcher.predict_batch(&allele(), &peptides).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], records[2]);
        assert_eq!(records[1].peptide().as_str(), "GILGFVFTL");
    }

    #[test]
    fn test_unsupported_length_fails_before_dispatch() {
        let dispatcher = LengthBucketed::new(RecordingEngine::new(&[9]));
        let peptides = Peptide::parse_all(["GILGFVFTL", "SIINFEKLSIINFEKL"]).unwrap();

        let err = dispatcher.predict_batch(&allele(), &peptides).unwrap_err();
        match err {
            BindError::UnsupportedLength { length, peptide, .. } => {
                assert_eq!(length, 16);
                assert_eq!(peptide, "SIINFEKLSIINFEKL");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(dispatcher.inner().calls.lock().is_empty());
    }

    #[test]
    fn test_short_bucket_is_fatal() {
        let mut engine = RecordingEngine::new(&[8, 9]);
        engine.drop_last = true;
        let dispatcher = LengthBucketed::new(engine);
        let peptides = Peptide::parse_all(["GILGFVFTL", "SIINFEKL"]).unwrap();

        let err = dispatcher.predict_batch(&allele(), &peptides).unwrap_err();
        assert!(matches!(err, BindError::BatchSizeMismatch { .. }));
    }

    #[test]
    fn test_empty_request_makes_no_calls() {
        let dispatcher = LengthBucketed::new(RecordingEngine::new(&[9]));
        assert!(dispatcher.predict_batch(&allele(), &[]).unwrap().is_empty());
        assert!(dispatcher.inner().calls.lock().is_empty());
    }
}
