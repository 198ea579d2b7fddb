//! Predictors that count what they are asked to compute.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use pepbind_common::{Allele, BindError, BindRecord, Method, Peptide, Result};
use pepbind_predict::{FixedLengthPredictor, Predictor};

/// Deterministic record derived from the sequence alone.
///
/// Strength is `10 * (1 + Σ residue index)`; the percentile is that sum
/// modulo 100, so two calls for the same peptide always agree.
pub fn synthetic_record(peptide: &Peptide) -> Result<BindRecord> {
    let sum: usize = peptide.residues().iter().map(|r| r.index()).sum();
    BindRecord::new(peptide.clone(), 10.0 * (1 + sum) as f64, Some((sum % 100) as f64))
}

#[derive(Debug, Default)]
struct CallLog {
    batches: Mutex<Vec<Vec<Peptide>>>,
    failing: AtomicBool,
}

impl CallLog {
    fn record(&self, method: Method, allele: &Allele, peptides: &[Peptide]) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BindError::PredictorFailed {
                method,
                allele: allele.to_string(),
                reason: "failure injected by test".to_string(),
            });
        }
        self.batches.lock().push(peptides.to_vec());
        Ok(())
    }

    fn times_predicted(&self, peptide: &Peptide) -> usize {
        self.batches.lock().iter().flatten().filter(|p| *p == peptide).count()
    }
}

/// [`Predictor`] returning [`synthetic_record`]s and logging every batch.
#[derive(Debug)]
pub struct CountingPredictor {
    method: Method,
    installed: bool,
    log: CallLog,
}

impl CountingPredictor {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            installed: true,
            log: CallLog::default(),
        }
    }

    pub fn not_installed(mut self) -> Self {
        self.installed = false;
        self
    }

    /// Make every following call fail with `PredictorFailed`.
    pub fn set_failing(&self, failing: bool) {
        self.log.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `predict_batch` calls that reached the engine.
    pub fn calls(&self) -> usize {
        self.log.batches.lock().len()
    }

    /// Total peptides across all calls.
    pub fn predicted(&self) -> usize {
        self.log.batches.lock().iter().map(Vec::len).sum()
    }

    pub fn times_predicted(&self, peptide: &Peptide) -> usize {
        self.log.times_predicted(peptide)
    }

    pub fn batches(&self) -> Vec<Vec<Peptide>> {
        self.log.batches.lock().clone()
    }
}

impl Predictor for CountingPredictor {
    fn method(&self) -> Method {
        self.method
    }

    fn is_installed(&self) -> bool {
        self.installed
    }

    fn predict_batch(&self, allele: &Allele, peptides: &[Peptide]) -> Result<Vec<BindRecord>> {
        self.log.record(self.method, allele, peptides)?;
        peptides.iter().map(synthetic_record).collect()
    }
}

/// [`FixedLengthPredictor`] counterpart of [`CountingPredictor`].
#[derive(Debug)]
pub struct CountingFixedLength {
    method: Method,
    lengths: Vec<usize>,
    log: CallLog,
}

impl CountingFixedLength {
    pub fn new(method: Method, lengths: &[usize]) -> Self {
        Self {
            method,
            lengths: lengths.to_vec(),
            log: CallLog::default(),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.log.failing.store(failing, Ordering::SeqCst);
    }

    /// Lengths of the buckets dispatched so far, in call order.
    pub fn bucket_lengths(&self) -> Vec<usize> {
        self.log
            .batches
            .lock()
            .iter()
            .filter_map(|b| b.first().map(Peptide::len))
            .collect()
    }

    pub fn calls(&self) -> usize {
        self.log.batches.lock().len()
    }

    pub fn times_predicted(&self, peptide: &Peptide) -> usize {
        self.log.times_predicted(peptide)
    }
}

impl FixedLengthPredictor for CountingFixedLength {
    fn method(&self) -> Method {
        self.method
    }

    fn is_installed(&self) -> bool {
        true
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
        if let Some(p) = peptides.iter().find(|p| p.len() != length) {
            return Err(BindError::Internal(format!("{} in bucket for length {}", p, length)));
        }
        self.log.record(self.method, allele, peptides)?;
        peptides.iter().map(synthetic_record).collect()
    }
}
