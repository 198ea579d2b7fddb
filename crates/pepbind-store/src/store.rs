//! Compute-on-demand store for one (method, allele) partition.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use pepbind_common::{BindError, BindRecord, PartitionKey, Peptide, Result};
use pepbind_predict::{check_batch, Predictor};

use crate::table::BindTable;

/// Unique peptides of `peptides` not satisfied by `known`, in first-seen order.
pub(crate) fn missing_peptides<F>(peptides: &[Peptide], known: F) -> Vec<Peptide>
where
    F: Fn(&Peptide) -> bool,
{
    let mut seen = HashSet::new();
    peptides
        .iter()
        .filter(|p| !known(*p) && seen.insert(*p))
        .cloned()
        .collect()
}

/// Pick the record for each requested peptide, in request order.
pub(crate) fn assemble(
    key: &PartitionKey,
    peptides: &[Peptide],
    resolved: &HashMap<Peptide, BindRecord>,
) -> Result<Vec<BindRecord>> {
    peptides
        .iter()
        .map(|p| {
            resolved
                .get(p)
                .cloned()
                .ok_or_else(|| BindError::Internal(format!("{} unresolved in {}", p, key)))
        })
        .collect()
}

/// Persisted records of one partition plus the predictor that fills gaps.
///
/// The table is read once when the store is opened. Records computed later
/// are written back best-effort: a failed write is logged and the computed
/// records are still returned and served from this store.
pub struct BindStore {
    key: PartitionKey,
    predictor: Arc<dyn Predictor>,
    table: Box<dyn BindTable>,
    records: RwLock<HashMap<Peptide, BindRecord>>,
}

impl fmt::Debug for BindStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindStore")
            .field("key", &self.key)
            .field("table", &self.table.location())
            .field("records", &self.records.read().len())
            .finish()
    }
}

impl BindStore {
    /// Open the partition, loading everything already persisted.
    ///
    /// A table that cannot be read is fatal for the partition.
    pub fn open(
        key: PartitionKey,
        predictor: Arc<dyn Predictor>,
        table: Box<dyn BindTable>,
    ) -> Result<Self> {
        if predictor.method() != key.method {
            return Err(BindError::Internal(format!(
                "{} predictor bound to partition {}",
                predictor.method(),
                key
            )));
        }

        let loaded = table.load_all()?;
        let records: HashMap<Peptide, BindRecord> = loaded
            .into_iter()
            .map(|r| (r.peptide().clone(), r))
            .collect();
        info!(
            partition = %key,
            table = %table.location(),
            n = records.len(),
            "Bind store opened"
        );

        Ok(Self {
            key,
            predictor,
            table,
            records: RwLock::new(records),
        })
    }

    pub fn key(&self) -> &PartitionKey {
        &self.key
    }

    /// Records known to this store, persisted or computed.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn contains(&self, peptide: &Peptide) -> bool {
        self.records.read().contains_key(peptide)
    }

    /// Records for `peptides`, in order, computing the unknown ones with a
    /// single predictor call.
    pub fn get(&self, peptides: &[Peptide]) -> Result<Vec<BindRecord>> {
        let mut resolved: HashMap<Peptide, BindRecord> = HashMap::new();
        let missing = {
            let records = self.records.read();
            for p in peptides {
                if let Some(r) = records.get(p) {
                    resolved.insert(p.clone(), r.clone());
                }
            }
            missing_peptides(peptides, |p| records.contains_key(p))
        };

        if !missing.is_empty() {
            let computed = self.compute(&missing)?;
            self.persist(&computed);

            let mut records = self.records.write();
            for record in computed {
                records.insert(record.peptide().clone(), record.clone());
                resolved.insert(record.peptide().clone(), record);
            }
        }

        assemble(&self.key, peptides, &resolved)
    }

    fn compute(&self, missing: &[Peptide]) -> Result<Vec<BindRecord>> {
        debug!(partition = %self.key, n = missing.len(), "Computing missing records");
        let computed = self.predictor.predict_batch(&self.key.allele, missing)?;
        check_batch(self.key.method, &self.key.allele, missing, &computed)?;
        Ok(computed)
    }

    fn persist(&self, records: &[BindRecord]) {
        if let Err(e) = self.table.upsert_many(records) {
            warn!(
                partition = %self.key,
                table = %self.table.location(),
                n = records.len(),
                error = %e,
                "Failed to persist bind records, keeping them in memory only"
            );
        }
    }
}
