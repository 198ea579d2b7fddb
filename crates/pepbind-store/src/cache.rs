//! In-memory overlay in front of a [`BindStore`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use pepbind_common::{BindError, BindRecord, PartitionKey, Peptide, Result};

use crate::store::{assemble, missing_peptides, BindStore};

/// Process-lifetime memory of the records resolved for one partition.
///
/// Once a peptide is resident, requests for it never reach the store again
/// until [`clear`](BindCache::clear) is called.
pub struct BindCache {
    store: Arc<BindStore>,
    records: RwLock<HashMap<Peptide, BindRecord>>,
}

impl fmt::Debug for BindCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindCache")
            .field("key", self.store.key())
            .field("resident", &self.records.read().len())
            .finish()
    }
}

impl BindCache {
    pub fn new(store: Arc<BindStore>) -> Self {
        Self {
            store,
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn key(&self) -> &PartitionKey {
        self.store.key()
    }

    pub fn store(&self) -> &Arc<BindStore> {
        &self.store
    }

    /// Records for `peptides` in request order.
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
        debug!(
            partition = %self.key(),
            hits = resolved.len(),
            misses = missing.len(),
            "Bind cache lookup"
        );

        if !missing.is_empty() {
            let fetched = self.store.get(&missing)?;

            let mut records = self.records.write();
            for record in fetched {
                records.insert(record.peptide().clone(), record.clone());
                resolved.insert(record.peptide().clone(), record);
            }
        }

        assemble(self.key(), peptides, &resolved)
    }

    pub fn get_one(&self, peptide: &Peptide) -> Result<BindRecord> {
        self.get(std::slice::from_ref(peptide))?
            .pop()
            .ok_or_else(|| BindError::Internal(format!("{} unresolved in {}", peptide, self.key())))
    }

    /// Resident records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn contains(&self, peptide: &Peptide) -> bool {
        self.records.read().contains_key(peptide)
    }

    /// Forget every resident record. The store and its table are untouched.
    pub fn clear(&self) {
        self.records.write().clear();
    }
}
