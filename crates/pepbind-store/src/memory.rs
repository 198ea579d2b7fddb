//! In-process tables.
//!
//! Contents live in the factory, not in the table handle, so a partition
//! that is cleared and reopened sees what was written before. Used for
//! tests and ephemeral runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use pepbind_common::{BindRecord, PartitionKey, Peptide};

use crate::error::{Result, StoreError};
use crate::table::{BindTable, TableFactory};

type Rows = Arc<RwLock<BTreeMap<Peptide, BindRecord>>>;

#[derive(Debug, Default)]
struct Counters {
    read_only: AtomicBool,
    opens: AtomicUsize,
    writes: AtomicUsize,
}

/// Handle on one partition's rows inside a [`MemoryTableFactory`].
#[derive(Debug)]
pub struct MemoryBindTable {
    key: PartitionKey,
    rows: Rows,
    counters: Arc<Counters>,
}

impl BindTable for MemoryBindTable {
    fn load_all(&self) -> Result<Vec<BindRecord>> {
        Ok(self.rows.read().values().cloned().collect())
    }

    fn upsert_many(&self, records: &[BindRecord]) -> Result<()> {
        if self.counters.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly(self.location()));
        }
        let mut rows = self.rows.write();
        for record in records {
            rows.insert(record.peptide().clone(), record.clone());
        }
        self.counters.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        format!("memory:{}", self.key)
    }
}

#[derive(Debug, Default)]
pub struct MemoryTableFactory {
    tables: Mutex<HashMap<PartitionKey, Rows>>,
    counters: Arc<Counters>,
}

impl MemoryTableFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every following write with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.counters.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Persisted rows for `key`.
    pub fn rows(&self, key: &PartitionKey) -> Vec<BindRecord> {
        self.tables
            .lock()
            .get(key)
            .map(|rows| rows.read().values().cloned().collect())
            .unwrap_or_default()
    }

    /// Tables opened so far, across all partitions.
    pub fn opens(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    /// Successful `upsert_many` calls, across all partitions.
    pub fn writes(&self) -> usize {
        self.counters.writes.load(Ordering::SeqCst)
    }
}

impl TableFactory for MemoryTableFactory {
    fn open(&self, key: &PartitionKey) -> Result<Box<dyn BindTable>> {
        let rows = Arc::clone(self.tables.lock().entry(key.clone()).or_default());
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryBindTable {
            key: key.clone(),
            rows,
            counters: Arc::clone(&self.counters),
        }))
    }
}
