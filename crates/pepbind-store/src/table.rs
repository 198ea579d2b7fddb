//! Persistent table contract.
//!
//! One table per (method, allele) partition, keyed by peptide sequence and
//! holding a strength and an optional percentile per row.

use pepbind_common::{BindRecord, PartitionKey};

use crate::error::Result;

/// Durable peptide → record table for one partition.
pub trait BindTable: Send + Sync {
    /// Every persisted record, one per peptide.
    fn load_all(&self) -> Result<Vec<BindRecord>>;

    /// Persist `records`. Writing a peptide again with the same values has no
    /// visible effect; a different value replaces the old one.
    fn upsert_many(&self, records: &[BindRecord]) -> Result<()>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}

/// Opens the table backing a partition.
///
/// The table name must be a deterministic, collision-free function of the key.
pub trait TableFactory: Send + Sync {
    fn open(&self, key: &PartitionKey) -> Result<Box<dyn BindTable>>;
}
