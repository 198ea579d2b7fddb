//! pepbind-common - Shared value types, errors, and logging used across all pepbind crates.
//!
//! Every cache, store and predictor in the workspace is keyed by the types
//! defined here: a [`Method`] and an [`Allele`] select a partition, and a
//! [`Peptide`] selects one [`BindRecord`] inside it.

pub mod error;
pub mod peptide;
pub mod allele;
pub mod method;
pub mod record;
pub mod logging;

// Re-export commonly used types
pub use allele::Allele;
pub use error::{BindError, Result};
pub use method::{Engine, MeasureKind, Method, PartitionKey};
pub use peptide::{Peptide, Residue, ALPHABET_SIZE};
pub use record::BindRecord;
