//! Pepbind Store Layer
//!
//! Request path for one (method, allele) partition:
//!
//! ```text
//! BindRegistry::get ─▶ BindCache (memory) ─miss─▶ BindStore (table) ─miss─▶ Predictor
//!                           ▲                          │
//!                           └──── merge ◀── persist ◀──┘
//! ```
//!
//! A peptide resolved once is never recomputed for the life of its cache
//! partition. Clearing a partition drops memory only; persisted rows are
//! read back when the partition is reopened.

pub mod error;
pub mod table;
pub mod csv_table;
pub mod memory;
pub mod store;
pub mod cache;
pub mod registry;

pub use cache::BindCache;
pub use csv_table::{CsvBindTable, CsvTableFactory};
pub use error::StoreError;
pub use memory::{MemoryBindTable, MemoryTableFactory};
pub use registry::BindRegistry;
pub use store::BindStore;
pub use table::{BindTable, TableFactory};
