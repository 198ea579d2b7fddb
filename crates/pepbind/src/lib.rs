//! pepbind: peptide-MHC binding prediction with compute-on-demand caching.
//!
//! Records are resolved per (method, allele) partition: memory first, then
//! the persisted table, then the predictor for whatever is still missing.
//! A peptide is predicted at most once per partition lifetime.
//!
//! # Example
//!
//! ```rust,no_run
//! use pepbind::{Allele, BindContext, Method, Peptide};
//!
//! fn main() -> anyhow::Result<()> {
//!     pepbind::logging::init();
//!     let ctx = BindContext::load()?;
//!
//!     let allele = Allele::new("HLA-A*02:01")?;
//!     let peptides = Peptide::parse_all(["GILGFVFTL", "SIINFEKL"])?;
//!     let records = ctx.get(Method::Smm, &allele, &peptides)?;
//!
//!     for (record, binder) in records.iter().zip(ctx.classify(Method::Smm, &records)?) {
//!         println!("{} {:.1} nM {}", record.peptide(), record.strength(), binder);
//!     }
//!     Ok(())
//! }
//! ```

pub mod context;

pub use context::{build_predictors, BindContext};

pub use pepbind_classify::{BinderCutoffs, BinderType, Threshold};
pub use pepbind_common::{
    logging, Allele, BindError, BindRecord, Engine, MeasureKind, Method, PartitionKey, Peptide,
    Residue,
};
pub use pepbind_config::Config;
pub use pepbind_matrix::{MatrixCache, MatrixPredictor, StabilizedMatrix};
pub use pepbind_predict::{CommandPredictor, FixedLengthPredictor, LengthBucketed, Predictor, PredictorSet};
pub use pepbind_store::{
    BindCache, BindRegistry, BindStore, BindTable, CsvTableFactory, MemoryTableFactory, TableFactory,
};
