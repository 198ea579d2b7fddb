//! Pepbind Matrix Predictors
//!
//! A stabilized matrix is a log-linear model for one (method, allele, length):
//!
//! | Term | Meaning |
//! |------|---------|
//! | `intercept` | baseline log10 strength |
//! | `element[pos][res]` | log10 contribution of residue `res` at position `pos` |
//! | `strength` | `10 ^ (intercept + Σ element[pos][peptide[pos]])` |
//!
//! Matrices are read from `<root>/<method>/<allele stem>-<length>.txt` the
//! first time a peptide of that length is scored, then shared read-only.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pepbind_common::{Allele, Method, Peptide};
//! use pepbind_matrix::{MatrixCache, MatrixPredictor};
//! use pepbind_predict::{LengthBucketed, Predictor};
//!
//! fn main() -> pepbind_common::Result<()> {
//!     let cache = Arc::new(MatrixCache::new("data/matrices"));
//!     let smm = LengthBucketed::new(MatrixPredictor::new(Method::Smm, cache));
//!
//!     let allele = Allele::new("HLA-A*01:01")?;
//!     let records = smm.predict_batch(&allele, &[Peptide::new("YWDRNTQIY")?])?;
//!     println!("IC50 = {:.2} nM", records[0].strength());
//!     Ok(())
//! }
//! ```

pub mod matrix;
pub mod reader;
pub mod cache;
pub mod predictor;

pub use cache::{MatrixCache, MatrixKey};
pub use matrix::StabilizedMatrix;
pub use predictor::MatrixPredictor;
pub use reader::{load_matrix, parse_matrix};
