//! Test doubles shared by the pepbind crates.
//!
//! - [`CountingPredictor`]: deterministic [`Predictor`](pepbind_predict::Predictor)
//!   that records every batch it is asked for
//! - [`CountingFixedLength`]: the same for single-length engines
//! - [`fixtures`]: matrix files with known scores

pub mod fixtures;
pub mod predictors;

pub use predictors::{synthetic_record, CountingFixedLength, CountingPredictor};
