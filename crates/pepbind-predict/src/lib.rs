//! pepbind-predict - Prediction engines behind the binding cache.
//!
//! Every engine implements [`Predictor`]: one record per input peptide, in
//! input order, or an error for the whole batch. Engines that only accept a
//! single peptide length per invocation implement [`FixedLengthPredictor`]
//! instead and are wrapped in [`LengthBucketed`], which splits mixed-length
//! requests and reassembles the results.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pepbind_common::{Allele, Method, Peptide};
//! use pepbind_predict::{CommandPredictor, LengthBucketed, Predictor, PredictorSet};
//!
//! fn main() -> pepbind_common::Result<()> {
//!     let netmhcpan = CommandPredictor::new(Method::NetMhcPan, "netMHCpan")
//!         .with_lengths([8, 9, 10, 11]);
//!     let predictors = PredictorSet::new()
//!         .with(Arc::new(LengthBucketed::new(netmhcpan)));
//!
//!     let allele = Allele::new("HLA-A*02:01")?;
//!     let peptides = Peptide::parse_all(["GILGFVFTL", "SIINFEKL"])?;
//!     let records = predictors.get(Method::NetMhcPan)?.predict_batch(&allele, &peptides)?;
//!     assert_eq!(records.len(), 2);
//!     Ok(())
//! }
//! ```

pub mod predictor;
pub mod dispatch;
pub mod external;
pub mod set;

pub use dispatch::{FixedLengthPredictor, LengthBucketed};
pub use external::CommandPredictor;
pub use predictor::{check_batch, Predictor};
pub use set::PredictorSet;
