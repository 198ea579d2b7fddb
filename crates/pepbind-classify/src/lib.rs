//! Deciding which resolved binding records count as binders.
//!
//! Two views over the same records:
//! - [`Threshold`]: a yes/no filter, affinity OR percentile
//! - [`BinderType`]: STRONG / WEAK / UNBOUND, percentile rank first

pub mod threshold;
pub mod binder;

pub use binder::{require_affinity, BinderCutoffs, BinderType};
pub use threshold::Threshold;
