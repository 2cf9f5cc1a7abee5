//! Engine modules: the pure derivation layer.
//!
//! Options and operators go in, view models come out. The engine holds no
//! state, performs no I/O and never fails: malformed input is repaired
//! (missing operators become `and`, unparseable discounts become 0).
//!
//! - `grouper`: partitions options into packages
//! - `pricing`: per-group totals, promotions, monthly estimates
//! - `summary`: range/approved rollups and comparison labels
//! - `format`: currency formatting for labels

pub mod format;
pub mod grouper;
pub mod pricing;
pub mod summary;
