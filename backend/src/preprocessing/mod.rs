//! Turning raw rows into ranked result records.
//!
//! [`normalizer`] maps source columns onto the canonical schema and records
//! row diagnostics; [`ranking`] then decides, per rank column, whether the
//! source ranks can be trusted or must be recomputed from elapsed times.

pub mod normalizer;
pub mod ranking;

pub use normalizer::{normalize, NormalizeOptions, Normalized};
pub use ranking::{apply_rank_policy, cmp_by_time};
