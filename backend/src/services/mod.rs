//! Service layer: loading sources and answering queries.
//!
//! - [`loader`]: bytes or a path through detection, parsing and normalization
//! - [`query`]: distinct values, filtering, top-N and name search
//! - [`classification`]: the full ordered table for one selection

pub mod classification;
pub mod loader;
pub mod query;

pub use classification::{Classification, ClassificationRow, ClassificationStatus};
pub use loader::{load_bytes, load_into_store, load_path, LoadReport};
pub use query::{search, top_n, Medal, Placing, RankedGroup, ResultQuery, MEDAL_POSITIONS};
