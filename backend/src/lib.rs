//! # Swim Results
//!
//! Ingestion and ranking engine for swim and aquathlon race results.
//!
//! Result sheets arrive as loosely structured tables: semicolon or comma
//! separated text in whatever encoding the timing software produced, or a
//! workbook exported from a spreadsheet. This crate turns such a file into a
//! normalized, ranked [`models::ResultSet`] and answers the queries a results
//! dashboard needs.
//!
//! ## Architecture
//!
//! - [`parsing`]: format/encoding/delimiter detection, tabular readers, time parsing
//! - [`preprocessing`]: positional schema normalization and the rank policy
//! - [`store`]: the currently loaded dataset as an atomically swapped snapshot
//! - [`services`]: end-to-end loading and the query engine
//! - [`config`]: `results.toml` plus environment overrides
//! - [`http`]: axum JSON API (feature `http-server`)
//!
//! ## Example
//!
//! ```no_run
//! use swim_results::config::IngestConfig;
//! use swim_results::services::{load_path, top_n, ResultQuery};
//!
//! let report = load_path("resultados.csv", &IngestConfig::default()).unwrap();
//! let query = ResultQuery::new(&report.result_set);
//! let podium = top_n(&query.filter("F", "500m"), 3, None);
//! for placing in &podium[0].placings {
//!     println!("{} {}", placing.position, placing.record.name);
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod parsing;
pub mod preprocessing;
pub mod services;
pub mod store;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{ResultsError, ResultsResult};
