//! Readers for race-result sources.
//!
//! - [`detector`]: choose format, encoding and delimiter for a byte source
//! - [`delimited`]: delimited text (CSV, semicolon-separated, TSV) into raw rows
//! - [`spreadsheet`]: first worksheet of a workbook into raw rows
//! - [`time_parser`]: raw cells into canonical race times
//!
//! # Example
//!
//! ```no_run
//! use swim_results::config::IngestConfig;
//! use swim_results::parsing::{detector::{detect, SourceHint}, read_rows};
//!
//! let bytes = std::fs::read("resultados.csv").unwrap();
//! let plan = detect(&bytes, &SourceHint::from_filename("resultados.csv"), &IngestConfig::default())
//!     .unwrap();
//! let parsed = read_rows(&bytes, &plan).unwrap();
//! println!("{} rows, encoding {}", parsed.rows.len(), parsed.encoding);
//! ```

pub mod delimited;
pub mod detector;
#[cfg(feature = "excel")]
pub mod spreadsheet;
pub mod time_parser;

pub use detector::{DecodePlan, SourceHint};
pub use time_parser::{parse_time, parse_time_str, TimeParseError};

use crate::error::ResultsResult;
use crate::models::{RawRow, SourceFormat};

/// Rows read from a source plus how they were decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSource {
    pub rows: Vec<RawRow>,
    /// Encoding that decoded the text (`"binary"` for workbooks)
    pub encoding: String,
    pub used_fallback: bool,
}

/// Apply a decode plan and read all rows.
pub fn read_rows(bytes: &[u8], plan: &DecodePlan) -> ResultsResult<ParsedSource> {
    match plan.format {
        SourceFormat::Delimited => {
            let decoded = detector::decode(bytes, plan)?;
            let rows = delimited::parse_delimited(&decoded.text, plan.delimiter.unwrap_or(b';'))?;
            Ok(ParsedSource {
                rows,
                encoding: decoded.encoding.name().to_string(),
                used_fallback: decoded.used_fallback,
            })
        }
        SourceFormat::Spreadsheet => read_spreadsheet(bytes),
    }
}

#[cfg(feature = "excel")]
fn read_spreadsheet(bytes: &[u8]) -> ResultsResult<ParsedSource> {
    Ok(ParsedSource {
        rows: spreadsheet::parse_spreadsheet(bytes)?,
        encoding: "binary".to_string(),
        used_fallback: false,
    })
}

#[cfg(not(feature = "excel"))]
fn read_spreadsheet(_bytes: &[u8]) -> ResultsResult<ParsedSource> {
    use crate::error::{ErrorContext, ResultsError};

    Err(ResultsError::spreadsheet(
        "spreadsheet support is disabled (enable the `excel` feature)",
        ErrorContext::new("read_spreadsheet"),
    ))
}
