use crate::error::{ErrorContext, ResultsError, ResultsResult};
use crate::models::{RawCell, RawRow};

/// Parse decoded delimited text into raw rows.
///
/// Rows may have any width; the header row (if any) is returned like any
/// other row and left to the normalizer.
pub fn parse_delimited(text: &str, delimiter: u8) -> ResultsResult<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            let mut ctx = ErrorContext::new("parse_delimited");
            if let Some(pos) = e.position() {
                ctx = ctx.with_row(pos.line() as usize).with_byte_offset(pos.byte() as usize);
            }
            ResultsError::delimited(e.to_string(), ctx)
        })?;

        let row = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);
        let cells = record.iter().map(RawCell::text).collect();
        rows.push(RawRow::new(row, cells));
    }

    log::debug!("Parsed {} delimited rows", rows.len());
    Ok(rows)
}
