//! Workbook ingestion (xlsx, xlsm, xlsb, xls, ods) via calamine.
//!
//! Only the first worksheet is read. Typed cells are kept typed: numbers stay
//! numbers and time-formatted cells become [`RawCell::Time`], so the time
//! parser can pass them through untouched.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

use crate::error::{ErrorContext, ResultsError, ResultsResult};
use crate::models::{CanonicalTime, RawCell, RawRow};

/// Parse the first worksheet of a workbook into raw rows.
pub fn parse_spreadsheet(bytes: &[u8]) -> ResultsResult<Vec<RawRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| {
        ResultsError::spreadsheet(e.to_string(), ErrorContext::new("open_workbook"))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            ResultsError::spreadsheet("workbook has no worksheets", ErrorContext::new("read_sheet"))
        })?
        .map_err(|e| ResultsError::spreadsheet(e.to_string(), ErrorContext::new("read_sheet")))?;

    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let rows: Vec<RawRow> = range
        .rows()
        .enumerate()
        .map(|(idx, cells)| RawRow::new(first_row + idx + 1, cells.iter().map(to_raw_cell).collect()))
        .collect();

    log::debug!("Parsed {} spreadsheet rows", rows.len());
    Ok(rows)
}

fn to_raw_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::text(s),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Float(f) => RawCell::Number(*f),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) => {
            let days = dt.as_f64();
            // Date-times carry the time of day in the fraction; durations
            // beyond a day cannot be a canonical time.
            let fraction = if dt.is_duration() { days } else { days.fract() };
            match CanonicalTime::from_day_fraction(fraction) {
                Some(t) => RawCell::Time(t),
                None => RawCell::Number(days * 86_400.0),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};

    #[test]
    fn test_typed_cells() {
        assert_eq!(to_raw_cell(&Data::Int(3)), RawCell::Number(3.0));
        assert_eq!(to_raw_cell(&Data::String(" Ana ".into())), RawCell::Text("Ana".into()));
        assert_eq!(to_raw_cell(&Data::Empty), RawCell::Empty);
        assert_eq!(to_raw_cell(&Data::Bool(true)), RawCell::Bool(true));
    }

    fn datetime(value: f64, kind: ExcelDateTimeType) -> Data {
        Data::DateTime(ExcelDateTime::new(value, kind, false))
    }

    fn time_text(cell: RawCell) -> String {
        match cell {
            RawCell::Time(t) => t.display_precise(),
            other => panic!("expected a time cell, got {:?}", other),
        }
    }

    #[test]
    fn test_time_of_day_cells() {
        let cell = to_raw_cell(&datetime(11.0 / 86_400.0, ExcelDateTimeType::DateTime));
        assert_eq!(time_text(cell), "00:00:11");

        let cell = to_raw_cell(&datetime(535.0 / 86_400.0, ExcelDateTimeType::DateTime));
        assert_eq!(time_text(cell), "00:08:55");
    }

    #[test]
    fn test_date_part_is_discarded() {
        // 2023-03-15 09:30:22
        let cell = to_raw_cell(&datetime(45_000.0 + 34_222.0 / 86_400.0, ExcelDateTimeType::DateTime));
        assert_eq!(time_text(cell), "09:30:22");
    }

    #[test]
    fn test_duration_cells() {
        let cell = to_raw_cell(&datetime(3_723.0 / 86_400.0, ExcelDateTimeType::TimeDelta));
        assert_eq!(time_text(cell), "01:02:03");

        // Longer than a day: kept as seconds so the time parser can reject it
        let cell = to_raw_cell(&datetime(1.5, ExcelDateTimeType::TimeDelta));
        assert_eq!(cell, RawCell::Number(129_600.0));
    }

    #[test]
    fn test_garbage_bytes_are_a_spreadsheet_error() {
        let err = parse_spreadsheet(b"definitely not a workbook").unwrap_err();
        assert_eq!(err.code(), "SPREADSHEET_ERROR");
    }
}
