//! Raw tabular cells as produced by the readers, before normalization.

use super::time::CanonicalTime;

/// One cell of a raw row.
///
/// Delimited text only ever yields `Text` and `Empty`; spreadsheets can also
/// hand over typed numbers and times.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Time(CanonicalTime),
}

impl RawCell {
    /// Text cell, trimmed; blank text becomes `Empty`.
    pub fn text(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RawCell::Empty)
    }

    /// Cell rendered as text, `None` when empty.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawCell::Empty => None,
            RawCell::Text(s) => Some(s.clone()),
            RawCell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            RawCell::Number(n) => Some(n.to_string()),
            RawCell::Bool(b) => Some(b.to_string()),
            RawCell::Time(t) => Some(t.display_precise()),
        }
    }
}

/// One source row with its 1-based row number.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub row: usize,
    pub cells: Vec<RawCell>,
}

impl RawRow {
    pub fn new(row: usize, cells: Vec<RawCell>) -> Self {
        Self { row, cells }
    }

    /// Cell at a position; positions past the end read as `Empty`.
    pub fn cell(&self, position: usize) -> &RawCell {
        self.cells.get(position).unwrap_or(&RawCell::Empty)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(RawCell::is_empty)
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }
}
