//! Per-row diagnostics produced while normalizing a source.

use serde::Serialize;
use std::fmt;

use super::record::Field;

/// What went wrong with a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A time cell could not be parsed; the field is absent
    TimeParseFailure,
    /// A rank cell is not an integer >= 1; the field is absent
    InvalidRank,
    /// The name is empty but the row has a time, so it is kept
    EmptyName,
    /// Sex or event is empty; the row is excluded
    MissingRequired,
    /// Neither name nor elapsed time; the row is excluded
    MissingNameAndTime,
}

/// Whether the row survived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Dropped,
}

/// A diagnostic about one source row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowDiagnostic {
    /// 1-based row number in the source
    pub row: usize,
    pub field: Option<Field>,
    pub kind: DiagnosticKind,
    /// Offending raw value, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    pub message: String,
}

impl RowDiagnostic {
    pub fn new(row: usize, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            row,
            field: None,
            kind,
            raw: None,
            message: message.into(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.field = Some(field);
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn severity(&self) -> Severity {
        match self.kind {
            DiagnosticKind::MissingRequired | DiagnosticKind::MissingNameAndTime => {
                Severity::Dropped
            }
            DiagnosticKind::TimeParseFailure
            | DiagnosticKind::InvalidRank
            | DiagnosticKind::EmptyName => Severity::Warning,
        }
    }

    pub fn is_dropped(&self) -> bool {
        self.severity() == Severity::Dropped
    }
}

impl fmt::Display for RowDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}", self.row)?;
        if let Some(field) = self.field {
            write!(f, " ({})", field)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(ref raw) = self.raw {
            write!(f, " [raw={:?}]", raw)?;
        }
        Ok(())
    }
}
