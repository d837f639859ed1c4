//! Error types for the ingestion pipeline and the query layer.
//!
//! File-level failures halt a load and are surfaced as a single
//! [`ResultsError`] carrying an [`ErrorContext`] (row number, byte offset, raw
//! value) so a frontend can explain the problem without knowing the internals.
//! Field-level failures never reach this type; they become
//! [`RowDiagnostic`](crate::models::RowDiagnostic)s.

use std::fmt;

/// Result type for pipeline operations
pub type ResultsResult<T> = Result<T, ResultsError>;

/// Structured context for pipeline errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "decode", "normalize")
    pub operation: Option<String>,
    /// Name of the source file or upload, when known
    pub source_name: Option<String>,
    /// 1-based row number in the source
    pub row: Option<usize>,
    /// Byte offset into the raw input
    pub byte_offset: Option<usize>,
    /// Offending raw value
    pub raw_value: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the source name.
    pub fn with_source(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Set the row number.
    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    /// Set the byte offset.
    pub fn with_byte_offset(mut self, offset: usize) -> Self {
        self.byte_offset = Some(offset);
        self
    }

    /// Set the raw value.
    pub fn with_raw_value(mut self, raw: impl Into<String>) -> Self {
        self.raw_value = Some(raw.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref source) = self.source_name {
            parts.push(format!("source={}", source));
        }
        if let Some(row) = self.row {
            parts.push(format!("row={}", row));
        }
        if let Some(offset) = self.byte_offset {
            parts.push(format!("byte_offset={}", offset));
        }
        if let Some(ref raw) = self.raw_value {
            parts.push(format!("raw={:?}", raw));
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for the results pipeline
#[derive(Debug, thiserror::Error)]
pub enum ResultsError {
    /// Byte-to-text failure that survived the fallback retry.
    #[error("Decode error: {message} {context}")]
    Decode {
        message: String,
        context: ErrorContext,
    },

    /// The input is too narrow to populate name and elapsed time.
    #[error("Schema insufficient: found {found} columns, at least {required} required {context}")]
    SchemaInsufficient {
        found: usize,
        required: usize,
        context: ErrorContext,
    },

    /// The delimited-text reader rejected the input.
    #[error("Delimited text error: {message} {context}")]
    Delimited {
        message: String,
        context: ErrorContext,
    },

    /// The spreadsheet reader rejected the input.
    #[error("Spreadsheet error: {message} {context}")]
    Spreadsheet {
        message: String,
        context: ErrorContext,
    },

    /// Configuration file or environment error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A query was issued before any dataset was loaded.
    #[error("No dataset loaded")]
    NoDataset,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResultsError {
    /// Create a decode error with context.
    pub fn decode(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Decode {
            message: message.into(),
            context,
        }
    }

    /// Create a delimited-text error with context.
    pub fn delimited(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Delimited {
            message: message.into(),
            context,
        }
    }

    /// Create a spreadsheet error with context.
    pub fn spreadsheet(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Spreadsheet {
            message: message.into(),
            context,
        }
    }

    /// Get the error context, if any.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Decode { context, .. }
            | Self::SchemaInsufficient { context, .. }
            | Self::Delimited { context, .. }
            | Self::Spreadsheet { context, .. } => Some(context),
            Self::Config(_) | Self::NoDataset | Self::Io(_) => None,
        }
    }

    /// Attach a source name to the error context, keeping everything else.
    pub fn with_source(self, name: &str) -> Self {
        match self {
            Self::Decode { message, context } => Self::Decode {
                message,
                context: context.with_source(name),
            },
            Self::SchemaInsufficient {
                found,
                required,
                context,
            } => Self::SchemaInsufficient {
                found,
                required,
                context: context.with_source(name),
            },
            Self::Delimited { message, context } => Self::Delimited {
                message,
                context: context.with_source(name),
            },
            Self::Spreadsheet { message, context } => Self::Spreadsheet {
                message,
                context: context.with_source(name),
            },
            other => other,
        }
    }

    /// Short machine-readable code used by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "DECODE_ERROR",
            Self::SchemaInsufficient { .. } => "SCHEMA_INSUFFICIENT",
            Self::Delimited { .. } => "DELIMITED_ERROR",
            Self::Spreadsheet { .. } => "SPREADSHEET_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::NoDataset => "NO_DATASET",
            Self::Io(_) => "IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display_lists_set_fields() {
        let ctx = ErrorContext::new("decode")
            .with_source("resultados.csv")
            .with_byte_offset(42);
        assert_eq!(
            ctx.to_string(),
            "[operation=decode, source=resultados.csv, byte_offset=42]"
        );
    }

    #[test]
    fn test_empty_context_display() {
        assert_eq!(ErrorContext::default().to_string(), "[]");
    }

    #[test]
    fn test_with_source_preserves_details() {
        let err = ResultsError::SchemaInsufficient {
            found: 5,
            required: 8,
            context: ErrorContext::new("normalize").with_row(1),
        }
        .with_source("upload.csv");

        let ctx = err.context().unwrap();
        assert_eq!(ctx.row, Some(1));
        assert_eq!(ctx.source_name.as_deref(), Some("upload.csv"));
        assert!(err.to_string().contains("found 5 columns"));
        assert_eq!(err.code(), "SCHEMA_INSUFFICIENT");
    }

    #[test]
    fn test_no_dataset_has_no_context() {
        assert!(ResultsError::NoDataset.context().is_none());
    }
}
