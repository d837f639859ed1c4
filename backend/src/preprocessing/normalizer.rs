//! Positional schema normalization.
//!
//! Raw rows of any width are mapped left-to-right onto the twelve canonical
//! [`Field`]s. Missing trailing columns are absent, extra trailing columns are
//! ignored. Header text is never used for mapping because it is routinely
//! mangled by encoding mismatches.

use crate::config::HeaderMode;
use crate::error::{ErrorContext, ResultsError, ResultsResult};
use crate::models::{
    CanonicalTime, DiagnosticKind, Field, RankPolicy, RawCell, RawRow, ResultRecord, ResultSet,
    RowDiagnostic, SourceInfo, MIN_COLUMNS,
};
use crate::parsing::time_parser::parse_time;

use super::ranking::apply_rank_policy;

/// Options controlling normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub header: HeaderMode,
}

/// Output of [`normalize`], before source metadata is attached.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub records: Vec<ResultRecord>,
    pub rank_policy: RankPolicy,
    pub diagnostics: Vec<RowDiagnostic>,
    /// Widest row in the source
    pub column_count: usize,
    /// Row number of the skipped header, if one was detected
    pub header_row: Option<usize>,
}

impl Normalized {
    /// Attach source metadata, yielding the immutable result set and the diagnostics.
    pub fn into_result_set(self, source: SourceInfo) -> (ResultSet, Vec<RowDiagnostic>) {
        (
            ResultSet::new(self.records, self.rank_policy, source),
            self.diagnostics,
        )
    }
}

/// Normalize raw rows into result records.
///
/// # Errors
/// [`ResultsError::SchemaInsufficient`] when no row reaches the elapsed-time
/// column. Every other problem is recorded as a [`RowDiagnostic`].
pub fn normalize(rows: &[RawRow], options: &NormalizeOptions) -> ResultsResult<Normalized> {
    let data_rows: Vec<&RawRow> = rows.iter().filter(|r| !r.is_blank()).collect();
    let column_count = data_rows.iter().map(|r| r.width()).max().unwrap_or(0);

    if column_count < MIN_COLUMNS {
        let mut context = ErrorContext::new("normalize");
        if let Some(first) = data_rows.first() {
            context = context.with_row(first.row);
        }
        return Err(ResultsError::SchemaInsufficient {
            found: column_count,
            required: MIN_COLUMNS,
            context,
        });
    }

    let header_row = data_rows
        .first()
        .filter(|first| is_header(first, options.header))
        .map(|first| first.row);
    if let Some(row) = header_row {
        log::info!("Skipping header at row {}", row);
    }
    let body = if header_row.is_some() {
        &data_rows[1..]
    } else {
        &data_rows[..]
    };

    let mut diagnostics = Vec::new();
    let mut records: Vec<ResultRecord> = body
        .iter()
        .filter_map(|row| normalize_row(row, &mut diagnostics))
        .collect();

    let rank_policy = apply_rank_policy(
        &mut records,
        column_count > Field::OverallRank.position(),
        column_count > Field::CategoryRank.position(),
    );

    let dropped = diagnostics.iter().filter(|d| d.is_dropped()).count();
    log::info!(
        "Normalized {} records from {} rows ({} dropped, {} diagnostics, {} columns)",
        records.len(),
        body.len(),
        dropped,
        diagnostics.len(),
        column_count
    );
    if !rank_policy.overall.is_trusted() {
        log::warn!("Overall ranks recomputed: {:?}", rank_policy.overall);
    }

    Ok(Normalized {
        records,
        rank_policy,
        diagnostics,
        column_count,
        header_row,
    })
}

fn is_header(row: &RawRow, mode: HeaderMode) -> bool {
    match mode {
        HeaderMode::Present => true,
        HeaderMode::Absent => false,
        HeaderMode::Auto => looks_like_header(row),
    }
}

/// A header row labels the elapsed-time column with plain text and has no
/// typed value in any time, rank or id column. A data row with a malformed
/// time (`1:02`) still carries digits and is kept.
fn looks_like_header(row: &RawRow) -> bool {
    let label = match row.cell(Field::ElapsedTime.position()) {
        RawCell::Text(s) => s,
        _ => return false,
    };
    if label.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    let has_time = [Field::ArrivalTime, Field::DepartureTime]
        .iter()
        .map(|f| row.cell(f.position()))
        .any(|cell| !cell.is_empty() && parse_time(cell).is_ok());
    let has_rank = [Field::OverallRank, Field::CategoryRank]
        .iter()
        .any(|f| parse_rank(row.cell(f.position())).is_some());
    let has_number_id = matches!(row.cell(Field::AthleteId1.position()), RawCell::Number(_));

    !(has_time || has_rank || has_number_id)
}

fn normalize_row(row: &RawRow, diagnostics: &mut Vec<RowDiagnostic>) -> Option<ResultRecord> {
    let text = |field: Field| row.cell(field.position()).as_text();

    let name = text(Field::Name).unwrap_or_default();
    let elapsed_time = time_field(row, Field::ElapsedTime, diagnostics);

    if name.is_empty() && elapsed_time.is_none() {
        diagnostics.push(
            RowDiagnostic::new(
                row.row,
                DiagnosticKind::MissingNameAndTime,
                "row has neither a name nor an elapsed time",
            )
            .with_field(Field::Name),
        );
        return None;
    }

    let (sex, event) = match (text(Field::Sex), text(Field::Event)) {
        (Some(sex), Some(event)) => (sex, event),
        (sex, _) => {
            let field = if sex.is_none() { Field::Sex } else { Field::Event };
            diagnostics.push(
                RowDiagnostic::new(
                    row.row,
                    DiagnosticKind::MissingRequired,
                    format!("required field {} is empty", field),
                )
                .with_field(field),
            );
            return None;
        }
    };

    if name.is_empty() {
        diagnostics.push(
            RowDiagnostic::new(row.row, DiagnosticKind::EmptyName, "name is empty")
                .with_field(Field::Name),
        );
    }

    Some(ResultRecord {
        athlete_id1: text(Field::AthleteId1),
        athlete_id2: text(Field::AthleteId2),
        name,
        category: text(Field::Category),
        sex,
        arrival_time: time_field(row, Field::ArrivalTime, diagnostics),
        departure_time: time_field(row, Field::DepartureTime, diagnostics),
        elapsed_time,
        event,
        team: text(Field::Team),
        overall_rank: rank_field(row, Field::OverallRank, diagnostics),
        category_rank: rank_field(row, Field::CategoryRank, diagnostics),
        source_row: row.row,
    })
}

/// Parse a time column; empty cells are silently absent.
fn time_field(
    row: &RawRow,
    field: Field,
    diagnostics: &mut Vec<RowDiagnostic>,
) -> Option<CanonicalTime> {
    let cell = row.cell(field.position());
    if cell.is_empty() {
        return None;
    }
    match parse_time(cell) {
        Ok(t) => Some(t),
        Err(e) => {
            diagnostics.push(
                RowDiagnostic::new(row.row, DiagnosticKind::TimeParseFailure, e.kind.to_string())
                    .with_field(field)
                    .with_raw(e.raw),
            );
            None
        }
    }
}

fn rank_field(row: &RawRow, field: Field, diagnostics: &mut Vec<RowDiagnostic>) -> Option<u32> {
    let cell = row.cell(field.position());
    if cell.is_empty() {
        return None;
    }
    let parsed = parse_rank(cell);
    if parsed.is_none() {
        diagnostics.push(
            RowDiagnostic::new(
                row.row,
                DiagnosticKind::InvalidRank,
                "rank must be an integer >= 1",
            )
            .with_field(field)
            .with_raw(cell.as_text().unwrap_or_default()),
        );
    }
    parsed
}

/// Integer rank >= 1. Accepts `3`, `3.0` and ordinal suffixes such as `3º`.
fn parse_rank(cell: &RawCell) -> Option<u32> {
    let value = match cell {
        RawCell::Number(n) => *n,
        RawCell::Text(s) => s
            .trim_end_matches(['º', '°', 'ª', '.'])
            .trim()
            .parse::<f64>()
            .ok()?,
        _ => return None,
    };
    if value.fract() != 0.0 || value < 1.0 || value > u32::MAX as f64 {
        return None;
    }
    Some(value as u32)
}
