use serde::{Deserialize, Serialize};

use super::record::ResultRecord;

/// Tabular container format of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Delimited text (CSV, semicolon-separated, TSV)
    Delimited,
    /// Workbook (xlsx, xls, ods, ...)
    Spreadsheet,
}

/// Where a result set came from and how it was decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub name: String,
    pub format: SourceFormat,
    /// Encoding that actually decoded the bytes (WHATWG label)
    pub encoding: String,
    /// Whether the fallback encoding had to be used
    pub used_fallback: bool,
    pub delimiter: Option<char>,
    /// Widest row seen in the source
    pub column_count: usize,
    /// Row number of the header that was skipped, if any
    pub header_row: Option<usize>,
    /// SHA-256 of the raw bytes
    pub checksum: String,
}

/// Why a rank column was recomputed instead of trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecomputeReason {
    /// The source has no such column
    ColumnAbsent,
    /// Some records have no (valid) rank
    MissingValues,
    /// Duplicate ranks or gaps within a partition
    NotDense,
    /// Rank order disagrees with elapsed-time order
    InconsistentWithTimes,
}

/// Whether a rank column was taken from the source or recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "reason", rename_all = "snake_case")]
pub enum RankSource {
    Trusted,
    Recomputed(RecomputeReason),
}

impl RankSource {
    pub fn is_trusted(&self) -> bool {
        matches!(self, RankSource::Trusted)
    }
}

/// The ranking policy applied to a result set, surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankPolicy {
    /// Policy for ranks within (event, sex)
    pub overall: RankSource,
    /// Policy for ranks within (event, sex, category)
    pub category: RankSource,
}

/// The full normalized collection for one loaded source.
///
/// Immutable once built; a new load produces a new set.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet {
    records: Vec<ResultRecord>,
    rank_policy: RankPolicy,
    source: SourceInfo,
}

impl ResultSet {
    pub fn new(records: Vec<ResultRecord>, rank_policy: RankPolicy, source: SourceInfo) -> Self {
        Self {
            records,
            rank_policy,
            source,
        }
    }

    /// Records in source order.
    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rank_policy(&self) -> RankPolicy {
        self.rank_policy
    }

    pub fn source(&self) -> &SourceInfo {
        &self.source
    }
}
