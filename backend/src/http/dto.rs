//! Data Transfer Objects for the HTTP API.
//!
//! Query results borrow from the loaded result set; the response types here
//! own their data so they can outlive the snapshot a handler read from.

use serde::{Deserialize, Serialize};

use crate::models::{Field, RankPolicy, ResultRecord, RowDiagnostic, SourceInfo};
use crate::services::{Classification, ClassificationStatus, Medal, RankedGroup};
use crate::store::Snapshot;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub dataset_loaded: bool,
    pub generation: u64,
}

/// Summary of the loaded dataset.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetResponse {
    pub generation: u64,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
    pub source: SourceInfo,
    pub rank_policy: RankPolicy,
    pub records: usize,
    pub diagnostics: usize,
    pub dropped_rows: usize,
}

impl From<&Snapshot> for DatasetResponse {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            generation: snapshot.generation,
            loaded_at: snapshot.loaded_at,
            source: snapshot.result_set.source().clone(),
            rank_policy: snapshot.result_set.rank_policy(),
            records: snapshot.result_set.len(),
            diagnostics: snapshot.diagnostics.len(),
            dropped_rows: snapshot.diagnostics.iter().filter(|d| d.is_dropped()).count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsResponse {
    pub generation: u64,
    pub diagnostics: Vec<RowDiagnostic>,
}

/// Query parameters for `GET /v1/filters`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltersQuery {
    pub field: String,
    /// Restrict values to records of this sex
    pub sex: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FiltersResponse {
    pub field: Field,
    pub values: Vec<String>,
}

/// Query parameters for `GET /v1/classification`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassificationQuery {
    pub sex: String,
    pub event: String,
    /// Name search pattern
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationRowDto {
    pub medal: Option<Medal>,
    pub medal_emoji: Option<&'static str>,
    #[serde(flatten)]
    pub record: ResultRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResponse {
    pub sex: String,
    pub event: String,
    #[serde(flatten)]
    pub status: ClassificationStatus,
    pub rows: Vec<ClassificationRowDto>,
}

impl From<Classification<'_>> for ClassificationResponse {
    fn from(table: Classification<'_>) -> Self {
        Self {
            sex: table.sex,
            event: table.event,
            status: table.status,
            rows: table
                .rows
                .into_iter()
                .map(|row| ClassificationRowDto {
                    medal: row.medal,
                    medal_emoji: row.medal.map(Medal::emoji),
                    record: row.record.clone(),
                })
                .collect(),
        }
    }
}

/// Query parameters for `GET /v1/champions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChampionsQuery {
    pub sex: String,
    pub event: String,
    /// Places per group; defaults to the configured podium size
    pub n: Option<usize>,
    /// Partition field, e.g. `category`
    pub by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacingDto {
    pub position: usize,
    pub medal: Option<Medal>,
    pub medal_emoji: Option<&'static str>,
    pub record: ResultRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupDto {
    pub key: Option<String>,
    pub placings: Vec<PlacingDto>,
}

impl From<RankedGroup<'_>> for GroupDto {
    fn from(group: RankedGroup<'_>) -> Self {
        Self {
            key: group.key,
            placings: group
                .placings
                .into_iter()
                .map(|p| PlacingDto {
                    position: p.position,
                    medal: p.medal,
                    medal_emoji: p.medal.map(Medal::emoji),
                    record: p.record.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChampionsResponse {
    pub sex: String,
    pub event: String,
    pub n: usize,
    pub partition: Option<Field>,
    pub groups: Vec<GroupDto>,
}

/// Query parameters for `POST /v1/dataset`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadQuery {
    /// Original file name; its extension is used as a format hint
    pub filename: Option<String>,
}
