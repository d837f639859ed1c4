//! Full classification table for one (sex, event) selection.

use serde::Serialize;

use crate::models::ResultRecord;

use super::query::{cmp_by_overall_rank, medal_for, search, Medal, ResultQuery};

/// Outcome of a classification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClassificationStatus {
    Ok,
    /// The (sex, event) selection has no records
    NoData,
    /// Records exist but none match the search pattern; rows are empty
    NoMatch { pattern: String },
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRow<'a> {
    pub medal: Option<Medal>,
    #[serde(flatten)]
    pub record: &'a ResultRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification<'a> {
    pub sex: String,
    pub event: String,
    pub status: ClassificationStatus,
    pub rows: Vec<ClassificationRow<'a>>,
}

impl<'a> ResultQuery<'a> {
    /// Classification ordered by overall rank, with medals and an optional name search.
    pub fn classification(&self, sex: &str, event: &str, pattern: &str) -> Classification<'a> {
        let mut selected = self.filter(sex, event);
        selected.sort_by(|a, b| cmp_by_overall_rank(a, b));

        let matched = search(&selected, pattern);
        let status = if selected.is_empty() {
            ClassificationStatus::NoData
        } else if matched.is_empty() {
            ClassificationStatus::NoMatch {
                pattern: pattern.trim().to_string(),
            }
        } else {
            ClassificationStatus::Ok
        };

        let rows = matched
            .into_iter()
            .map(|record| ClassificationRow {
                medal: record
                    .overall_rank
                    .and_then(|rank| medal_for(rank as usize, record)),
                record,
            })
            .collect();

        Classification {
            sex: sex.to_string(),
            event: event.to_string(),
            status,
            rows,
        }
    }
}
