//! Result records and the canonical column table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::time::CanonicalTime;

/// Number of canonical columns.
pub const CANONICAL_COLUMNS: usize = 12;

/// Minimum source width: anything narrower cannot carry an elapsed time.
pub const MIN_COLUMNS: usize = 8;

/// Canonical result columns, in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    AthleteId1,
    AthleteId2,
    Name,
    Category,
    Sex,
    ArrivalTime,
    DepartureTime,
    ElapsedTime,
    Event,
    Team,
    OverallRank,
    CategoryRank,
}

impl Field {
    /// All fields in positional order.
    pub const ALL: [Field; CANONICAL_COLUMNS] = [
        Field::AthleteId1,
        Field::AthleteId2,
        Field::Name,
        Field::Category,
        Field::Sex,
        Field::ArrivalTime,
        Field::DepartureTime,
        Field::ElapsedTime,
        Field::Event,
        Field::Team,
        Field::OverallRank,
        Field::CategoryRank,
    ];

    /// Zero-based column position in the source file.
    pub fn position(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Field::AthleteId1 => "athlete_id1",
            Field::AthleteId2 => "athlete_id2",
            Field::Name => "name",
            Field::Category => "category",
            Field::Sex => "sex",
            Field::ArrivalTime => "arrival_time",
            Field::DepartureTime => "departure_time",
            Field::ElapsedTime => "elapsed_time",
            Field::Event => "event",
            Field::Team => "team",
            Field::OverallRank => "overall_rank",
            Field::CategoryRank => "category_rank",
        }
    }

    /// Whether the column holds a race time.
    pub fn is_time(self) -> bool {
        matches!(
            self,
            Field::ArrivalTime | Field::DepartureTime | Field::ElapsedTime
        )
    }

    /// Whether the column holds a rank.
    pub fn is_rank(self) -> bool {
        matches!(self, Field::OverallRank | Field::CategoryRank)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "athleteid1" | "id1" => Ok(Field::AthleteId1),
            "athleteid2" | "id2" => Ok(Field::AthleteId2),
            "name" => Ok(Field::Name),
            "category" => Ok(Field::Category),
            "sex" => Ok(Field::Sex),
            "arrivaltime" | "arrival" => Ok(Field::ArrivalTime),
            "departuretime" | "departure" => Ok(Field::DepartureTime),
            "elapsedtime" | "elapsed" | "time" => Ok(Field::ElapsedTime),
            "event" => Ok(Field::Event),
            "team" => Ok(Field::Team),
            "overallrank" => Ok(Field::OverallRank),
            "categoryrank" => Ok(Field::CategoryRank),
            _ => Err(format!("Unknown field: {}", s)),
        }
    }
}

/// One athlete's entry for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub athlete_id1: Option<String>,
    pub athlete_id2: Option<String>,
    /// Display name; may be empty (flagged by a diagnostic at load time).
    pub name: String,
    pub category: Option<String>,
    pub sex: String,
    pub arrival_time: Option<CanonicalTime>,
    pub departure_time: Option<CanonicalTime>,
    /// Absent when unparsable; such records are displayable but never medal.
    pub elapsed_time: Option<CanonicalTime>,
    pub event: String,
    pub team: Option<String>,
    pub overall_rank: Option<u32>,
    pub category_rank: Option<u32>,
    /// 1-based row number in the source file.
    pub source_row: usize,
}

impl ResultRecord {
    /// Minimal record with only the required fields set.
    pub fn new(
        name: impl Into<String>,
        sex: impl Into<String>,
        event: impl Into<String>,
        source_row: usize,
    ) -> Self {
        Self {
            athlete_id1: None,
            athlete_id2: None,
            name: name.into(),
            category: None,
            sex: sex.into(),
            arrival_time: None,
            departure_time: None,
            elapsed_time: None,
            event: event.into(),
            team: None,
            overall_rank: None,
            category_rank: None,
            source_row,
        }
    }

    /// Whether the record can be ranked by time.
    pub fn is_timed(&self) -> bool {
        self.elapsed_time.is_some()
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }

    /// Display value of a field, `None` when absent.
    pub fn value(&self, field: Field) -> Option<String> {
        match field {
            Field::AthleteId1 => self.athlete_id1.clone(),
            Field::AthleteId2 => self.athlete_id2.clone(),
            Field::Name => Some(self.name.clone()),
            Field::Category => self.category.clone(),
            Field::Sex => Some(self.sex.clone()),
            Field::ArrivalTime => self.arrival_time.map(|t| t.to_string()),
            Field::DepartureTime => self.departure_time.map(|t| t.to_string()),
            Field::ElapsedTime => self.elapsed_time.map(|t| t.to_string()),
            Field::Event => Some(self.event.clone()),
            Field::Team => self.team.clone(),
            Field::OverallRank => self.overall_rank.map(|r| r.to_string()),
            Field::CategoryRank => self.category_rank.map(|r| r.to_string()),
        }
    }
}
