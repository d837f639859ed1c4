//! Read-only queries over a loaded [`ResultSet`].
//!
//! Everything here borrows from the set and never mutates it; queries are
//! cheap enough to run per request. Unknown filter values are not errors,
//! they just select nothing.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::models::{Field, ResultRecord, ResultSet};
use crate::preprocessing::cmp_by_time;

/// Positions that earn a medal. Untimed records never occupy them.
pub const MEDAL_POSITIONS: usize = 3;

/// Display medal for a podium position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub fn from_position(position: usize) -> Option<Self> {
        match position {
            1 => Some(Medal::Gold),
            2 => Some(Medal::Silver),
            3 => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Medal::Gold => "🥇",
            Medal::Silver => "🥈",
            Medal::Bronze => "🥉",
        }
    }
}

/// One entry of a top-N group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placing<'a> {
    /// 1-based position within the group
    pub position: usize,
    pub record: &'a ResultRecord,
    pub medal: Option<Medal>,
}

/// Top-N for one partition value. `key` is `None` for the unpartitioned view
/// and for records whose partition field is absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedGroup<'a> {
    pub key: Option<String>,
    pub placings: Vec<Placing<'a>>,
}

/// Query interface over one result set.
#[derive(Debug, Clone, Copy)]
pub struct ResultQuery<'a> {
    set: &'a ResultSet,
}

impl<'a> ResultQuery<'a> {
    pub fn new(set: &'a ResultSet) -> Self {
        Self { set }
    }

    pub fn records(&self) -> &'a [ResultRecord] {
        self.set.records()
    }

    /// Distinct values of a field in first-seen order. Absent values are skipped.
    pub fn distinct_values(&self, field: Field) -> Vec<String> {
        distinct(self.records().iter(), field)
    }

    /// Distinct values among records of one sex (event choices for a selected sex).
    pub fn distinct_values_where(&self, field: Field, sex: &str) -> Vec<String> {
        distinct(self.records().iter().filter(|r| r.sex == sex), field)
    }

    /// Records matching both `sex` and `event` exactly, in source order.
    pub fn filter(&self, sex: &str, event: &str) -> Vec<&'a ResultRecord> {
        self.records()
            .iter()
            .filter(|r| r.sex == sex && r.event == event)
            .collect()
    }
}

fn distinct<'r>(records: impl Iterator<Item = &'r ResultRecord>, field: Field) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .filter_map(|r| r.value(field))
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Top `n` records, either per partition value or over the whole input.
///
/// With a partition field, each group is ordered by elapsed time (absent last,
/// ties by source row) and groups are sorted by key with the absent key last.
/// Without one, a single group is ordered by overall rank. In both modes an
/// untimed record is never placed within [`MEDAL_POSITIONS`].
pub fn top_n<'a>(
    records: &[&'a ResultRecord],
    n: usize,
    partition: Option<Field>,
) -> Vec<RankedGroup<'a>> {
    if n == 0 || records.is_empty() {
        return Vec::new();
    }

    match partition {
        Some(field) => {
            let mut groups: BTreeMap<GroupKey, Vec<&'a ResultRecord>> = BTreeMap::new();
            for record in records {
                groups
                    .entry(GroupKey(record.value(field)))
                    .or_default()
                    .push(record);
            }
            groups
                .into_iter()
                .map(|(key, mut members)| {
                    members.sort_by(|a, b| cmp_by_time(a, b));
                    RankedGroup {
                        key: key.0,
                        placings: place(members, n),
                    }
                })
                .collect()
        }
        None => {
            let mut members = records.to_vec();
            members.sort_by(|a, b| cmp_by_overall_rank(a, b));
            vec![RankedGroup {
                key: None,
                placings: place(members, n),
            }]
        }
    }
}

/// Partition key ordering: present keys ascending, absent key last.
#[derive(Debug, PartialEq, Eq)]
struct GroupKey(Option<String>);

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Classification order: untimed last, then overall rank, then source row.
pub fn cmp_by_overall_rank(a: &ResultRecord, b: &ResultRecord) -> Ordering {
    let key = |r: &ResultRecord| (!r.is_timed(), r.overall_rank.unwrap_or(u32::MAX), r.source_row);
    key(a).cmp(&key(b))
}

fn place<'a>(ordered: Vec<&'a ResultRecord>, n: usize) -> Vec<Placing<'a>> {
    ordered
        .into_iter()
        .enumerate()
        .map(|(idx, record)| (idx + 1, record))
        .take_while(|(position, record)| record.is_timed() || *position > MEDAL_POSITIONS)
        .take(n)
        .map(|(position, record)| Placing {
            position,
            record,
            medal: medal_for(position, record),
        })
        .collect()
}

/// Medal for a timed record at a podium position.
pub fn medal_for(position: usize, record: &ResultRecord) -> Option<Medal> {
    if record.is_timed() {
        Medal::from_position(position)
    } else {
        None
    }
}

/// Case-insensitive substring search on the name.
///
/// A blank pattern returns the input unchanged; no match returns an empty vector.
pub fn search<'a>(records: &[&'a ResultRecord], pattern: &str) -> Vec<&'a ResultRecord> {
    let needle = pattern.trim().to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .copied()
        .filter(|r| r.name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SourceFormat, SourceInfo};

    fn record(row: usize, name: &str, sex: &str, event: &str, time: Option<&str>) -> ResultRecord {
        let mut r = ResultRecord::new(name, sex, event, row);
        r.elapsed_time = time.and_then(|t| crate::parsing::parse_time_str(t).ok());
        r
    }

    fn set(mut records: Vec<ResultRecord>) -> ResultSet {
        let policy = crate::preprocessing::apply_rank_policy(&mut records, false, false);
        ResultSet::new(
            records,
            policy,
            SourceInfo {
                name: "test.csv".to_string(),
                format: SourceFormat::Delimited,
                encoding: "UTF-8".to_string(),
                used_fallback: false,
                delimiter: Some(';'),
                column_count: 9,
                header_row: None,
                checksum: String::new(),
            },
        )
    }

    fn scenario() -> ResultSet {
        set(vec![
            record(2, "Ana Lima", "F", "500m", Some("00:09:10")),
            record(3, "Bruno Costa", "M", "500m", Some("00:08:30")),
            record(4, "Carla Souza", "F", "500m", Some("00:08:55")),
            record(5, "Diana Reis", "F", "1km", Some("00:20:00")),
            record(6, "Elisa Prado", "F", "500m", Some("00:09:40")),
        ])
    }

    #[test]
    fn test_distinct_values_first_seen_order() {
        let set = scenario();
        let q = ResultQuery::new(&set);
        assert_eq!(q.distinct_values(Field::Sex), vec!["F", "M"]);
        assert_eq!(q.distinct_values(Field::Event), vec!["500m", "1km"]);
        assert_eq!(q.distinct_values_where(Field::Event, "M"), vec!["500m"]);
        assert!(q.distinct_values(Field::Team).is_empty());
    }

    #[test]
    fn test_filter_unknown_values_is_empty() {
        let set = scenario();
        let q = ResultQuery::new(&set);
        assert_eq!(q.filter("F", "500m").len(), 3);
        assert!(q.filter("X", "500m").is_empty());
        assert!(q.filter("F", "50km").is_empty());
    }

    #[test]
    fn test_top_three_podium() {
        let set = scenario();
        let q = ResultQuery::new(&set);
        let groups = top_n(&q.filter("F", "500m"), 3, None);
        assert_eq!(groups.len(), 1);

        let times: Vec<String> = groups[0]
            .placings
            .iter()
            .map(|p| p.record.elapsed_time.unwrap().to_string())
            .collect();
        assert_eq!(times, vec!["00:08:55", "00:09:10", "00:09:40"]);

        let medals: Vec<_> = groups[0].placings.iter().map(|p| p.medal).collect();
        assert_eq!(
            medals,
            vec![Some(Medal::Gold), Some(Medal::Silver), Some(Medal::Bronze)]
        );
    }

    #[test]
    fn test_untimed_never_on_podium() {
        let set = set(vec![
            record(2, "Ana", "F", "500m", None),
            record(3, "Bia", "F", "500m", Some("00:09:00")),
            record(4, "Cris", "F", "500m", None),
            record(5, "Dora", "F", "500m", None),
            record(6, "Eva", "F", "500m", None),
        ]);
        let q = ResultQuery::new(&set);
        let filtered = q.filter("F", "500m");

        let podium = top_n(&filtered, 3, None);
        assert_eq!(podium[0].placings.len(), 1);
        assert_eq!(podium[0].placings[0].record.name, "Bia");

        let by_sex = top_n(&filtered, 5, Some(Field::Sex));
        assert_eq!(by_sex[0].placings.len(), 1);
    }

    #[test]
    fn test_partitioned_groups_sorted_with_absent_key_last() {
        let mut records = vec![
            record(2, "Ana", "F", "500m", Some("00:09:00")),
            record(3, "Bia", "F", "500m", Some("00:08:00")),
            record(4, "Cris", "F", "500m", Some("00:07:00")),
        ];
        records[0].category = Some("30-34".to_string());
        records[1].category = Some("25-29".to_string());
        let set = set(records);
        let q = ResultQuery::new(&set);

        let groups = top_n(&q.filter("F", "500m"), 3, Some(Field::Category));
        let keys: Vec<_> = groups.iter().map(|g| g.key.clone()).collect();
        assert_eq!(
            keys,
            vec![Some("25-29".to_string()), Some("30-34".to_string()), None]
        );
        assert!(groups.iter().all(|g| g.placings[0].medal == Some(Medal::Gold)));
    }

    #[test]
    fn test_top_zero_is_empty() {
        let set = scenario();
        let q = ResultQuery::new(&set);
        assert!(top_n(&q.filter("F", "500m"), 0, None).is_empty());
    }

    #[test]
    fn test_top_n_beyond_podium_allows_untimed() {
        let set = set(vec![
            record(2, "Ana", "F", "500m", Some("00:09:00")),
            record(3, "Bia", "F", "500m", Some("00:09:10")),
            record(4, "Cris", "F", "500m", Some("00:09:20")),
            record(5, "Dora", "F", "500m", None),
        ]);
        let q = ResultQuery::new(&set);
        let groups = top_n(&q.filter("F", "500m"), 10, None);
        let last = groups[0].placings.last().unwrap();
        assert_eq!(last.position, 4);
        assert_eq!(last.record.name, "Dora");
        assert_eq!(last.medal, None);
    }

    #[test]
    fn test_search_case_insensitive_and_identity() {
        let set = scenario();
        let q = ResultQuery::new(&set);
        let filtered = q.filter("F", "500m");

        assert_eq!(search(&filtered, ""), filtered);
        assert_eq!(search(&filtered, "   "), filtered);
        assert_eq!(search(&filtered, "CARLA").len(), 1);
        assert_eq!(search(&filtered, "souza")[0].name, "Carla Souza");
        assert!(search(&filtered, "zzz").is_empty());
    }

    #[test]
    fn test_search_unicode_names() {
        let set = set(vec![record(2, "JOÃO Ângelo", "M", "500m", Some("00:10:00"))]);
        let q = ResultQuery::new(&set);
        assert_eq!(search(&q.filter("M", "500m"), "joão ângelo").len(), 1);
    }

    #[test]
    fn test_medal_emoji() {
        assert_eq!(Medal::from_position(4), None);
        assert_eq!(Medal::Gold.emoji(), "🥇");
        assert_eq!(Medal::from_position(3).map(Medal::emoji), Some("🥉"));
    }

    #[test]
    fn test_overall_rank_order_puts_untimed_last() {
        let set = set(vec![
            record(2, "Ana", "F", "500m", None),
            record(3, "Bia", "F", "500m", Some("00:09:00")),
            record(4, "Cris", "F", "500m", Some("00:08:00")),
        ]);
        let mut rows: Vec<_> = set.records().iter().collect();
        rows.sort_by(|a, b| cmp_by_overall_rank(a, b));
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Cris", "Bia", "Ana"]);
    }
}
