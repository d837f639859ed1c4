//! Rank trust/recompute policy.
//!
//! Source rank columns are kept only when they are internally consistent in
//! every partition: all ranks present, exactly `1..=N`, and ordered the same
//! way as elapsed times (absent times last). A single inconsistent partition
//! makes the whole column recomputed, so a result set never mixes both kinds
//! of rank.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{RankPolicy, RankSource, RecomputeReason, ResultRecord};

/// Partition key: (event, sex, category). Category is `None` for overall ranks.
type PartitionKey = (String, String, Option<String>);

struct RankColumn {
    get: fn(&ResultRecord) -> Option<u32>,
    set: fn(&mut ResultRecord, u32),
    key: fn(&ResultRecord) -> PartitionKey,
}

const OVERALL: RankColumn = RankColumn {
    get: overall_rank,
    set: set_overall_rank,
    key: overall_key,
};

const CATEGORY: RankColumn = RankColumn {
    get: category_rank,
    set: set_category_rank,
    key: category_key,
};

fn overall_rank(r: &ResultRecord) -> Option<u32> {
    r.overall_rank
}

fn set_overall_rank(r: &mut ResultRecord, rank: u32) {
    r.overall_rank = Some(rank);
}

fn overall_key(r: &ResultRecord) -> PartitionKey {
    (r.event.clone(), r.sex.clone(), None)
}

fn category_rank(r: &ResultRecord) -> Option<u32> {
    r.category_rank
}

fn set_category_rank(r: &mut ResultRecord, rank: u32) {
    r.category_rank = Some(rank);
}

fn category_key(r: &ResultRecord) -> PartitionKey {
    (
        r.event.clone(),
        r.sex.clone(),
        Some(r.category.clone().unwrap_or_default()),
    )
}

/// Ordering by elapsed time: whole seconds ascending, absent last, then source row.
pub fn cmp_by_time(a: &ResultRecord, b: &ResultRecord) -> Ordering {
    time_key(a).cmp(&time_key(b))
}

fn time_key(r: &ResultRecord) -> (bool, u32, usize) {
    match r.elapsed_time {
        Some(t) => (false, t.ranking_seconds(), r.source_row),
        None => (true, 0, r.source_row),
    }
}

/// Decide and apply the policy for both rank columns.
///
/// `*_present` tells whether the source was wide enough to contain the column.
pub fn apply_rank_policy(
    records: &mut [ResultRecord],
    overall_present: bool,
    category_present: bool,
) -> RankPolicy {
    let overall = apply_column(records, &OVERALL, overall_present);
    let category = apply_column(records, &CATEGORY, category_present);
    RankPolicy { overall, category }
}

fn apply_column(records: &mut [ResultRecord], column: &RankColumn, present: bool) -> RankSource {
    let partitions = partition(records, column);

    let view: &[ResultRecord] = records;
    let verdict = if present {
        partitions
            .values()
            .find_map(|indices| check_partition(view, indices, column))
    } else {
        Some(RecomputeReason::ColumnAbsent)
    };

    match verdict {
        None => RankSource::Trusted,
        Some(reason) => {
            for indices in partitions.values() {
                recompute_partition(records, indices, column);
            }
            RankSource::Recomputed(reason)
        }
    }
}

fn partition(records: &[ResultRecord], column: &RankColumn) -> BTreeMap<PartitionKey, Vec<usize>> {
    let mut partitions: BTreeMap<PartitionKey, Vec<usize>> = BTreeMap::new();
    for (idx, record) in records.iter().enumerate() {
        partitions.entry((column.key)(record)).or_default().push(idx);
    }
    partitions
}

/// `None` when the partition's source ranks can be trusted.
fn check_partition(
    records: &[ResultRecord],
    indices: &[usize],
    column: &RankColumn,
) -> Option<RecomputeReason> {
    let mut ranked: Vec<(u32, usize)> = Vec::with_capacity(indices.len());
    for &idx in indices {
        match (column.get)(&records[idx]) {
            Some(rank) => ranked.push((rank, idx)),
            None => return Some(RecomputeReason::MissingValues),
        }
    }

    ranked.sort_unstable();
    let dense = ranked
        .iter()
        .enumerate()
        .all(|(pos, (rank, _))| *rank as usize == pos + 1);
    if !dense {
        return Some(RecomputeReason::NotDense);
    }

    let consistent = ranked.windows(2).all(|pair| {
        let (a, b) = (&records[pair[0].1], &records[pair[1].1]);
        let (a_absent, a_secs, _) = time_key(a);
        let (b_absent, b_secs, _) = time_key(b);
        (a_absent, a_secs) <= (b_absent, b_secs)
    });
    if !consistent {
        return Some(RecomputeReason::InconsistentWithTimes);
    }
    None
}

fn recompute_partition(records: &mut [ResultRecord], indices: &[usize], column: &RankColumn) {
    let mut order = indices.to_vec();
    order.sort_by(|&a, &b| cmp_by_time(&records[a], &records[b]));
    for (pos, idx) in order.into_iter().enumerate() {
        (column.set)(&mut records[idx], pos as u32 + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CanonicalTime;

    fn record(row: usize, event: &str, sex: &str, secs: Option<u32>, rank: Option<u32>) -> ResultRecord {
        let mut r = ResultRecord::new(format!("athlete {row}"), sex, event, row);
        r.elapsed_time = secs.and_then(|s| CanonicalTime::from_seconds(s as f64));
        r.overall_rank = rank;
        r.category = Some("A".to_string());
        r.category_rank = rank;
        r
    }

    #[test]
    fn test_consistent_source_ranks_are_trusted() {
        let mut records = vec![
            record(2, "500m", "F", Some(550), Some(2)),
            record(3, "500m", "F", Some(535), Some(1)),
            record(4, "500m", "M", Some(600), Some(1)),
        ];
        let policy = apply_rank_policy(&mut records, true, true);
        assert_eq!(policy.overall, RankSource::Trusted);
        assert_eq!(policy.category, RankSource::Trusted);
        assert_eq!(records[0].overall_rank, Some(2));
    }

    #[test]
    fn test_duplicate_rank_triggers_recompute() {
        let mut records = vec![
            record(2, "500m", "F", Some(550), Some(1)),
            record(3, "500m", "F", Some(535), Some(1)),
        ];
        let policy = apply_rank_policy(&mut records, true, true);
        assert_eq!(policy.overall, RankSource::Recomputed(RecomputeReason::NotDense));
        assert_eq!(records[0].overall_rank, Some(2));
        assert_eq!(records[1].overall_rank, Some(1));
    }

    #[test]
    fn test_ranks_disagreeing_with_times_are_recomputed() {
        let mut records = vec![
            record(2, "500m", "F", Some(600), Some(1)),
            record(3, "500m", "F", Some(535), Some(2)),
        ];
        let policy = apply_rank_policy(&mut records, true, true);
        assert_eq!(
            policy.overall,
            RankSource::Recomputed(RecomputeReason::InconsistentWithTimes)
        );
        assert_eq!(records[1].overall_rank, Some(1));
    }

    #[test]
    fn test_absent_column_recomputes_with_untimed_last() {
        let mut records = vec![
            record(2, "500m", "F", None, None),
            record(3, "500m", "F", Some(580), None),
            record(4, "500m", "F", Some(535), None),
        ];
        let policy = apply_rank_policy(&mut records, false, false);
        assert_eq!(policy.overall, RankSource::Recomputed(RecomputeReason::ColumnAbsent));
        assert_eq!(records[0].overall_rank, Some(3));
        assert_eq!(records[1].overall_rank, Some(2));
        assert_eq!(records[2].overall_rank, Some(1));
    }

    #[test]
    fn test_missing_rank_value_recomputes() {
        let mut records = vec![
            record(2, "500m", "F", Some(535), Some(1)),
            record(3, "500m", "F", Some(540), None),
        ];
        let policy = apply_rank_policy(&mut records, true, true);
        assert_eq!(policy.overall, RankSource::Recomputed(RecomputeReason::MissingValues));
        assert_eq!(records[1].overall_rank, Some(2));
    }

    #[test]
    fn test_equal_times_break_ties_by_source_row() {
        let mut records = vec![
            record(5, "1km", "M", Some(700), None),
            record(2, "1km", "M", Some(700), None),
        ];
        apply_rank_policy(&mut records, false, false);
        assert_eq!(records[1].overall_rank, Some(1));
        assert_eq!(records[0].overall_rank, Some(2));
    }

    #[test]
    fn test_category_ranks_are_per_category() {
        let mut records = vec![
            record(2, "500m", "F", Some(535), None),
            record(3, "500m", "F", Some(550), None),
        ];
        records[1].category = Some("B".to_string());
        apply_rank_policy(&mut records, false, false);
        assert_eq!(records[0].category_rank, Some(1));
        assert_eq!(records[1].category_rank, Some(1));
        assert_eq!(records[1].overall_rank, Some(2));
    }
}
