use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::record::{InspectionRecord, cmp_timestamps};
use super::table::ConsolidatedTable;

/// Ten hours: repeat attempts on one work order closer than this collapse
/// onto the later attempt.
pub const MIN_GAP_SECONDS: i64 = 36_000;

/// Suppresses near-duplicate inspections per work order.
///
/// Each work order is walked latest-first. The first record is kept; every
/// later record is compared with the most recently kept one and kept only
/// when at least `min_gap_seconds` older. Records without a timestamp are
/// kept after the dated ones and never move the comparison point.
///
/// Output holds only kept records, grouped by work order in order of first
/// appearance, latest first within each group. Equal timestamps keep their
/// input order, so the earlier row of a tie survives.
pub fn remove_close_inspections(table: ConsolidatedTable, min_gap_seconds: i64) -> ConsolidatedTable {
    let mut order = Vec::<String>::new();
    let mut groups = HashMap::<String, Vec<InspectionRecord>>::new();

    for record in table.into_records() {
        let work_order = record.work_order().to_string();
        groups
            .entry(work_order.clone())
            .or_insert_with(|| {
                order.push(work_order);
                Vec::new()
            })
            .push(record);
    }

    let mut kept = Vec::new();
    for work_order in order {
        let Some(mut group) = groups.remove(&work_order) else {
            continue;
        };

        group.sort_by(|left, right| latest_first(left, right));

        let mut last_kept: Option<NaiveDateTime> = None;
        for record in group {
            let Some(timestamp) = record.timestamp() else {
                kept.push(record);
                continue;
            };

            let keep = match last_kept {
                None => true,
                Some(previous) => (previous - timestamp).num_seconds() >= min_gap_seconds,
            };

            if keep {
                last_kept = Some(timestamp);
                kept.push(record);
            }
        }
    }

    ConsolidatedTable::from_records(kept)
}

fn latest_first(left: &InspectionRecord, right: &InspectionRecord) -> std::cmp::Ordering {
    match (left.timestamp(), right.timestamp()) {
        (Some(left), Some(right)) => right.cmp(&left),
        (left, right) => cmp_timestamps(left, right),
    }
}
