//! Weekly resample.
//!
//! Daily feature rows collapse to the last observation of each
//! Friday-anchored week, matching the horizon of the weekly direction
//! target.

use advisor_core::week::friday_anchor;
use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::features::FeatureRow;

/// A resampled row labeled by its Friday week end.
#[derive(Debug, Clone)]
pub struct WeeklyRow {
    pub week_end: NaiveDate,
    pub row: FeatureRow,
}

/// Keeps the last observation per Friday-anchored week.
///
/// Input must be sorted by date ascending; output is sorted by week end.
#[must_use]
pub fn resample_weekly(rows: &[FeatureRow]) -> Vec<WeeklyRow> {
    let mut buckets: BTreeMap<NaiveDate, FeatureRow> = BTreeMap::new();
    for row in rows {
        buckets.insert(friday_anchor(row.date), row.clone());
    }

    buckets
        .into_iter()
        .map(|(week_end, row)| WeeklyRow { week_end, row })
        .collect()
}
