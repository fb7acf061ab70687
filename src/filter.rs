//! Filter pipeline
//!
//! Filters apply in a fixed order: location, then activity, then chainage
//! range, then excavation sequence. Every intermediate snapshot stays
//! queryable because the rate metrics read different stages:
//! - location snapshot: total and delay time
//! - activity snapshot: activity time
//! - chainage snapshot: excavation-sequence counts
//! - sequence snapshot: descriptive statistics and advance rate
//!
//! Snapshots are borrowed views; the underlying table never mutates.

use serde::{Deserialize, Serialize};

use crate::types::{ActivityRecord, ExcavationSeq};

/// Active predicates for one pipeline invocation. Recreated from UI input
/// each run; holds no state beyond it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterState {
    /// Location of interest
    pub location: String,
    /// Activity of interest
    pub activity: String,
    /// Lower chainage bound on the start metre, exclusive
    pub chainage_min: f64,
    /// Upper chainage bound on the start metre, exclusive
    pub chainage_max: f64,
    /// Excavation sequence of interest
    pub excavation_seq: ExcavationSeq,
}

/// The four cumulative snapshots produced by one [`FilterPipeline::apply`]
#[derive(Debug, Clone)]
pub struct FilterSnapshots<'a> {
    /// Rows at the selected location
    pub location: Vec<&'a ActivityRecord>,
    /// Location rows with the selected activity
    pub activity: Vec<&'a ActivityRecord>,
    /// Activity rows inside the chainage range
    pub chainage: Vec<&'a ActivityRecord>,
    /// Chainage rows with the selected excavation sequence (final)
    pub sequence: Vec<&'a ActivityRecord>,
}

/// Sequential filter pipeline over the activity table
pub struct FilterPipeline;

impl FilterPipeline {
    /// Apply the four filters cumulatively and return every snapshot
    pub fn apply<'a>(table: &'a [ActivityRecord], state: &FilterState) -> FilterSnapshots<'a> {
        let location: Vec<&ActivityRecord> = table
            .iter()
            .filter(|r| r.location == state.location)
            .collect();

        let activity: Vec<&ActivityRecord> = location
            .iter()
            .copied()
            .filter(|r| r.activity == state.activity)
            .collect();

        // Strict inequalities: rows sitting exactly on a bound are excluded
        let chainage: Vec<&ActivityRecord> = activity
            .iter()
            .copied()
            .filter(|r| {
                r.tunnel_meter_start > state.chainage_min
                    && r.tunnel_meter_start < state.chainage_max
            })
            .collect();

        let sequence: Vec<&ActivityRecord> = chainage
            .iter()
            .copied()
            .filter(|r| r.excavation_seq == state.excavation_seq)
            .collect();

        FilterSnapshots {
            location,
            activity,
            chainage,
            sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use pretty_assertions::assert_eq;

    fn record(
        location: &str,
        activity: &str,
        seq: ExcavationSeq,
        metre_start: f64,
    ) -> ActivityRecord {
        ActivityRecord {
            location: location.to_string(),
            activity: activity.to_string(),
            excavation_seq: seq,
            tunnel_meter_start: metre_start,
            tunnel_meter_finish: metre_start + 1.5,
            time_start: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            time_stop: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            date: NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
            date_logged: NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
            tunnel_chainage: 1.5,
            time_taken: 120.0,
        }
    }

    fn sample_table() -> Vec<ActivityRecord> {
        vec![
            record("Portal North", "Excavation", ExcavationSeq::TopHeading, 100.0),
            record("Portal North", "Excavation", ExcavationSeq::TopHeading, 105.0),
            record("Portal North", "Excavation", ExcavationSeq::Bench, 110.0),
            record("Portal North", "Delay", ExcavationSeq::NotApplicable, 105.0),
            record("Portal South", "Excavation", ExcavationSeq::TopHeading, 500.0),
        ]
    }

    fn state() -> FilterState {
        FilterState {
            location: "Portal North".to_string(),
            activity: "Excavation".to_string(),
            chainage_min: 99.0,
            chainage_max: 200.0,
            excavation_seq: ExcavationSeq::TopHeading,
        }
    }

    #[test]
    fn test_snapshots_narrow_cumulatively() {
        let table = sample_table();
        let snapshots = FilterPipeline::apply(&table, &state());

        assert_eq!(snapshots.location.len(), 4);
        assert_eq!(snapshots.activity.len(), 3);
        assert_eq!(snapshots.chainage.len(), 3);
        assert_eq!(snapshots.sequence.len(), 2);
    }

    #[test]
    fn test_chainage_bounds_are_strict() {
        let table = sample_table();
        let mut bounds = state();
        bounds.chainage_min = 100.0;
        bounds.chainage_max = 110.0;

        let snapshots = FilterPipeline::apply(&table, &bounds);

        // Rows starting exactly at 100.0 and 110.0 are excluded
        assert_eq!(snapshots.chainage.len(), 1);
        assert_eq!(snapshots.chainage[0].tunnel_meter_start, 105.0);
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let table = sample_table();
        let snapshots = FilterPipeline::apply(&table, &state());

        let refiltered_table: Vec<ActivityRecord> =
            snapshots.sequence.iter().map(|r| (*r).clone()).collect();
        let refiltered = FilterPipeline::apply(&refiltered_table, &state());

        assert_eq!(refiltered.sequence.len(), snapshots.sequence.len());
        for (a, b) in refiltered.sequence.iter().zip(snapshots.sequence.iter()) {
            assert_eq!(*a, *b);
        }
    }

    #[test]
    fn test_no_matches_yields_empty_snapshots() {
        let table = sample_table();
        let mut missing = state();
        missing.location = "Adit 3".to_string();

        let snapshots = FilterPipeline::apply(&table, &missing);
        assert!(snapshots.location.is_empty());
        assert!(snapshots.sequence.is_empty());
    }
}
