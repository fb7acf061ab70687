//! Rate estimation
//!
//! Aggregate time sums over the filter snapshots plus the four session
//! metrics: advance rate, volumetric removal/spraying rate, and the two
//! time-proportion percentages. A metric whose denominator is zero or whose
//! gating inputs are not filled in reports `None` instead of failing.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::stats::round_dp;
use crate::types::{ActivityRecord, DELAY_ACTIVITY};

/// Decimal places used for rate metrics
const RATE_DECIMALS: i32 = 3;

/// User-supplied scalars gating the rate and projection formulas. These are
/// pure parameters collected by the presentation layer, never derived from
/// the dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstimationInputs {
    /// Theoretical excavation/spraying area (m^2)
    pub theoretical_area: f64,
    /// Overprofile of the excavation/spraying area (m^2)
    pub overprofile_area: f64,
    /// Time taken per advance (minutes)
    pub time_per_advance: f64,
    /// Distance per advance (metres)
    pub distance_per_advance: f64,
    /// New project theoretical area (m^2)
    pub new_area: f64,
    /// New project overprofile area (m^2)
    pub new_overprofile: f64,
    /// New project advance length (metres)
    pub new_advance_length: f64,
    /// Estimated new project duration (days)
    pub project_duration: f64,
}

/// Rate estimator over the filter snapshots
pub struct RateEstimator;

impl RateEstimator {
    /// Sum of `time_taken` over the location snapshot
    pub fn total_time(location_rows: &[&ActivityRecord]) -> f64 {
        location_rows.iter().map(|r| r.time_taken).sum()
    }

    /// Sum of `time_taken` over delay rows in the location snapshot
    pub fn delay_time(location_rows: &[&ActivityRecord]) -> f64 {
        location_rows
            .iter()
            .filter(|r| r.activity == DELAY_ACTIVITY)
            .map(|r| r.time_taken)
            .sum()
    }

    /// Sum of `time_taken` over the activity snapshot
    pub fn activity_time(activity_rows: &[&ActivityRecord]) -> f64 {
        activity_rows.iter().map(|r| r.time_taken).sum()
    }

    /// Mean daily advance over the final snapshot: chainage summed per
    /// `date_logged`, averaged across the logged days, in metres per day.
    /// `None` when the snapshot is empty.
    pub fn advance_rate(sequence_rows: &[&ActivityRecord]) -> Option<f64> {
        if sequence_rows.is_empty() {
            return None;
        }

        let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for row in sequence_rows {
            *per_day.entry(row.date_logged).or_insert(0.0) += row.tunnel_chainage;
        }

        let mean = per_day.values().sum::<f64>() / per_day.len() as f64;
        Some(round_dp(mean, RATE_DECIMALS))
    }

    /// Muck removal / spraying rate in m^3 per minute. `None` until the
    /// area, time-per-advance, and distance-per-advance inputs are all
    /// positive.
    pub fn volume_rate(inputs: &EstimationInputs) -> Option<f64> {
        Self::volume_rate_raw(inputs).map(|rate| round_dp(rate, RATE_DECIMALS))
    }

    /// Unrounded volume rate; the projection divides by this directly
    pub(crate) fn volume_rate_raw(inputs: &EstimationInputs) -> Option<f64> {
        let area = inputs.theoretical_area + inputs.overprofile_area;
        if area > 0.0 && inputs.time_per_advance > 0.0 && inputs.distance_per_advance > 0.0 {
            Some(inputs.distance_per_advance * area / inputs.time_per_advance)
        } else {
            None
        }
    }

    /// Share of location time spent on the selected activity, percent.
    /// `None` when no time was logged at the location.
    pub fn time_percent(activity_time: f64, total_time: f64) -> Option<f64> {
        percent_of(activity_time, total_time)
    }

    /// Share of location time spent on delays, percent. `None` when no time
    /// was logged at the location.
    pub fn delay_percent(delay_time: f64, total_time: f64) -> Option<f64> {
        percent_of(delay_time, total_time)
    }
}

fn percent_of(part: f64, whole: f64) -> Option<f64> {
    if whole == 0.0 {
        None
    } else {
        Some(round_dp(part / whole * 100.0, RATE_DECIMALS))
    }
}
