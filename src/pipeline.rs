//! Pipeline orchestration
//!
//! This module provides the public API for Tunnel Datum. [`DatumEngine`]
//! builds the activity table from one CSV batch and evaluates filter and
//! estimation parameters into a [`SessionMetrics`] bundle per invocation.
//! The table is read-only once built; changing a filter just recomputes from
//! it.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DatumError;
use crate::features::FieldDeriver;
use crate::filter::{FilterPipeline, FilterSnapshots, FilterState};
use crate::normalizer::{ParseStats, RecordNormalizer};
use crate::projection::Projector;
use crate::rates::{EstimationInputs, RateEstimator};
use crate::stats::{describe, excavation_counts, Describe, ExcavationCount};
use crate::types::ActivityRecord;

/// Sample batch bundled with the crate, used when no input is supplied
const DEFAULT_BATCH: &str = include_str!("../data/activities_default.csv");

/// Row counts of the four filter snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSizes {
    pub location: usize,
    pub activity: usize,
    pub chainage: usize,
    pub sequence: usize,
}

/// All metrics derived for one filter/estimation invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub snapshot_sizes: SnapshotSizes,
    /// Activity counts per excavation sequence over the chainage snapshot
    pub excavation_counts: Vec<ExcavationCount>,
    /// `time_taken` statistics over the final snapshot (minutes)
    pub time_stats: Describe,
    /// `tunnel_chainage` statistics over the final snapshot (metres)
    pub chainage_stats: Describe,
    /// Minutes logged at the location
    pub total_time: f64,
    /// Minutes logged as delays at the location
    pub delay_time: f64,
    /// Minutes logged on the selected activity at the location
    pub activity_time: f64,
    /// Mean daily advance (metres/day); `None` for an empty final snapshot
    pub advance_rate: Option<f64>,
    /// Removal/spraying rate (m^3/min); `None` until inputs are filled in
    pub volume_rate: Option<f64>,
    /// Share of location time on the activity (%); `None` when nothing logged
    pub time_percent: Option<f64>,
    /// Share of location time on delays (%); `None` when nothing logged
    pub delay_percent: Option<f64>,
    /// New-project activity duration (minutes); `None` until inputs filled in
    pub new_time_volume: Option<f64>,
    /// New-project duration with delays (days); `None` until inputs filled in
    pub new_delay: Option<f64>,
}

/// Engine over one normalized activity batch.
///
/// Construction runs normalization and field derivation once; evaluation is
/// a pure function of the stored table and the supplied parameters, so a
/// single engine can serve any number of filter invocations.
pub struct DatumEngine {
    table: Vec<ActivityRecord>,
    stats: ParseStats,
}

impl DatumEngine {
    /// Build an engine from a CSV batch held in memory
    pub fn from_csv_str(data: &str) -> Result<Self, DatumError> {
        let batch = RecordNormalizer::from_csv_str(data)?;
        Ok(Self {
            table: FieldDeriver::derive_all(batch.rows),
            stats: batch.stats,
        })
    }

    /// Build an engine from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatumError> {
        let batch = RecordNormalizer::from_reader(reader)?;
        Ok(Self {
            table: FieldDeriver::derive_all(batch.rows),
            stats: batch.stats,
        })
    }

    /// Build an engine from a CSV file path
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, DatumError> {
        let batch = RecordNormalizer::from_csv_path(path)?;
        Ok(Self {
            table: FieldDeriver::derive_all(batch.rows),
            stats: batch.stats,
        })
    }

    /// Build an engine over the bundled sample batch
    pub fn from_default_batch() -> Result<Self, DatumError> {
        Self::from_csv_str(DEFAULT_BATCH)
    }

    /// The full derived table, for charting layers
    pub fn table(&self) -> &[ActivityRecord] {
        &self.table
    }

    /// Parse accounting for the batch this engine was built from
    pub fn parse_stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Distinct location labels in first-seen order
    pub fn locations(&self) -> Vec<&str> {
        distinct(self.table.iter().map(|r| r.location.as_str()))
    }

    /// Distinct activity labels in first-seen order
    pub fn activities(&self) -> Vec<&str> {
        distinct(self.table.iter().map(|r| r.activity.as_str()))
    }

    /// Dataset chainage extent: minimum start metre and maximum finish
    /// metre. The presentation layer seeds its range slider with these.
    /// `None` for an empty table.
    pub fn chainage_bounds(&self) -> Option<(f64, f64)> {
        if self.table.is_empty() {
            return None;
        }
        let min = self
            .table
            .iter()
            .map(|r| r.tunnel_meter_start)
            .fold(f64::INFINITY, f64::min);
        let max = self
            .table
            .iter()
            .map(|r| r.tunnel_meter_finish)
            .fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }

    /// Borrowed snapshots for one filter state
    pub fn snapshots<'a>(&'a self, state: &FilterState) -> FilterSnapshots<'a> {
        FilterPipeline::apply(&self.table, state)
    }

    /// Evaluate one filter/estimation invocation into the full metric set.
    ///
    /// Every arithmetic step tolerates empty snapshots: sums are zero and
    /// gated or zero-denominator metrics come back as `None`.
    pub fn evaluate(&self, filters: &FilterState, inputs: &EstimationInputs) -> SessionMetrics {
        let snapshots = self.snapshots(filters);

        let total_time = RateEstimator::total_time(&snapshots.location);
        let delay_time = RateEstimator::delay_time(&snapshots.location);
        let activity_time = RateEstimator::activity_time(&snapshots.activity);

        let time_values: Vec<f64> = snapshots.sequence.iter().map(|r| r.time_taken).collect();
        let chainage_values: Vec<f64> = snapshots
            .sequence
            .iter()
            .map(|r| r.tunnel_chainage)
            .collect();

        SessionMetrics {
            snapshot_sizes: SnapshotSizes {
                location: snapshots.location.len(),
                activity: snapshots.activity.len(),
                chainage: snapshots.chainage.len(),
                sequence: snapshots.sequence.len(),
            },
            excavation_counts: excavation_counts(&snapshots.chainage),
            time_stats: describe(&time_values),
            chainage_stats: describe(&chainage_values),
            total_time,
            delay_time,
            activity_time,
            advance_rate: RateEstimator::advance_rate(&snapshots.sequence),
            volume_rate: RateEstimator::volume_rate(inputs),
            time_percent: RateEstimator::time_percent(activity_time, total_time),
            delay_percent: RateEstimator::delay_percent(delay_time, total_time),
            new_time_volume: Projector::new_time_volume(inputs),
            new_delay: Projector::new_delay(inputs, delay_time, total_time),
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}
