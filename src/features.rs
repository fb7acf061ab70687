//! Derived-field calculation
//!
//! This module adds the two derived fields to each normalized row:
//! - `tunnel_chainage`: metres advanced, finish metre minus start metre
//! - `time_taken`: elapsed minutes, wrapped across midnight
//!
//! The transform is pure per row: the normalized row is consumed and a new
//! record returned, so the table is never patched in place.

use chrono::NaiveTime;

use crate::types::{ActivityRecord, NormalizedRow};

/// Minutes in one day, added when a shift crosses midnight
const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// Field deriver for computing the per-record derived values
pub struct FieldDeriver;

impl FieldDeriver {
    /// Derive the chainage and elapsed-time fields for one row
    pub fn derive(row: NormalizedRow) -> ActivityRecord {
        let tunnel_chainage = row.tunnel_meter_finish - row.tunnel_meter_start;
        let time_taken = elapsed_minutes(row.time_start, row.time_stop);

        ActivityRecord {
            location: row.location,
            activity: row.activity,
            excavation_seq: row.excavation_seq,
            tunnel_meter_start: row.tunnel_meter_start,
            tunnel_meter_finish: row.tunnel_meter_finish,
            time_start: row.time_start,
            time_stop: row.time_stop,
            date: row.date,
            date_logged: row.date_logged,
            tunnel_chainage,
            time_taken,
        }
    }

    /// Derive fields for a whole batch
    pub fn derive_all(rows: Vec<NormalizedRow>) -> Vec<ActivityRecord> {
        rows.into_iter().map(Self::derive).collect()
    }
}

/// Minutes from `start` to `stop`, wrapped to non-negative for shifts that
/// cross midnight. Always in `[0, 1440)`.
fn elapsed_minutes(start: NaiveTime, stop: NaiveTime) -> f64 {
    let raw = stop.signed_duration_since(start).num_seconds() as f64 / 60.0;
    if raw < 0.0 {
        raw + MINUTES_PER_DAY
    } else {
        raw
    }
}
