//! Aggregation and descriptive statistics
//!
//! This module computes the excavation-sequence count table and the
//! named-field descriptive statistics reported for the final filtered
//! snapshot. Every statistic uses the same fixed-point rounding policy so
//! report values compare exactly.

use serde::{Deserialize, Serialize};

use crate::types::{ActivityRecord, ExcavationSeq};

/// Decimal places used for descriptive statistics
const STAT_DECIMALS: i32 = 4;

/// Descriptive statistics over one numeric column.
///
/// `count` is always defined. The value fields are `None` for an empty
/// input; `std` additionally needs at least two readings (sample standard
/// deviation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Describe {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub median: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl Describe {
    fn empty() -> Self {
        Self {
            count: 0,
            mean: None,
            std: None,
            min: None,
            p25: None,
            median: None,
            p75: None,
            max: None,
        }
    }
}

/// One row of the excavation-sequence count table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcavationCount {
    pub sequence: ExcavationSeq,
    pub count: u64,
}

/// Count snapshot rows per excavation-sequence category, in the fixed
/// reporting order. Categories with no rows report zero, and the counts
/// always sum to the snapshot length.
pub fn excavation_counts(rows: &[&ActivityRecord]) -> Vec<ExcavationCount> {
    ExcavationSeq::ALL
        .iter()
        .map(|&sequence| ExcavationCount {
            sequence,
            count: rows.iter().filter(|r| r.excavation_seq == sequence).count() as u64,
        })
        .collect()
}

/// Descriptive statistics with sample standard deviation and linearly
/// interpolated percentiles, each value rounded to four decimal places
pub fn describe(values: &[f64]) -> Describe {
    let count = values.len();
    if count == 0 {
        return Describe::empty();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let variance =
            sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count as f64 - 1.0);
        Some(variance.sqrt())
    } else {
        None
    };

    Describe {
        count,
        mean: Some(round_dp(mean, STAT_DECIMALS)),
        std: std.map(|s| round_dp(s, STAT_DECIMALS)),
        min: Some(round_dp(sorted[0], STAT_DECIMALS)),
        p25: Some(round_dp(percentile(&sorted, 0.25), STAT_DECIMALS)),
        median: Some(round_dp(percentile(&sorted, 0.50), STAT_DECIMALS)),
        p75: Some(round_dp(percentile(&sorted, 0.75), STAT_DECIMALS)),
        max: Some(round_dp(sorted[count - 1], STAT_DECIMALS)),
    }
}

/// Linearly interpolated percentile over a sorted, non-empty slice
fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

/// Round to `decimals` decimal places
pub(crate) fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
