//! Core types for the tunnel-datum pipeline
//!
//! This module defines the data that flows through each stage of the
//! pipeline: normalized rows, derived activity records, and the excavation
//! sequence category set.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Sentinel category substituted for a missing location or activity value
pub const NOT_AVAILABLE: &str = "Not available";

/// Activity label that marks a delay row
pub const DELAY_ACTIVITY: &str = "Delay";

/// Excavation sequence stage. The set is closed; the variant order below is
/// the fixed order used in every count table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExcavationSeq {
    #[serde(rename = "Bench (B)")]
    Bench,
    #[serde(rename = "Bench/Invert (B/I)")]
    BenchInvert,
    #[serde(rename = "CTR")]
    Ctr,
    #[serde(rename = "Full Face (FF)")]
    FullFace,
    #[serde(rename = "Invert (I)")]
    Invert,
    #[serde(rename = "LHS")]
    Lhs,
    #[serde(rename = "RHS")]
    Rhs,
    #[serde(rename = "Shaft (S)")]
    Shaft,
    #[serde(rename = "Top Heading (TH)")]
    TopHeading,
    #[serde(rename = "Not applicable")]
    NotApplicable,
}

impl ExcavationSeq {
    /// All categories in the fixed reporting order
    pub const ALL: [ExcavationSeq; 10] = [
        ExcavationSeq::Bench,
        ExcavationSeq::BenchInvert,
        ExcavationSeq::Ctr,
        ExcavationSeq::FullFace,
        ExcavationSeq::Invert,
        ExcavationSeq::Lhs,
        ExcavationSeq::Rhs,
        ExcavationSeq::Shaft,
        ExcavationSeq::TopHeading,
        ExcavationSeq::NotApplicable,
    ];

    /// The label used in activity-log data and report tables
    pub fn as_str(&self) -> &'static str {
        match self {
            ExcavationSeq::Bench => "Bench (B)",
            ExcavationSeq::BenchInvert => "Bench/Invert (B/I)",
            ExcavationSeq::Ctr => "CTR",
            ExcavationSeq::FullFace => "Full Face (FF)",
            ExcavationSeq::Invert => "Invert (I)",
            ExcavationSeq::Lhs => "LHS",
            ExcavationSeq::Rhs => "RHS",
            ExcavationSeq::Shaft => "Shaft (S)",
            ExcavationSeq::TopHeading => "Top Heading (TH)",
            ExcavationSeq::NotApplicable => "Not applicable",
        }
    }

    /// Parse a data label. Accepts the full label ("Bench (B)") or the bare
    /// stage name ("Bench"); an empty label maps to `NotApplicable` so that
    /// count tables always cover every row.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "" => Some(ExcavationSeq::NotApplicable),
            "Bench (B)" | "Bench" => Some(ExcavationSeq::Bench),
            "Bench/Invert (B/I)" | "Bench/Invert" => Some(ExcavationSeq::BenchInvert),
            "CTR" => Some(ExcavationSeq::Ctr),
            "Full Face (FF)" | "Full Face" => Some(ExcavationSeq::FullFace),
            "Invert (I)" | "Invert" => Some(ExcavationSeq::Invert),
            "LHS" => Some(ExcavationSeq::Lhs),
            "RHS" => Some(ExcavationSeq::Rhs),
            "Shaft (S)" | "Shaft" => Some(ExcavationSeq::Shaft),
            "Top Heading (TH)" | "Top Heading" => Some(ExcavationSeq::TopHeading),
            "Not applicable" => Some(ExcavationSeq::NotApplicable),
            _ => None,
        }
    }
}

/// One activity-log row after schema checking and parsing, before the
/// derived fields are added
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    /// Work location (portal, shaft, heading name)
    pub location: String,
    /// Activity carried out, including the distinguished "Delay"
    pub activity: String,
    /// Excavation sequence stage
    pub excavation_seq: ExcavationSeq,
    /// Chainage at the start of the activity (metres)
    pub tunnel_meter_start: f64,
    /// Chainage at the end of the activity (metres)
    pub tunnel_meter_finish: f64,
    /// Shift start time of day
    pub time_start: NaiveTime,
    /// Shift stop time of day
    pub time_stop: NaiveTime,
    /// Calendar date the work was carried out
    pub date: NaiveDate,
    /// Calendar date the row was logged
    pub date_logged: NaiveDate,
}

/// One fully derived activity record. The derived fields are computed once
/// when the table is built and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub location: String,
    pub activity: String,
    pub excavation_seq: ExcavationSeq,
    pub tunnel_meter_start: f64,
    pub tunnel_meter_finish: f64,
    pub time_start: NaiveTime,
    pub time_stop: NaiveTime,
    pub date: NaiveDate,
    pub date_logged: NaiveDate,
    /// Signed advance: finish metre minus start metre
    pub tunnel_chainage: f64,
    /// Elapsed minutes, wrapped across midnight; always in `[0, 1440)`
    pub time_taken: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_labels() {
        for seq in ExcavationSeq::ALL {
            assert_eq!(ExcavationSeq::parse(seq.as_str()), Some(seq));
        }
    }

    #[test]
    fn test_parse_bare_names() {
        assert_eq!(ExcavationSeq::parse("Bench"), Some(ExcavationSeq::Bench));
        assert_eq!(
            ExcavationSeq::parse("Top Heading"),
            Some(ExcavationSeq::TopHeading)
        );
        assert_eq!(ExcavationSeq::parse("LHS"), Some(ExcavationSeq::Lhs));
    }

    #[test]
    fn test_parse_empty_is_not_applicable() {
        assert_eq!(ExcavationSeq::parse(""), Some(ExcavationSeq::NotApplicable));
        assert_eq!(
            ExcavationSeq::parse("  "),
            Some(ExcavationSeq::NotApplicable)
        );
    }

    #[test]
    fn test_parse_unknown_label() {
        assert_eq!(ExcavationSeq::parse("Sidewall"), None);
    }

    #[test]
    fn test_serde_uses_data_labels() {
        let json = serde_json::to_string(&ExcavationSeq::BenchInvert).unwrap();
        assert_eq!(json, "\"Bench/Invert (B/I)\"");

        let parsed: ExcavationSeq = serde_json::from_str("\"Top Heading (TH)\"").unwrap();
        assert_eq!(parsed, ExcavationSeq::TopHeading);
    }
}
