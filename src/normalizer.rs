//! Record normalization
//!
//! This module turns raw activity-log CSV rows into typed rows:
//! - Required-column schema check (fatal when a column is absent)
//! - Time-of-day and calendar-date parsing
//! - Sentinel substitution for missing categorical values
//!
//! A row whose time, date, or metre value cannot be parsed is skipped
//! individually and accounted for in [`ParseStats`]; only a missing column or
//! unreadable input aborts the batch.

use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::DatumError;
use crate::types::{ExcavationSeq, NormalizedRow, NOT_AVAILABLE};

/// Columns the engine consumes. A batch missing any of these is rejected.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "location",
    "activity",
    "excavation_seq",
    "tunnel_meter_start",
    "tunnel_meter_finish",
    "time_start",
    "time_stop",
    "date",
    "date_logged",
];

/// Accepted time-of-day formats
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Accepted calendar-date formats
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// Raw CSV row restricted to the recognized columns. The passthrough columns
/// (user, report_id, round_no, gang, equipment, delays, additional_info) are
/// never read and drop out here.
#[derive(Debug, Clone, Deserialize)]
struct RawActivityRow {
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    activity: Option<String>,
    #[serde(default)]
    excavation_seq: Option<String>,
    #[serde(default)]
    tunnel_meter_start: Option<String>,
    #[serde(default)]
    tunnel_meter_finish: Option<String>,
    #[serde(default)]
    time_start: Option<String>,
    #[serde(default)]
    time_stop: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    date_logged: Option<String>,
}

/// Parsing statistics for one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseStats {
    /// Total number of data rows encountered
    pub total_records: usize,
    /// Rows successfully normalized
    pub rows_parsed: usize,
    /// Rows skipped because a field could not be parsed
    pub rows_skipped: usize,
    /// One message per skipped row
    pub errors: Vec<String>,
}

impl ParseStats {
    pub fn new() -> Self {
        Self {
            total_records: 0,
            rows_parsed: 0,
            rows_skipped: 0,
            errors: Vec::new(),
        }
    }

    /// Share of rows successfully normalized, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            (self.rows_parsed as f64 / self.total_records as f64) * 100.0
        }
    }
}

impl Default for ParseStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalized batch: typed rows plus parse accounting
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    pub rows: Vec<NormalizedRow>,
    pub stats: ParseStats,
}

/// Normalizer for converting raw CSV batches into typed rows
pub struct RecordNormalizer;

impl RecordNormalizer {
    /// Normalize a CSV batch held in memory
    pub fn from_csv_str(data: &str) -> Result<NormalizedBatch, DatumError> {
        Self::from_reader(data.as_bytes())
    }

    /// Normalize a CSV batch from a file path
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<NormalizedBatch, DatumError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Normalize a CSV batch from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<NormalizedBatch, DatumError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        check_schema(rdr.headers()?)?;

        let mut rows = Vec::new();
        let mut stats = ParseStats::new();

        for (index, result) in rdr.deserialize::<RawActivityRow>().enumerate() {
            stats.total_records += 1;
            // 1-based data row number, counting the header line
            let row_no = index + 2;

            let parsed = result
                .map_err(DatumError::CsvError)
                .and_then(|raw| normalize_row(raw, row_no));

            match parsed {
                Ok(row) => {
                    rows.push(row);
                    stats.rows_parsed += 1;
                }
                Err(e) => {
                    warn!(row = row_no, error = %e, "skipping unparsable activity row");
                    stats.rows_skipped += 1;
                    stats.errors.push(e.to_string());
                }
            }
        }

        Ok(NormalizedBatch { rows, stats })
    }
}

fn check_schema(headers: &csv::StringRecord) -> Result<(), DatumError> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(DatumError::SchemaError(column.to_string()));
        }
    }
    Ok(())
}

fn normalize_row(raw: RawActivityRow, row: usize) -> Result<NormalizedRow, DatumError> {
    // Numeric and temporal fields must parse before any sentinel fill so a
    // missing metre or time rejects the row instead of becoming a zero.
    let tunnel_meter_start = parse_metre(raw.tunnel_meter_start.as_deref(), "tunnel_meter_start", row)?;
    let tunnel_meter_finish = parse_metre(raw.tunnel_meter_finish.as_deref(), "tunnel_meter_finish", row)?;
    let time_start = parse_time(raw.time_start.as_deref(), "time_start", row)?;
    let time_stop = parse_time(raw.time_stop.as_deref(), "time_stop", row)?;
    let date = parse_date(raw.date.as_deref(), "date", row)?;
    let date_logged = parse_date(raw.date_logged.as_deref(), "date_logged", row)?;
    let excavation_seq = parse_sequence(raw.excavation_seq.as_deref(), row)?;

    Ok(NormalizedRow {
        location: fill_category(raw.location),
        activity: fill_category(raw.activity),
        excavation_seq,
        tunnel_meter_start,
        tunnel_meter_finish,
        time_start,
        time_stop,
        date,
        date_logged,
    })
}

/// Missing categorical values become an explicit category rather than null so
/// grouping and filtering keep those rows visible.
fn fill_category(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn parse_metre(value: Option<&str>, field: &str, row: usize) -> Result<f64, DatumError> {
    let text = non_empty(value).ok_or_else(|| DatumError::RowParse {
        row,
        message: format!("missing {field}"),
    })?;
    text.parse::<f64>().map_err(|_| DatumError::RowParse {
        row,
        message: format!("invalid {field}: {text}"),
    })
}

fn parse_time(value: Option<&str>, field: &str, row: usize) -> Result<NaiveTime, DatumError> {
    let text = non_empty(value).ok_or_else(|| DatumError::RowParse {
        row,
        message: format!("missing {field}"),
    })?;
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| DatumError::RowParse {
            row,
            message: format!("invalid {field}: {text}"),
        })
}

fn parse_date(value: Option<&str>, field: &str, row: usize) -> Result<NaiveDate, DatumError> {
    let text = non_empty(value).ok_or_else(|| DatumError::RowParse {
        row,
        message: format!("missing {field}"),
    })?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .ok_or_else(|| DatumError::RowParse {
            row,
            message: format!("invalid {field}: {text}"),
        })
}

/// An absent excavation sequence counts as "Not applicable"; an unrecognized
/// label rejects the row, since the category set is closed.
fn parse_sequence(value: Option<&str>, row: usize) -> Result<ExcavationSeq, DatumError> {
    let label = value.unwrap_or("");
    ExcavationSeq::parse(label).ok_or_else(|| DatumError::RowParse {
        row,
        message: format!("unknown excavation_seq: {label}"),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "user,report_id,date,date_logged,location,activity,excavation_seq,round_no,gang,equipment,tunnel_meter_start,tunnel_meter_finish,time_start,time_stop,delays,additional_info";

    fn batch(rows: &[&str]) -> String {
        let mut csv = String::from(HEADER);
        for row in rows {
            csv.push('\n');
            csv.push_str(row);
        }
        csv
    }

    #[test]
    fn test_normalizes_valid_rows() {
        let data = batch(&[
            "js,R1,2023-03-01,2023-03-01,Portal North,Excavation,Top Heading (TH),1,A,Jumbo,120.0,121.8,07:30,11:45,,",
            "js,R1,2023-03-01,2023-03-01,Portal North,Delay,Not applicable,1,A,,121.8,121.8,11:45,12:00,survey,",
        ]);

        let result = RecordNormalizer::from_csv_str(&data).unwrap();
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.stats.rows_parsed, 2);
        assert_eq!(result.stats.rows_skipped, 0);

        let first = &result.rows[0];
        assert_eq!(first.location, "Portal North");
        assert_eq!(first.excavation_seq, ExcavationSeq::TopHeading);
        assert_eq!(first.tunnel_meter_start, 120.0);
        assert_eq!(first.tunnel_meter_finish, 121.8);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let data = "user,date,location,activity,excavation_seq,tunnel_meter_start,tunnel_meter_finish,time_start,time_stop\n\
                    js,2023-03-01,Portal,Excavation,CTR,1.0,2.0,07:00,08:00";

        let err = RecordNormalizer::from_csv_str(data).unwrap_err();
        match err {
            DatumError::SchemaError(column) => assert_eq!(column, "date_logged"),
            other => panic!("expected SchemaError, got {other:?}"),
        }
    }

    #[test]
    fn test_unparsable_time_skips_row() {
        let data = batch(&[
            "js,R1,2023-03-01,2023-03-01,Portal,Excavation,CTR,1,A,,1.0,2.0,25:99,08:00,,",
            "js,R1,2023-03-01,2023-03-01,Portal,Excavation,CTR,1,A,,2.0,3.0,07:00,08:00,,",
        ]);

        let result = RecordNormalizer::from_csv_str(&data).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.stats.total_records, 2);
        assert_eq!(result.stats.rows_skipped, 1);
        assert_eq!(result.stats.errors.len(), 1);
        assert!(result.stats.errors[0].contains("time_start"));
        assert_eq!(result.stats.success_rate(), 50.0);
    }

    #[test]
    fn test_missing_metre_rejects_row_instead_of_zero() {
        let data = batch(&[
            "js,R1,2023-03-01,2023-03-01,Portal,Excavation,CTR,1,A,,,2.0,07:00,08:00,,",
        ]);

        let result = RecordNormalizer::from_csv_str(&data).unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.stats.rows_skipped, 1);
        assert!(result.stats.errors[0].contains("tunnel_meter_start"));
    }

    #[test]
    fn test_missing_categories_become_sentinel() {
        let data = batch(&[
            "js,R1,2023-03-01,2023-03-01,,,,1,A,,1.0,2.0,07:00,08:00,,",
        ]);

        let result = RecordNormalizer::from_csv_str(&data).unwrap();
        let row = &result.rows[0];
        assert_eq!(row.location, NOT_AVAILABLE);
        assert_eq!(row.activity, NOT_AVAILABLE);
        assert_eq!(row.excavation_seq, ExcavationSeq::NotApplicable);
    }

    #[test]
    fn test_unknown_sequence_label_skips_row() {
        let data = batch(&[
            "js,R1,2023-03-01,2023-03-01,Portal,Excavation,Sidewall,1,A,,1.0,2.0,07:00,08:00,,",
        ]);

        let result = RecordNormalizer::from_csv_str(&data).unwrap();
        assert!(result.rows.is_empty());
        assert!(result.stats.errors[0].contains("excavation_seq"));
    }

    #[test]
    fn test_alternate_date_and_time_formats() {
        let data = batch(&[
            "js,R1,01/03/2023,01/03/2023,Portal,Excavation,CTR,1,A,,1.0,2.0,07:00:30,08:00:00,,",
        ]);

        let result = RecordNormalizer::from_csv_str(&data).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(
            result.rows[0].date,
            NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()
        );
    }
}
