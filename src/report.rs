//! Report encoding
//!
//! This module wraps one session's metrics in a versioned payload with
//! producer and provenance metadata, so the presentation layer can render
//! (and cache) the result verbatim. The encoder only rounds numbers; it
//! never formats for display.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DatumError;
use crate::filter::FilterState;
use crate::normalizer::ParseStats;
use crate::pipeline::SessionMetrics;
use crate::rates::EstimationInputs;
use crate::{DATUM_VERSION, PRODUCER_NAME};

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Report provenance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProvenance {
    /// Where the batch came from (path, "stdin", or "bundled sample")
    pub source: String,
    pub computed_at_utc: String,
    pub total_records: usize,
    pub rows_skipped: usize,
}

/// Complete report payload for one engine invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatumReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    /// Filter parameters the metrics were computed under
    pub filters: FilterState,
    /// Estimation inputs the metrics were computed under
    pub estimation: EstimationInputs,
    pub metrics: SessionMetrics,
}

/// Report encoder producing versioned payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Wrap session metrics in a full report payload
    pub fn encode(
        &self,
        source: &str,
        stats: &ParseStats,
        filters: &FilterState,
        estimation: &EstimationInputs,
        metrics: SessionMetrics,
    ) -> DatumReport {
        DatumReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: DATUM_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            provenance: ReportProvenance {
                source: source.to_string(),
                computed_at_utc: Utc::now().to_rfc3339(),
                total_records: stats.total_records,
                rows_skipped: stats.rows_skipped,
            },
            filters: filters.clone(),
            estimation: estimation.clone(),
            metrics,
        }
    }

    /// Encode to pretty-printed JSON
    pub fn encode_to_json(
        &self,
        source: &str,
        stats: &ParseStats,
        filters: &FilterState,
        estimation: &EstimationInputs,
        metrics: SessionMetrics,
    ) -> Result<String, DatumError> {
        let report = self.encode(source, stats, filters, estimation, metrics);
        serde_json::to_string_pretty(&report).map_err(DatumError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::DatumEngine;
    use crate::types::ExcavationSeq;

    fn sample_report() -> DatumReport {
        let engine = DatumEngine::from_default_batch().unwrap();
        let filters = FilterState {
            location: "Portal North".to_string(),
            activity: "Excavation".to_string(),
            chainage_min: 0.0,
            chainage_max: 1000.0,
            excavation_seq: ExcavationSeq::TopHeading,
        };
        let inputs = EstimationInputs::default();
        let metrics = engine.evaluate(&filters, &inputs);

        ReportEncoder::with_instance_id("test-instance".to_string()).encode(
            "bundled sample",
            engine.parse_stats(),
            &filters,
            &inputs,
            metrics,
        )
    }

    #[test]
    fn test_report_carries_producer_and_provenance() {
        let report = sample_report();

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.instance_id, "test-instance");
        assert_eq!(report.provenance.source, "bundled sample");
        assert_eq!(report.provenance.rows_skipped, 0);
    }

    #[test]
    fn test_report_json_round_trip() {
        let report = sample_report();
        let json = serde_json::to_string(&report).unwrap();
        let parsed: DatumReport = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.metrics.total_time, report.metrics.total_time);
        assert_eq!(parsed.filters.location, "Portal North");

        // Not-computable metrics serialize as null, never as zero
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["metrics"]["volume_rate"].is_null());
    }

    #[test]
    fn test_encode_to_json() {
        let engine = DatumEngine::from_default_batch().unwrap();
        let filters = FilterState {
            location: "Portal South".to_string(),
            activity: "Excavation".to_string(),
            chainage_min: 500.0,
            chainage_max: 600.0,
            excavation_seq: ExcavationSeq::FullFace,
        };
        let inputs = EstimationInputs::default();
        let metrics = engine.evaluate(&filters, &inputs);

        let json = ReportEncoder::new()
            .encode_to_json("bundled sample", engine.parse_stats(), &filters, &inputs, metrics)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["report_version"], REPORT_VERSION);
        assert_eq!(value["filters"]["excavation_seq"], "Full Face (FF)");
    }
}
