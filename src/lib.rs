//! Tunnel Datum - metric derivation and estimation engine for
//! tunnel-construction activity logs
//!
//! Datum turns raw activity-log rows (location, activity, excavation
//! sequence, chainage, shift times) into filtered aggregates and
//! project-level estimates through a deterministic pipeline: record
//! normalization → field derivation → filtering → aggregation → rate
//! estimation → projection.
//!
//! The presentation layer supplies a [`FilterState`] and [`EstimationInputs`]
//! on every run and renders the outputs; it owns no derivation logic. The
//! engine processes one finite batch per invocation and keeps no state
//! between invocations beyond the table it was built from.

pub mod error;
pub mod features;
pub mod filter;
pub mod normalizer;
pub mod pipeline;
pub mod projection;
pub mod rates;
pub mod report;
pub mod stats;
pub mod types;

pub use error::DatumError;
pub use filter::{FilterPipeline, FilterSnapshots, FilterState};
pub use normalizer::{NormalizedBatch, ParseStats, RecordNormalizer, REQUIRED_COLUMNS};
pub use pipeline::{DatumEngine, SessionMetrics, SnapshotSizes};
pub use rates::{EstimationInputs, RateEstimator};
pub use report::{DatumReport, ReportEncoder, REPORT_VERSION};
pub use stats::{describe, excavation_counts, Describe, ExcavationCount};
pub use types::{ActivityRecord, ExcavationSeq, DELAY_ACTIVITY, NOT_AVAILABLE};

/// Engine version embedded in all report payloads
pub const DATUM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "tunnel-datum";
