//! Datum CLI - command-line interface for Tunnel Datum
//!
//! Commands:
//! - report: Derive session metrics from an activity-log CSV
//! - validate: Check an activity-log CSV against the input schema
//! - schema: Print input column and output payload information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use tunnel_datum::{
    DatumEngine, DatumError, DatumReport, EstimationInputs, ExcavationSeq, FilterState,
    ReportEncoder, DATUM_VERSION, PRODUCER_NAME, REPORT_VERSION, REQUIRED_COLUMNS,
};

/// Datum - metric derivation and estimation engine for tunnel activity logs
#[derive(Parser)]
#[command(name = "datum")]
#[command(version = DATUM_VERSION)]
#[command(about = "Derive operational metrics from tunnel-construction activity logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive session metrics from an activity-log CSV
    Report {
        /// Input CSV path (use - for stdin; omit for the bundled sample batch)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format (auto = text on a TTY, json otherwise)
        #[arg(long, default_value = "auto")]
        format: ReportFormat,

        /// Location of interest
        #[arg(long)]
        location: String,

        /// Activity of interest
        #[arg(long)]
        activity: String,

        /// Excavation sequence of interest, e.g. "Top Heading (TH)"
        #[arg(long)]
        excavation_seq: String,

        /// Lower chainage bound, exclusive (defaults to the dataset minimum
        /// start metre)
        #[arg(long)]
        chainage_min: Option<f64>,

        /// Upper chainage bound, exclusive (defaults to the dataset maximum
        /// finish metre)
        #[arg(long)]
        chainage_max: Option<f64>,

        /// Theoretical excavation/spraying area (m^2)
        #[arg(long, default_value = "10.0")]
        theoretical_area: f64,

        /// Overprofile of the excavation/spraying area (m^2)
        #[arg(long, default_value = "0.0")]
        overprofile_area: f64,

        /// Time taken per advance in minutes (defaults to the session mean)
        #[arg(long)]
        time_per_advance: Option<f64>,

        /// Distance per advance in metres (defaults to the session mean)
        #[arg(long)]
        distance_per_advance: Option<f64>,

        /// New project theoretical area (m^2)
        #[arg(long, default_value = "0.0")]
        new_area: f64,

        /// New project overprofile area (m^2)
        #[arg(long, default_value = "0.0")]
        new_overprofile: f64,

        /// New project advance length (metres)
        #[arg(long, default_value = "0.0")]
        new_advance_length: f64,

        /// Estimated new project duration (days)
        #[arg(long, default_value = "0.0")]
        project_duration: f64,
    },

    /// Check an activity-log CSV against the input schema
    Validate {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, ValueEnum)]
enum ReportFormat {
    /// Text on a TTY, JSON otherwise
    Auto,
    /// Human-readable text tables
    Text,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input CSV columns
    Input,
    /// Output report payload
    Output,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), DatumCliError> {
    match cli.command {
        Commands::Report {
            input,
            output,
            format,
            location,
            activity,
            excavation_seq,
            chainage_min,
            chainage_max,
            theoretical_area,
            overprofile_area,
            time_per_advance,
            distance_per_advance,
            new_area,
            new_overprofile,
            new_advance_length,
            project_duration,
        } => cmd_report(ReportArgs {
            input,
            output,
            format,
            location,
            activity,
            excavation_seq,
            chainage_min,
            chainage_max,
            theoretical_area,
            overprofile_area,
            time_per_advance,
            distance_per_advance,
            new_area,
            new_overprofile,
            new_advance_length,
            project_duration,
        }),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

struct ReportArgs {
    input: Option<PathBuf>,
    output: PathBuf,
    format: ReportFormat,
    location: String,
    activity: String,
    excavation_seq: String,
    chainage_min: Option<f64>,
    chainage_max: Option<f64>,
    theoretical_area: f64,
    overprofile_area: f64,
    time_per_advance: Option<f64>,
    distance_per_advance: Option<f64>,
    new_area: f64,
    new_overprofile: f64,
    new_advance_length: f64,
    project_duration: f64,
}

fn cmd_report(args: ReportArgs) -> Result<(), DatumCliError> {
    let (engine, source) = load_engine(args.input.as_deref())?;

    let excavation_seq = ExcavationSeq::parse(&args.excavation_seq)
        .ok_or_else(|| DatumCliError::UnknownSequence(args.excavation_seq.clone()))?;

    // The chainage slider defaults to the dataset extent; strict filter
    // bounds mean rows at the exact extremes drop out, as on the dashboard.
    let (bound_min, bound_max) = engine.chainage_bounds().unwrap_or((0.0, 0.0));
    let filters = FilterState {
        location: args.location,
        activity: args.activity,
        chainage_min: args.chainage_min.unwrap_or(bound_min),
        chainage_max: args.chainage_max.unwrap_or(bound_max),
        excavation_seq,
    };

    // First pass gives the per-advance statistics that seed the estimation
    // defaults; the metrics are then recomputed with the final inputs.
    let preview = engine.evaluate(&filters, &EstimationInputs::default());
    let inputs = EstimationInputs {
        theoretical_area: args.theoretical_area,
        overprofile_area: args.overprofile_area,
        time_per_advance: args
            .time_per_advance
            .or(preview.time_stats.mean)
            .unwrap_or(0.0),
        distance_per_advance: args
            .distance_per_advance
            .or(preview.chainage_stats.mean)
            .unwrap_or(0.0),
        new_area: args.new_area,
        new_overprofile: args.new_overprofile,
        new_advance_length: args.new_advance_length,
        project_duration: args.project_duration,
    };

    let metrics = engine.evaluate(&filters, &inputs);
    let report = ReportEncoder::new().encode(
        &source,
        engine.parse_stats(),
        &filters,
        &inputs,
        metrics,
    );

    let to_stdout = args.output.to_string_lossy() == "-";
    let rendered = match resolve_format(args.format, to_stdout) {
        ResolvedFormat::Text => render_text(&report),
        ResolvedFormat::Json => serde_json::to_string(&report)?,
        ResolvedFormat::JsonPretty => serde_json::to_string_pretty(&report)?,
    };

    if to_stdout {
        println!("{rendered}");
    } else {
        fs::write(&args.output, rendered + "\n")?;
    }

    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), DatumCliError> {
    let (engine, source) = load_engine(Some(input))?;
    let stats = engine.parse_stats();

    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Source:       {source}");
        println!("Total rows:   {}", stats.total_records);
        println!("Parsed rows:  {}", stats.rows_parsed);
        println!("Skipped rows: {}", stats.rows_skipped);
        println!("Success rate: {:.1}%", stats.success_rate());

        if !stats.errors.is_empty() {
            println!("\nErrors:");
            for error in &stats.errors {
                println!("  - {error}");
            }
        }
    }

    if stats.rows_skipped > 0 {
        Err(DatumCliError::ValidationFailed(stats.rows_skipped))
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), DatumCliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Input Schema: activity-log CSV");
            println!();
            println!("Required columns:");
            for column in REQUIRED_COLUMNS {
                println!("  - {column}");
            }
            println!();
            println!("Times use HH:MM (HH:MM:SS accepted); dates use YYYY-MM-DD");
            println!("(DD/MM/YYYY accepted). Shifts crossing midnight are handled.");
            println!();
            println!("Passthrough columns are dropped unread: user, report_id,");
            println!("round_no, gang, equipment, delays, additional_info.");
            println!();
            println!("Excavation sequence labels:");
            for seq in ExcavationSeq::ALL {
                println!("  - {}", seq.as_str());
            }
        }
        SchemaType::Output => {
            println!("Output Schema: datum report {REPORT_VERSION}");
            println!();
            println!("The report payload contains:");
            println!();
            println!("- report_version: Schema version ({REPORT_VERSION})");
            println!("- producer: {{ name, version, instance_id }}");
            println!("- provenance: {{ source, computed_at_utc, total_records, rows_skipped }}");
            println!("- filters: The filter state the metrics were computed under");
            println!("- estimation: The estimation inputs supplied by the caller");
            println!("- metrics:");
            println!("  - snapshot_sizes: {{ location, activity, chainage, sequence }}");
            println!("  - excavation_counts: One count per sequence category, fixed order");
            println!("  - time_stats / chainage_stats: {{ count, mean, std, min, p25, median, p75, max }}");
            println!("  - total_time, delay_time, activity_time (minutes)");
            println!("  - advance_rate (m/day), volume_rate (m^3/min)");
            println!("  - time_percent, delay_percent (%)");
            println!("  - new_time_volume (minutes), new_delay (days)");
            println!();
            println!("Metrics that cannot be computed are null, never zero.");
        }
    }

    Ok(())
}

// Helper functions

fn load_engine(input: Option<&Path>) -> Result<(DatumEngine, String), DatumCliError> {
    match input {
        None => Ok((DatumEngine::from_default_batch()?, "bundled sample".to_string())),
        Some(path) if path.to_string_lossy() == "-" => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok((DatumEngine::from_csv_str(&buffer)?, "stdin".to_string()))
        }
        Some(path) => Ok((
            DatumEngine::from_csv_path(path)?,
            path.to_string_lossy().into_owned(),
        )),
    }
}

enum ResolvedFormat {
    Text,
    Json,
    JsonPretty,
}

fn resolve_format(format: ReportFormat, to_stdout: bool) -> ResolvedFormat {
    match format {
        ReportFormat::Auto => {
            if to_stdout && atty::is(atty::Stream::Stdout) {
                ResolvedFormat::Text
            } else {
                ResolvedFormat::Json
            }
        }
        ReportFormat::Text => ResolvedFormat::Text,
        ReportFormat::Json => ResolvedFormat::Json,
        ReportFormat::JsonPretty => ResolvedFormat::JsonPretty,
    }
}

fn render_text(report: &DatumReport) -> String {
    let metrics = &report.metrics;
    let mut out = String::new();

    out.push_str(&format!("{PRODUCER_NAME} report ({DATUM_VERSION})\n"));
    out.push_str(&format!("Source: {}\n", report.provenance.source));
    out.push_str(&format!(
        "Rows: {} parsed, {} skipped\n",
        report.provenance.total_records - report.provenance.rows_skipped,
        report.provenance.rows_skipped
    ));
    out.push_str(&format!(
        "Filters: location={}, activity={}, chainage=({}, {}) exclusive, sequence={}\n",
        report.filters.location,
        report.filters.activity,
        report.filters.chainage_min,
        report.filters.chainage_max,
        report.filters.excavation_seq.as_str()
    ));

    out.push_str("\nActivity counts by excavation sequence:\n");
    for entry in &metrics.excavation_counts {
        out.push_str(&format!("  {:<22} {}\n", entry.sequence.as_str(), entry.count));
    }

    out.push_str("\nTime taken per advance (minutes):\n");
    out.push_str(&render_describe(&metrics.time_stats));
    out.push_str("\nChainage per advance (metres):\n");
    out.push_str(&render_describe(&metrics.chainage_stats));

    out.push_str("\nKey insights:\n");
    out.push_str(&format!(
        "  Advance rate of activity:     {}\n",
        format_metric(metrics.advance_rate, "metres/day")
    ));
    out.push_str(&format!(
        "  Removal/spraying rate:        {}\n",
        format_metric(metrics.volume_rate, "m^3/min")
    ));
    out.push_str(&format!(
        "  Time spent on activity:       {}\n",
        format_metric(metrics.time_percent, "%")
    ));
    out.push_str(&format!(
        "  Time spent on delays:         {}\n",
        format_metric(metrics.delay_percent, "%")
    ));

    out.push_str("\nEstimations for new project:\n");
    out.push_str(&format!(
        "  Estimated activity duration:  {}\n",
        format_metric(metrics.new_time_volume, "minutes")
    ));
    out.push_str(&format!(
        "  Duration factoring in delays: {}\n",
        format_metric(metrics.new_delay, "days")
    ));

    out
}

fn render_describe(stats: &tunnel_datum::Describe) -> String {
    let mut out = String::new();
    out.push_str(&format!("  Readings available:   {}\n", stats.count));
    out.push_str(&format!("  Average:              {}\n", format_stat(stats.mean)));
    out.push_str(&format!("  Standard deviation:   {}\n", format_stat(stats.std)));
    out.push_str(&format!("  Minimum:              {}\n", format_stat(stats.min)));
    out.push_str(&format!("  Lower quartile:       {}\n", format_stat(stats.p25)));
    out.push_str(&format!("  Median:               {}\n", format_stat(stats.median)));
    out.push_str(&format!("  Upper quartile:       {}\n", format_stat(stats.p75)));
    out.push_str(&format!("  Maximum:              {}\n", format_stat(stats.max)));
    out
}

fn format_metric(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v} {unit}"),
        None => "Not computable".to_string(),
    }
}

fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "Not available".to_string(),
    }
}

// Error types

#[derive(Debug)]
enum DatumCliError {
    Io(io::Error),
    Engine(DatumError),
    Json(serde_json::Error),
    UnknownSequence(String),
    ValidationFailed(usize),
}

impl From<io::Error> for DatumCliError {
    fn from(e: io::Error) -> Self {
        DatumCliError::Io(e)
    }
}

impl From<DatumError> for DatumCliError {
    fn from(e: DatumError) -> Self {
        DatumCliError::Engine(e)
    }
}

impl From<serde_json::Error> for DatumCliError {
    fn from(e: serde_json::Error) -> Self {
        DatumCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<DatumCliError> for CliError {
    fn from(e: DatumCliError) -> Self {
        match e {
            DatumCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            DatumCliError::Engine(e) => CliError {
                code: match e {
                    DatumError::SchemaError(_) => "SCHEMA_ERROR".to_string(),
                    _ => "ENGINE_ERROR".to_string(),
                },
                message: e.to_string(),
                hint: Some("Run 'datum schema input' for the expected columns".to_string()),
            },
            DatumCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            DatumCliError::UnknownSequence(label) => CliError {
                code: "UNKNOWN_SEQUENCE".to_string(),
                message: format!("unknown excavation sequence: {label}"),
                hint: Some("Run 'datum schema input' for the accepted labels".to_string()),
            },
            DatumCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{count} rows failed to parse"),
                hint: Some("Fix the listed rows and retry".to_string()),
            },
        }
    }
}
