//! tally - behavior tracking reports from the command line

mod cli;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tally_core::codec::{decode, DecodeContext};
use tally_core::{
    summarize, CoreError, DataType, FrequencyMode, Granularity, RawValue, ReportOptions,
    TallyConfig,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Behavior tracking reports",
    long_about = "Turns recorded behavior observations into interval-bucketed series and\n\
                  previous/current period summaries.\n\
                  \n\
                  Input files are JSON: a target record, and a list of observations as stored\n\
                  (id, target_id, timestamp, data_type, value).\n\
                  \n\
                  Examples:\n\
                    tally report --target t.json --observations o.json          # Table, daily\n\
                    tally report --target t.json --observations o.json -g week  # Weekly\n\
                    tally report ... --view chart --json                        # Chart data\n\
                    tally decode --data-type Duration 1:10                      # Parse form input\n\
                    tally collection targets.json                               # Summaries\n\
                  \n\
                  Environment Variables:\n\
                    TALLY_TIMEZONE                   # IANA zone for period boundaries\n\
                    TALLY_CONFIG                     # Config file location\n\
                    TALLY_NO_COLOR                   # Disable ANSI colors\n\
                    TALLY_LOG                        # Log filter, e.g. debug or tally_core=debug"
)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,

    /// Config file (default: <config dir>/tally/config.toml)
    #[arg(long, global = true, env = "TALLY_CONFIG")]
    config: Option<PathBuf>,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, global = true, env = "TALLY_NO_COLOR")]
    no_color: bool,
}

/// Arguments shared by every command that draws calendar periods
#[derive(Args)]
struct PeriodArgs {
    /// Reference time, RFC 3339 (default: now)
    #[arg(long)]
    now: Option<String>,

    /// Bucket width: day, week, month, year (or D, W, M, Y)
    #[arg(long, short = 'g')]
    granularity: Option<Granularity>,

    /// IANA time zone for period boundaries
    #[arg(long, env = "TALLY_TIMEZONE")]
    tz: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum View {
    /// Per-bucket table with previous/current summaries
    Table,
    /// Labels and aligned datasets
    Chart,
    /// The full report structure (JSON only)
    Report,
}

#[derive(Subcommand)]
enum Mode {
    /// Build a report for one target
    Report {
        /// Target record (JSON)
        #[arg(long)]
        target: PathBuf,
        /// Observations of that target (JSON array)
        #[arg(long)]
        observations: PathBuf,
        #[command(flatten)]
        period: PeriodArgs,
        /// Attach the contributing observations to every bucket
        #[arg(long)]
        raw: bool,
        #[arg(long, value_enum, default_value = "table")]
        view: View,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode form input into a stored value
    Decode {
        /// Data type tag, e.g. "Duration" or "Percent Correct"
        #[arg(long, required_unless_present = "target")]
        data_type: Option<String>,
        /// Target record; supplies the data type and task analysis steps
        #[arg(long)]
        target: Option<PathBuf>,
        /// Entered value; one per step for task analysis
        values: Vec<String>,
        /// Rate: correct count
        #[arg(long)]
        correct: Option<String>,
        /// Rate: incorrect count
        #[arg(long)]
        incorrect: Option<String>,
        /// Rate: counting window, SS, MM:SS or HH:MM:SS
        #[arg(long)]
        counting_time: Option<String>,
        /// Frequency: treat the value as a new total over this stored count
        #[arg(long)]
        delta_from: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Previous/current summaries for many targets
    Collection {
        /// JSON array of {"target": ..., "observations": [...]}
        input: PathBuf,
        #[command(flatten)]
        period: PeriodArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("TALLY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let no_color = cli.no_color;

    match cli.mode {
        Mode::Report {
            target,
            observations,
            period,
            raw,
            view,
            json,
        } => {
            let options = resolve_options(cli.config, &period)?.with_raw(raw);
            run_report(target, observations, &period, options, view, json, no_color)?;
        }
        Mode::Decode {
            data_type,
            target,
            values,
            correct,
            incorrect,
            counting_time,
            delta_from,
            json,
        } => {
            let raw = match (correct, incorrect, counting_time) {
                (None, None, None) => None,
                (correct, incorrect, counting_time) => Some(RawValue::Rate {
                    correct,
                    incorrect,
                    counting_time,
                }),
            };
            run_decode(data_type, target, values, raw, delta_from, json)?;
        }
        Mode::Collection {
            input,
            period,
            json,
        } => {
            let options = resolve_options(cli.config, &period)?;
            run_collection(input, &period, options, json, no_color)?;
        }
    }

    Ok(())
}

/// Config file defaults, then command line flags on top
fn resolve_options(config: Option<PathBuf>, period: &PeriodArgs) -> Result<ReportOptions> {
    let config = match config.or_else(TallyConfig::default_path) {
        Some(path) => TallyConfig::load(&path)?,
        None => TallyConfig::default(),
    };
    let mut options = config.report_options()?;

    if let Some(granularity) = period.granularity {
        options = options.with_granularity(granularity);
    }
    if let Some(zone) = &period.tz {
        options = options.with_timezone(tally_core::config::parse_timezone(zone)?);
    }
    debug!(
        granularity = %options.granularity,
        timezone = options.timezone.name(),
        "Resolved report options"
    );
    Ok(options)
}

fn run_report(
    target: PathBuf,
    observations: PathBuf,
    period: &PeriodArgs,
    options: ReportOptions,
    view: View,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let target: tally_types::Target = cli::load_json(&target)?;
    let observations: Vec<tally_types::Observation> = cli::load_json(&observations)?;
    cli::check_ownership(&target, &observations)?;
    let now = cli::parse_now(period.now.as_deref())?;
    info!(
        target_id = %target.id,
        observations = observations.len(),
        now = %now,
        "Building report"
    );

    let report = tally_core::report(&target, &observations, now, &options)
        .with_context(|| format!("Failed to build report for target {}", target.id))?;
    debug!(buckets = report.series.len(), "Report built");

    let output = match view {
        View::Table => cli::format_report_table(&report, json, no_color),
        View::Chart => cli::format_chart(&report.chart(), json),
        View::Report => cli::to_json(&report),
    };
    println!("{}", output);
    Ok(())
}

fn run_decode(
    data_type: Option<String>,
    target: Option<PathBuf>,
    values: Vec<String>,
    rate: Option<RawValue>,
    delta_from: Option<i64>,
    json: bool,
) -> Result<()> {
    let target: Option<tally_types::Target> = target.map(|p| cli::load_json(&p)).transpose()?;
    let data_type = match (&data_type, &target) {
        (Some(tag), _) => tag.parse::<DataType>().map_err(CoreError::from)?,
        (None, Some(target)) => target.kind().map_err(CoreError::from)?,
        (None, None) => anyhow::bail!("Either --data-type or --target is required"),
    };

    let raw = cli::raw_input(data_type, values, rate)?;

    // Without a target the entered steps define the step list
    let steps: Vec<String> = match (&target, &raw) {
        (Some(target), _) => target.steps.clone(),
        (None, RawValue::Steps(entered)) => entered.clone(),
        (None, _) => Vec::new(),
    };
    let mode = match delta_from {
        Some(original) => FrequencyMode::Delta { original },
        None => FrequencyMode::Absolute,
    };
    let ctx = DecodeContext {
        steps: &steps,
        frequency_mode: mode,
    };

    let value = decode(data_type, &raw, &ctx)?;
    debug!(data_type = %data_type, steps = steps.len(), "Decoded form input");
    println!("{}", cli::format_decoded(&value, json));
    Ok(())
}

fn run_collection(
    input: PathBuf,
    period: &PeriodArgs,
    options: ReportOptions,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let entries: Vec<cli::CollectionInput> = cli::load_json(&input)?;
    for entry in &entries {
        cli::check_ownership(&entry.target, &entry.observations)?;
    }
    let now = cli::parse_now(period.now.as_deref())?;
    info!(targets = entries.len(), now = %now, "Summarizing collection");

    let targets: Vec<_> = entries
        .into_iter()
        .map(|e| (e.target, e.observations))
        .collect();
    let summaries = summarize(&targets, now, &options);

    println!("{}", cli::format_collection(&summaries, json, no_color));

    let failed = summaries.iter().filter(|s| !s.is_ok()).count();
    if failed > 0 {
        warn!(failed, total = summaries.len(), "Some targets could not be summarized");
    }
    if failed > 0 && !json {
        eprintln!("\n{} of {} targets could not be summarized", failed, summaries.len());
    }
    Ok(())
}
