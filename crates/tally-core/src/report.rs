//! Reporting entry points
//!
//! The web layer calls these with a target, its observations, an explicit
//! `now` and [`ReportOptions`]. The target's data type tag picks the
//! aggregation module; an unrecognized tag is an error, never a fallback.

use chrono::{DateTime, Utc};
use tally_types::{DataType, Observation, Target};

use crate::aggregate::{
    check_shapes, duration, frequency, percent_correct, rate, task_analysis, BucketValue,
    PeriodContext, Summary,
};
use crate::assemble::{build_report, Chart, DataTable, Report, SeriesPoint};
use crate::bucket::{BucketKey, Bucketing};
use crate::config::ReportOptions;
use crate::error::{CoreError, ErrorSeverity, Result};

pub(crate) fn series_for(
    data_type: DataType,
    observations: &[Observation],
    bucketing: &Bucketing,
) -> Result<Vec<(BucketKey, BucketValue)>> {
    match data_type {
        DataType::Frequency => frequency::series(observations, bucketing),
        DataType::Duration => duration::series(observations, bucketing),
        DataType::Rate => rate::series(observations, bucketing),
        DataType::PercentCorrect => percent_correct::series(observations, bucketing),
        DataType::TaskAnalysis => task_analysis::series(observations, bucketing),
    }
}

pub(crate) fn previous_for(
    data_type: DataType,
    observations: &[Observation],
    ctx: &PeriodContext,
) -> Result<Summary> {
    match data_type {
        DataType::Frequency => frequency::previous(observations, ctx),
        DataType::Duration => duration::previous(observations, ctx),
        DataType::Rate => rate::previous(observations, ctx),
        DataType::PercentCorrect => percent_correct::previous(observations, ctx),
        DataType::TaskAnalysis => task_analysis::previous(observations, ctx),
    }
}

/// Types without a running total record completed sessions and report `NA`
pub(crate) fn current_for(
    data_type: DataType,
    observations: &[Observation],
    ctx: &PeriodContext,
) -> Result<Summary> {
    if !data_type.has_running_total() {
        check_shapes(observations, data_type)?;
        return Ok(Summary::NotApplicable);
    }

    match data_type {
        DataType::Frequency => frequency::current(observations, ctx),
        DataType::PercentCorrect => percent_correct::current(observations, ctx),
        DataType::Duration | DataType::Rate | DataType::TaskAnalysis => Ok(Summary::NotApplicable),
    }
}

/// Log a failure at the severity its cause deserves, then pass it on
fn surface<T>(target: &Target, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        match e.severity() {
            ErrorSeverity::Integrity => tracing::error!(
                target_id = %target.id,
                data_type = %target.data_type,
                error = %e,
                "report failed on inconsistent data"
            ),
            ErrorSeverity::Input => tracing::debug!(
                target_id = %target.id,
                error = %e,
                "report rejected input"
            ),
        }
    }
    result
}

fn resolve(target: &Target) -> Result<DataType> {
    surface(target, target.kind().map_err(CoreError::from))
}

/// Series plus previous and current summaries for one target
pub fn report(
    target: &Target,
    observations: &[Observation],
    now: DateTime<Utc>,
    options: &ReportOptions,
) -> Result<Report> {
    tracing::debug!(
        target_id = %target.id,
        data_type = %target.data_type,
        observations = observations.len(),
        granularity = %options.granularity,
        "building report"
    );
    surface(target, build_report(target, observations, now, options))
}

/// Chart-ready series. Raw rows are never attached.
pub fn graph(target: &Target, observations: &[Observation], options: &ReportOptions) -> Result<Chart> {
    let data_type = resolve(target)?;
    let series = surface(target, series_for(data_type, observations, &options.bucketing()))?;

    // Summaries do not appear in a chart, so no clock is involved
    let report = Report {
        target_id: target.id.clone(),
        data_type,
        granularity: options.granularity,
        series: series
            .into_iter()
            .map(|(bucket, value)| SeriesPoint {
                bucket,
                value,
                raw_rows: None,
            })
            .collect(),
        previous: Summary::NotApplicable,
        current: Summary::NotApplicable,
    };
    Ok(report.chart())
}

/// Tabular series, with raw rows per bucket when `options.include_raw` is set
pub fn table(
    target: &Target,
    observations: &[Observation],
    now: DateTime<Utc>,
    options: &ReportOptions,
) -> Result<DataTable> {
    report(target, observations, now, options).map(|r| r.table())
}

/// Summary for the most recently closed period
pub fn previous(
    target: &Target,
    observations: &[Observation],
    now: DateTime<Utc>,
    options: &ReportOptions,
) -> Result<Summary> {
    let data_type = resolve(target)?;
    let ctx = PeriodContext::new(options.bucketing(), now);
    surface(target, previous_for(data_type, observations, &ctx))
}

/// Summary for the still-open period
pub fn current(
    target: &Target,
    observations: &[Observation],
    now: DateTime<Utc>,
    options: &ReportOptions,
) -> Result<Summary> {
    let data_type = resolve(target)?;
    let ctx = PeriodContext::new(options.bucketing(), now);
    surface(target, current_for(data_type, observations, &ctx))
}
