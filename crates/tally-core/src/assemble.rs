//! Series assembly
//!
//! Packages bucketed aggregates into the shapes the web layer renders: the
//! full [`Report`], a chart with datasets aligned to bucket labels, and a table
//! of display strings. Raw rows are a side channel for audit and editing views;
//! they never feed back into the aggregated numbers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tally_types::{DataType, Observation, ObservationId, ObservationValue, Target, TargetId};

use crate::aggregate::{BucketValue, PeriodContext, Summary};
use crate::bucket::{BucketKey, Granularity};
use crate::codec::{encode, format_duration_colon, DisplayValue};
use crate::config::ReportOptions;
use crate::error::Result;
use crate::report::{current_for, previous_for, series_for};

/// One observation as it contributed to a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRow {
    pub id: ObservationId,
    pub timestamp: DateTime<Utc>,
    /// Stored value, untouched
    #[serde(flatten)]
    pub value: ObservationValue,
    /// The same value encoded for display
    pub display: DisplayValue,
}

impl RawRow {
    fn from_observation(obs: &Observation) -> Self {
        Self {
            id: obs.id.clone(),
            timestamp: obs.timestamp,
            value: obs.value.clone(),
            display: encode(&obs.value),
        }
    }
}

/// One non-empty bucket of the series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub bucket: BucketKey,
    pub value: BucketValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_rows: Option<Vec<RawRow>>,
}

/// Everything the web layer shows for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub target_id: TargetId,
    pub data_type: DataType,
    pub granularity: Granularity,
    /// Chronological, sparse: periods without observations are absent
    pub series: Vec<SeriesPoint>,
    pub previous: Summary,
    pub current: Summary,
}

/// Chart data: dataset values are aligned with `labels`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chart {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    pub name: &'static str,
    /// `None` where the bucket has no scorable value
    pub data: Vec<Option<i64>>,
}

/// Human-readable table, one row per bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataTable {
    pub headers: Vec<&'static str>,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub period: String,
    pub cells: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_rows: Option<Vec<RawRow>>,
}

/// Build the full report for `target`.
///
/// Deterministic: the same arguments always produce the same report. `now` is
/// only used for the previous/current summaries.
pub fn build_report(
    target: &Target,
    observations: &[Observation],
    now: DateTime<Utc>,
    options: &ReportOptions,
) -> Result<Report> {
    let data_type = target.kind()?;
    let bucketing = options.bucketing();
    let period = PeriodContext::new(bucketing, now);

    let aggregated = series_for(data_type, observations, &bucketing)?;
    let previous = previous_for(data_type, observations, &period)?;
    let current = current_for(data_type, observations, &period)?;

    let mut raw = if options.include_raw {
        Some(raw_rows_by_bucket(observations, options)?)
    } else {
        None
    };

    let series = aggregated
        .into_iter()
        .map(|(bucket, value)| SeriesPoint {
            bucket,
            value,
            raw_rows: raw
                .as_mut()
                .map(|rows| rows.remove(&bucket).unwrap_or_default()),
        })
        .collect();

    Ok(Report {
        target_id: target.id.clone(),
        data_type,
        granularity: options.granularity,
        series,
        previous,
        current,
    })
}

fn raw_rows_by_bucket(
    observations: &[Observation],
    options: &ReportOptions,
) -> Result<BTreeMap<BucketKey, Vec<RawRow>>> {
    let groups = options.bucketing().group(observations)?;
    Ok(groups
        .into_iter()
        .map(|(key, members)| {
            let rows = members.into_iter().map(RawRow::from_observation).collect();
            (key, rows)
        })
        .collect())
}

fn to_i64(n: u64) -> Option<i64> {
    i64::try_from(n).ok()
}

impl Report {
    /// Bucket keys in canonical, sortable form
    pub fn labels(&self) -> Vec<String> {
        self.series.iter().map(|p| p.bucket.to_string()).collect()
    }

    /// Chart-ready numeric series
    pub fn chart(&self) -> Chart {
        let column = |f: fn(&BucketValue) -> Option<i64>| -> Vec<Option<i64>> {
            self.series.iter().map(|p| f(&p.value)).collect()
        };

        let datasets = match self.data_type {
            DataType::Frequency => vec![Dataset {
                name: "count",
                data: column(|v| match v {
                    BucketValue::Count(n) => Some(*n),
                    _ => None,
                }),
            }],
            DataType::Duration => vec![Dataset {
                name: "duration_ms",
                data: column(|v| match v {
                    BucketValue::DurationMs(ms) => to_i64(*ms),
                    _ => None,
                }),
            }],
            DataType::PercentCorrect | DataType::TaskAnalysis => vec![Dataset {
                name: "percent_correct",
                data: column(|v| match v {
                    BucketValue::Percent(p) => p.map(i64::from),
                    _ => None,
                }),
            }],
            DataType::Rate => vec![
                Dataset {
                    name: "correct_per_min",
                    data: column(|v| match v {
                        BucketValue::Rate { correct, .. } => correct.and_then(to_i64),
                        _ => None,
                    }),
                },
                Dataset {
                    name: "incorrect_per_min",
                    data: column(|v| match v {
                        BucketValue::Rate { incorrect, .. } => incorrect.and_then(to_i64),
                        _ => None,
                    }),
                },
            ],
        };

        Chart {
            labels: self.labels(),
            datasets,
        }
    }

    /// Table of display strings, carrying raw rows when the report has them
    pub fn table(&self) -> DataTable {
        let headers = match self.data_type {
            DataType::Frequency => vec!["Period", "Count"],
            DataType::Duration => vec!["Period", "Duration"],
            DataType::PercentCorrect | DataType::TaskAnalysis => vec!["Period", "Percent Correct"],
            DataType::Rate => vec!["Period", "Correct/min", "Incorrect/min", "Counting Time"],
        };

        let rows = self
            .series
            .iter()
            .map(|point| TableRow {
                period: point.bucket.to_string(),
                cells: display_cells(&point.value),
                raw_rows: point.raw_rows.clone(),
            })
            .collect();

        DataTable { headers, rows }
    }
}

fn na_or<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "NA".to_string(), |v| v.to_string())
}

fn display_cells(value: &BucketValue) -> Vec<String> {
    match value {
        BucketValue::Count(n) => vec![n.to_string()],
        BucketValue::DurationMs(ms) => vec![format_duration_colon(*ms)],
        BucketValue::Percent(p) => vec![na_or(*p)],
        BucketValue::Rate {
            correct,
            incorrect,
            counting_time_ms,
        } => vec![
            na_or(*correct),
            na_or(*incorrect),
            format_duration_colon(*counting_time_ms),
        ],
    }
}
