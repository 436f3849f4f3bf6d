//! Task Analysis: share of steps performed correctly
//!
//! Each record scores `round(100 * correct steps / steps)`. A bucket averages
//! its records' scores; the previous-period summary scores the latest record only.

use tally_types::{DataType, Observation, ObservationValue, Outcome};

use super::{bucketed, check_shapes, percent, shape_mismatch, BucketValue, PeriodContext, Summary};
use crate::bucket::{BucketKey, Bucketing};
use crate::error::Result;

fn step_outcomes(obs: &Observation) -> Result<&[Outcome]> {
    match &obs.value {
        ObservationValue::TaskAnalysis(steps) => Ok(steps.as_slice()),
        _ => Err(shape_mismatch(obs, DataType::TaskAnalysis)),
    }
}

/// Score of one record; `None` for a record with no steps
pub fn record_percent(steps: &[Outcome]) -> Option<u32> {
    let correct = steps.iter().filter(|s| s.is_correct()).count();
    percent(correct, steps.len())
}

fn reduce(bucket: &[&Observation]) -> Result<BucketValue> {
    let mut scores = Vec::with_capacity(bucket.len());
    for obs in bucket {
        match record_percent(step_outcomes(obs)?) {
            Some(p) => scores.push(p),
            None => tracing::warn!(observation = %obs.id, "task analysis record has no steps"),
        }
    }

    if scores.is_empty() {
        return Ok(BucketValue::Percent(None));
    }
    let sum: u32 = scores.iter().sum();
    let mean = f64::from(sum) / scores.len() as f64;
    Ok(BucketValue::Percent(Some(mean.round() as u32)))
}

pub fn series(
    observations: &[Observation],
    bucketing: &Bucketing,
) -> Result<Vec<(BucketKey, BucketValue)>> {
    check_shapes(observations, DataType::TaskAnalysis)?;
    bucketed(observations, bucketing, reduce)
}

/// Score of the latest record, not a bucket average
pub fn previous(observations: &[Observation], ctx: &PeriodContext) -> Result<Summary> {
    check_shapes(observations, DataType::TaskAnalysis)?;
    let Some(obs) = ctx.most_recent(observations) else {
        return Ok(Summary::NotApplicable);
    };

    Ok(match record_percent(step_outcomes(obs)?) {
        Some(p) => Summary::Percent(p),
        None => Summary::NotApplicable,
    })
}
