//! Rate: correct and incorrect responses per minute of counting time
//!
//! A bucket reports the first record it received. Later records in the same
//! bucket are not merged, averaged or summed.

use tally_types::{DataType, Observation, ObservationValue, RateValue};

use super::{bucketed, check_shapes, shape_mismatch, BucketValue, PeriodContext, Summary};
use crate::bucket::{BucketKey, Bucketing};
use crate::error::Result;

const MS_PER_MINUTE: f64 = 60_000.0;

fn rate(obs: &Observation) -> Result<RateValue> {
    match obs.value {
        ObservationValue::Rate(r) => Ok(r),
        _ => Err(shape_mismatch(obs, DataType::Rate)),
    }
}

/// Count per minute, rounded to three decimals then truncated to a whole number.
///
/// `None` for a zero counting window.
pub fn per_minute(count: u32, counting_time_ms: u64) -> Option<u64> {
    if counting_time_ms == 0 {
        return None;
    }
    let minutes = counting_time_ms as f64 / MS_PER_MINUTE;
    let per_min = f64::from(count) / minutes;
    Some(((per_min * 1000.0).round() / 1000.0).trunc() as u64)
}

fn reduce(bucket: &[&Observation]) -> Result<BucketValue> {
    // Every member must still be the right shape even though only the first is reported
    let mut values = Vec::with_capacity(bucket.len());
    for obs in bucket {
        values.push(rate(obs)?);
    }

    let Some(first) = values.first() else {
        return Ok(BucketValue::Rate {
            correct: None,
            incorrect: None,
            counting_time_ms: 0,
        });
    };

    if values.len() > 1 {
        tracing::debug!(
            skipped = values.len() - 1,
            "rate bucket keeps its first record only"
        );
    }
    if first.counting_time_ms == 0 {
        tracing::warn!(observation = %bucket[0].id, "rate record with zero counting time");
    }

    Ok(BucketValue::Rate {
        correct: per_minute(first.correct, first.counting_time_ms),
        incorrect: per_minute(first.incorrect, first.counting_time_ms),
        counting_time_ms: first.counting_time_ms,
    })
}

pub fn series(
    observations: &[Observation],
    bucketing: &Bucketing,
) -> Result<Vec<(BucketKey, BucketValue)>> {
    check_shapes(observations, DataType::Rate)?;
    bucketed(observations, bucketing, reduce)
}

/// Per-minute rates of the latest record
pub fn previous(observations: &[Observation], ctx: &PeriodContext) -> Result<Summary> {
    check_shapes(observations, DataType::Rate)?;
    let Some(obs) = ctx.most_recent(observations) else {
        return Ok(Summary::NotApplicable);
    };

    let value = rate(obs)?;
    match (
        per_minute(value.correct, value.counting_time_ms),
        per_minute(value.incorrect, value.counting_time_ms),
    ) {
        (Some(correct), Some(incorrect)) => Ok(Summary::Rate { correct, incorrect }),
        _ => {
            tracing::warn!(observation = %obs.id, "latest rate record has zero counting time");
            Ok(Summary::NotApplicable)
        }
    }
}
