//! Duration: milliseconds, summed per bucket
//!
//! The previous-period summary is the latest recorded session, not a sum.

use tally_types::{DataType, Observation, ObservationValue};

use super::{bucketed, check_shapes, shape_mismatch, BucketValue, PeriodContext, Summary};
use crate::bucket::{BucketKey, Bucketing};
use crate::error::{CoreError, Result};

fn millis(obs: &Observation) -> Result<u64> {
    match obs.value {
        ObservationValue::Duration(ms) => Ok(ms),
        _ => Err(shape_mismatch(obs, DataType::Duration)),
    }
}

fn reduce(bucket: &[&Observation]) -> Result<BucketValue> {
    let mut total = 0u64;
    for obs in bucket {
        let ms = millis(obs)?;
        total = total.checked_add(ms).ok_or_else(|| CoreError::TotalOutOfRange {
            data_type: DataType::Duration,
            total: i128::from(total) + i128::from(ms),
        })?;
    }
    Ok(BucketValue::DurationMs(total))
}

pub fn series(
    observations: &[Observation],
    bucketing: &Bucketing,
) -> Result<Vec<(BucketKey, BucketValue)>> {
    check_shapes(observations, DataType::Duration)?;
    bucketed(observations, bucketing, reduce)
}

/// Latest record's duration
pub fn previous(observations: &[Observation], ctx: &PeriodContext) -> Result<Summary> {
    check_shapes(observations, DataType::Duration)?;
    match ctx.most_recent(observations) {
        Some(obs) => Ok(Summary::Duration(millis(obs)?)),
        None => Ok(Summary::NotApplicable),
    }
}
