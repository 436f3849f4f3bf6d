//! Frequency: occurrence counts, summed per bucket
//!
//! Stored counts may be negative (delta entries), so a bucket total is exact
//! as long as it fits in an `i64`, even when a partial sum would not.

use tally_types::{DataType, Observation, ObservationValue};

use super::{bucketed, check_shapes, shape_mismatch, BucketValue, PeriodContext, Summary};
use crate::bucket::{BucketKey, Bucketing};
use crate::error::{CoreError, Result};

fn count(obs: &Observation) -> Result<i64> {
    match obs.value {
        ObservationValue::Frequency(n) => Ok(n),
        _ => Err(shape_mismatch(obs, DataType::Frequency)),
    }
}

fn total<'a, I>(observations: I) -> Result<i64>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut sum = 0i128;
    for obs in observations {
        sum += i128::from(count(obs)?);
    }
    i64::try_from(sum).map_err(|_| CoreError::TotalOutOfRange {
        data_type: DataType::Frequency,
        total: sum,
    })
}

fn reduce(bucket: &[&Observation]) -> Result<BucketValue> {
    total(bucket.iter().copied()).map(BucketValue::Count)
}

/// Sum of counts per bucket
pub fn series(
    observations: &[Observation],
    bucketing: &Bucketing,
) -> Result<Vec<(BucketKey, BucketValue)>> {
    check_shapes(observations, DataType::Frequency)?;
    bucketed(observations, bucketing, reduce)
}

fn period_sum(observations: &[Observation], ctx: &PeriodContext, key: BucketKey) -> Result<Summary> {
    check_shapes(observations, DataType::Frequency)?;
    if observations.is_empty() {
        return Ok(Summary::NotApplicable);
    }
    total(ctx.in_bucket(observations, key)?).map(Summary::Count)
}

/// Sum over the previous closed period, 0 when that period is empty
pub fn previous(observations: &[Observation], ctx: &PeriodContext) -> Result<Summary> {
    period_sum(observations, ctx, ctx.previous_key()?)
}

/// Running total for the current period
pub fn current(observations: &[Observation], ctx: &PeriodContext) -> Result<Summary> {
    period_sum(observations, ctx, ctx.current_key()?)
}
