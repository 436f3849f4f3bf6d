//! Percent Correct: share of trials judged correct

use tally_types::{DataType, Observation, ObservationValue, Outcome};

use super::{bucketed, check_shapes, percent, shape_mismatch, BucketValue, PeriodContext, Summary};
use crate::bucket::{BucketKey, Bucketing};
use crate::error::Result;

fn outcome(obs: &Observation) -> Result<Outcome> {
    match obs.value {
        ObservationValue::PercentCorrect(o) => Ok(o),
        _ => Err(shape_mismatch(obs, DataType::PercentCorrect)),
    }
}

/// `round(100 * correct / total)`; approximations count toward the total only
fn score<'a, I>(observations: I) -> Result<Option<u32>>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut total = 0usize;
    let mut correct = 0usize;
    for obs in observations {
        total += 1;
        if outcome(obs)?.is_correct() {
            correct += 1;
        }
    }
    Ok(percent(correct, total))
}

fn reduce(bucket: &[&Observation]) -> Result<BucketValue> {
    score(bucket.iter().copied()).map(BucketValue::Percent)
}

pub fn series(
    observations: &[Observation],
    bucketing: &Bucketing,
) -> Result<Vec<(BucketKey, BucketValue)>> {
    check_shapes(observations, DataType::PercentCorrect)?;
    bucketed(observations, bucketing, reduce)
}

fn period_score(observations: &[Observation], ctx: &PeriodContext, key: BucketKey) -> Result<Summary> {
    check_shapes(observations, DataType::PercentCorrect)?;
    Ok(match score(ctx.in_bucket(observations, key)?)? {
        Some(p) => Summary::Percent(p),
        None => Summary::NotApplicable,
    })
}

pub fn previous(observations: &[Observation], ctx: &PeriodContext) -> Result<Summary> {
    period_score(observations, ctx, ctx.previous_key()?)
}

pub fn current(observations: &[Observation], ctx: &PeriodContext) -> Result<Summary> {
    period_score(observations, ctx, ctx.current_key()?)
}
