//! Per-data-type aggregation
//!
//! Each data type module exposes the same operations over a target's
//! observations:
//! - `series`: one aggregated value per non-empty bucket, chronological
//! - `previous`: summary for the most recently closed period (or the latest
//!   record, for types that summarize completed sessions)
//! - `current`: summary for the still-open period. Only types for which
//!   [`DataType::has_running_total`] holds define it; the rest report `NA`.
//!
//! Dispatch over the closed [`DataType`] set happens in [`crate::report`].

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use tally_types::{DataType, Observation};

use crate::bucket::{BucketKey, Bucketing};
use crate::codec::format_duration_long;
use crate::error::{CoreError, Result};

pub mod duration;
pub mod frequency;
pub mod percent_correct;
pub mod rate;
pub mod task_analysis;


/// Aggregated value of one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BucketValue {
    /// Frequency: summed occurrences
    Count(i64),
    /// Duration: summed milliseconds
    DurationMs(u64),
    /// Percent Correct and Task Analysis. `None` when nothing could be scored.
    Percent(Option<u32>),
    /// Rate: per-minute counts of the first record in the bucket.
    /// `None` when that record has a zero counting window.
    Rate {
        correct: Option<u64>,
        incorrect: Option<u64>,
        counting_time_ms: u64,
    },
}

/// At-a-glance summary shown on collection screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Summary {
    /// No qualifying data. Distinct from zero.
    NotApplicable,
    Count(i64),
    Percent(u32),
    /// Milliseconds, rendered in words
    Duration(u64),
    /// Per-minute counts
    Rate { correct: u64, incorrect: u64 },
}

impl Summary {
    pub fn is_na(&self) -> bool {
        matches!(self, Summary::NotApplicable)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Summary::NotApplicable => f.write_str("NA"),
            Summary::Count(n) => write!(f, "{}", n),
            Summary::Percent(p) => write!(f, "{}%", p),
            Summary::Duration(ms) => f.write_str(&format_duration_long(*ms)),
            Summary::Rate { correct, incorrect } => {
                write!(f, "{} correct, {} incorrect(/min)", correct, incorrect)
            }
        }
    }
}

impl Serialize for Summary {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Reference point for previous/current summaries
#[derive(Debug, Clone, Copy)]
pub struct PeriodContext {
    pub bucketing: Bucketing,
    pub now: DateTime<Utc>,
}

impl PeriodContext {
    pub fn new(bucketing: Bucketing, now: DateTime<Utc>) -> Self {
        Self { bucketing, now }
    }

    pub fn current_key(&self) -> Result<BucketKey> {
        self.bucketing.current_key(self.now)
    }

    pub fn previous_key(&self) -> Result<BucketKey> {
        self.bucketing.previous_key(self.now)
    }

    /// Observations falling in `key`, in input order
    pub(crate) fn in_bucket<'a>(
        &self,
        observations: &'a [Observation],
        key: BucketKey,
    ) -> Result<Vec<&'a Observation>> {
        let mut members = Vec::new();
        for obs in observations {
            if self.bucketing.key_for(obs.timestamp)? == key {
                members.push(obs);
            }
        }
        Ok(members)
    }

    /// Latest observation at or before `now`; ties go to the later input entry
    pub(crate) fn most_recent<'a>(&self, observations: &'a [Observation]) -> Option<&'a Observation> {
        observations
            .iter()
            .filter(|o| o.timestamp <= self.now)
            .max_by_key(|o| o.timestamp)
    }
}

pub(crate) fn shape_mismatch(obs: &Observation, expected: DataType) -> CoreError {
    CoreError::ValueShapeMismatch {
        observation_id: obs.id.clone(),
        expected,
        found: obs.data_type(),
    }
}

/// Reject the whole input if any value has a foreign shape
pub(crate) fn check_shapes(observations: &[Observation], expected: DataType) -> Result<()> {
    match observations.iter().find(|o| o.data_type() != expected) {
        Some(obs) => Err(shape_mismatch(obs, expected)),
        None => Ok(()),
    }
}

/// Group, then reduce every bucket
pub(crate) fn bucketed<F>(
    observations: &[Observation],
    bucketing: &Bucketing,
    reduce: F,
) -> Result<Vec<(BucketKey, BucketValue)>>
where
    F: Fn(&[&Observation]) -> Result<BucketValue>,
{
    bucketing
        .group(observations)?
        .into_iter()
        .map(|(key, members)| reduce(&members).map(|value| (key, value)))
        .collect()
}

/// `round(100 * part / total)`, `None` for an empty total
pub(crate) fn percent(part: usize, total: usize) -> Option<u32> {
    if total == 0 {
        return None;
    }
    Some(((part as f64 / total as f64) * 100.0).round() as u32)
}
