//! Interval bucketing
//!
//! Maps timestamps to calendar periods (day, ISO week, month, year) in a caller
//! supplied time zone. Keys order chronologically as values. Their canonical
//! strings (`2024-03-05`, `2024-W10`, `2024-03`, `2024`) sort the same way only
//! for four-digit years, so order by [`BucketKey`], not by label.
//!
//! Timestamps whose local date or period start falls outside chrono's calendar
//! have no bucket and are reported as [`CoreError::TimestampOutOfRange`].

use chrono::{DateTime, Datelike, Days, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tally_types::Observation;
use thiserror::Error;

use crate::error::{CoreError, Result};

/// Width of a bucket
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl Granularity {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown granularity {input:?} (expected day, week, month or year)")]
pub struct ParseGranularityError {
    pub input: String,
}

impl FromStr for Granularity {
    type Err = ParseGranularityError;

    /// Accepts full names and the single-letter interval codes (`D`, `W`, `M`, `Y`)
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" | "d" => Ok(Self::Day),
            "week" | "w" => Ok(Self::Week),
            "month" | "m" => Ok(Self::Month),
            "year" | "y" => Ok(Self::Year),
            _ => Err(ParseGranularityError {
                input: s.to_string(),
            }),
        }
    }
}

/// A calendar period, identified by its first local date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    start: NaiveDate,
    granularity: Granularity,
}

impl BucketKey {
    /// The period of `granularity` that contains `date`.
    ///
    /// `None` when that period would start before [`NaiveDate::MIN`].
    pub fn containing(date: NaiveDate, granularity: Granularity) -> Option<Self> {
        let back = match granularity {
            Granularity::Day => 0,
            Granularity::Week => date.weekday().num_days_from_monday(),
            Granularity::Month => date.day0(),
            Granularity::Year => date.ordinal0(),
        };
        let start = date.checked_sub_days(Days::new(u64::from(back)))?;
        Some(Self { start, granularity })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// The period immediately before this one, or itself at the start of the calendar
    pub fn previous(&self) -> Self {
        self.start
            .pred_opt()
            .and_then(|day_before| Self::containing(day_before, self.granularity))
            .unwrap_or(*self)
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.granularity {
            Granularity::Day => write!(f, "{}", self.start.format("%Y-%m-%d")),
            Granularity::Week => {
                let week = self.start.iso_week();
                write!(f, "{}-W{:02}", week.year(), week.week())
            }
            Granularity::Month => write!(f, "{}", self.start.format("%Y-%m")),
            Granularity::Year => write!(f, "{}", self.start.format("%Y")),
        }
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Bucket width plus the zone in which calendar boundaries are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucketing {
    pub granularity: Granularity,
    pub tz: Tz,
}

impl Default for Bucketing {
    fn default() -> Self {
        Self {
            granularity: Granularity::Day,
            tz: Tz::UTC,
        }
    }
}

impl Bucketing {
    pub fn new(granularity: Granularity, tz: Tz) -> Self {
        Self { granularity, tz }
    }

    /// Calendar date of `ts` in the bucketing zone
    fn local_date(&self, ts: DateTime<Utc>) -> Option<NaiveDate> {
        let utc = ts.naive_utc();
        let offset = self.tz.offset_from_utc_datetime(&utc).fix();
        utc.checked_add_offset(offset).map(|local| local.date())
    }

    /// Bucket of a single timestamp
    pub fn key_for(&self, ts: DateTime<Utc>) -> Result<BucketKey> {
        self.local_date(ts)
            .and_then(|date| BucketKey::containing(date, self.granularity))
            .ok_or_else(|| CoreError::TimestampOutOfRange {
                timestamp: ts,
                granularity: self.granularity,
                zone: self.tz.name().to_string(),
            })
    }

    /// The still-open period containing `now`
    pub fn current_key(&self, now: DateTime<Utc>) -> Result<BucketKey> {
        self.key_for(now)
    }

    /// The most recently closed period before `now`
    pub fn previous_key(&self, now: DateTime<Utc>) -> Result<BucketKey> {
        self.key_for(now).map(|key| key.previous())
    }

    /// Group observations into chronological buckets.
    ///
    /// Within a bucket observations keep timestamp order, ties in input order.
    /// Buckets with no observations do not appear. One unbucketable timestamp
    /// fails the whole grouping.
    pub fn group<'a>(
        &self,
        observations: &'a [Observation],
    ) -> Result<Vec<(BucketKey, Vec<&'a Observation>)>> {
        let mut ordered: Vec<&Observation> = observations.iter().collect();
        ordered.sort_by_key(|o| o.timestamp);

        let mut buckets: BTreeMap<BucketKey, Vec<&Observation>> = BTreeMap::new();
        for obs in ordered {
            buckets.entry(self.key_for(obs.timestamp)?).or_default().push(obs);
        }

        Ok(buckets.into_iter().collect())
    }
}
