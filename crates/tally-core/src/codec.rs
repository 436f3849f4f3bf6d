//! Value codec: form input <-> canonical stored values <-> display values
//!
//! Durations are entered in colon notation (`SS`, `MM:SS`, `HH:MM:SS`) and
//! stored as milliseconds. Rates carry two counts and a counting window in the
//! same notation. Everything else is a literal or a list of literals.

use serde::Serialize;
use std::fmt;
use tally_types::{DataType, ObservationValue, Outcome, RateValue, Target};
use thiserror::Error;

use crate::error::{CoreError, Result};

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Why a colon-notation duration was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDurationError {
    #[error("empty duration")]
    Empty,
    #[error("expected SS, MM:SS or HH:MM:SS, got {0} groups")]
    GroupCount(usize),
    #[error("{0:?} is not a whole number")]
    NotANumber(String),
    #[error("duration out of range")]
    OutOfRange,
}

/// Value as entered on a form, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Frequency count, duration in colon notation, or a percent-correct literal
    Text(String),
    /// Rate fields. Any of them may be missing from the submitted form.
    Rate {
        correct: Option<String>,
        incorrect: Option<String>,
        counting_time: Option<String>,
    },
    /// One literal per task analysis step
    Steps(Vec<String>),
}

impl RawValue {
    pub fn text(s: impl Into<String>) -> Self {
        RawValue::Text(s.into())
    }

    fn describe(&self) -> String {
        match self {
            RawValue::Text(s) => s.clone(),
            RawValue::Rate { .. } => "<rate fields>".to_string(),
            RawValue::Steps(steps) => format!("[{}]", steps.join(", ")),
        }
    }
}

/// How a frequency entry relates to what is already stored.
///
/// The caller states the mode; it is never inferred from context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencyMode {
    /// The entry is the count to store
    #[default]
    Absolute,
    /// The entry is a new running total; store the difference from `original`
    Delta { original: i64 },
}

/// Everything decoding needs beyond the raw value itself
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeContext<'a> {
    /// The target's current step labels (Task Analysis)
    pub steps: &'a [String],
    pub frequency_mode: FrequencyMode,
}

impl<'a> DecodeContext<'a> {
    pub fn for_target(target: &'a Target) -> Self {
        Self {
            steps: &target.steps,
            frequency_mode: FrequencyMode::Absolute,
        }
    }

    pub fn with_frequency_mode(mut self, mode: FrequencyMode) -> Self {
        self.frequency_mode = mode;
        self
    }
}

/// Decode form input into the canonical stored value for `data_type`.
///
/// Task analysis input must have exactly one entry per current step; a length
/// mismatch is always an error, never padded or truncated.
pub fn decode(data_type: DataType, raw: &RawValue, ctx: &DecodeContext) -> Result<ObservationValue> {
    match (data_type, raw) {
        (DataType::Frequency, RawValue::Text(s)) => {
            decode_frequency(s, ctx.frequency_mode).map(ObservationValue::Frequency)
        }
        (DataType::Duration, RawValue::Text(s)) => parse_duration(s)
            .map(ObservationValue::Duration)
            .map_err(|e| CoreError::invalid(DataType::Duration, s.as_str(), e.to_string())),
        (DataType::PercentCorrect, RawValue::Text(s)) => parse_outcome(DataType::PercentCorrect, s)
            .map(ObservationValue::PercentCorrect),
        (
            DataType::Rate,
            RawValue::Rate {
                correct,
                incorrect,
                counting_time,
            },
        ) => decode_rate(
            correct.as_deref(),
            incorrect.as_deref(),
            counting_time.as_deref(),
        )
        .map(ObservationValue::Rate),
        (DataType::TaskAnalysis, RawValue::Steps(steps)) => {
            decode_task_analysis(steps, ctx.steps.len()).map(ObservationValue::TaskAnalysis)
        }
        (data_type, raw) => Err(CoreError::invalid(
            data_type,
            raw.describe(),
            "input does not have the shape this data type expects",
        )),
    }
}

/// Decode against a target, parsing its stored data type tag first
pub fn decode_for(target: &Target, raw: &RawValue, mode: FrequencyMode) -> Result<ObservationValue> {
    let data_type = target.kind()?;
    let ctx = DecodeContext::for_target(target).with_frequency_mode(mode);
    decode(data_type, raw, &ctx)
}

fn decode_frequency(input: &str, mode: FrequencyMode) -> Result<i64> {
    let entered: i64 = input
        .trim()
        .parse()
        .map_err(|_| CoreError::invalid(DataType::Frequency, input, "not an integer"))?;

    match mode {
        FrequencyMode::Absolute if entered < 0 => Err(CoreError::invalid(
            DataType::Frequency,
            input,
            "count cannot be negative",
        )),
        FrequencyMode::Absolute => Ok(entered),
        FrequencyMode::Delta { original } => entered
            .checked_sub(original)
            .ok_or_else(|| CoreError::invalid(DataType::Frequency, input, "difference overflows")),
    }
}

fn parse_outcome(data_type: DataType, input: &str) -> Result<Outcome> {
    input.parse().map_err(|_| {
        CoreError::invalid(
            data_type,
            input,
            "expected one of correct, incorrect, approximation",
        )
    })
}

fn decode_rate(
    correct: Option<&str>,
    incorrect: Option<&str>,
    counting_time: Option<&str>,
) -> Result<RateValue> {
    let count = |field: &str, value: Option<&str>| -> Result<u32> {
        let value = value
            .ok_or_else(|| CoreError::invalid(DataType::Rate, "", format!("missing {field}")))?;
        value.trim().parse::<u32>().map_err(|_| {
            CoreError::invalid(
                DataType::Rate,
                value,
                format!("{field} must be a non-negative integer"),
            )
        })
    };

    let correct = count("correct", correct)?;
    let incorrect = count("incorrect", incorrect)?;

    let counting_time = counting_time
        .ok_or_else(|| CoreError::invalid(DataType::Rate, "", "missing counting_time"))?;
    let counting_time_ms = parse_duration(counting_time)
        .map_err(|e| CoreError::invalid(DataType::Rate, counting_time, e.to_string()))?;
    if counting_time_ms == 0 {
        return Err(CoreError::invalid(
            DataType::Rate,
            counting_time,
            "counting time must be longer than zero",
        ));
    }

    Ok(RateValue {
        correct,
        incorrect,
        counting_time_ms,
    })
}

fn decode_task_analysis(input: &[String], expected: usize) -> Result<Vec<Outcome>> {
    if input.len() != expected {
        return Err(CoreError::StepCountMismatch {
            expected,
            found: input.len(),
        });
    }

    input
        .iter()
        .map(|s| parse_outcome(DataType::TaskAnalysis, s))
        .collect()
}

/// Parse `SS`, `MM:SS` or `HH:MM:SS` into milliseconds.
///
/// Groups are positional: one group is seconds, two are minutes and seconds,
/// three are hours, minutes and seconds. Components may be zero-padded and are
/// not range checked (`"90"` is ninety seconds).
pub fn parse_duration(input: &str) -> std::result::Result<u64, ParseDurationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseDurationError::Empty);
    }

    let groups: Vec<&str> = trimmed.split(':').collect();
    let units: &[u64] = match groups.len() {
        1 => &[MS_PER_SECOND],
        2 => &[MS_PER_MINUTE, MS_PER_SECOND],
        3 => &[MS_PER_HOUR, MS_PER_MINUTE, MS_PER_SECOND],
        n => return Err(ParseDurationError::GroupCount(n)),
    };

    groups.iter().zip(units).try_fold(0u64, |total, (group, unit)| {
        if group.is_empty() || !group.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseDurationError::NotANumber(group.to_string()));
        }
        // All digits, so the only way to fail is overflow
        let n: u64 = group.parse().map_err(|_| ParseDurationError::OutOfRange)?;
        n.checked_mul(*unit)
            .and_then(|ms| total.checked_add(ms))
            .ok_or(ParseDurationError::OutOfRange)
    })
}

/// Render milliseconds in colon notation: `0:10`, `1:10`, `1:01:10`.
///
/// Minutes are unpadded unless hours are shown. Sub-second remainders are dropped.
pub fn format_duration_colon(ms: u64) -> String {
    let total_secs = ms / MS_PER_SECOND;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Render milliseconds in words: `1 minute`, `1 hour 2 minutes 30 seconds`.
pub fn format_duration_long(ms: u64) -> String {
    if ms < MS_PER_SECOND {
        return plural(ms, "millisecond");
    }

    let mut parts = Vec::new();
    let days = ms / MS_PER_DAY;
    let hours = (ms % MS_PER_DAY) / MS_PER_HOUR;
    let minutes = (ms % MS_PER_HOUR) / MS_PER_MINUTE;
    let sub_minute = ms % MS_PER_MINUTE;

    if days > 0 {
        parts.push(plural(days, "day"));
    }
    if hours > 0 {
        parts.push(plural(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(plural(minutes, "minute"));
    }
    if sub_minute > 0 {
        let whole = sub_minute / MS_PER_SECOND;
        let tenths = (sub_minute % MS_PER_SECOND) / 100;
        if tenths == 0 {
            parts.push(plural(whole, "second"));
        } else {
            parts.push(format!("{}.{} seconds", whole, tenths));
        }
    }

    parts.join(" ")
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Stored value rendered for tables and raw-row listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Text(String),
    Rate {
        correct: u32,
        incorrect: u32,
        counting_time: String,
    },
    Steps(Vec<String>),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DisplayValue::Text(s) => f.write_str(s),
            DisplayValue::Rate {
                correct,
                incorrect,
                counting_time,
            } => write!(
                f,
                "{} correct, {} incorrect in {}",
                correct, incorrect, counting_time
            ),
            DisplayValue::Steps(steps) => f.write_str(&steps.join(", ")),
        }
    }
}

/// Encode a stored value for display
pub fn encode(value: &ObservationValue) -> DisplayValue {
    match value {
        ObservationValue::Frequency(n) => DisplayValue::Text(n.to_string()),
        ObservationValue::Duration(ms) => DisplayValue::Text(format_duration_colon(*ms)),
        ObservationValue::PercentCorrect(outcome) => DisplayValue::Text(outcome.to_string()),
        ObservationValue::Rate(rate) => DisplayValue::Rate {
            correct: rate.correct,
            incorrect: rate.incorrect,
            counting_time: format_duration_colon(rate.counting_time_ms),
        },
        ObservationValue::TaskAnalysis(steps) => {
            DisplayValue::Steps(steps.iter().map(|o| o.to_string()).collect())
        }
    }
}
