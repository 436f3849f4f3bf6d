//! Data type tags and categorical outcomes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The value shape a target records.
///
/// Fixed when the target is created. The set is closed: adding a variant forces
/// every dispatch site in tally-core to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Frequency,
    Duration,
    Rate,
    #[serde(rename = "Percent Correct")]
    PercentCorrect,
    #[serde(rename = "Task Analysis")]
    TaskAnalysis,
}

impl DataType {
    pub const ALL: [DataType; 5] = [
        DataType::Frequency,
        DataType::Duration,
        DataType::Rate,
        DataType::PercentCorrect,
        DataType::TaskAnalysis,
    ];

    /// Tag as stored on the target record
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Frequency => "Frequency",
            Self::Duration => "Duration",
            Self::Rate => "Rate",
            Self::PercentCorrect => "Percent Correct",
            Self::TaskAnalysis => "Task Analysis",
        }
    }

    /// Whether an in-progress aggregate for today means anything.
    ///
    /// Duration, Rate and Task Analysis record completed sessions, so their
    /// current period is always `NA`.
    pub fn has_running_total(&self) -> bool {
        matches!(self, Self::Frequency | Self::PercentCorrect)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A target carried a data type tag with no aggregator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown data type tag: {tag:?}")]
pub struct UnknownDataType {
    pub tag: String,
}

impl FromStr for DataType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|dt| dt.tag() == s)
            .ok_or_else(|| UnknownDataType { tag: s.to_string() })
    }
}

/// Judgment recorded for one trial or one task step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
    Approximation,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
            Self::Approximation => "approximation",
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Correct)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text that is not one of the outcome literals
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown outcome {input:?} (expected correct, incorrect or approximation)")]
pub struct ParseOutcomeError {
    pub input: String,
}

impl FromStr for Outcome {
    type Err = ParseOutcomeError;

    /// Exact literal match, no case folding
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "correct" => Ok(Self::Correct),
            "incorrect" => Ok(Self::Incorrect),
            "approximation" => Ok(Self::Approximation),
            _ => Err(ParseOutcomeError {
                input: s.to_string(),
            }),
        }
    }
}
