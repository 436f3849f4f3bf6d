//! Raw observation records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::data_type::{DataType, Outcome};
use super::ids::{ObservationId, TargetId};

/// Counts taken over a timed counting window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateValue {
    pub correct: u32,
    pub incorrect: u32,
    /// Length of the counting window in milliseconds
    #[serde(alias = "counting_time")]
    pub counting_time_ms: u64,
}

/// Canonical stored value, tagged with its data type.
///
/// Serialized adjacently as `{"data_type": "...", "value": ...}` so the shape
/// is never guessed from the JSON alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "data_type", content = "value")]
pub enum ObservationValue {
    /// Occurrence count. Negative when recorded as a correction delta.
    Frequency(i64),
    /// Milliseconds
    Duration(u64),
    Rate(RateValue),
    #[serde(rename = "Percent Correct")]
    PercentCorrect(Outcome),
    /// One outcome per step, aligned with the target's step list
    #[serde(rename = "Task Analysis")]
    TaskAnalysis(Vec<Outcome>),
}

impl ObservationValue {
    /// Data type this value's shape belongs to
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Frequency(_) => DataType::Frequency,
            Self::Duration(_) => DataType::Duration,
            Self::Rate(_) => DataType::Rate,
            Self::PercentCorrect(_) => DataType::PercentCorrect,
            Self::TaskAnalysis(_) => DataType::TaskAnalysis,
        }
    }
}

/// One recorded data point for a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub id: ObservationId,
    pub target_id: TargetId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub value: ObservationValue,
}

impl Observation {
    pub fn new(
        id: impl Into<ObservationId>,
        target_id: impl Into<TargetId>,
        timestamp: DateTime<Utc>,
        value: ObservationValue,
    ) -> Self {
        Self {
            id: id.into(),
            target_id: target_id.into(),
            timestamp,
            value,
        }
    }

    pub fn data_type(&self) -> DataType {
        self.value.data_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_observation_json_shape() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap();
        let obs = Observation::new(
            "o-1",
            "t-1",
            ts,
            ObservationValue::Rate(RateValue {
                correct: 12,
                incorrect: 4,
                counting_time_ms: 60_000,
            }),
        );

        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["data_type"], "Rate");
        assert_eq!(json["value"]["correct"], 12);
        assert_eq!(json["value"]["counting_time_ms"], 60_000);
        assert_eq!(json["target_id"], "t-1");
    }

    #[test]
    fn test_rate_accepts_legacy_counting_time_field() {
        let json = r#"{
            "id": "o-2",
            "target_id": "t-1",
            "timestamp": "2024-03-05T14:00:00Z",
            "data_type": "Rate",
            "value": {"correct": 3, "incorrect": 1, "counting_time": 60000}
        }"#;
        let obs: Observation = serde_json::from_str(json).unwrap();
        assert_eq!(
            obs.value,
            ObservationValue::Rate(RateValue {
                correct: 3,
                incorrect: 1,
                counting_time_ms: 60_000
            })
        );
    }

    #[test]
    fn test_task_analysis_value_parses() {
        let json = r#"{
            "id": "o-3",
            "target_id": "t-9",
            "timestamp": "2024-03-05T14:00:00Z",
            "data_type": "Task Analysis",
            "value": ["correct", "incorrect", "approximation"]
        }"#;
        let obs: Observation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.data_type(), DataType::TaskAnalysis);
        assert_eq!(
            obs.value,
            ObservationValue::TaskAnalysis(vec![
                Outcome::Correct,
                Outcome::Incorrect,
                Outcome::Approximation
            ])
        );
    }

    #[test]
    fn test_unknown_value_tag_rejected() {
        let json = r#"{
            "id": "o-4",
            "target_id": "t-1",
            "timestamp": "2024-03-05T14:00:00Z",
            "data_type": "Whole Interval",
            "value": 1
        }"#;
        assert!(serde_json::from_str::<Observation>(json).is_err());
    }
}
