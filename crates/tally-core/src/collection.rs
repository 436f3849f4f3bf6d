//! Collection screen summaries
//!
//! Previous and current summaries for many targets at once. Targets are
//! independent, so they are summarized in parallel; a target that fails to
//! summarize carries its error in its own entry.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tally_types::{Observation, Target, TargetId};

use crate::aggregate::Summary;
use crate::config::ReportOptions;
use crate::error::Result;
use crate::report::{current, previous};

/// Previous and current summary of one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summaries {
    pub previous: Summary,
    pub current: Summary,
}

/// One row of the collection screen
#[derive(Debug)]
pub struct CollectionEntry {
    pub target_id: TargetId,
    pub name: String,
    /// Stored tag, as given; may be a tag without an aggregator
    pub data_type: String,
    pub outcome: Result<Summaries>,
}

impl CollectionEntry {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Serializes flat: the summaries on success, an `error` message otherwise
impl Serialize for CollectionEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("target_id", &self.target_id)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("data_type", &self.data_type)?;
        match &self.outcome {
            Ok(summaries) => {
                map.serialize_entry("previous", &summaries.previous)?;
                map.serialize_entry("current", &summaries.current)?;
            }
            Err(e) => map.serialize_entry("error", &e.to_string())?,
        }
        map.end()
    }
}

fn summarize_one(
    target: &Target,
    observations: &[Observation],
    now: DateTime<Utc>,
    options: &ReportOptions,
) -> Result<Summaries> {
    Ok(Summaries {
        previous: previous(target, observations, now, options)?,
        current: current(target, observations, now, options)?,
    })
}

/// Summarize every target. Entries come back in input order.
pub fn summarize(
    targets: &[(Target, Vec<Observation>)],
    now: DateTime<Utc>,
    options: &ReportOptions,
) -> Vec<CollectionEntry> {
    let entries: Vec<CollectionEntry> = targets
        .par_iter()
        .map(|(target, observations)| CollectionEntry {
            target_id: target.id.clone(),
            name: target.name.clone(),
            data_type: target.data_type.clone(),
            outcome: summarize_one(target, observations, now, options),
        })
        .collect();

    let failed = entries.iter().filter(|e| !e.is_ok()).count();
    if failed > 0 {
        tracing::warn!(
            targets = entries.len(),
            failed,
            "some targets could not be summarized"
        );
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tally_types::{DataType, ObservationValue};

    use crate::error::CoreError;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 12, 0, 0).unwrap()
    }

    fn yesterday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_entries_follow_input_order() {
        let targets = vec![
            (
                Target::new("t-1", "Hand raising", DataType::Frequency),
                vec![Observation::new("o-1", "t-1", yesterday(), ObservationValue::Frequency(3))],
            ),
            (
                Target::new("t-2", "Tantrum length", DataType::Duration),
                vec![Observation::new("o-2", "t-2", yesterday(), ObservationValue::Duration(60_000))],
            ),
        ];

        let entries = summarize(&targets, now(), &ReportOptions::default());
        let ids: Vec<&str> = entries.iter().map(|e| e.target_id.as_str()).collect();
        assert_eq!(ids, vec!["t-1", "t-2"]);

        let first = entries[0].outcome.as_ref().unwrap();
        assert_eq!(first.previous, Summary::Count(3));
        assert_eq!(first.current, Summary::Count(0));

        let second = entries[1].outcome.as_ref().unwrap();
        assert_eq!(second.previous.to_string(), "1 minute");
        assert!(second.current.is_na());
    }

    #[test]
    fn test_failure_stays_in_its_entry() {
        let mut legacy = Target::new("t-9", "On task", DataType::Frequency);
        legacy.data_type = "Partial Interval".to_string();

        let targets = vec![
            (legacy, vec![]),
            (Target::new("t-1", "Hand raising", DataType::Frequency), vec![]),
        ];

        let entries = summarize(&targets, now(), &ReportOptions::default());
        assert!(matches!(
            entries[0].outcome,
            Err(CoreError::UnknownDataType { .. })
        ));
        assert!(entries[1].is_ok());
    }

    #[test]
    fn test_entry_serialization() {
        let mut legacy = Target::new("t-9", "On task", DataType::Frequency);
        legacy.data_type = "Whole Interval".to_string();
        let targets = vec![
            (Target::new("t-1", "Hand raising", DataType::Frequency), vec![]),
            (legacy, vec![]),
        ];

        let entries = summarize(&targets, now(), &ReportOptions::default());
        let json = serde_json::to_value(&entries).unwrap();

        assert_eq!(json[0]["previous"], "NA");
        assert_eq!(json[0]["current"], "NA");
        assert_eq!(json[1]["data_type"], "Whole Interval");
        assert!(json[1]["error"].as_str().unwrap().contains("Whole Interval"));
    }
}
