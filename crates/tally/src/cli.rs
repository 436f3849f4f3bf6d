//! Input loading and output formatting for the tally commands

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tally_core::codec::encode;
use tally_core::{Chart, CollectionEntry, DataType, ObservationValue, RawValue, Report};
use tally_types::{Observation, ObservationId, Target, TargetId};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug)]
pub enum CliError {
    /// An observation in the input belongs to another target
    ForeignObservation {
        target_id: TargetId,
        observation_id: ObservationId,
        found: TargetId,
    },
    /// Wrong number of positional values for the data type
    ValueCount {
        data_type: DataType,
        expected: usize,
        found: usize,
    },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::ForeignObservation {
                target_id,
                observation_id,
                found,
            } => write!(
                f,
                "Observation {} belongs to target {}, not {}",
                observation_id, found, target_id
            ),
            CliError::ValueCount {
                data_type,
                expected,
                found,
            } => write!(
                f,
                "{} takes {} value(s), got {}",
                data_type, expected, found
            ),
        }
    }
}

impl std::error::Error for CliError {}

// ============================================================================
// Input
// ============================================================================

/// One element of a collection input file
#[derive(Debug, Deserialize)]
pub struct CollectionInput {
    pub target: Target,
    #[serde(default)]
    pub observations: Vec<Observation>,
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Every observation must belong to `target`
pub fn check_ownership(target: &Target, observations: &[Observation]) -> Result<(), CliError> {
    match observations.iter().find(|o| o.target_id != target.id) {
        Some(obs) => Err(CliError::ForeignObservation {
            target_id: target.id.clone(),
            observation_id: obs.id.clone(),
            found: obs.target_id.clone(),
        }),
        None => Ok(()),
    }
}

/// Parse `--now` (RFC 3339), defaulting to the current time
pub fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| format!("Invalid --now {:?} (expected RFC 3339)", s)),
        None => Ok(Utc::now()),
    }
}

/// Shape command line values into form input for `data_type`
pub fn raw_input(
    data_type: DataType,
    values: Vec<String>,
    rate: Option<RawValue>,
) -> Result<RawValue, CliError> {
    if let Some(rate) = rate {
        return Ok(rate);
    }

    match data_type {
        DataType::Rate => Ok(RawValue::Rate {
            correct: None,
            incorrect: None,
            counting_time: None,
        }),
        DataType::TaskAnalysis => Ok(RawValue::Steps(values)),
        DataType::Frequency | DataType::Duration | DataType::PercentCorrect => {
            let found = values.len();
            match <[String; 1]>::try_from(values) {
                Ok([value]) => Ok(RawValue::Text(value)),
                Err(_) => Err(CliError::ValueCount {
                    data_type,
                    expected: 1,
                    found,
                }),
            }
        }
    }
}

// ============================================================================
// Output
// ============================================================================

pub fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn header(table: &mut Table, headers: Vec<&str>, no_color: bool) {
    if no_color {
        table.set_header(headers);
    } else {
        table.set_header(
            headers
                .into_iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }
}

/// Per-bucket table followed by the previous/current summaries
pub fn format_report_table(report: &Report, json: bool, no_color: bool) -> String {
    let data = report.table();
    if json {
        return to_json(&data);
    }

    let mut lines = vec![format!(
        "Target {} ({}, by {})",
        report.target_id, report.data_type, report.granularity
    )];

    if data.rows.is_empty() {
        lines.push("No observations.".to_string());
    } else {
        let with_raw = data.rows.iter().any(|r| r.raw_rows.is_some());
        let mut headers = data.headers.clone();
        if with_raw {
            headers.push("Observations");
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        header(&mut table, headers, no_color);

        for row in &data.rows {
            let mut cells = vec![row.period.clone()];
            cells.extend(row.cells.iter().cloned());
            if let Some(raw) = &row.raw_rows {
                let listed: Vec<String> = raw
                    .iter()
                    .map(|r| format!("{} {} {}", r.timestamp.format("%Y-%m-%d %H:%M"), r.id, r.display))
                    .collect();
                cells.push(listed.join("\n"));
            }
            table.add_row(Row::from(cells));
        }
        lines.push(table.to_string());
    }

    lines.push(format!("Previous: {}", report.previous));
    lines.push(format!("Current:  {}", report.current));
    lines.join("\n")
}

/// Labels and datasets, one column per dataset
pub fn format_chart(chart: &Chart, json: bool) -> String {
    if json {
        return to_json(chart);
    }

    let mut table = Table::new();
    let mut headers = vec!["Period"];
    headers.extend(chart.datasets.iter().map(|d| d.name));
    table.set_header(headers);

    for (i, label) in chart.labels.iter().enumerate() {
        let mut cells = vec![label.clone()];
        for dataset in &chart.datasets {
            cells.push(
                dataset
                    .data
                    .get(i)
                    .copied()
                    .flatten()
                    .map_or_else(|| "NA".to_string(), |v| v.to_string()),
            );
        }
        table.add_row(Row::from(cells));
    }
    table.to_string()
}

/// Stored form of a decoded value, plus how it reads back
pub fn format_decoded(value: &ObservationValue, json: bool) -> String {
    if json {
        return serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
    }
    format!(
        "{}: {} (stored as {})",
        value.data_type(),
        encode(value),
        serde_json::to_string(value).unwrap_or_default()
    )
}

pub fn format_collection(entries: &[CollectionEntry], json: bool, no_color: bool) -> String {
    if json {
        return to_json(&entries);
    }

    if entries.is_empty() {
        return "No targets.".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    header(
        &mut table,
        vec!["Target", "Name", "Data Type", "Previous", "Current"],
        no_color,
    );

    for entry in entries {
        let (previous, current) = match &entry.outcome {
            Ok(s) => (Cell::new(s.previous.to_string()), Cell::new(s.current.to_string())),
            Err(e) => {
                let cell = Cell::new(format!("error: {}", e));
                let cell = if no_color { cell } else { cell.fg(Color::Red) };
                (cell, Cell::new("-"))
            }
        };
        table.add_row(Row::from(vec![
            Cell::new(entry.target_id.as_str()),
            Cell::new(&entry.name),
            Cell::new(&entry.data_type),
            previous,
            current,
        ]));
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tally_core::{summarize, Outcome, ReportOptions};
    use tempfile::{tempdir, NamedTempFile};

    fn json_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 12, 0, 0).unwrap()
    }

    fn frequency_fixture() -> (Target, Vec<Observation>) {
        let target = Target::new("t-1", "Hand raising", DataType::Frequency);
        let observations = vec![
            Observation::new(
                "o-1",
                "t-1",
                Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap(),
                ObservationValue::Frequency(2),
            ),
            Observation::new(
                "o-2",
                "t-1",
                Utc.with_ymd_and_hms(2024, 3, 6, 9, 0, 0).unwrap(),
                ObservationValue::Frequency(3),
            ),
        ];
        (target, observations)
    }

    #[test]
    fn test_parse_now() {
        let parsed = parse_now(Some("2024-03-06T07:00:00-05:00")).unwrap();
        assert_eq!(parsed, now());
        assert!(parse_now(Some("yesterday")).is_err());
        assert!(parse_now(None).is_ok());
    }

    #[test]
    fn test_raw_input_shapes() {
        assert_eq!(
            raw_input(DataType::Duration, vec!["1:10".into()], None).unwrap(),
            RawValue::Text("1:10".into())
        );
        assert_eq!(
            raw_input(DataType::TaskAnalysis, vec!["correct".into(), "incorrect".into()], None)
                .unwrap(),
            RawValue::Steps(vec!["correct".into(), "incorrect".into()])
        );
        assert!(matches!(
            raw_input(DataType::Frequency, vec![], None),
            Err(CliError::ValueCount {
                expected: 1,
                found: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_foreign_observation_is_rejected() {
        let (target, mut observations) = frequency_fixture();
        observations[1].target_id = "t-2".into();

        let err = check_ownership(&target, &observations).unwrap_err();
        assert_eq!(err.to_string(), "Observation o-2 belongs to target t-2, not t-1");
    }

    #[test]
    fn test_report_table_lists_summaries() {
        let (target, observations) = frequency_fixture();
        let report = tally_core::report(&target, &observations, now(), &ReportOptions::default())
            .unwrap();

        let output = format_report_table(&report, false, true);
        assert!(output.contains("2024-03-05"));
        assert!(output.contains("2024-03-06"));
        assert!(output.contains("Previous: 2"));
        assert!(output.contains("Current:  3"));
    }

    #[test]
    fn test_report_table_with_raw_rows() {
        let (target, observations) = frequency_fixture();
        let options = ReportOptions::default().with_raw(true);
        let report = tally_core::report(&target, &observations, now(), &options).unwrap();

        let output = format_report_table(&report, false, true);
        assert!(output.contains("Observations"));
        assert!(output.contains("o-1"));
    }

    #[test]
    fn test_chart_marks_missing_values() {
        let target = Target::new("t-2", "Color naming", DataType::TaskAnalysis);
        let observations = vec![Observation::new(
            "o-1",
            "t-2",
            Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap(),
            ObservationValue::TaskAnalysis(vec![]),
        )];
        let report = tally_core::report(&target, &observations, now(), &ReportOptions::default())
            .unwrap();

        let output = format_chart(&report.chart(), false);
        assert!(output.contains("percent_correct"));
        assert!(output.contains("NA"));
    }

    #[test]
    fn test_decoded_output() {
        let value = ObservationValue::PercentCorrect(Outcome::Approximation);
        assert_eq!(
            format_decoded(&value, true),
            r#"{"data_type":"Percent Correct","value":"approximation"}"#
        );
        assert_eq!(
            format_decoded(&ObservationValue::Duration(70_000), false),
            r#"Duration: 1:10 (stored as {"data_type":"Duration","value":70000})"#
        );
    }

    #[test]
    fn test_collection_table_shows_errors_inline() {
        let (target, observations) = frequency_fixture();
        let mut legacy = Target::new("t-9", "On task", DataType::Frequency);
        legacy.data_type = "Momentary Time Sampling".to_string();

        let entries = summarize(
            &[(target, observations), (legacy, vec![])],
            now(),
            &ReportOptions::default(),
        );
        let output = format_collection(&entries, false, true);

        assert!(output.contains("Hand raising"));
        assert!(output.contains("error:"));
    }

    #[test]
    fn test_load_collection_input_from_file() {
        let file = json_file(
            r#"[{
                "target": {"id": "t-1", "name": "Hand raising", "data_type": "Frequency"},
                "observations": [{
                    "id": "o-1",
                    "target_id": "t-1",
                    "timestamp": "2024-03-05T09:00:00Z",
                    "data_type": "Frequency",
                    "value": 2
                }]
            }, {
                "target": {"id": "t-2", "name": "On task", "data_type": "Duration"}
            }]"#,
        );

        let entries: Vec<CollectionInput> = load_json(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].observations[0].value, ObservationValue::Frequency(2));
        assert!(entries[1].observations.is_empty());
        check_ownership(&entries[0].target, &entries[0].observations).unwrap();
    }

    #[test]
    fn test_load_json_names_the_file_on_failure() {
        let file = json_file("[{\"target\": ");
        let err = load_json::<Vec<CollectionInput>>(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse"));
        assert!(err.to_string().contains(&file.path().display().to_string()));

        let dir = tempdir().unwrap();
        let missing = dir.path().join("observations.json");
        let err = load_json::<Vec<Observation>>(&missing).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }
}
