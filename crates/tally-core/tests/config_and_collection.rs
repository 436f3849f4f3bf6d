//! Config file defaults flowing into collection summaries

use chrono::{TimeZone, Utc};
use std::io::Write;
use tally_core::{
    summarize, DataType, Granularity, Observation, ObservationValue, Outcome, Summary,
    TallyConfig, Target,
};
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_weekly_config_changes_previous_period() {
    let file = write_config("granularity = \"week\"\n");
    let options = TallyConfig::load(file.path())
        .unwrap()
        .report_options()
        .unwrap();
    assert_eq!(options.granularity, Granularity::Week);

    // Wednesday of 2024-W10
    let now = Utc.with_ymd_and_hms(2024, 3, 6, 12, 0, 0).unwrap();
    let target = Target::new("t-1", "Hand raising", DataType::Frequency);
    let observations = vec![
        Observation::new(
            "o-1",
            "t-1",
            Utc.with_ymd_and_hms(2024, 2, 27, 9, 0, 0).unwrap(),
            ObservationValue::Frequency(4),
        ),
        Observation::new(
            "o-2",
            "t-1",
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            ObservationValue::Frequency(6),
        ),
    ];

    let entries = summarize(&[(target, observations)], now, &options);
    let summaries = entries[0].outcome.as_ref().unwrap();
    assert_eq!(summaries.previous, Summary::Count(10));
    assert_eq!(summaries.current, Summary::Count(0));
}

#[test]
fn test_config_time_zone_moves_today() {
    let file = write_config("timezone = \"America/Los_Angeles\"\n");
    let options = TallyConfig::load(file.path())
        .unwrap()
        .report_options()
        .unwrap();

    // 02:00 UTC on the 6th is still the 5th in Los Angeles
    let now = Utc.with_ymd_and_hms(2024, 3, 6, 2, 0, 0).unwrap();
    let target = Target::new("t-2", "Color naming", DataType::PercentCorrect);
    let observations = vec![Observation::new(
        "o-1",
        "t-2",
        Utc.with_ymd_and_hms(2024, 3, 5, 20, 0, 0).unwrap(),
        ObservationValue::PercentCorrect(Outcome::Correct),
    )];

    let entries = summarize(&[(target.clone(), observations.clone())], now, &options);
    let local = entries[0].outcome.as_ref().unwrap();
    assert_eq!(local.current, Summary::Percent(100));
    assert!(local.previous.is_na());

    // In UTC the same record already belongs to yesterday
    let utc_entries = summarize(&[(target, observations)], now, &Default::default());
    let utc = utc_entries[0].outcome.as_ref().unwrap();
    assert_eq!(utc.previous, Summary::Percent(100));
    assert!(utc.current.is_na());
}
