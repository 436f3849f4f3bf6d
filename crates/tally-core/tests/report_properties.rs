//! Property tests for report building
//!
//! Run with:
//! ```bash
//! cargo test -p tally-core --test report_properties
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use proptest::test_runner::Config;
use tally_core::codec::{format_duration_colon, parse_duration};
use tally_core::{
    graph, report, BucketValue, DataType, Granularity, Observation, ObservationValue,
    ReportOptions, Target,
};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn granularity() -> impl Strategy<Value = Granularity> {
    prop_oneof![
        Just(Granularity::Day),
        Just(Granularity::Week),
        Just(Granularity::Month),
        Just(Granularity::Year),
    ]
}

fn timezone() -> impl Strategy<Value = chrono_tz::Tz> {
    prop_oneof![
        Just(chrono_tz::Tz::UTC),
        Just(chrono_tz::America::Chicago),
        Just(chrono_tz::Asia::Kolkata),
        Just(chrono_tz::Pacific::Auckland),
    ]
}

/// (minutes after base, count) pairs spanning roughly two years
fn frequency_entries() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((0_i64..1_000_000, 0_i64..50), 0..60)
}

fn frequency_observations(entries: &[(i64, i64)]) -> Vec<Observation> {
    entries
        .iter()
        .enumerate()
        .map(|(i, (minutes, count))| {
            Observation::new(
                format!("o-{i}"),
                "t-1",
                base() + Duration::minutes(*minutes),
                ObservationValue::Frequency(*count),
            )
        })
        .collect()
}

proptest! {
    #![proptest_config(Config::with_cases(128))]

    #[test]
    fn duration_colon_roundtrip(secs in 0_u64..360_000) {
        let ms = secs * 1_000;
        prop_assert_eq!(parse_duration(&format_duration_colon(ms)), Ok(ms));
    }

    #[test]
    fn frequency_total_is_conserved(
        entries in frequency_entries(),
        granularity in granularity(),
        tz in timezone(),
    ) {
        let target = Target::new("t-1", "Hand raising", DataType::Frequency);
        let observations = frequency_observations(&entries);
        let options = ReportOptions::default()
            .with_granularity(granularity)
            .with_timezone(tz);

        let report = report(&target, &observations, base(), &options).unwrap();
        let bucketed: i64 = report
            .series
            .iter()
            .map(|p| match p.value {
                BucketValue::Count(n) => n,
                other => panic!("unexpected value {other:?}"),
            })
            .sum();
        let raw: i64 = entries.iter().map(|(_, c)| c).sum();
        prop_assert_eq!(bucketed, raw);
    }

    #[test]
    fn series_is_sparse_and_strictly_increasing(
        entries in frequency_entries(),
        granularity in granularity(),
    ) {
        let target = Target::new("t-1", "Hand raising", DataType::Frequency);
        let observations = frequency_observations(&entries);
        let options = ReportOptions::default().with_granularity(granularity);

        let report = report(&target, &observations, base(), &options).unwrap();
        prop_assert!(report.series.len() <= observations.len());

        let labels = report.labels();
        for pair in labels.windows(2) {
            prop_assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
        for pair in report.series.windows(2) {
            prop_assert!(pair[0].bucket < pair[1].bucket);
        }
    }

    #[test]
    fn report_is_deterministic(
        entries in frequency_entries(),
        granularity in granularity(),
        tz in timezone(),
        now_offset in 0_i64..1_000_000,
    ) {
        let target = Target::new("t-1", "Hand raising", DataType::Frequency);
        let observations = frequency_observations(&entries);
        let options = ReportOptions::default()
            .with_granularity(granularity)
            .with_timezone(tz)
            .with_raw(true);
        let now = base() + Duration::minutes(now_offset);

        let first = report(&target, &observations, now, &options).unwrap();
        let second = report(&target, &observations, now, &options).unwrap();
        prop_assert_eq!(&first, &second);

        let mut reversed = observations.clone();
        reversed.reverse();
        let chart = graph(&target, &reversed, &options).unwrap();
        prop_assert_eq!(chart.labels, first.labels());
    }
}

#[test]
fn test_three_sparse_days() {
    let target = Target::new("t-1", "Hand raising", DataType::Frequency);
    let day = |d: u32| Utc.with_ymd_and_hms(2024, 3, d, 10, 0, 0).unwrap();
    let observations = vec![
        Observation::new("o-3", "t-1", day(20), ObservationValue::Frequency(1)),
        Observation::new("o-1", "t-1", day(2), ObservationValue::Frequency(4)),
        Observation::new("o-2", "t-1", day(9), ObservationValue::Frequency(2)),
    ];

    let report = report(&target, &observations, day(21), &ReportOptions::default()).unwrap();
    assert_eq!(report.labels(), vec!["2024-03-02", "2024-03-09", "2024-03-20"]);
    assert_eq!(report.previous.to_string(), "1");
    assert_eq!(report.current.to_string(), "0");
}
