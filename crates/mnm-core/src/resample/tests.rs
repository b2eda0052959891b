use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float64Array, Int64Array, ListArray, StringArray, TimestampNanosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use mnm_config::{ReducerList, ReducerSpec};

use super::*;
use crate::error::CoreReason;
use crate::filter::FilterDataBasedOnTime;

// -----------------------------------------------------------------------
// Fixtures
// -----------------------------------------------------------------------

const NS: i64 = 1_000_000_000;

fn at(s: &str) -> i64 {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap()
        .and_utc()
        .timestamp_nanos_opt()
        .unwrap()
}

fn show(t: i64) -> String {
    chrono::DateTime::from_timestamp_nanos(t)
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

const STAMPS: &[&str] = &[
    "2021-01-01 00:00:00",
    "2021-01-01 00:00:01",
    "2021-01-01 00:01:00",
    "2021-01-01 00:05:00",
    "2021-01-01 01:00:00",
    "2021-01-01 06:00:00",
    "2021-12-31 23:55:00",
    "2022-01-01 00:00:00",
];

/// `timestamp_string`, `date` and `values` (epoch seconds of `date`).
fn sample() -> RecordBatch {
    let ts: Vec<i64> = STAMPS.iter().map(|s| at(s)).collect();
    let secs: Vec<i64> = ts.iter().map(|t| t / NS).collect();
    let schema = Schema::new(vec![
        Field::new("timestamp_string", DataType::Utf8, false),
        Field::new("date", DataType::Timestamp(TimeUnit::Nanosecond, None), false),
        Field::new("values", DataType::Int64, false),
    ]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(StringArray::from(STAMPS.to_vec())),
            Arc::new(TimestampNanosecondArray::from(ts)),
            Arc::new(Int64Array::from(secs)),
        ],
    )
    .unwrap()
}

fn sum_of(stamps: &[&str]) -> i64 {
    stamps.iter().map(|s| at(s) / NS).sum()
}

/// A `ts`/`v` batch with `v = 1..=n`, optionally in a named timezone.
fn series(ts: Vec<i64>, tz: Option<&str>) -> RecordBatch {
    let values: Vec<f64> = (1..=ts.len()).map(|v| v as f64).collect();
    let schema = Schema::new(vec![
        Field::new(
            "ts",
            DataType::Timestamp(TimeUnit::Nanosecond, tz.map(Into::into)),
            false,
        ),
        Field::new("v", DataType::Float64, true),
    ]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(TimestampNanosecondArray::from(ts).with_timezone_opt(tz)),
            Arc::new(Float64Array::from(values)),
        ],
    )
    .unwrap()
}

fn hourly(start: &str, hours: i64) -> Vec<i64> {
    let t0 = at(start);
    (0..hours).map(|h| t0 + h * 3_600 * NS).collect()
}

fn labels(out: &RecordBatch, column: &str) -> Vec<String> {
    out.column_by_name(column)
        .unwrap()
        .as_any()
        .downcast_ref::<TimestampNanosecondArray>()
        .unwrap()
        .values()
        .iter()
        .map(|t| show(*t))
        .collect()
}

fn ints(out: &RecordBatch, column: &str) -> Vec<Option<i64>> {
    out.column_by_name(column)
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap()
        .iter()
        .collect()
}

fn floats(out: &RecordBatch, column: &str) -> Vec<Option<f64>> {
    out.column_by_name(column)
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap()
        .iter()
        .collect()
}

fn names(out: &RecordBatch) -> Vec<String> {
    out.schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

// -----------------------------------------------------------------------
// Boundary and label combinations
// -----------------------------------------------------------------------

#[test]
fn daily_sum_closed_left_label_left() {
    let out = ResampleData::new("date", "1d")
        .unwrap()
        .transform(&sample())
        .unwrap();
    assert_eq!(names(&out), vec!["date", "values"]);
    assert_eq!(
        labels(&out, "date"),
        vec!["2021-01-01 00:00:00", "2021-12-31 00:00:00", "2022-01-01 00:00:00"]
    );
    assert_eq!(
        ints(&out, "values"),
        vec![
            Some(sum_of(&STAMPS[..6])),
            Some(sum_of(&STAMPS[6..7])),
            Some(sum_of(&STAMPS[7..])),
        ]
    );
}

#[test]
fn daily_sum_closed_right_label_left() {
    let out = ResampleData::new("date", "1d")
        .unwrap()
        .with_closed(ClosedBoundary::Right)
        .transform(&sample())
        .unwrap();
    assert_eq!(
        labels(&out, "date"),
        vec!["2020-12-31 00:00:00", "2021-01-01 00:00:00", "2021-12-31 00:00:00"]
    );
    assert_eq!(
        ints(&out, "values"),
        vec![
            Some(sum_of(&STAMPS[..1])),
            Some(sum_of(&STAMPS[1..6])),
            Some(sum_of(&STAMPS[6..])),
        ]
    );
}

#[test]
fn daily_sum_closed_left_label_right() {
    let out = ResampleData::new("date", "1d")
        .unwrap()
        .with_label(LabelStrategy::Right)
        .transform(&sample())
        .unwrap();
    assert_eq!(
        labels(&out, "date"),
        vec!["2021-01-02 00:00:00", "2022-01-01 00:00:00", "2022-01-02 00:00:00"]
    );
    assert_eq!(
        ints(&out, "values"),
        vec![
            Some(sum_of(&STAMPS[..6])),
            Some(sum_of(&STAMPS[6..7])),
            Some(sum_of(&STAMPS[7..])),
        ]
    );
}

#[test]
fn daily_sum_closed_right_label_right() {
    let out = ResampleData::new("date", "1d")
        .unwrap()
        .with_closed(ClosedBoundary::Right)
        .with_label(LabelStrategy::Right)
        .transform(&sample())
        .unwrap();
    assert_eq!(
        labels(&out, "date"),
        vec!["2021-01-01 00:00:00", "2021-01-02 00:00:00", "2022-01-01 00:00:00"]
    );
    assert_eq!(
        ints(&out, "values"),
        vec![
            Some(sum_of(&STAMPS[..1])),
            Some(sum_of(&STAMPS[1..6])),
            Some(sum_of(&STAMPS[6..])),
        ]
    );
}

#[test]
fn daily_sum_with_start_offset() {
    let out = ResampleData::new("date", "1d")
        .unwrap()
        .with_start_offset("6h")
        .unwrap()
        .transform(&sample())
        .unwrap();
    assert_eq!(
        labels(&out, "date"),
        vec!["2020-12-31 00:00:00", "2021-01-01 00:00:00", "2021-12-31 00:00:00"]
    );
    assert_eq!(
        ints(&out, "values"),
        vec![
            Some(sum_of(&STAMPS[..5])),
            Some(sum_of(&STAMPS[5..6])),
            Some(sum_of(&STAMPS[6..])),
        ]
    );
}

#[test]
fn datapoint_label_is_first_timestamp() {
    let out = ResampleData::new("date", "1d")
        .unwrap()
        .with_label(LabelStrategy::Datapoint)
        .transform(&sample())
        .unwrap();
    assert_eq!(
        labels(&out, "date"),
        vec!["2021-01-01 00:00:00", "2021-12-31 23:55:00", "2022-01-01 00:00:00"]
    );
}

#[test]
fn datapoint_label_follows_start_offset() {
    let batch = series(vec![at("2021-01-01 07:00:00"), at("2021-01-01 08:00:00")], None);
    let out = ResampleData::new("ts", "1d")
        .unwrap()
        .with_start_offset("6h")
        .unwrap()
        .with_label(LabelStrategy::Datapoint)
        .transform(&batch)
        .unwrap();
    assert_eq!(labels(&out, "ts"), vec!["2021-01-01 01:00:00"]);
}

// -----------------------------------------------------------------------
// Arithmetic and ordering
// -----------------------------------------------------------------------

#[test]
fn one_day_of_minutes_sums_to_one_row() {
    let t0 = at("2023-06-01 00:00:00");
    let ts: Vec<i64> = (0..1440).map(|m| t0 + m * 60 * NS).collect();
    let out = ResampleData::new("ts", "1d")
        .unwrap()
        .with_partiality(PartialityPolicy::Fail)
        .transform(&series(ts, None))
        .unwrap();
    assert_eq!(out.num_rows(), 1);
    assert_eq!(labels(&out, "ts"), vec!["2023-06-01 00:00:00"]);
    assert_eq!(floats(&out, "v"), vec![Some((1440 * 1441 / 2) as f64)]);
}

#[test]
fn unsorted_input_is_sorted_first() {
    let ts = vec![at("2021-01-02 00:00:00"), at("2021-01-01 00:00:00")];
    let out = ResampleData::new("ts", "1d")
        .unwrap()
        .transform(&series(ts, None))
        .unwrap();
    assert_eq!(
        labels(&out, "ts"),
        vec!["2021-01-01 00:00:00", "2021-01-02 00:00:00"]
    );
    assert_eq!(floats(&out, "v"), vec![Some(2.0), Some(1.0)]);
}

#[test]
fn batches_are_concatenated() {
    let a = series(hourly("2021-01-01 00:00:00", 2), None);
    let b = series(hourly("2021-01-01 02:00:00", 2), None);
    let out = ResampleData::new("ts", "1d")
        .unwrap()
        .transform_batches(&[a, b])
        .unwrap();
    assert_eq!(floats(&out, "v"), vec![Some(1.0 + 2.0 + 1.0 + 2.0)]);
}

#[test]
fn multiple_reducers_are_suffixed() {
    let r = ResampleData::new("date", "1d")
        .unwrap()
        .with_reducers(&["sum".into(), "max".into(), "count".into()])
        .unwrap();
    let out = r.transform(&sample()).unwrap();
    assert_eq!(names(&out), vec!["date", "values_sum", "values_max", "values_count"]);
    assert_eq!(
        ints(&out, "values_count"),
        vec![Some(6), Some(1), Some(1)]
    );
    assert_eq!(
        ints(&out, "values_max"),
        vec![
            Some(at(STAMPS[5]) / NS),
            Some(at(STAMPS[6]) / NS),
            Some(at(STAMPS[7]) / NS),
        ]
    );
}

#[test]
fn suffixes_use_the_requested_reducer_name() {
    let out = ResampleData::new("ts", "1d")
        .unwrap()
        .with_reducers(&["sum".into(), "collect".into()])
        .unwrap()
        .transform(&series(hourly("2021-01-01 00:00:00", 4), None))
        .unwrap();
    assert_eq!(names(&out), vec!["ts", "v_sum", "v_collect"]);
    assert_eq!(floats(&out, "v_sum"), vec![Some(10.0)]);
}

#[test]
fn count_applies_to_every_column() {
    let out = ResampleData::new("date", "1d")
        .unwrap()
        .with_reducers(&["count".into()])
        .unwrap()
        .transform(&sample())
        .unwrap();
    assert_eq!(names(&out), vec!["date", "timestamp_string", "values"]);
    assert_eq!(ints(&out, "timestamp_string"), vec![Some(6), Some(1), Some(1)]);
}

#[test]
fn identity_collects_each_window() {
    let out = ResampleData::new("date", "1d")
        .unwrap()
        .with_reducers(&["identity".into()])
        .unwrap()
        .with_target_columns(vec!["timestamp_string".into()])
        .unwrap()
        .transform(&sample())
        .unwrap();
    let lists = out
        .column_by_name("timestamp_string")
        .unwrap()
        .as_any()
        .downcast_ref::<ListArray>()
        .unwrap();
    assert_eq!(lists.value_length(0), 6);
    let last = lists.value(2);
    let last = last.as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(last.value(0), "2022-01-01 00:00:00");
}

#[test]
fn boundaries_come_before_the_label() {
    let out = ResampleData::new("date", "1d")
        .unwrap()
        .with_closed(ClosedBoundary::Right)
        .with_boundaries(true)
        .transform(&sample())
        .unwrap();
    assert_eq!(
        names(&out),
        vec![LOWER_BOUNDARY, UPPER_BOUNDARY, "date", "values"]
    );
    assert_eq!(
        labels(&out, LOWER_BOUNDARY),
        vec!["2020-12-31 00:00:00", "2021-01-01 00:00:00", "2021-12-31 00:00:00"]
    );
    assert_eq!(
        labels(&out, UPPER_BOUNDARY),
        vec!["2021-01-01 00:00:00", "2021-01-02 00:00:00", "2022-01-01 00:00:00"]
    );
}

#[test]
fn groups_come_first_in_schema_and_order() {
    let ts = vec![
        at("2021-01-01 00:00:00"),
        at("2021-01-01 00:00:00"),
        at("2021-01-02 00:00:00"),
        at("2021-01-02 00:00:00"),
    ];
    let schema = Schema::new(vec![
        Field::new("ts", DataType::Timestamp(TimeUnit::Nanosecond, None), false),
        Field::new("site", DataType::Utf8, false),
        Field::new("v", DataType::Int64, false),
    ]);
    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(TimestampNanosecondArray::from(ts)) as ArrayRef,
            Arc::new(StringArray::from(vec!["north", "south", "south", "north"])),
            Arc::new(Int64Array::from(vec![1, 10, 20, 2])),
        ],
    )
    .unwrap();
    let out = ResampleData::new("ts", "1d")
        .unwrap()
        .with_group_by(vec!["site".into()])
        .transform(&batch)
        .unwrap();
    assert_eq!(names(&out), vec!["site", "ts", "v"]);
    let sites = out
        .column(0)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(
        (0..4).map(|i| sites.value(i)).collect::<Vec<_>>(),
        vec!["north", "north", "south", "south"]
    );
    assert_eq!(ints(&out, "v"), vec![Some(1), Some(2), Some(10), Some(20)]);
}

// -----------------------------------------------------------------------
// Partial windows
// -----------------------------------------------------------------------

/// One full day of hourly data followed by half a day.
fn day_and_a_half() -> RecordBatch {
    series(hourly("2021-01-01 00:00:00", 36), None)
}

#[test]
fn keep_policy_keeps_partial_windows() {
    let out = ResampleData::new("ts", "1d")
        .unwrap()
        .transform(&day_and_a_half())
        .unwrap();
    assert_eq!(out.num_rows(), 2);
}

#[test]
fn drop_policy_removes_partial_windows() {
    let out = ResampleData::new("ts", "1d")
        .unwrap()
        .with_partiality(PartialityPolicy::Drop)
        .transform(&day_and_a_half())
        .unwrap();
    assert_eq!(labels(&out, "ts"), vec!["2021-01-01 00:00:00"]);
}

#[test]
fn null_policy_clears_only_aggregates() {
    let out = ResampleData::new("ts", "1d")
        .unwrap()
        .with_partiality(PartialityPolicy::Null)
        .with_boundaries(true)
        .transform(&day_and_a_half())
        .unwrap();
    assert_eq!(out.num_rows(), 2);
    assert_eq!(floats(&out, "v"), vec![Some((24 * 25 / 2) as f64), None]);
    assert_eq!(out.column_by_name("ts").unwrap().null_count(), 0);
    assert_eq!(out.column_by_name(LOWER_BOUNDARY).unwrap().null_count(), 0);
}

#[test]
fn fail_policy_names_the_window() {
    let err = ResampleData::new("ts", "1d")
        .unwrap()
        .with_partiality(PartialityPolicy::Fail)
        .transform(&day_and_a_half())
        .unwrap_err();
    assert_eq!(err.reason(), &CoreReason::PartialData);
    assert!(format!("{err}").contains("2021-01-02T00:00:00"), "{err}");
}

#[test]
fn exact_detection_rejects_irregular_series() {
    let err = ResampleData::new("date", "1d")
        .unwrap()
        .with_partiality(PartialityPolicy::Drop)
        .transform(&sample())
        .unwrap_err();
    assert_eq!(err.reason(), &CoreReason::AmbiguousFrequency);
}

#[test]
fn max_detection_on_irregular_series() {
    // Gaps of 1h and 2h: max says 2h, so a day needs 12 samples.
    let mut ts = hourly("2021-01-01 00:00:00", 24);
    ts.extend((0..12).map(|i| at("2021-01-02 00:00:00") + i * 2 * 3_600 * NS));
    let out = ResampleData::new("ts", "1d")
        .unwrap()
        .with_partiality(PartialityPolicy::Drop)
        .with_frequency_detection(FrequencyStrategy::Max)
        .transform(&series(ts, None))
        .unwrap();
    assert_eq!(out.num_rows(), 2);
}

#[test]
fn dst_short_day_is_not_partial() {
    // Europe/London springs forward on 2023-03-26: the local day spans
    // 00:00 UTC to 23:00 UTC.
    let tz = Some("Europe/London");
    let batch = series(hourly("2023-03-26 00:00:00", 23), tz);
    let out = ResampleData::new("ts", "1d")
        .unwrap()
        .with_partiality(PartialityPolicy::Fail)
        .with_boundaries(true)
        .transform(&batch)
        .unwrap();
    assert_eq!(out.num_rows(), 1);
    let lower = at(&labels(&out, LOWER_BOUNDARY)[0]);
    let upper = at(&labels(&out, UPPER_BOUNDARY)[0]);
    assert_eq!(upper - lower, 23 * 3_600 * NS);
    assert_eq!(
        out.schema().field_with_name("ts").unwrap().data_type(),
        &DataType::Timestamp(TimeUnit::Nanosecond, Some("Europe/London".into()))
    );
}

#[test]
fn hourly_windows_start_on_the_local_hour() {
    // Asia/Kolkata is UTC+05:30; local midnight is 18:30 UTC.
    let t0 = at("2022-12-31 18:30:00");
    let ts: Vec<i64> = (0..8).map(|i| t0 + i * 900 * NS).collect();
    let out = ResampleData::new("ts", "1h")
        .unwrap()
        .with_reducers(&["sum".into()])
        .unwrap()
        .transform(&series(ts, Some("Asia/Kolkata")))
        .unwrap();
    assert_eq!(
        labels(&out, "ts"),
        vec!["2022-12-31 18:30:00", "2022-12-31 19:30:00"]
    );
    assert_eq!(floats(&out, "v"), vec![Some(10.0), Some(26.0)]);
}

#[test]
fn partiality_is_measured_before_filtering() {
    let batch = series(hourly("2021-01-01 00:00:00", 48), None);
    let filter = FilterDataBasedOnTime::new("ts", &[">1h*<8h"]).unwrap();
    let out = ResampleData::new("ts", "1d")
        .unwrap()
        .with_partiality(PartialityPolicy::Drop)
        .with_reducers(&["count".into()])
        .unwrap()
        .transform_filtered(&batch, &filter)
        .unwrap();
    // Hours 2..=7 are removed from both days, yet neither day is partial.
    assert_eq!(ints(&out, "v"), vec![Some(18), Some(18)]);
}

#[test]
fn closure_filters_are_accepted() {
    let batch = series(hourly("2021-01-01 00:00:00", 24), None);
    let first_hour = |b: &RecordBatch| -> CoreResult<RecordBatch> { Ok(b.slice(0, 1)) };
    let out = ResampleData::new("ts", "1d")
        .unwrap()
        .transform_filtered(&batch, &first_hour)
        .unwrap();
    assert_eq!(floats(&out, "v"), vec![Some(1.0)]);
}

// -----------------------------------------------------------------------
// Construction and validation
// -----------------------------------------------------------------------

#[test]
fn construction_errors_carry_reasons() {
    let reason = |r: CoreResult<ResampleData>| r.unwrap_err().reason().clone();
    assert_eq!(reason(ResampleData::new("ts", "0d")), CoreReason::Configuration);
    assert_eq!(reason(ResampleData::new("ts", "1mo2d")), CoreReason::Configuration);
    assert_eq!(reason(ResampleData::new("ts", "d1")), CoreReason::MalformedDuration);
    assert_eq!(
        reason(ResampleData::new("ts", "1d").unwrap().with_start_offset("-6h")),
        CoreReason::Configuration
    );
    assert_eq!(
        reason(
            ResampleData::new("ts", "1d")
                .unwrap()
                .with_reducers(&[ReducerSpec::Record {
                    name: Some("p90".into()),
                    func: Some("percentile".into()),
                }])
        ),
        CoreReason::NotImplemented
    );
    assert_eq!(
        reason(
            ResampleData::new("ts", "1d")
                .unwrap()
                .with_target_columns(vec!["ts".into()])
        ),
        CoreReason::Configuration
    );
}

#[test]
fn fit_validates_schema() {
    let r = ResampleData::new("date", "1d").unwrap();
    assert!(r.fit(&sample()).is_ok());
    let r = ResampleData::new("when", "1d").unwrap();
    assert!(r.fit(&sample()).is_err());
    let r = ResampleData::new("date", "1d")
        .unwrap()
        .with_target_columns(vec!["timestamp_string".into()])
        .unwrap();
    let err = r.fit(&sample()).unwrap_err();
    assert_eq!(err.reason(), &CoreReason::DataFormat);
}

#[test]
fn from_config_matches_builder() {
    let mut cfg = ResampleConfig::new("date", "1d");
    cfg.closed = ClosedBoundary::Right;
    cfg.reducers = ReducerList::Many(vec!["sum".into(), "mean".into()]);
    let r = ResampleData::from_config(&cfg).unwrap();
    assert_eq!(r.reducers(), &[Reducer::Sum, Reducer::Mean]);
    let out = r.transform(&sample()).unwrap();
    assert_eq!(names(&out), vec!["date", "values_sum", "values_mean"]);
    assert_eq!(
        labels(&out, "date"),
        vec!["2020-12-31 00:00:00", "2021-01-01 00:00:00", "2021-12-31 00:00:00"]
    );
}
