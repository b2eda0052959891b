//! End-to-end: `mnm.toml` → Pipeline → Arrow IPC in and out, with logging
//! written to a file.

use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, TimestampNanosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use mnm_config::ProjectConfig;
use mnm_core::CoreReason;
use mnm_runtime::ipc::{read_ipc_file, write_ipc_file};
use mnm_runtime::{Pipeline, RuntimeReason, init_tracing};

const HOUR: i64 = 3_600_000_000_000;

fn hourly(y: i32, m: u32, d: u32, hours: i64, tz: Option<&str>) -> RecordBatch {
    let start = NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_nanos_opt()
        .unwrap();
    let ts: Vec<i64> = (0..hours).map(|h| start + h * HOUR).collect();
    let schema = Schema::new(vec![
        Field::new(
            "ts",
            DataType::Timestamp(TimeUnit::Nanosecond, tz.map(Into::into)),
            false,
        ),
        Field::new("v", DataType::Float64, false),
    ]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(TimestampNanosecondArray::from(ts).with_timezone_opt(tz)),
            Arc::new(Float64Array::from(vec![1.0; hours as usize])),
        ],
    )
    .unwrap()
}

const PROJECT: &str = r#"
[logging]
level = "info"
file = "logs/mnm.log"

[filter]
time_column = "ts"
patterns = [">1h*<8h"]

[resample]
time_column = "ts"
every = "1d"
reducers = ["sum", "count"]
partiality = "drop"
"#;

#[test]
fn toml_to_resampled_ipc_with_file_logging() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("mnm.toml");
    std::fs::write(&config_path, PROJECT).unwrap();

    let config = ProjectConfig::load(&config_path).unwrap();
    let guard = init_tracing(&config.logging, dir.path()).unwrap();
    assert!(guard.is_some());

    // Two full days and half of a third.
    let input = dir.path().join("in.arrow");
    let output = dir.path().join("out/resampled.arrow");
    write_ipc_file(&input, &hourly(2021, 1, 1, 60, None)).unwrap();

    let pipeline = Pipeline::load(&config_path).unwrap();
    let out = pipeline.run_file(&input, &output).unwrap();

    // Hours 2..=7 are filtered from every day; the half day is dropped as
    // partial even though filtering shrank the full days too.
    assert_eq!(out.num_rows(), 2);
    let sums = out
        .column_by_name("v_sum")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(sums.values().to_vec(), vec![18.0, 18.0]);
    let counts = out
        .column_by_name("v_count")
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(counts.values().to_vec(), vec![18, 18]);

    let reread = read_ipc_file(&output).unwrap();
    assert_eq!(reread.len(), 1);
    assert_eq!(reread[0].num_rows(), 2);
    assert_eq!(reread[0].schema(), out.schema());

    drop(guard);
    let log = std::fs::read_to_string(dir.path().join("logs/mnm.log")).unwrap();
    assert!(log.contains("[pipe] pipeline run finished"), "{log}");
    assert!(log.contains("[conf] pipeline built"), "{log}");
}

#[test]
fn short_dst_day_passes_fail_policy() {
    let config: ProjectConfig = r#"
[resample]
time_column = "ts"
every = "1d"
partiality = "fail"
include_boundaries = true
"#
    .parse()
    .unwrap();
    let pipeline = Pipeline::from_config(&config).unwrap();

    // Europe/London springs forward on 2023-03-26.
    let out = pipeline
        .run(&hourly(2023, 3, 26, 23, Some("Europe/London")))
        .unwrap();
    assert_eq!(out.num_rows(), 1);

    let err = pipeline
        .run(&hourly(2023, 3, 26, 30, Some("Europe/London")))
        .unwrap_err();
    assert_eq!(err.reason(), &RuntimeReason::Core(CoreReason::PartialData));
}

#[test]
fn batches_are_joined_before_resampling() {
    let config: ProjectConfig = r#"
[resample]
time_column = "ts"
every = "12h"
reducers = ["mean"]
"#
    .parse()
    .unwrap();
    let pipeline = Pipeline::from_config(&config).unwrap();
    let a = hourly(2021, 1, 1, 6, None);
    let b = hourly(2021, 1, 1, 24, None).slice(6, 18);
    let out = pipeline.run_batches(&[a, b]).unwrap();
    assert_eq!(out.num_rows(), 2);
    let means = out
        .column_by_name("v")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(means.values().to_vec(), vec![1.0, 1.0]);
}
