//! Arrow helpers shared by the estimators: locating and normalising the time
//! column, ordering rows by time, and stitching batches together.

use std::sync::Arc;

use arrow::array::timezone::Tz;
use arrow::array::{Array, ArrayRef, TimestampNanosecondArray, UInt32Array};
use arrow::compute::{cast, concat_batches, take_record_batch};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDateTime, TimeDelta, TimeZone};

use crate::error::{CoreResult, arrow_error, data_error};

/// The time column of a batch, normalised to UTC nanoseconds.
#[derive(Debug, Clone)]
pub struct TimeColumn {
    /// Absolute instants, nanoseconds since the Unix epoch.
    pub values: Vec<i64>,
    /// Timezone used for wall-clock arithmetic (`+00:00` for naive columns).
    pub tz: Tz,
    /// Timezone annotation carried by the source column, if any.
    pub tz_name: Option<Arc<str>>,
}

impl TimeColumn {
    /// Read `name` from `batch`.
    ///
    /// Accepts `Timestamp` of any unit and `Date32`/`Date64`. Null entries
    /// are rejected since they cannot be placed in a window.
    pub fn from_batch(batch: &RecordBatch, name: &str) -> CoreResult<Self> {
        let col = batch
            .column_by_name(name)
            .ok_or_else(|| data_error(format!("time column {name:?} not found")))?;

        let tz_name = match col.data_type() {
            DataType::Timestamp(_, tz) => tz.clone(),
            DataType::Date32 | DataType::Date64 => None,
            other => {
                return Err(data_error(format!(
                    "time column {name:?} has type {other}, expected a timestamp or date"
                )));
            }
        };
        if col.null_count() > 0 {
            return Err(data_error(format!(
                "time column {name:?} contains {} null value(s)",
                col.null_count()
            )));
        }

        let target = DataType::Timestamp(TimeUnit::Nanosecond, tz_name.clone());
        let normalised = cast(col.as_ref(), &target)
            .map_err(|e| arrow_error(&format!("casting time column {name:?}"), e))?;
        let ts = normalised
            .as_any()
            .downcast_ref::<TimestampNanosecondArray>()
            .ok_or_else(|| data_error(format!("time column {name:?} did not cast to ns")))?;

        Ok(Self {
            values: ts.values().to_vec(),
            tz: parse_tz(tz_name.as_deref())?,
            tz_name,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.values.windows(2).all(|w| w[0] <= w[1])
    }

    /// Build an output timestamp array carrying the same timezone.
    pub fn to_array(&self, values: Vec<i64>) -> ArrayRef {
        Arc::new(TimestampNanosecondArray::from(values).with_timezone_opt(self.tz_name.clone()))
    }

    /// The wall-clock reading of instant `t` in this column's timezone.
    pub fn local(&self, t: i64) -> DateTime<Tz> {
        DateTime::from_timestamp_nanos(t).with_timezone(&self.tz)
    }
}

pub fn parse_tz(name: Option<&str>) -> CoreResult<Tz> {
    name.unwrap_or("+00:00")
        .parse::<Tz>()
        .map_err(|e| arrow_error("parsing timezone", e))
}

// ---------------------------------------------------------------------------
// Wall clock <-> instant
// ---------------------------------------------------------------------------

/// Local wall-clock nanoseconds since `1970-01-01 00:00` (local).
pub(crate) fn local_nanos(tz: &Tz, t: i64) -> CoreResult<i64> {
    let naive = DateTime::from_timestamp_nanos(t).with_timezone(tz).naive_local();
    naive_nanos(naive)
}

pub(crate) fn naive_nanos(naive: NaiveDateTime) -> CoreResult<i64> {
    naive
        .and_utc()
        .timestamp_nanos_opt()
        .ok_or_else(|| data_error(format!("{naive} is outside the nanosecond range")))
}

pub(crate) fn naive_from_nanos(n: i64) -> NaiveDateTime {
    DateTime::from_timestamp_nanos(n).naive_utc()
}

/// Resolve a local wall-clock reading to an instant.
///
/// Ambiguous readings (clocks turned back) take the earliest instant. Readings
/// inside a gap (clocks turned forward) are interpreted with the offset in
/// force before the gap, which lands them just after it.
pub(crate) fn to_instant(tz: &Tz, naive: NaiveDateTime) -> CoreResult<i64> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return dt
            .timestamp_nanos_opt()
            .ok_or_else(|| data_error(format!("{naive} is outside the nanosecond range")));
    }
    let day_before = naive
        .checked_sub_signed(TimeDelta::days(1))
        .ok_or_else(|| data_error(format!("{naive} is outside the supported range")))?;
    let offset = chrono::Offset::fix(&tz.offset_from_utc_datetime(&day_before));
    let utc = naive
        .checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))
        .ok_or_else(|| data_error(format!("{naive} is outside the supported range")))?;
    naive_nanos(utc)
}

// ---------------------------------------------------------------------------
// Batch plumbing
// ---------------------------------------------------------------------------

/// Concatenate batches sharing one schema. At least one batch is required.
pub fn concat(batches: &[RecordBatch]) -> CoreResult<RecordBatch> {
    match batches {
        [] => Err(data_error("no record batches supplied")),
        [single] => Ok(single.clone()),
        [first, ..] => concat_batches(&first.schema(), batches)
            .map_err(|e| arrow_error("concatenating batches", e)),
    }
}

/// Stable sort of `batch` by its time column; already sorted input is
/// returned untouched.
pub fn sort_by_time(batch: &RecordBatch, time: &TimeColumn) -> CoreResult<RecordBatch> {
    if time.is_sorted() {
        return Ok(batch.clone());
    }
    let mut order: Vec<u32> = (0..time.len() as u32).collect();
    order.sort_by_key(|&i| time.values[i as usize]);
    take_record_batch(batch, &UInt32Array::from(order))
        .map_err(|e| arrow_error("sorting by time", e))
}
