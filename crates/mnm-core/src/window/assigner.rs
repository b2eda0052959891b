use std::collections::HashMap;

use arrow::array::ArrayRef;
use arrow::record_batch::RecordBatch;
use arrow::row::{OwnedRow, RowConverter, SortField};
use mnm_config::{ClosedBoundary, LabelStrategy};
use mnm_lang::{CalendarSpan, Duration};

use super::calendar::{Bounds, Period, shift_back};
use crate::error::{CoreResult, arrow_error, config_error, data_error, lang_error};
use crate::frame::TimeColumn;

// ---------------------------------------------------------------------------
// WindowSpec
// ---------------------------------------------------------------------------

/// How rows are bucketed into windows.
#[derive(Debug, Clone)]
pub struct WindowSpec {
    pub time_column: String,
    pub every: Duration,
    pub period: Period,
    pub closed: ClosedBoundary,
    pub label: LabelStrategy,
    pub start_offset: Option<Duration>,
    offset_span: Option<CalendarSpan>,
    pub group_by: Vec<String>,
}

impl WindowSpec {
    pub fn new(time_column: impl Into<String>, every: &str) -> CoreResult<Self> {
        let every: Duration = every.parse().map_err(lang_error)?;
        let period = Period::from_duration(&every)?;
        Ok(Self {
            time_column: time_column.into(),
            every,
            period,
            closed: ClosedBoundary::default(),
            label: LabelStrategy::default(),
            start_offset: None,
            offset_span: None,
            group_by: Vec::new(),
        })
    }

    pub fn with_closed(mut self, closed: ClosedBoundary) -> Self {
        self.closed = closed;
        self
    }

    pub fn with_label(mut self, label: LabelStrategy) -> Self {
        self.label = label;
        self
    }

    pub fn with_group_by(mut self, group_by: Vec<String>) -> Self {
        self.group_by = group_by;
        self
    }

    /// Shift data backwards by `offset` before bucketing. Negative offsets
    /// are rejected.
    pub fn with_start_offset(mut self, offset: &str) -> CoreResult<Self> {
        if offset.trim_start().starts_with('-') {
            return Err(config_error(format!(
                "start_offset {offset:?} must not be negative"
            )));
        }
        let duration: Duration = offset.parse().map_err(lang_error)?;
        let span = duration.span().map_err(lang_error)?;
        self.offset_span = (!span.is_zero()).then_some(span);
        self.start_offset = Some(duration);
        Ok(self)
    }

    pub fn window_of(&self, shifted: i64, time: &TimeColumn) -> CoreResult<Bounds> {
        self.period.window_of(shifted, self.closed, &time.tz)
    }

    /// Timestamps on the shifted timeline windows are computed on.
    pub fn shifted(&self, time: &TimeColumn) -> CoreResult<Vec<i64>> {
        match &self.offset_span {
            None => Ok(time.values.clone()),
            Some(span) => time
                .values
                .iter()
                .map(|&t| shift_back(t, span, &time.tz))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// Group identity: encoded group-by values, or `None` when ungrouped.
pub type GroupKey = Option<OwnedRow>;

/// One populated window of one group.
#[derive(Debug, Clone)]
pub struct Window {
    /// Index into [`Assignment::groups`].
    pub group: usize,
    pub bounds: Bounds,
    pub label: i64,
    /// Row indices into the assigned batch, in time order.
    pub rows: Vec<u32>,
    /// Number of distinct timestamps among `rows`.
    pub distinct: usize,
}

#[derive(Debug)]
pub struct Assignment {
    /// Windows ordered by group (first appearance) then by lower boundary.
    pub windows: Vec<Window>,
    pub groups: Vec<GroupKey>,
}

impl Assignment {
    pub fn key_of(&self, window: &Window) -> (GroupKey, i64) {
        (self.groups[window.group].clone(), window.bounds.lower)
    }
}

/// Bucket every row of a time-sorted `batch` into exactly one window.
pub fn assign(spec: &WindowSpec, batch: &RecordBatch, time: &TimeColumn) -> CoreResult<Assignment> {
    let (row_groups, groups) = group_rows(batch, &spec.group_by)?;
    let shifted = spec.shifted(time)?;

    let mut index: HashMap<(usize, i64), usize> = HashMap::new();
    let mut windows: Vec<Window> = Vec::new();
    let mut last_seen: Vec<i64> = Vec::new();
    let mut cached: Option<Bounds> = None;

    for (row, &t) in shifted.iter().enumerate() {
        let bounds = match cached {
            Some(b) if b.contains(t, spec.closed) => b,
            _ => {
                let b = spec.window_of(t, time)?;
                cached = Some(b);
                b
            }
        };
        let group = row_groups[row];
        let original = time.values[row];
        let slot = *index.entry((group, bounds.lower)).or_insert_with(|| {
            windows.push(Window {
                group,
                bounds,
                label: match spec.label {
                    LabelStrategy::Left => bounds.lower,
                    LabelStrategy::Right => bounds.upper,
                    LabelStrategy::Datapoint => t,
                },
                rows: Vec::new(),
                distinct: 0,
            });
            last_seen.push(i64::MIN);
            windows.len() - 1
        });
        let w = &mut windows[slot];
        w.rows.push(row as u32);
        if w.rows.len() == 1 || last_seen[slot] != original {
            w.distinct += 1;
            last_seen[slot] = original;
        }
    }

    windows.sort_by_key(|w| (w.group, w.bounds.lower));
    log::debug!(
        "assigned {} rows to {} windows across {} groups (every={})",
        batch.num_rows(),
        windows.len(),
        groups.len(),
        spec.every
    );
    Ok(Assignment { windows, groups })
}

/// Map each row to a group index numbered by first appearance.
fn group_rows(batch: &RecordBatch, group_by: &[String]) -> CoreResult<(Vec<usize>, Vec<GroupKey>)> {
    if group_by.is_empty() {
        let groups = if batch.num_rows() == 0 { vec![] } else { vec![None] };
        return Ok((vec![0; batch.num_rows()], groups));
    }

    let columns: Vec<ArrayRef> = group_by
        .iter()
        .map(|name| {
            batch
                .column_by_name(name)
                .cloned()
                .ok_or_else(|| data_error(format!("group_by column {name:?} not found")))
        })
        .collect::<CoreResult<_>>()?;
    let fields = columns
        .iter()
        .map(|c| SortField::new(c.data_type().clone()))
        .collect();
    let converter = RowConverter::new(fields).map_err(|e| arrow_error("encoding group keys", e))?;
    let rows = converter
        .convert_columns(&columns)
        .map_err(|e| arrow_error("encoding group keys", e))?;

    let mut seen: HashMap<OwnedRow, usize> = HashMap::new();
    let mut groups = Vec::new();
    let mut row_groups = Vec::with_capacity(batch.num_rows());
    for row in rows.iter() {
        let owned = row.owned();
        let next = groups.len();
        let id = *seen.entry(owned.clone()).or_insert_with(|| {
            groups.push(Some(owned));
            next
        });
        row_groups.push(id);
    }
    Ok((row_groups, groups))
}
