use std::collections::HashMap;

use arrow::array::{ArrayRef, BooleanArray};
use arrow::compute::{filter_record_batch, nullif};
use arrow::record_batch::RecordBatch;
use mnm_config::{FrequencyStrategy, PartialityPolicy};
use orion_error::prelude::*;

use crate::error::{CoreReason, CoreResult, arrow_error};
use crate::frame::TimeColumn;
use crate::frequency::detect_frequency;
use crate::window::{Assignment, Bounds, GroupKey, Window};

/// Completeness of every window, measured before any row filter runs.
#[derive(Debug)]
pub struct PartialSnapshot {
    /// Detected sampling interval in nanoseconds.
    pub frequency: i64,
    partial: HashMap<(GroupKey, i64), bool>,
}

impl PartialSnapshot {
    /// Detect the sampling frequency over `time` and flag each window of
    /// `assignment` whose distinct timestamp count falls short of a full period.
    pub fn capture(
        assignment: &Assignment,
        time: &TimeColumn,
        strategy: FrequencyStrategy,
    ) -> CoreResult<Self> {
        let frequency = detect_frequency(&time.values, strategy)?;
        let partial = assignment
            .windows
            .iter()
            .map(|w| (assignment.key_of(w), is_partial(w, frequency)))
            .collect();
        Ok(Self { frequency, partial })
    }

    /// Whether the window with this key was partial. Unknown keys are
    /// treated as complete.
    pub fn is_partial(&self, key: &(GroupKey, i64)) -> bool {
        self.partial.get(key).copied().unwrap_or(false)
    }
}

/// `distinct < elapsed / frequency`.
pub fn is_partial(window: &Window, frequency: i64) -> bool {
    let expected = window.bounds.elapsed_nanos() as f64 / frequency as f64;
    (window.distinct as f64) < expected
}

/// Apply `policy` to an aggregated batch.
///
/// `flags[i]` marks output row `i` partial and `aggregated` names the columns
/// that the `null` policy clears.
pub fn resolve(
    policy: PartialityPolicy,
    batch: RecordBatch,
    flags: &[bool],
    bounds: &[Bounds],
    aggregated: &[usize],
    time: &TimeColumn,
) -> CoreResult<RecordBatch> {
    let flagged = flags.iter().filter(|f| **f).count();
    if flagged == 0 {
        return Ok(batch);
    }
    match policy {
        PartialityPolicy::Keep => Ok(batch),
        PartialityPolicy::Drop => {
            log::warn!("dropping {flagged} partial window(s)");
            let keep = BooleanArray::from(flags.iter().map(|f| !f).collect::<Vec<_>>());
            filter_record_batch(&batch, &keep).map_err(|e| arrow_error("dropping partial windows", e))
        }
        PartialityPolicy::Null => {
            log::debug!("nulling {flagged} partial window(s)");
            let mask = BooleanArray::from(flags.to_vec());
            let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
            for &i in aggregated {
                columns[i] = nullif(columns[i].as_ref(), &mask)
                    .map_err(|e| arrow_error("nulling partial windows", e))?;
            }
            RecordBatch::try_new(batch.schema(), columns)
                .map_err(|e| arrow_error("nulling partial windows", e))
        }
        PartialityPolicy::Fail => {
            let first = flags.iter().position(|f| *f).unwrap_or(0);
            let b = bounds[first];
            StructError::from(CoreReason::PartialData)
                .with_detail(format!(
                    "window [{}, {}] is partial ({flagged} partial window(s) in total)",
                    time.local(b.lower).fixed_offset().to_rfc3339(),
                    time.local(b.upper).fixed_offset().to_rfc3339(),
                ))
                .err()
        }
    }
}
