use serde::{Deserialize, Serialize};

use crate::types::{
    ClosedBoundary, FrequencyStrategy, LabelStrategy, PartialityPolicy, ReducerList,
};

/// The `[resample]` section: how rows are bucketed, reduced and checked for
/// completeness.
///
/// Durations (`every`, `start_offset`) stay strings here and are parsed by
/// the engine, which owns the duration grammar and its error reporting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResampleConfig {
    pub time_column: String,
    pub every: String,
    #[serde(default)]
    pub closed: ClosedBoundary,
    #[serde(default)]
    pub label: LabelStrategy,
    #[serde(default)]
    pub start_offset: Option<String>,
    /// Columns to aggregate; `None` means every column the reducers support.
    #[serde(default)]
    pub target_columns: Option<Vec<String>>,
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub reducers: ReducerList,
    #[serde(default)]
    pub partiality: PartialityPolicy,
    #[serde(default)]
    pub frequency_detection: FrequencyStrategy,
    #[serde(default)]
    pub include_boundaries: bool,
}

impl ResampleConfig {
    /// A config with every optional field at its default.
    pub fn new(time_column: impl Into<String>, every: impl Into<String>) -> Self {
        Self {
            time_column: time_column.into(),
            every: every.into(),
            closed: ClosedBoundary::default(),
            label: LabelStrategy::default(),
            start_offset: None,
            target_columns: None,
            group_by: Vec::new(),
            reducers: ReducerList::default(),
            partiality: PartialityPolicy::default(),
            frequency_detection: FrequencyStrategy::default(),
            include_boundaries: false,
        }
    }
}
