use std::sync::Arc;

use arrow::array::{ArrayRef, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use mnm_config::{
    ClosedBoundary, FrequencyStrategy, LabelStrategy, PartialityPolicy, Reducer, ReducerSpec,
    ResampleConfig,
};

use crate::aggregate::{output_name, reduce, resolve_reducers, resolve_targets};
use crate::error::{CoreResult, arrow_error, config_error, data_error};
use crate::filter::RowFilter;
use crate::frame::{TimeColumn, concat, sort_by_time};
use crate::partial::{PartialSnapshot, resolve};
use crate::window::{WindowSpec, assign};

pub const LOWER_BOUNDARY: &str = "_lower_boundary";
pub const UPPER_BOUNDARY: &str = "_upper_boundary";

/// Windowed resampler: buckets rows by time (and optional group columns),
/// reduces each bucket and resolves incomplete buckets.
///
/// All configuration is validated on construction; `transform` only fails on
/// data problems.
#[derive(Debug, Clone)]
pub struct ResampleData {
    spec: WindowSpec,
    reducers: Vec<Reducer>,
    reducer_names: Vec<String>,
    target_columns: Option<Vec<String>>,
    partiality: PartialityPolicy,
    frequency_detection: FrequencyStrategy,
    include_boundaries: bool,
}

impl ResampleData {
    /// A resampler summing every numeric column into windows of `every`.
    pub fn new(time_column: impl Into<String>, every: &str) -> CoreResult<Self> {
        Ok(Self {
            spec: WindowSpec::new(time_column, every)?,
            reducers: vec![Reducer::Sum],
            reducer_names: vec![Reducer::Sum.to_string()],
            target_columns: None,
            partiality: PartialityPolicy::default(),
            frequency_detection: FrequencyStrategy::default(),
            include_boundaries: false,
        })
    }

    pub fn from_config(config: &ResampleConfig) -> CoreResult<Self> {
        let mut resampler = Self::new(config.time_column.clone(), &config.every)?
            .with_closed(config.closed)
            .with_label(config.label)
            .with_group_by(config.group_by.clone())
            .with_reducers(&config.reducers.specs())?
            .with_partiality(config.partiality)
            .with_frequency_detection(config.frequency_detection)
            .with_boundaries(config.include_boundaries);
        if let Some(offset) = &config.start_offset {
            resampler = resampler.with_start_offset(offset)?;
        }
        if let Some(cols) = &config.target_columns {
            resampler = resampler.with_target_columns(cols.clone())?;
        }
        Ok(resampler)
    }

    pub fn with_closed(mut self, closed: ClosedBoundary) -> Self {
        self.spec = self.spec.with_closed(closed);
        self
    }

    pub fn with_label(mut self, label: LabelStrategy) -> Self {
        self.spec = self.spec.with_label(label);
        self
    }

    pub fn with_start_offset(mut self, offset: &str) -> CoreResult<Self> {
        self.spec = self.spec.with_start_offset(offset)?;
        Ok(self)
    }

    pub fn with_group_by(mut self, group_by: Vec<String>) -> Self {
        self.spec = self.spec.with_group_by(group_by);
        self
    }

    pub fn with_reducers(mut self, specs: &[ReducerSpec]) -> CoreResult<Self> {
        let (names, reducers): (Vec<String>, Vec<Reducer>) =
            resolve_reducers(specs)?.into_iter().unzip();
        self.reducer_names = names;
        self.reducers = reducers;
        Ok(self)
    }

    /// Restrict aggregation to `columns`. The time and group-by columns
    /// cannot be targets.
    pub fn with_target_columns(mut self, columns: Vec<String>) -> CoreResult<Self> {
        if let Some(bad) = columns
            .iter()
            .find(|c| **c == self.spec.time_column || self.spec.group_by.contains(c))
        {
            return Err(config_error(format!(
                "target column {bad:?} is the time column or a group_by column"
            )));
        }
        self.target_columns = Some(columns);
        Ok(self)
    }

    pub fn with_partiality(mut self, policy: PartialityPolicy) -> Self {
        self.partiality = policy;
        self
    }

    pub fn with_frequency_detection(mut self, strategy: FrequencyStrategy) -> Self {
        self.frequency_detection = strategy;
        self
    }

    pub fn with_boundaries(mut self, include: bool) -> Self {
        self.include_boundaries = include;
        self
    }

    pub fn spec(&self) -> &WindowSpec {
        &self.spec
    }

    pub fn reducers(&self) -> &[Reducer] {
        &self.reducers
    }

    pub fn partiality(&self) -> PartialityPolicy {
        self.partiality
    }

    /// Check `batch` against this configuration. Nothing is learned.
    pub fn fit(&self, batch: &RecordBatch) -> CoreResult<()> {
        TimeColumn::from_batch(batch, &self.spec.time_column)?;
        for col in &self.spec.group_by {
            if batch.column_by_name(col).is_none() {
                return Err(data_error(format!("group_by column {col:?} not found")));
            }
        }
        self.targets(batch).map(|_| ())
    }

    pub fn transform(&self, batch: &RecordBatch) -> CoreResult<RecordBatch> {
        self.run(batch, None)
    }

    /// Resample after removing rows with `filter`. Window completeness is
    /// measured on the unfiltered rows.
    pub fn transform_filtered(
        &self,
        batch: &RecordBatch,
        filter: &dyn RowFilter,
    ) -> CoreResult<RecordBatch> {
        self.run(batch, Some(filter))
    }

    /// Concatenate `batches` and resample them as one.
    pub fn transform_batches(&self, batches: &[RecordBatch]) -> CoreResult<RecordBatch> {
        self.transform(&concat(batches)?)
    }

    fn targets(&self, batch: &RecordBatch) -> CoreResult<Vec<String>> {
        let mut excluded: Vec<&str> = vec![self.spec.time_column.as_str()];
        excluded.extend(self.spec.group_by.iter().map(String::as_str));
        resolve_targets(
            batch.schema().as_ref(),
            self.target_columns.as_deref(),
            &excluded,
            &self.reducers,
        )
    }

    fn run(&self, batch: &RecordBatch, filter: Option<&dyn RowFilter>) -> CoreResult<RecordBatch> {
        let (sorted, time) = self.sorted(batch)?;

        let snapshot = match self.partiality {
            PartialityPolicy::Keep => None,
            _ => {
                let full = assign(&self.spec, &sorted, &time)?;
                Some(PartialSnapshot::capture(
                    &full,
                    &time,
                    self.frequency_detection,
                )?)
            }
        };

        let (rows, time) = match filter {
            Some(f) => self.sorted(&f.filter_rows(&sorted)?)?,
            None => (sorted, time),
        };

        let assignment = assign(&self.spec, &rows, &time)?;
        let windows = &assignment.windows;
        let targets = self.targets(&rows)?;

        let mut fields: Vec<Field> = Vec::new();
        let mut columns: Vec<ArrayRef> = Vec::new();

        let first_rows = UInt32Array::from(
            windows
                .iter()
                .map(|w| w.rows.first().copied().unwrap_or(0))
                .collect::<Vec<_>>(),
        );
        let schema = rows.schema();
        for name in &self.spec.group_by {
            let (idx, field) = schema
                .column_with_name(name)
                .ok_or_else(|| data_error(format!("group_by column {name:?} not found")))?;
            let values = take(rows.column(idx).as_ref(), &first_rows, None)
                .map_err(|e| arrow_error("collecting group keys", e))?;
            fields.push(field.clone());
            columns.push(values);
        }

        if self.include_boundaries {
            let lower = time.to_array(windows.iter().map(|w| w.bounds.lower).collect());
            let upper = time.to_array(windows.iter().map(|w| w.bounds.upper).collect());
            fields.push(Field::new(LOWER_BOUNDARY, lower.data_type().clone(), false));
            fields.push(Field::new(UPPER_BOUNDARY, upper.data_type().clone(), false));
            columns.push(lower);
            columns.push(upper);
        }

        let labels = time.to_array(windows.iter().map(|w| w.label).collect());
        fields.push(Field::new(
            self.spec.time_column.as_str(),
            labels.data_type().clone(),
            false,
        ));
        columns.push(labels);

        let multiple = self.reducers.len() > 1;
        let mut aggregated = Vec::with_capacity(targets.len() * self.reducers.len());
        for target in &targets {
            let source = rows
                .column_by_name(target)
                .ok_or_else(|| data_error(format!("target column {target:?} not found")))?;
            for (name, &reducer) in self.reducer_names.iter().zip(&self.reducers) {
                let values = reduce(source, windows, reducer)?;
                aggregated.push(columns.len());
                fields.push(Field::new(
                    output_name(target, name, multiple),
                    values.data_type().clone(),
                    true,
                ));
                columns.push(values);
            }
        }

        let out = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
            .map_err(|e| arrow_error("assembling resampled batch", e))?;
        log::debug!(
            "resampled {} rows into {} windows ({} aggregated columns)",
            rows.num_rows(),
            out.num_rows(),
            aggregated.len()
        );

        let Some(snapshot) = snapshot else {
            return Ok(out);
        };
        let flags: Vec<bool> = windows
            .iter()
            .map(|w| snapshot.is_partial(&assignment.key_of(w)))
            .collect();
        let bounds: Vec<_> = windows.iter().map(|w| w.bounds).collect();
        resolve(self.partiality, out, &flags, &bounds, &aggregated, &time)
    }

    fn sorted(&self, batch: &RecordBatch) -> CoreResult<(RecordBatch, TimeColumn)> {
        let time = TimeColumn::from_batch(batch, &self.spec.time_column)?;
        if time.is_sorted() {
            return Ok((batch.clone(), time));
        }
        let sorted = sort_by_time(batch, &time)?;
        let time = TimeColumn::from_batch(&sorted, &self.spec.time_column)?;
        Ok((sorted, time))
    }
}

#[cfg(test)]
mod tests;
