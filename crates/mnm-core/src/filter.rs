use arrow::array::BooleanArray;
use arrow::compute::filter_record_batch;
use arrow::record_batch::RecordBatch;
use mnm_config::FilterConfig;
use mnm_lang::{Predicate, compile_time_patterns};

use crate::error::{CoreResult, arrow_error, lang_error};
use crate::frame::TimeColumn;

// ---------------------------------------------------------------------------
// RowFilter — the seam between filtering and resampling
// ---------------------------------------------------------------------------

/// Removes rows from a batch. Used by the resampler after it has measured
/// window completeness and before it aggregates.
pub trait RowFilter {
    fn filter_rows(&self, batch: &RecordBatch) -> CoreResult<RecordBatch>;
}

impl<F> RowFilter for F
where
    F: Fn(&RecordBatch) -> CoreResult<RecordBatch>,
{
    fn filter_rows(&self, batch: &RecordBatch) -> CoreResult<RecordBatch> {
        self(batch)
    }
}

// ---------------------------------------------------------------------------
// FilterDataBasedOnTime
// ---------------------------------------------------------------------------

/// Drops rows whose timestamp matches any exclusion pattern.
///
/// Patterns are compiled once at construction; calendar components are read
/// from the wall clock of the time column's timezone.
#[derive(Debug, Clone)]
pub struct FilterDataBasedOnTime {
    time_column: String,
    patterns: Vec<String>,
    keep: Predicate,
}

impl FilterDataBasedOnTime {
    pub fn new<S: AsRef<str>>(time_column: impl Into<String>, patterns: &[S]) -> CoreResult<Self> {
        let keep = compile_time_patterns(patterns).map_err(lang_error)?;
        Ok(Self {
            time_column: time_column.into(),
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            keep,
        })
    }

    pub fn from_config(config: &FilterConfig) -> CoreResult<Self> {
        Self::new(config.time_column.clone(), &config.patterns)
    }

    pub fn time_column(&self) -> &str {
        &self.time_column
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// The compiled keep-mask.
    pub fn predicate(&self) -> &Predicate {
        &self.keep
    }

    /// Check that `batch` carries a usable time column. Nothing is learned.
    pub fn fit(&self, batch: &RecordBatch) -> CoreResult<()> {
        TimeColumn::from_batch(batch, &self.time_column).map(|_| ())
    }

    /// `true` for every row to keep.
    pub fn mask(&self, batch: &RecordBatch) -> CoreResult<BooleanArray> {
        let time = TimeColumn::from_batch(batch, &self.time_column)?;
        Ok(time
            .values
            .iter()
            .map(|&t| Some(self.keep.eval(&time.local(t))))
            .collect())
    }

    pub fn transform(&self, batch: &RecordBatch) -> CoreResult<RecordBatch> {
        let mask = self.mask(batch)?;
        let out = filter_record_batch(batch, &mask)
            .map_err(|e| arrow_error("applying time filter", e))?;
        log::debug!(
            "time filter kept {} of {} rows ({} pattern(s))",
            out.num_rows(),
            batch.num_rows(),
            self.patterns.len()
        );
        Ok(out)
    }
}

impl RowFilter for FilterDataBasedOnTime {
    fn filter_rows(&self, batch: &RecordBatch) -> CoreResult<RecordBatch> {
        self.transform(batch)
    }
}
