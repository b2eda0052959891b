use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use arrow::array::{Array, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::{CoreError, CoreResult, arrow_error, config_error, data_error};
use crate::frame::TimeColumn;

// ---------------------------------------------------------------------------
// Pairing
// ---------------------------------------------------------------------------

/// Which cells of the `n x n` index matrix [`pair_data`] visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairSelection {
    #[default]
    Full,
    /// `i <= j`
    Upper,
    /// `i >= j`
    Lower,
}

impl FromStr for PairSelection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "upper" => Ok(Self::Upper),
            "lower" => Ok(Self::Lower),
            other => Err(config_error(format!(
                "unknown pair selection {other:?}, expected full/upper/lower"
            ))),
        }
    }
}

impl fmt::Display for PairSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Full => "full",
            Self::Upper => "upper",
            Self::Lower => "lower",
        })
    }
}

/// Enumerate `((i, j), items[i], items[j])` in row-major order.
pub fn pair_data<T>(
    items: &[T],
    selection: PairSelection,
    ignore_diagonal: bool,
) -> Vec<((usize, usize), &T, &T)> {
    let mut out = Vec::new();
    for (i, a) in items.iter().enumerate() {
        for (j, b) in items.iter().enumerate() {
            let wanted = match selection {
                PairSelection::Full => true,
                PairSelection::Upper => i <= j,
                PairSelection::Lower => i >= j,
            };
            if wanted && !(ignore_diagonal && i == j) {
                out.push(((i, j), a, b));
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Pearson correlation
// ---------------------------------------------------------------------------

/// Pairwise correlations between frames plus the display name of each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlations {
    /// `None` where fewer than two rows joined or a side had zero variance.
    pub matrix: BTreeMap<(usize, usize), Option<f64>>,
    pub mapping: BTreeMap<usize, String>,
}

impl Correlations {
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.matrix.get(&(i, j)).copied().flatten()
    }
}

/// Correlate `value_column` between every pair of `frames`, inner-joining
/// each pair on the instants of `time_column`.
///
/// Frames are named `df_1, df_2, ...` unless `mapping` supplies one name per
/// frame.
pub fn calculate_correlations(
    frames: &[RecordBatch],
    time_column: &str,
    value_column: &str,
    mapping: Option<Vec<String>>,
) -> CoreResult<Correlations> {
    let names: Vec<String> = match mapping {
        Some(names) if names.len() != frames.len() => {
            return Err(config_error(format!(
                "mapping has {} name(s) for {} frame(s)",
                names.len(),
                frames.len()
            )));
        }
        Some(names) => names,
        None => (1..=frames.len()).map(|i| format!("df_{i}")).collect(),
    };

    let series = frames
        .iter()
        .map(|f| Series::from_batch(f, time_column, value_column))
        .collect::<CoreResult<Vec<_>>>()?;

    let matrix = pair_data(&series, PairSelection::Full, false)
        .into_iter()
        .map(|(ij, a, b)| (ij, pearson(&a.join(b))))
        .collect();

    Ok(Correlations {
        matrix,
        mapping: names.into_iter().enumerate().collect(),
    })
}

/// Non-null `(instant, value)` rows of one frame.
struct Series {
    rows: Vec<(i64, f64)>,
}

impl Series {
    fn from_batch(batch: &RecordBatch, time_column: &str, value_column: &str) -> CoreResult<Self> {
        let time = TimeColumn::from_batch(batch, time_column)?;
        let col = batch
            .column_by_name(value_column)
            .ok_or_else(|| data_error(format!("value column {value_column:?} not found")))?;
        if !col.data_type().is_numeric() {
            return Err(data_error(format!(
                "value column {value_column:?} has type {}, expected numeric",
                col.data_type()
            )));
        }
        let floats = cast(col.as_ref(), &DataType::Float64)
            .map_err(|e| arrow_error("casting value column", e))?;
        let floats = floats
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| data_error("value column did not cast to f64"))?;
        let rows = time
            .values
            .iter()
            .zip(floats.iter())
            .filter_map(|(&t, v)| v.map(|v| (t, v)))
            .collect();
        Ok(Self { rows })
    }

    /// Inner join on the instant; repeated instants multiply out.
    fn join(&self, other: &Series) -> Vec<(f64, f64)> {
        let mut index: HashMap<i64, Vec<f64>> = HashMap::new();
        for &(t, v) in &other.rows {
            index.entry(t).or_default().push(v);
        }
        let mut out = Vec::new();
        for &(t, a) in &self.rows {
            if let Some(matches) = index.get(&t) {
                out.extend(matches.iter().map(|&b| (a, b)));
            }
        }
        out
    }
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for &(a, b) in pairs {
        let (da, db) = (a - mean_a, b - mean_b);
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}
