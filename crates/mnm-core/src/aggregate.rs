use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, ListArray, UInt32Array};
use arrow::buffer::{OffsetBuffer, ScalarBuffer};
use arrow::compute::{cast, take};
use arrow::datatypes::{DataType, Field, Schema};
use mnm_config::{Reducer, ReducerSpec};
use orion_error::prelude::*;

use crate::error::{CoreReason, CoreResult, arrow_error, config_error, data_error};
use crate::window::Window;

// ---------------------------------------------------------------------------
// Reducer selection
// ---------------------------------------------------------------------------

/// Validate user reducer entries and resolve them to built-ins, paired with
/// the name each was requested under.
///
/// Every entry needs a unique name. Entries carrying a `func` ask for a
/// custom callable, which is not supported.
pub fn resolve_reducers(specs: &[ReducerSpec]) -> CoreResult<Vec<(String, Reducer)>> {
    if specs.is_empty() {
        return Err(config_error("at least one reducer is required"));
    }
    let total = specs.len();
    let mut out: Vec<(String, Reducer)> = Vec::with_capacity(total);
    let mut names: Vec<&str> = Vec::with_capacity(total);
    for (i, spec) in specs.iter().enumerate() {
        let pos = i + 1;
        let Some(name) = spec.name() else {
            return Err(config_error(format!(
                "reducer {pos}/{total} does not have a name"
            )));
        };
        if names.contains(&name) {
            return Err(config_error(format!(
                "reducer {pos}/{total} is named {name:?}, which is already defined"
            )));
        }
        names.push(name);
        if let Some(func) = spec.func() {
            return Err(StructError::from(CoreReason::NotImplemented).with_detail(format!(
                "reducer {pos}/{total} ({name:?}) uses custom function {func:?}; \
                 custom reducers are not supported"
            )));
        }
        let reducer: Reducer = name.parse().map_err(|e: anyhow::Error| {
            config_error(format!("reducer {pos}/{total}: {e}"))
        })?;
        if out.iter().any(|(_, r)| *r == reducer) {
            return Err(config_error(format!(
                "reducer {pos}/{total} ({name:?}) repeats {reducer}"
            )));
        }
        out.push((name.to_string(), reducer));
    }
    Ok(out)
}

fn is_numeric(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
    )
}

pub fn supports(reducer: Reducer, dt: &DataType) -> bool {
    match reducer {
        Reducer::Sum | Reducer::Max | Reducer::Min | Reducer::Mean => is_numeric(dt),
        Reducer::Count | Reducer::Identity => true,
    }
}

/// Columns to aggregate: the explicit list, checked, or every column outside
/// `excluded` that all reducers accept.
pub fn resolve_targets(
    schema: &Schema,
    explicit: Option<&[String]>,
    excluded: &[&str],
    reducers: &[Reducer],
) -> CoreResult<Vec<String>> {
    match explicit {
        Some(cols) => {
            for name in cols {
                let field = schema
                    .field_with_name(name)
                    .map_err(|_| data_error(format!("target column {name:?} not found")))?;
                if let Some(r) = reducers.iter().find(|r| !supports(**r, field.data_type())) {
                    return Err(data_error(format!(
                        "target column {name:?} has type {}, which {r} does not support",
                        field.data_type()
                    )));
                }
            }
            Ok(cols.to_vec())
        }
        None => Ok(schema
            .fields()
            .iter()
            .filter(|f| !excluded.contains(&f.name().as_str()))
            .filter(|f| reducers.iter().all(|r| supports(*r, f.data_type())))
            .map(|f| f.name().clone())
            .collect()),
    }
}

/// Output column name for `column` reduced by the reducer requested as
/// `reducer_name`.
pub fn output_name(column: &str, reducer_name: &str, multiple: bool) -> String {
    if multiple {
        format!("{column}_{reducer_name}")
    } else {
        column.to_string()
    }
}

// ---------------------------------------------------------------------------
// Reduction
// ---------------------------------------------------------------------------

/// Reduce `column` once per window, producing one value per window.
pub fn reduce(column: &ArrayRef, windows: &[Window], reducer: Reducer) -> CoreResult<ArrayRef> {
    match reducer {
        Reducer::Count => Ok(count(column.as_ref(), windows)),
        Reducer::Identity => identity(column, windows),
        Reducer::Sum | Reducer::Max | Reducer::Min | Reducer::Mean => {
            numeric(column, windows, reducer)
        }
    }
}

fn valid<'a>(column: &'a dyn Array, rows: &'a [u32]) -> impl Iterator<Item = usize> + 'a {
    rows.iter()
        .map(|&r| r as usize)
        .filter(move |&r| column.is_valid(r))
}

fn count(column: &dyn Array, windows: &[Window]) -> ArrayRef {
    let counts: Vec<i64> = windows
        .iter()
        .map(|w| valid(column, &w.rows).count() as i64)
        .collect();
    Arc::new(Int64Array::from(counts))
}

fn identity(column: &ArrayRef, windows: &[Window]) -> CoreResult<ArrayRef> {
    let mut offsets: Vec<i32> = Vec::with_capacity(windows.len() + 1);
    offsets.push(0);
    let mut indices: Vec<u32> = Vec::new();
    for w in windows {
        indices.extend_from_slice(&w.rows);
        let end = i32::try_from(indices.len())
            .map_err(|_| data_error("identity output exceeds list capacity"))?;
        offsets.push(end);
    }
    let values = take(column.as_ref(), &UInt32Array::from(indices), None)
        .map_err(|e| arrow_error("collecting window values", e))?;
    let field = Arc::new(Field::new("item", column.data_type().clone(), true));
    let list = ListArray::try_new(
        field,
        OffsetBuffer::new(ScalarBuffer::from(offsets)),
        values,
        None,
    )
    .map_err(|e| arrow_error("building identity list", e))?;
    Ok(Arc::new(list))
}

fn numeric(column: &ArrayRef, windows: &[Window], reducer: Reducer) -> CoreResult<ArrayRef> {
    match column.data_type() {
        DataType::Int64 => {
            let ints = column
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| data_error("Int64 column did not downcast"))?;
            reduce_ints(ints, windows, reducer)
        }
        dt if is_numeric(dt) => {
            let cast_col = cast(column.as_ref(), &DataType::Float64)
                .map_err(|e| arrow_error("casting to Float64", e))?;
            let floats = cast_col
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| data_error("Float64 column did not downcast"))?;
            Ok(reduce_floats(floats, windows, reducer))
        }
        other => Err(data_error(format!("{reducer} does not support type {other}"))),
    }
}

fn reduce_ints(col: &Int64Array, windows: &[Window], reducer: Reducer) -> CoreResult<ArrayRef> {
    let values = |w: &Window| valid(col, &w.rows).map(|r| col.value(r)).collect::<Vec<_>>();
    let out: ArrayRef = match reducer {
        Reducer::Sum => {
            let sums = windows
                .iter()
                .map(|w| {
                    values(w).into_iter().try_fold(0i64, |acc, v| {
                        acc.checked_add(v)
                            .ok_or_else(|| data_error("integer sum overflowed"))
                    })
                })
                .collect::<CoreResult<Vec<i64>>>()?;
            Arc::new(Int64Array::from(sums))
        }
        Reducer::Max => Arc::new(Int64Array::from(
            windows
                .iter()
                .map(|w| values(w).into_iter().max())
                .collect::<Vec<_>>(),
        )),
        Reducer::Min => Arc::new(Int64Array::from(
            windows
                .iter()
                .map(|w| values(w).into_iter().min())
                .collect::<Vec<_>>(),
        )),
        Reducer::Mean => Arc::new(Float64Array::from(
            windows
                .iter()
                .map(|w| mean(values(w).into_iter().map(|v| v as f64)))
                .collect::<Vec<_>>(),
        )),
        Reducer::Count | Reducer::Identity => {
            return Err(data_error(format!("{reducer} is not a numeric reducer")));
        }
    };
    Ok(out)
}

fn reduce_floats(col: &Float64Array, windows: &[Window], reducer: Reducer) -> ArrayRef {
    let values = |w: &Window| valid(col, &w.rows).map(|r| col.value(r)).collect::<Vec<_>>();
    let per_window: Vec<Option<f64>> = windows
        .iter()
        .map(|w| {
            let vals = values(w);
            match reducer {
                Reducer::Sum => Some(vals.iter().sum()),
                Reducer::Max => vals.into_iter().reduce(f64::max),
                Reducer::Min => vals.into_iter().reduce(f64::min),
                _ => mean(vals.into_iter()),
            }
        })
        .collect();
    Arc::new(Float64Array::from(per_window))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
