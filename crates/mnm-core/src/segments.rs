use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray};
use arrow::compute::partition;

use crate::error::{CoreResult, arrow_error, data_error};

/// `[start, end)` row ranges over runs of equal consecutive values.
///
/// Nulls compare equal to each other. With a `mask`, rows that are not
/// selected (false or null) end the current run and belong to no segment.
pub fn find_contiguous_segments(
    values: &ArrayRef,
    mask: Option<&BooleanArray>,
) -> CoreResult<Vec<(usize, usize)>> {
    let Some(mask) = mask else {
        let parts = partition(std::slice::from_ref(values))
            .map_err(|e| arrow_error("segment partition", e))?;
        return Ok(parts.ranges().into_iter().map(|r| (r.start, r.end)).collect());
    };

    if mask.len() != values.len() {
        return Err(data_error(format!(
            "segment mask has {} rows, values have {}",
            mask.len(),
            values.len()
        )));
    }
    let columns = [Arc::clone(values), Arc::new(mask.clone()) as ArrayRef];
    let parts = partition(&columns).map_err(|e| arrow_error("segment partition", e))?;
    let segments: Vec<(usize, usize)> = parts
        .ranges()
        .into_iter()
        .filter(|r| mask.is_valid(r.start) && mask.value(r.start))
        .map(|r| (r.start, r.end))
        .collect();
    log::debug!("{} masked segments over {} rows", segments.len(), values.len());
    Ok(segments)
}
