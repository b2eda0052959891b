use std::collections::HashSet;

use crate::project::ProjectConfig;

/// Internal validation, called automatically during `ProjectConfig::from_str` / `load`.
///
/// Only structural checks live here; durations, patterns and reducer names are
/// validated by the engine when it builds its estimators.
pub(crate) fn validate(config: &ProjectConfig) -> anyhow::Result<()> {
    if let Some(resample) = &config.resample {
        if resample.time_column.trim().is_empty() {
            anyhow::bail!("resample.time_column must not be empty");
        }
        if resample.every.trim().is_empty() {
            anyhow::bail!("resample.every must not be empty");
        }

        let mut seen = HashSet::new();
        for col in &resample.group_by {
            if col == &resample.time_column {
                anyhow::bail!("resample.group_by must not contain the time column {col:?}");
            }
            if !seen.insert(col.as_str()) {
                anyhow::bail!("resample.group_by lists {col:?} more than once");
            }
        }
    }

    if let Some(filter) = &config.filter
        && filter.time_column.trim().is_empty()
    {
        anyhow::bail!("filter.time_column must not be empty");
    }

    // The filter feeds the resampler, so both must read the same column.
    if let (Some(filter), Some(resample)) = (&config.filter, &config.resample)
        && filter.time_column != resample.time_column
    {
        anyhow::bail!(
            "filter.time_column ({:?}) differs from resample.time_column ({:?})",
            filter.time_column,
            resample.time_column,
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
