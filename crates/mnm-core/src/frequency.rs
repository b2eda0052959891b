use std::collections::BTreeMap;

use mnm_config::FrequencyStrategy;
use orion_error::prelude::*;

use crate::error::{CoreReason, CoreResult};

/// Infer the native sampling interval (nanoseconds) of a timestamp series.
///
/// Repeated timestamps are collapsed first; the input need not be sorted.
pub fn detect_frequency(timestamps: &[i64], strategy: FrequencyStrategy) -> CoreResult<i64> {
    let mut unique = timestamps.to_vec();
    unique.sort_unstable();
    unique.dedup();

    if unique.len() < 2 {
        return StructError::from(CoreReason::AmbiguousFrequency)
            .with_detail(format!(
                "need at least two distinct timestamps, found {}",
                unique.len()
            ))
            .err();
    }

    let mut diffs: BTreeMap<i64, usize> = BTreeMap::new();
    for pair in unique.windows(2) {
        *diffs.entry(pair[1] - pair[0]).or_default() += 1;
    }

    let freq = match strategy {
        FrequencyStrategy::Exact => {
            if diffs.len() != 1 {
                return StructError::from(CoreReason::AmbiguousFrequency)
                    .with_detail(format!(
                        "series has {} distinct spacings; use mode or max detection",
                        diffs.len()
                    ))
                    .err();
            }
            *diffs.keys().next().unwrap_or(&0)
        }
        // Ascending keys and a strict comparison keep the smallest on ties.
        FrequencyStrategy::Mode => {
            let mut best = (0i64, 0usize);
            for (&diff, &n) in &diffs {
                if n > best.1 {
                    best = (diff, n);
                }
            }
            best.0
        }
        FrequencyStrategy::Max => *diffs.keys().next_back().unwrap_or(&0),
    };
    log::debug!("detected sampling frequency {freq}ns using {strategy}");
    Ok(freq)
}
