use serde::{Deserialize, Serialize};

/// The `[filter]` section: recurring time-of-day exclusions.
///
/// Each entry of `patterns` is one exclusion rule such as `">1h*<8h"`; a row
/// is removed when any pattern matches its timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FilterConfig {
    pub time_column: String,
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl FilterConfig {
    pub fn new<S: Into<String>>(
        time_column: impl Into<String>,
        patterns: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            time_column: time_column.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }
}
