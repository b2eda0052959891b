use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Logging configuration. All fields have defaults so the entire `[logging]`
/// section may be omitted from `mnm.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global log level filter (e.g. `"info"`, `"debug"`).
    pub level: String,
    /// Per-module level overrides, e.g. `{ "mnm_core::resample" = "debug" }`.
    pub modules: HashMap<String, String>,
    /// Optional file path for log output. Relative paths are resolved against
    /// the config file's parent directory.
    pub file: Option<PathBuf>,
    /// Output format: `plain` (human-readable) or `json` (structured).
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            modules: HashMap::new(),
            file: None,
            format: LogFormat::Plain,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_uses_defaults() {
        let cfg: LoggingConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.level, "info");
        assert!(cfg.modules.is_empty());
        assert!(cfg.file.is_none());
        assert_eq!(cfg.format, LogFormat::Plain);
    }

    #[test]
    fn module_overrides_and_json() {
        let cfg: LoggingConfig = toml::from_str(
            r#"
level = "warn"
format = "json"
file = "logs/mnm.log"

[modules]
"mnm_core::resample" = "debug"
"#,
        )
        .unwrap();
        assert_eq!(cfg.level, "warn");
        assert_eq!(cfg.format, LogFormat::Json);
        assert_eq!(cfg.file, Some(PathBuf::from("logs/mnm.log")));
        assert_eq!(cfg.modules["mnm_core::resample"], "debug");
    }
}
