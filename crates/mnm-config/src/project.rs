use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::filter::FilterConfig;
use crate::logging::LoggingConfig;
use crate::resample::ResampleConfig;
use crate::validate;

// ---------------------------------------------------------------------------
// Raw TOML structure (intermediate representation)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectConfigRaw {
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    resample: Option<ResampleConfig>,
    #[serde(default)]
    filter: Option<FilterConfig>,
}

// ---------------------------------------------------------------------------
// ProjectConfig (validated)
// ---------------------------------------------------------------------------

/// Everything an `mnm.toml` file describes.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub logging: LoggingConfig,
    pub resample: Option<ResampleConfig>,
    pub filter: Option<FilterConfig>,
}

impl ProjectConfig {
    /// Read and parse an `mnm.toml` file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.as_ref().display()))?;
        content.parse()
    }
}

impl FromStr for ProjectConfig {
    type Err = anyhow::Error;

    /// Parse a TOML string into a validated [`ProjectConfig`].
    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        let raw: ProjectConfigRaw = toml::from_str(toml_str)?;

        let config = ProjectConfig {
            logging: raw.logging,
            resample: raw.resample,
            filter: raw.filter,
        };

        validate::validate(&config)?;

        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
