use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ClosedBoundary
// ---------------------------------------------------------------------------

/// Which end of a window includes a timestamp sitting exactly on a boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosedBoundary {
    /// `[lower, upper)`
    #[default]
    Left,
    /// `(lower, upper]`
    Right,
}

impl FromStr for ClosedBoundary {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => anyhow::bail!("unknown closed boundary {other:?} (expected left/right)"),
        }
    }
}

impl fmt::Display for ClosedBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

// ---------------------------------------------------------------------------
// LabelStrategy
// ---------------------------------------------------------------------------

/// The timestamp that represents a window in output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStrategy {
    #[default]
    Left,
    Right,
    /// First timestamp observed in the window.
    Datapoint,
}

impl FromStr for LabelStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "datapoint" => Ok(Self::Datapoint),
            other => {
                anyhow::bail!("unknown label strategy {other:?} (expected left/right/datapoint)")
            }
        }
    }
}

impl fmt::Display for LabelStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Datapoint => "datapoint",
        })
    }
}

// ---------------------------------------------------------------------------
// PartialityPolicy
// ---------------------------------------------------------------------------

/// What to do with windows holding fewer samples than a full period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialityPolicy {
    #[default]
    Keep,
    Drop,
    Null,
    Fail,
}

impl FromStr for PartialityPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "keep" => Ok(Self::Keep),
            "drop" => Ok(Self::Drop),
            "null" => Ok(Self::Null),
            "fail" => Ok(Self::Fail),
            other => {
                anyhow::bail!("unknown partiality policy {other:?} (expected keep/drop/null/fail)")
            }
        }
    }
}

impl fmt::Display for PartialityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Keep => "keep",
            Self::Drop => "drop",
            Self::Null => "null",
            Self::Fail => "fail",
        })
    }
}

// ---------------------------------------------------------------------------
// FrequencyStrategy
// ---------------------------------------------------------------------------

/// How the native sampling interval of a series is inferred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyStrategy {
    /// The series must have exactly one distinct spacing.
    #[default]
    Exact,
    /// Most common spacing.
    Mode,
    /// Largest spacing.
    Max,
}

impl FromStr for FrequencyStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "exact" => Ok(Self::Exact),
            "mode" => Ok(Self::Mode),
            "max" => Ok(Self::Max),
            other => {
                anyhow::bail!("unknown frequency strategy {other:?} (expected exact/mode/max)")
            }
        }
    }
}

impl fmt::Display for FrequencyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exact => "exact",
            Self::Mode => "mode",
            Self::Max => "max",
        })
    }
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

/// Built-in per-window reductions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    Sum,
    Max,
    Min,
    Mean,
    Count,
    /// Pass every contributing value through as a list.
    #[serde(alias = "collect")]
    Identity,
}

impl Reducer {
    pub const ALL: [Reducer; 6] = [
        Reducer::Sum,
        Reducer::Max,
        Reducer::Min,
        Reducer::Mean,
        Reducer::Count,
        Reducer::Identity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Reducer::Sum => "sum",
            Reducer::Max => "max",
            Reducer::Min => "min",
            Reducer::Mean => "mean",
            Reducer::Count => "count",
            Reducer::Identity => "identity",
        }
    }
}

impl FromStr for Reducer {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        if s == "collect" {
            return Ok(Reducer::Identity);
        }
        Reducer::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Reducer::ALL.iter().map(|r| r.name()).collect();
                anyhow::anyhow!("unknown reducer {s:?} (expected one of {})", names.join("/"))
            })
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// ReducerSpec — user-facing reducer entry
// ---------------------------------------------------------------------------

/// One requested reducer: either a bare name (`"sum"`) or a record
/// `{ name = "...", func = "..." }`. Records are validated later; a `func`
/// entry names a custom callable, which is not supported.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ReducerSpec {
    Name(String),
    Record {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        func: Option<String>,
    },
}

impl ReducerSpec {
    pub fn name(&self) -> Option<&str> {
        match self {
            ReducerSpec::Name(n) => Some(n),
            ReducerSpec::Record { name, .. } => name.as_deref(),
        }
    }

    pub fn func(&self) -> Option<&str> {
        match self {
            ReducerSpec::Name(_) => None,
            ReducerSpec::Record { func, .. } => func.as_deref(),
        }
    }
}

impl From<&str> for ReducerSpec {
    fn from(name: &str) -> Self {
        ReducerSpec::Name(name.to_string())
    }
}

impl From<Reducer> for ReducerSpec {
    fn from(r: Reducer) -> Self {
        ReducerSpec::Name(r.name().to_string())
    }
}

/// `reducers = "sum"` or `reducers = ["sum", { name = "max" }]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ReducerList {
    Single(String),
    Many(Vec<ReducerSpec>),
}

impl ReducerList {
    pub fn specs(&self) -> Vec<ReducerSpec> {
        match self {
            ReducerList::Single(name) => vec![ReducerSpec::Name(name.clone())],
            ReducerList::Many(specs) => specs.clone(),
        }
    }
}

impl Default for ReducerList {
    fn default() -> Self {
        ReducerList::Single(Reducer::Sum.name().to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
