pub mod filter;
pub mod logging;
pub mod project;
pub mod resample;
pub mod types;
mod validate;

pub use filter::FilterConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use project::ProjectConfig;
pub use resample::ResampleConfig;
pub use types::{
    ClosedBoundary, FrequencyStrategy, LabelStrategy, PartialityPolicy, Reducer, ReducerList,
    ReducerSpec,
};
