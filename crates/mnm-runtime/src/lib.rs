#[macro_use]
mod log_macros;

pub mod error;
pub mod ipc;
pub mod pipeline;
pub mod tracing_init;

pub use error::{RuntimeError, RuntimeReason, RuntimeResult};
pub use pipeline::Pipeline;
pub use tracing_init::init_tracing;
