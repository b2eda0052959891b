pub mod aggregate;
pub mod correlate;
pub mod error;
pub mod filter;
pub mod frame;
pub mod frequency;
pub mod partial;
pub mod resample;
pub mod segments;
pub mod window;

pub use correlate::{Correlations, PairSelection, calculate_correlations, pair_data};
pub use error::{CoreError, CoreReason, CoreResult};
pub use filter::{FilterDataBasedOnTime, RowFilter};
pub use frame::TimeColumn;
pub use frequency::detect_frequency;
pub use resample::{LOWER_BOUNDARY, ResampleData, UPPER_BOUNDARY};
pub use segments::find_contiguous_segments;
pub use window::{Bounds, Period, WindowSpec};
