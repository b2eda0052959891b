mod assigner;
mod calendar;

pub use assigner::{Assignment, GroupKey, Window, WindowSpec, assign};
pub use calendar::{Bounds, Period, shift_back};
