pub mod ast;
mod compiler;
pub mod duration;
mod error;
pub mod parse_utils;
mod pattern_parser;
pub mod predicate;

pub use compiler::{compile_keep_mask, compile_pattern, compile_rule, compile_time_patterns};
pub use duration::{CalendarSpan, Duration, DurationPart, Unit};
pub use error::LangError;
pub use pattern_parser::parse_time_pattern;
pub use predicate::{Component, Predicate};
