use std::fmt;
use std::str::FromStr;

use winnow::combinator::repeat;
use winnow::prelude::*;

use crate::error::LangError;
use crate::parse_utils::{digit_run, letter_run};

const NANOS_PER_MICRO: i64 = 1_000;
const NANOS_PER_MILLI: i64 = 1_000_000;
const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;

// ---------------------------------------------------------------------------
// Unit
// ---------------------------------------------------------------------------

/// Time unit of one duration part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Unit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// Accepted spellings. `us` and `µs` both mean microseconds.
const UNIT_SYMBOLS: &[(&str, Unit)] = &[
    ("ns", Unit::Nanosecond),
    ("us", Unit::Microsecond),
    ("µs", Unit::Microsecond),
    ("ms", Unit::Millisecond),
    ("s", Unit::Second),
    ("m", Unit::Minute),
    ("h", Unit::Hour),
    ("d", Unit::Day),
    ("w", Unit::Week),
    ("mo", Unit::Month),
    ("q", Unit::Quarter),
    ("y", Unit::Year),
];

impl Unit {
    /// Look up a unit by its spelling, returning the canonical static form of
    /// that spelling alongside it.
    pub fn from_symbol(symbol: &str) -> Option<(Unit, &'static str)> {
        UNIT_SYMBOLS
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(s, u)| (*u, *s))
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Nanosecond => "ns",
            Unit::Microsecond => "us",
            Unit::Millisecond => "ms",
            Unit::Second => "s",
            Unit::Minute => "m",
            Unit::Hour => "h",
            Unit::Day => "d",
            Unit::Week => "w",
            Unit::Month => "mo",
            Unit::Quarter => "q",
            Unit::Year => "y",
        }
    }

    /// Units shorter than a calendar day.
    pub fn is_sub_day(self) -> bool {
        self.fixed_nanos().is_some()
    }

    /// Length in nanoseconds for units that have a fixed length.
    pub fn fixed_nanos(self) -> Option<i64> {
        match self {
            Unit::Nanosecond => Some(1),
            Unit::Microsecond => Some(NANOS_PER_MICRO),
            Unit::Millisecond => Some(NANOS_PER_MILLI),
            Unit::Second => Some(NANOS_PER_SECOND),
            Unit::Minute => Some(NANOS_PER_MINUTE),
            Unit::Hour => Some(NANOS_PER_HOUR),
            Unit::Day | Unit::Week | Unit::Month | Unit::Quarter | Unit::Year => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ---------------------------------------------------------------------------
// DurationPart
// ---------------------------------------------------------------------------

/// One `(multiplier, unit)` component of a [`Duration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DurationPart {
    pub multiplier: u64,
    pub unit: Unit,
    symbol: &'static str,
}

impl DurationPart {
    pub fn new(multiplier: u64, unit: Unit) -> Self {
        Self {
            multiplier,
            unit,
            symbol: unit.symbol(),
        }
    }

    /// The unit as it was spelled in the source text.
    pub fn symbol(&self) -> &'static str {
        self.symbol
    }
}

impl fmt::Display for DurationPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.multiplier, self.symbol)
    }
}

// ---------------------------------------------------------------------------
// Duration
// ---------------------------------------------------------------------------

/// A duration literal such as `"1d"`, `"3d12h4m25s"` or `"90µs"`.
///
/// Parts are kept in source order and are never normalised: `"25h"` stays
/// 25 hours and `"1d"` multiplied by 25 is `"25d"`. Formatting a parsed
/// duration reproduces its source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Duration {
    parts: Vec<DurationPart>,
}

impl Duration {
    pub fn from_parts(parts: Vec<DurationPart>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[DurationPart] {
        &self.parts
    }

    /// True when every multiplier is zero.
    pub fn is_zero(&self) -> bool {
        self.parts.iter().all(|p| p.multiplier == 0)
    }

    /// Arithmetic view of this duration. Fails if a multiplier does not fit
    /// the span's counters.
    pub fn span(&self) -> Result<CalendarSpan, LangError> {
        let overflow = || LangError::duration(&self.to_string(), "duration out of range");
        let mut span = CalendarSpan::default();
        for part in &self.parts {
            let n = i64::try_from(part.multiplier).map_err(|_| overflow())?;
            let (slot, factor) = match part.unit {
                Unit::Day => (&mut span.days, 1),
                Unit::Week => (&mut span.weeks, 1),
                Unit::Month => (&mut span.months, 1),
                Unit::Quarter => (&mut span.months, 3),
                Unit::Year => (&mut span.months, 12),
                fixed => (&mut span.nanos, fixed.fixed_nanos().unwrap_or(1)),
            };
            let add = n.checked_mul(factor).ok_or_else(overflow)?;
            *slot = slot.checked_add(add).ok_or_else(overflow)?;
        }
        Ok(span)
    }

    /// Scale every multiplier by `factor`, failing if one overflows.
    pub fn checked_mul(&self, factor: u64) -> Result<Duration, LangError> {
        let parts = self
            .parts
            .iter()
            .map(|p| {
                let multiplier = p.multiplier.checked_mul(factor).ok_or_else(|| {
                    LangError::duration(&self.to_string(), "duration out of range")
                })?;
                Ok(DurationPart { multiplier, ..*p })
            })
            .collect::<Result<Vec<_>, LangError>>()?;
        Ok(Self { parts })
    }
}

impl FromStr for Duration {
    type Err = LangError;

    fn from_str(s: &str) -> Result<Self, LangError> {
        if s.is_empty() {
            return Err(LangError::duration(s, "empty duration"));
        }
        if s.starts_with(|c: char| c.is_alphabetic()) {
            return Err(LangError::duration(s, "duration must start with a number"));
        }
        if s.ends_with(|c: char| c.is_ascii_digit()) {
            return Err(LangError::duration(s, "missing unit after the last number"));
        }

        let raw: Vec<(&str, &str)> = repeat(1.., (digit_run, letter_run))
            .parse(s)
            .map_err(|_| LangError::duration(s, "expected alternating numbers and units"))?;

        let parts = raw
            .into_iter()
            .map(|(digits, letters)| {
                if digits.len() > 1 && digits.starts_with('0') {
                    return Err(LangError::duration(s, format!("number {digits} has leading zeros")));
                }
                let multiplier: u64 = digits
                    .parse()
                    .map_err(|_| LangError::duration(s, format!("number {digits} is too large")))?;
                let (unit, symbol) = Unit::from_symbol(letters)
                    .ok_or_else(|| LangError::duration(s, format!("unknown unit {letters:?}")))?;
                Ok(DurationPart {
                    multiplier,
                    unit,
                    symbol,
                })
            })
            .collect::<Result<Vec<_>, LangError>>()?;

        Ok(Self { parts })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CalendarSpan
// ---------------------------------------------------------------------------

/// Duration reduced to the counters needed for date arithmetic.
///
/// `months`, `weeks` and `days` follow the local calendar; `nanos` is elapsed
/// time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalendarSpan {
    pub months: i64,
    pub weeks: i64,
    pub days: i64,
    pub nanos: i64,
}

impl CalendarSpan {
    /// A span made only of sub-day units.
    pub fn is_fixed(&self) -> bool {
        self.months == 0 && self.weeks == 0 && self.days == 0
    }

    pub fn is_zero(&self) -> bool {
        self.is_fixed() && self.nanos == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
