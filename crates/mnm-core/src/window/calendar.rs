use arrow::array::timezone::Tz;
use chrono::{Months, NaiveDate, NaiveDateTime, TimeDelta};
use mnm_config::ClosedBoundary;
use mnm_lang::{CalendarSpan, Duration};

use crate::error::{CoreResult, config_error, data_error, lang_error};
use crate::frame::{local_nanos, naive_from_nanos, to_instant};

const NANOS_PER_DAY: i64 = 86_400_000_000_000;
/// 1969-12-29 was a Monday, three days before the epoch.
const MONDAY_ORIGIN: i64 = -3 * NANOS_PER_DAY;

/// A window boundary pair as absolute instants (UTC nanoseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub lower: i64,
    pub upper: i64,
}

impl Bounds {
    pub fn elapsed_nanos(&self) -> i64 {
        self.upper - self.lower
    }

    pub fn contains(&self, t: i64, closed: ClosedBoundary) -> bool {
        match closed {
            ClosedBoundary::Left => self.lower <= t && t < self.upper,
            ClosedBoundary::Right => self.lower < t && t <= self.upper,
        }
    }
}

// ---------------------------------------------------------------------------
// Period — the window length with its natural origin
// ---------------------------------------------------------------------------

/// Window length resolved from a duration literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// Sub-day only: multiples of `n` wall-clock nanoseconds since local
    /// midnight 1970-01-01. Elapsed time still follows the zone, so a window
    /// spanning a DST change is shorter or longer than `n`.
    Fixed(i64),
    /// Contains days (or weeks mixed with other parts): multiples of this
    /// many wall-clock nanoseconds since local midnight 1970-01-01.
    Local(i64),
    /// Weeks only: Monday-aligned multiples since 1969-12-29.
    Weeks(i64),
    /// Months only: every `n` months since January 1970.
    Months(i64),
}

impl Period {
    pub fn from_duration(every: &Duration) -> CoreResult<Self> {
        let span = every.span().map_err(lang_error)?;
        if span.is_zero() {
            return Err(config_error(format!("window length {every} must not be zero")));
        }
        if span.months > 0 {
            if span.weeks != 0 || span.days != 0 || span.nanos != 0 {
                return Err(config_error(format!(
                    "window length {every} mixes months with shorter units"
                )));
            }
            return Ok(Period::Months(span.months));
        }
        if span.is_fixed() {
            return Ok(Period::Fixed(span.nanos));
        }
        let week_only = span.days == 0 && span.nanos == 0;
        let total = span
            .weeks
            .checked_mul(7)
            .and_then(|d| d.checked_add(span.days))
            .and_then(|d| d.checked_mul(NANOS_PER_DAY))
            .and_then(|n| n.checked_add(span.nanos))
            .ok_or_else(|| config_error(format!("window length {every} is too large")))?;
        if week_only {
            Ok(Period::Weeks(total))
        } else {
            Ok(Period::Local(total))
        }
    }

    /// The window that instant `t` falls into.
    pub fn window_of(&self, t: i64, closed: ClosedBoundary, tz: &Tz) -> CoreResult<Bounds> {
        let on_right = closed == ClosedBoundary::Right;
        match *self {
            Period::Fixed(span) | Period::Local(span) => local_window(t, span, 0, on_right, tz),
            Period::Weeks(span) => local_window(t, span, MONDAY_ORIGIN, on_right, tz),
            Period::Months(n) => month_window(t, n, on_right, tz),
        }
    }
}

fn overflow() -> crate::error::CoreError {
    data_error("window boundary is outside the nanosecond range")
}

fn local_window(t: i64, span: i64, origin: i64, on_right: bool, tz: &Tz) -> CoreResult<Bounds> {
    let local = local_nanos(tz, t)?;
    let rel = local.checked_sub(origin).ok_or_else(overflow)?;
    let mut lower = local - rel.rem_euclid(span);
    if on_right && lower == local {
        lower = lower.checked_sub(span).ok_or_else(overflow)?;
    }
    let upper = lower.checked_add(span).ok_or_else(overflow)?;
    Ok(Bounds {
        lower: to_instant(tz, naive_from_nanos(lower))?,
        upper: to_instant(tz, naive_from_nanos(upper))?,
    })
}

fn month_window(t: i64, n: i64, on_right: bool, tz: &Tz) -> CoreResult<Bounds> {
    let local = naive_from_nanos(local_nanos(tz, t)?);
    let index = month_index(local);
    let mut lower = index - index.rem_euclid(n);
    if on_right && lower == index && month_start(lower)? == local {
        lower -= n;
    }
    Ok(Bounds {
        lower: to_instant(tz, month_start(lower)?)?,
        upper: to_instant(tz, month_start(lower + n)?)?,
    })
}

/// Months since January 1970.
fn month_index(dt: NaiveDateTime) -> i64 {
    use chrono::Datelike;
    (i64::from(dt.year()) - 1970) * 12 + i64::from(dt.month0())
}

fn month_start(index: i64) -> CoreResult<NaiveDateTime> {
    let year = i32::try_from(1970 + index.div_euclid(12)).map_err(|_| overflow())?;
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(overflow)
}

// ---------------------------------------------------------------------------
// Offset shifting
// ---------------------------------------------------------------------------

/// Shift instant `t` backwards by `span`.
///
/// Fixed spans subtract on the absolute timeline; calendar spans subtract on
/// the wall clock of `tz` and resolve back to an instant.
pub fn shift_back(t: i64, span: &CalendarSpan, tz: &Tz) -> CoreResult<i64> {
    if span.is_fixed() {
        return t.checked_sub(span.nanos).ok_or_else(overflow);
    }
    let mut local = naive_from_nanos(local_nanos(tz, t)?);
    if span.months > 0 {
        let months = u32::try_from(span.months).map_err(|_| overflow())?;
        local = local
            .checked_sub_months(Months::new(months))
            .ok_or_else(overflow)?;
    }
    let days = span
        .weeks
        .checked_mul(7)
        .and_then(|d| d.checked_add(span.days))
        .ok_or_else(overflow)?;
    local = local
        .checked_sub_signed(TimeDelta::days(days))
        .and_then(|l| l.checked_sub_signed(TimeDelta::nanoseconds(span.nanos)))
        .ok_or_else(overflow)?;
    to_instant(tz, local)
}
