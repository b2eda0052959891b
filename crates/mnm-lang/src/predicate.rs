use std::fmt;

use chrono::{Datelike, Timelike};

use crate::ast::CmpOp;
use crate::duration::Unit;

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// A calendar or clock field read from a timestamp.
///
/// Sub-second fields follow the usual accessor convention: `Millisecond`,
/// `Microsecond` and `Nanosecond` are the fraction of the current second in
/// that unit. The `NanosOf*` fields are the remainder below one millisecond or
/// one microsecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Year,
    Quarter,
    Month,
    IsoWeek,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
    NanosOfMillisecond,
    NanosOfMicrosecond,
}

impl Component {
    /// The field a duration unit compares against.
    pub fn for_unit(unit: Unit) -> Self {
        match unit {
            Unit::Nanosecond => Component::Nanosecond,
            Unit::Microsecond => Component::Microsecond,
            Unit::Millisecond => Component::Millisecond,
            Unit::Second => Component::Second,
            Unit::Minute => Component::Minute,
            Unit::Hour => Component::Hour,
            Unit::Day => Component::Day,
            Unit::Week => Component::IsoWeek,
            Unit::Month => Component::Month,
            Unit::Quarter => Component::Quarter,
            Unit::Year => Component::Year,
        }
    }

    /// Fields that are non-zero exactly when time has elapsed past a whole
    /// mark of `unit`. Only meaningful for sub-day units.
    pub fn finer_than(unit: Unit) -> &'static [Component] {
        match unit {
            Unit::Hour => &[Component::Minute, Component::Second, Component::Nanosecond],
            Unit::Minute => &[Component::Second, Component::Nanosecond],
            Unit::Second => &[Component::Nanosecond],
            Unit::Millisecond => &[Component::NanosOfMillisecond],
            Unit::Microsecond => &[Component::NanosOfMicrosecond],
            _ => &[],
        }
    }

    pub fn extract<T: Datelike + Timelike>(self, t: &T) -> i64 {
        let nanos = i64::from(t.nanosecond());
        match self {
            Component::Year => i64::from(t.year()),
            Component::Quarter => i64::from(t.month0() / 3 + 1),
            Component::Month => i64::from(t.month()),
            Component::IsoWeek => i64::from(t.iso_week().week()),
            Component::Day => i64::from(t.day()),
            Component::Hour => i64::from(t.hour()),
            Component::Minute => i64::from(t.minute()),
            Component::Second => i64::from(t.second()),
            Component::Millisecond => nanos / 1_000_000,
            Component::Microsecond => nanos / 1_000,
            Component::Nanosecond => nanos,
            Component::NanosOfMillisecond => nanos % 1_000_000,
            Component::NanosOfMicrosecond => nanos % 1_000,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Component::Year => "year",
            Component::Quarter => "quarter",
            Component::Month => "month",
            Component::IsoWeek => "week",
            Component::Day => "day",
            Component::Hour => "hour",
            Component::Minute => "minute",
            Component::Second => "second",
            Component::Millisecond => "millisecond",
            Component::Microsecond => "microsecond",
            Component::Nanosecond => "nanosecond",
            Component::NanosOfMillisecond => "nanos_of_millisecond",
            Component::NanosOfMicrosecond => "nanos_of_microsecond",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

/// Boolean expression over calendar components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Literal(bool),
    Compare {
        component: Component,
        op: CmpOp,
        value: i64,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn compare(component: Component, op: CmpOp, value: i64) -> Self {
        Predicate::Compare {
            component,
            op,
            value,
        }
    }

    /// Conjunction; a single operand is returned unwrapped.
    pub fn and(mut operands: Vec<Predicate>) -> Self {
        if operands.len() == 1 {
            operands.remove(0)
        } else {
            Predicate::And(operands)
        }
    }

    /// Disjunction; a single operand is returned unwrapped.
    pub fn or(mut operands: Vec<Predicate>) -> Self {
        if operands.len() == 1 {
            operands.remove(0)
        } else {
            Predicate::Or(operands)
        }
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Evaluate against any date-time value. Empty `And` is true, empty `Or`
    /// is false.
    pub fn eval<T: Datelike + Timelike>(&self, t: &T) -> bool {
        match self {
            Predicate::Literal(b) => *b,
            Predicate::Compare {
                component,
                op,
                value,
            } => op.apply(component.extract(t), *value),
            Predicate::And(items) => items.iter().all(|p| p.eval(t)),
            Predicate::Or(items) => items.iter().any(|p| p.eval(t)),
            Predicate::Not(inner) => !inner.eval(t),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Literal(b) => write!(f, "{b}"),
            Predicate::Compare {
                component,
                op,
                value,
            } => write!(f, "{component} {op} {value}"),
            Predicate::And(items) => write_joined(f, items, " AND "),
            Predicate::Or(items) => write_joined(f, items, " OR "),
            Predicate::Not(inner) => write!(f, "NOT {inner}"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Predicate], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(")")
}
