use std::fmt;

use crate::duration::Duration;

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }

    pub fn apply(self, lhs: i64, rhs: i64) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ge => lhs >= rhs,
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMode {
    /// Compare calendar components only, e.g. `>1h` is "hour > 1".
    Simple,
    /// `>1h*`: any instant past the mark, finer units included.
    Cascade,
}

/// One classified clause of a time pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePatternRule {
    pub duration: Duration,
    pub op: CmpOp,
    pub mode: RuleMode,
}

impl fmt::Display for TimePatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.duration)?;
        if self.mode == RuleMode::Cascade {
            f.write_str("*")?;
        }
        Ok(())
    }
}

/// A parsed pattern string: one rule, or two rules that must both hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePattern {
    pub source: String,
    pub rules: Vec<TimePatternRule>,
}
