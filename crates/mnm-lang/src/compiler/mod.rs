use crate::ast::{CmpOp, RuleMode, TimePattern, TimePatternRule};
use crate::error::LangError;
use crate::pattern_parser::parse_time_pattern;
use crate::predicate::{Component, Predicate};


/// Parse and compile a list of exclusion patterns into a keep-mask predicate.
///
/// A row is kept when it matches none of the patterns. An empty list keeps
/// every row.
pub fn compile_time_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Predicate, LangError> {
    let parsed = patterns
        .iter()
        .map(|p| parse_time_pattern(p.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(compile_keep_mask(&parsed))
}

/// `NOT (pattern_1 OR pattern_2 OR ...)`.
pub fn compile_keep_mask(patterns: &[TimePattern]) -> Predicate {
    if patterns.is_empty() {
        return Predicate::Literal(true);
    }
    Predicate::or(patterns.iter().map(compile_pattern).collect()).negate()
}

/// The clauses of one pattern all have to match.
pub fn compile_pattern(pattern: &TimePattern) -> Predicate {
    Predicate::and(pattern.rules.iter().map(compile_rule).collect())
}

pub fn compile_rule(rule: &TimePatternRule) -> Predicate {
    match rule.mode {
        RuleMode::Simple => compile_simple(rule),
        RuleMode::Cascade => compile_cascade(rule),
    }
}

// ---------------------------------------------------------------------------
// Simple: every part compares its own component
// ---------------------------------------------------------------------------

fn compile_simple(rule: &TimePatternRule) -> Predicate {
    Predicate::and(
        rule.duration
            .parts()
            .iter()
            .map(|part| {
                Predicate::compare(
                    Component::for_unit(part.unit),
                    rule.op,
                    clamp_value(part.multiplier),
                )
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Cascade: past the mark, finer units included
// ---------------------------------------------------------------------------

/// `(any finer field > 0 AND unit == v) OR unit op v`.
///
/// The parser only produces cascade rules with one sub-day part and `>`/`>=`.
fn compile_cascade(rule: &TimePatternRule) -> Predicate {
    let Some(part) = rule.duration.parts().first() else {
        return Predicate::Literal(false);
    };
    let component = Component::for_unit(part.unit);
    let value = clamp_value(part.multiplier);

    let finer: Vec<Predicate> = Component::finer_than(part.unit)
        .iter()
        .map(|c| Predicate::compare(*c, CmpOp::Gt, 0))
        .collect();

    let past_mark = Predicate::And(vec![
        Predicate::or(finer),
        Predicate::compare(component, CmpOp::Eq, value),
    ]);
    Predicate::Or(vec![past_mark, Predicate::compare(component, rule.op, value)])
}

fn clamp_value(multiplier: u64) -> i64 {
    i64::try_from(multiplier).unwrap_or(i64::MAX)
}
