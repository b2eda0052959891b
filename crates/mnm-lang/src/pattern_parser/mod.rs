use winnow::combinator::{cut_err, opt, preceded, repeat};
use winnow::error::{StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::literal;

use crate::ast::{CmpOp, RuleMode, TimePattern, TimePatternRule};
use crate::duration::Duration;
use crate::error::LangError;
use crate::parse_utils::{cmp_op, duration_text, ws_skip};


/// Most clauses a single pattern may hold (a lower and an upper bound).
const MAX_CLAUSES: usize = 2;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Parse one exclusion pattern such as `">1h"`, `">1h*<8h"` or `">=30m, <45m"`.
///
/// Clauses start at an operator; a second clause may follow directly or after
/// a comma. Durations are validated and each clause is classified as a
/// simple or cascade rule.
pub fn parse_time_pattern(input: &str) -> Result<TimePattern, LangError> {
    let clauses = pattern
        .parse(input)
        .map_err(|e| LangError::pattern(input, format!("parse error: {e}")))?;

    if clauses.len() > MAX_CLAUSES {
        return Err(LangError::pattern(
            input,
            format!(
                "expected at most {MAX_CLAUSES} clauses, got {}",
                clauses.len()
            ),
        ));
    }

    let rules = clauses
        .into_iter()
        .map(|clause| classify(clause, input))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TimePattern {
        source: input.to_string(),
        rules,
    })
}

// ---------------------------------------------------------------------------
// Grammar
// ---------------------------------------------------------------------------

struct RawClause<'a> {
    op: CmpOp,
    duration: &'a str,
    cascade: bool,
}

/// `pattern = clause { [","] clause }`
fn pattern<'a>(input: &mut &'a str) -> ModalResult<Vec<RawClause<'a>>> {
    ws_skip.parse_next(input)?;
    let first = clause.parse_next(input)?;
    let rest: Vec<RawClause<'a>> = repeat(0.., preceded(separator, clause)).parse_next(input)?;
    ws_skip.parse_next(input)?;

    let mut clauses = Vec::with_capacity(1 + rest.len());
    clauses.push(first);
    clauses.extend(rest);
    Ok(clauses)
}

fn separator(input: &mut &str) -> ModalResult<()> {
    ws_skip.parse_next(input)?;
    opt(literal(",")).parse_next(input)?;
    ws_skip.parse_next(input)
}

/// `clause = cmp_op duration ["*"]`
fn clause<'a>(input: &mut &'a str) -> ModalResult<RawClause<'a>> {
    let op = cmp_op
        .context(StrContext::Expected(StrContextValue::Description(
            "comparison operator (=, !=, <, <=, >, >=)",
        )))
        .parse_next(input)?;
    ws_skip.parse_next(input)?;
    let duration = cut_err(duration_text)
        .context(StrContext::Expected(StrContextValue::Description(
            "duration after operator",
        )))
        .parse_next(input)?;
    let cascade = opt(literal("*")).parse_next(input)?.is_some();
    Ok(RawClause {
        op,
        duration,
        cascade,
    })
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

fn classify(clause: RawClause<'_>, source: &str) -> Result<TimePatternRule, LangError> {
    let duration: Duration = clause.duration.parse()?;

    if !clause.cascade {
        return Ok(TimePatternRule {
            duration,
            op: clause.op,
            mode: RuleMode::Simple,
        });
    }

    let [part] = duration.parts() else {
        return Err(LangError::cascade(
            source,
            format!("cascade needs a single unit, got \"{duration}\""),
        ));
    };
    if !part.unit.is_sub_day() {
        return Err(LangError::cascade(
            source,
            format!("cannot cascade on unit {:?}, only sub-day units", part.symbol()),
        ));
    }
    if !matches!(clause.op, CmpOp::Gt | CmpOp::Ge) {
        return Err(LangError::cascade(
            source,
            format!("cascade requires > or >=, got {}", clause.op),
        ));
    }

    Ok(TimePatternRule {
        duration,
        op: clause.op,
        mode: RuleMode::Cascade,
    })
}
