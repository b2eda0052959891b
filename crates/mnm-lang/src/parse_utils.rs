use winnow::ascii::multispace0;
use winnow::combinator::alt;
use winnow::prelude::*;
use winnow::token::{literal, take_while};

use crate::ast::CmpOp;

// ---------------------------------------------------------------------------
// Character runs
// ---------------------------------------------------------------------------

/// One or more ASCII digits.
pub fn digit_run<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)
}

/// One or more alphabetic characters. Not limited to ASCII so that `µs` is
/// read as a single unit.
pub fn letter_run<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_alphabetic()).parse_next(input)
}

/// The raw text of a duration literal: a run of digits and letters, stopping
/// at operators, separators, `*` and whitespace.
pub fn duration_text<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_digit() || c.is_alphabetic()).parse_next(input)
}

// ---------------------------------------------------------------------------
// Whitespace
// ---------------------------------------------------------------------------

pub fn ws_skip(input: &mut &str) -> ModalResult<()> {
    multispace0.void().parse_next(input)
}

// ---------------------------------------------------------------------------
// Comparison operators
// ---------------------------------------------------------------------------

/// Two-character operators are tried first so `>=` never reads as `>`.
pub fn cmp_op(input: &mut &str) -> ModalResult<CmpOp> {
    alt((
        literal("!=").value(CmpOp::Ne),
        literal("<=").value(CmpOp::Le),
        literal(">=").value(CmpOp::Ge),
        literal("=").value(CmpOp::Eq),
        literal("<").value(CmpOp::Lt),
        literal(">").value(CmpOp::Gt),
    ))
    .parse_next(input)
}
