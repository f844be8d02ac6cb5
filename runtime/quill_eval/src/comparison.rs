//! Comparison operators (evaluator level 4).
//!
//! Cross-type rules:
//! - `is` / `isnot` with operands of different types are false / true.
//! - Lists compare only with Lists and only with `== != is isnot` (`E691`,
//!   `E692`); `is` compares identity. Dicts likewise (`E735`, `E736`).
//! - Function values allow only `== != is isnot` (`E694`).
//! - Otherwise a Float on either side compares as floats, a Number on either
//!   side as numbers, and everything else as strings. `=~` and `!~` always
//!   compare as strings.

use std::cmp::Ordering;

use quill_value::errors::{
    dict_compare_mismatch, invalid_dict_operation, invalid_func_operation,
    invalid_list_operation, list_compare_mismatch,
};
use quill_value::{values_equal, EvalError, Value};

use crate::pattern::PatternMatcher;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Match,
    NoMatch,
    Is,
    IsNot,
}

/// Case handling requested by a `#` or `?` suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaseMode {
    /// No suffix: follow the `ignorecase` option.
    Default,
    /// `#`
    MatchCase,
    /// `?`
    IgnoreCase,
}

impl CaseMode {
    pub fn ignore_case(self, default: bool) -> bool {
        match self {
            CaseMode::Default => default,
            CaseMode::MatchCase => false,
            CaseMode::IgnoreCase => true,
        }
    }
}

impl CompareOp {
    /// Recognize a comparison operator at the start of `text`.
    ///
    /// Returns the operator, its case suffix and the number of bytes taken.
    pub fn parse(text: &str) -> Option<(CompareOp, CaseMode, usize)> {
        let bytes = text.as_bytes();
        let at = |i: usize| bytes.get(i).copied().unwrap_or(0);
        let (op, len) = match (at(0), at(1)) {
            (b'=', b'=') => (CompareOp::Equal, 2),
            (b'=', b'~') => (CompareOp::Match, 2),
            (b'!', b'=') => (CompareOp::NotEqual, 2),
            (b'!', b'~') => (CompareOp::NoMatch, 2),
            (b'>', b'=') => (CompareOp::GreaterEqual, 2),
            (b'>', _) => (CompareOp::Greater, 1),
            (b'<', b'=') => (CompareOp::LessEqual, 2),
            (b'<', _) => (CompareOp::Less, 1),
            (b'i', b's') => {
                if text[2..].starts_with("not") && !is_word_byte(at(5)) {
                    (CompareOp::IsNot, 5)
                } else if !is_word_byte(at(2)) {
                    (CompareOp::Is, 2)
                } else {
                    return None;
                }
            }
            _ => return None,
        };
        let (case, len) = match at(len) {
            b'#' => (CaseMode::MatchCase, len + 1),
            b'?' => (CaseMode::IgnoreCase, len + 1),
            _ => (CaseMode::Default, len),
        };
        Some((op, case, len))
    }

    fn is_identity(self) -> bool {
        matches!(self, CompareOp::Is | CompareOp::IsNot)
    }

    fn is_equality(self) -> bool {
        matches!(
            self,
            CompareOp::Equal | CompareOp::NotEqual | CompareOp::Is | CompareOp::IsNot
        )
    }

    fn is_negated(self) -> bool {
        matches!(self, CompareOp::NotEqual | CompareOp::IsNot | CompareOp::NoMatch)
    }

    fn is_pattern(self) -> bool {
        matches!(self, CompareOp::Match | CompareOp::NoMatch)
    }

    fn from_ordering(self, ordering: Option<Ordering>) -> bool {
        let Some(ordering) = ordering else {
            return self == CompareOp::NotEqual || self == CompareOp::IsNot;
        };
        match self {
            CompareOp::Equal | CompareOp::Is => ordering == Ordering::Equal,
            CompareOp::NotEqual | CompareOp::IsNot => ordering != Ordering::Equal,
            CompareOp::Greater => ordering == Ordering::Greater,
            CompareOp::GreaterEqual => ordering != Ordering::Less,
            CompareOp::Less => ordering == Ordering::Less,
            CompareOp::LessEqual => ordering != Ordering::Greater,
            CompareOp::Match | CompareOp::NoMatch => false,
        }
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Byte-wise string ordering, optionally ignoring ASCII case.
pub fn compare_str(a: &str, b: &str, ignore_case: bool) -> Ordering {
    if ignore_case {
        let fold = |s: &str| s.bytes().map(|b| b.to_ascii_lowercase()).collect::<Vec<_>>();
        fold(a).cmp(&fold(b))
    } else {
        a.as_bytes().cmp(b.as_bytes())
    }
}

/// Evaluate `left op right`.
pub fn compare_values(
    left: &Value,
    right: &Value,
    op: CompareOp,
    ignore_case: bool,
    matcher: &dyn PatternMatcher,
) -> Result<bool, EvalError> {
    if op.is_identity() && std::mem::discriminant(left) != std::mem::discriminant(right) {
        // Function values are the one family spanning two variants.
        if !(left.is_func() && right.is_func()) {
            return Ok(op == CompareOp::IsNot);
        }
    }
    match (left, right) {
        (Value::List(a), Value::List(b)) => {
            if op.is_identity() {
                return Ok(a.ptr_eq(b) != op.is_negated());
            }
            if !op.is_equality() {
                return Err(invalid_list_operation());
            }
            Ok(values_equal(left, right, ignore_case) != op.is_negated())
        }
        (Value::List(_), _) | (_, Value::List(_)) => Err(list_compare_mismatch()),
        (Value::Dict(a), Value::Dict(b)) => {
            if op.is_identity() {
                return Ok(a.ptr_eq(b) != op.is_negated());
            }
            if !op.is_equality() {
                return Err(invalid_dict_operation());
            }
            Ok(values_equal(left, right, ignore_case) != op.is_negated())
        }
        (Value::Dict(_), _) | (_, Value::Dict(_)) => Err(dict_compare_mismatch()),
        _ if left.is_func() || right.is_func() => {
            if !op.is_equality() {
                return Err(invalid_func_operation());
            }
            let equal = match (left, right) {
                (Value::Partial(a), Value::Partial(b)) if op.is_identity() => {
                    std::rc::Rc::ptr_eq(a, b)
                }
                (Value::FuncRef(_), Value::FuncRef(_)) if op.is_identity() => {
                    values_equal(left, right, false)
                }
                _ if op.is_identity() => false,
                _ => values_equal(left, right, ignore_case),
            };
            Ok(equal != op.is_negated())
        }
        _ if op.is_pattern() => {
            let text = left.to_text()?;
            let pattern = right.to_text()?;
            let matched = matcher.is_match(&pattern, &text, ignore_case)?;
            Ok(matched != op.is_negated())
        }
        (Value::Float(_), _) | (_, Value::Float(_)) => {
            let (a, b) = (left.to_float()?, right.to_float()?);
            Ok(op.from_ordering(a.partial_cmp(&b)))
        }
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            let (a, b) = (left.to_number()?, right.to_number()?);
            Ok(op.from_ordering(Some(a.cmp(&b))))
        }
        _ => {
            let (a, b) = (left.to_text()?, right.to_text()?);
            Ok(op.from_ordering(Some(compare_str(&a, &b, ignore_case))))
        }
    }
}
