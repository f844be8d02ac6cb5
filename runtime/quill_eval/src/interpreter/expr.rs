//! Operator levels of the evaluator.
//!
//! Each level parses its own operators and calls the next tighter level:
//!
//! ```text
//! 1  a ? b : c
//! 2  a || b
//! 3  a && b
//! 4  a == b, a =~ b, a is b, ...   (one operator, not chained)
//! 5  a + b, a - b, a . b
//! 6  a * b, a / b, a % b
//! 7  ! - + prefixes, then a primary with postfix subscripts and calls
//! ```
//!
//! Every level takes `evaluate`. With `evaluate` false the full grammar is
//! still walked, so the end position and syntax errors come out the same,
//! but nothing is looked up, called or computed; the value returned is a
//! placeholder.

use quill_value::errors::missing_colon_in_ternary;
use quill_value::{EvalResult, Value};
use smallvec::SmallVec;

use super::Interpreter;
use crate::comparison::{compare_values, CompareOp};
use crate::operators::{evaluate_binary, BinaryOp};
use crate::parse::Cursor;
use crate::stack::ensure_sufficient_stack;
use crate::unary_operators::{evaluate_unary, UnaryOp};

/// Result of a level run in parse-only mode.
#[inline]
pub(crate) fn skipped() -> Value {
    Value::Number(0)
}

impl Interpreter {
    /// Parse and evaluate a full expression (level 1).
    pub(crate) fn eval_expression(&mut self, cur: &mut Cursor<'_>, evaluate: bool) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_ternary(cur, evaluate))
    }

    /// `cond ? a : b`; both branches are parsed, one is evaluated.
    fn eval_ternary(&mut self, cur: &mut Cursor<'_>, evaluate: bool) -> EvalResult {
        let cond = self.eval_or(cur, evaluate)?;
        cur.skip_white();
        if cur.peek() != Some(b'?') {
            return Ok(cond);
        }
        let take_first = evaluate && cond.is_truthy()?;
        cur.bump(1);
        cur.skip_white();
        let first = self.eval_expression(cur, take_first)?;
        cur.skip_white();
        if !cur.eat(b':') {
            return Err(missing_colon_in_ternary(cur.rest()));
        }
        cur.skip_white();
        let second = self.eval_expression(cur, evaluate && !take_first)?;
        Ok(match (evaluate, take_first) {
            (false, _) => skipped(),
            (true, true) => first,
            (true, false) => second,
        })
    }

    /// `a || b`, short-circuit.
    fn eval_or(&mut self, cur: &mut Cursor<'_>, evaluate: bool) -> EvalResult {
        ensure_sufficient_stack(|| {
            let left = self.eval_and(cur, evaluate)?;
            cur.skip_white();
            if !cur.starts_with("||") {
                return Ok(left);
            }
            let mut result = evaluate && left.is_truthy()?;
            while cur.eat_str("||") {
                cur.skip_white();
                let evaluate_right = evaluate && !result;
                let right = self.eval_and(cur, evaluate_right)?;
                if evaluate_right {
                    result = right.is_truthy()?;
                }
                cur.skip_white();
            }
            Ok(if evaluate { Value::truth(result) } else { skipped() })
        })
    }

    /// `a && b`, short-circuit.
    fn eval_and(&mut self, cur: &mut Cursor<'_>, evaluate: bool) -> EvalResult {
        ensure_sufficient_stack(|| {
            let left = self.eval_comparison(cur, evaluate)?;
            cur.skip_white();
            if !cur.starts_with("&&") {
                return Ok(left);
            }
            let mut result = evaluate && left.is_truthy()?;
            while cur.eat_str("&&") {
                cur.skip_white();
                let evaluate_right = evaluate && result;
                let right = self.eval_comparison(cur, evaluate_right)?;
                if evaluate_right {
                    result = right.is_truthy()?;
                }
                cur.skip_white();
            }
            Ok(if evaluate { Value::truth(result) } else { skipped() })
        })
    }

    /// One comparison operator; `a == b == c` is not chained.
    fn eval_comparison(&mut self, cur: &mut Cursor<'_>, evaluate: bool) -> EvalResult {
        ensure_sufficient_stack(|| {
            let left = self.eval_additive(cur, evaluate)?;
            cur.skip_white();
            let Some((op, case, len)) = CompareOp::parse(cur.rest()) else {
                return Ok(left);
            };
            cur.bump(len);
            cur.skip_white();
            let right = self.eval_additive(cur, evaluate)?;
            if !evaluate {
                return Ok(skipped());
            }
            let ignore_case = case.ignore_case(self.ignore_case());
            let result = compare_values(&left, &right, op, ignore_case, self.matcher.as_ref())?;
            Ok(Value::truth(result))
        })
    }

    /// `+`, `-` and `.` (also spelled `..`).
    fn eval_additive(&mut self, cur: &mut Cursor<'_>, evaluate: bool) -> EvalResult {
        ensure_sufficient_stack(|| {
            let mut left = self.eval_multiplicative(cur, evaluate)?;
            loop {
                cur.skip_white();
                let op = match cur.peek() {
                    Some(b'+') => BinaryOp::Add,
                    Some(b'-') => BinaryOp::Sub,
                    Some(b'.') => BinaryOp::Concat,
                    _ => break,
                };
                cur.bump(1);
                if op == BinaryOp::Concat {
                    cur.eat(b'.');
                }
                cur.skip_white();
                let right = self.eval_multiplicative(cur, evaluate)?;
                if evaluate {
                    left = evaluate_binary(&self.store, &left, &right, op)?;
                }
            }
            Ok(left)
        })
    }

    /// `*`, `/` and `%`.
    fn eval_multiplicative(&mut self, cur: &mut Cursor<'_>, evaluate: bool) -> EvalResult {
        ensure_sufficient_stack(|| {
            let mut left = self.eval_unary(cur, evaluate)?;
            loop {
                cur.skip_white();
                let op = match cur.peek() {
                    Some(b'*') => BinaryOp::Mul,
                    Some(b'/') => BinaryOp::Div,
                    Some(b'%') => BinaryOp::Mod,
                    _ => break,
                };
                cur.bump(1);
                cur.skip_white();
                let right = self.eval_unary(cur, evaluate)?;
                if evaluate {
                    left = evaluate_binary(&self.store, &left, &right, op)?;
                }
            }
            Ok(left)
        })
    }

    /// Prefix operators, applied after the operand and its postfix chain.
    fn eval_unary(&mut self, cur: &mut Cursor<'_>, evaluate: bool) -> EvalResult {
        ensure_sufficient_stack(|| {
            let mut leaders: SmallVec<[UnaryOp; 4]> = SmallVec::new();
            while let Some(op) = cur.peek().and_then(UnaryOp::from_byte) {
                leaders.push(op);
                cur.bump(1);
                cur.skip_white();
            }
            let value = self.eval_primary(cur, evaluate)?;
            if !evaluate {
                return Ok(skipped());
            }
            evaluate_unary(&value, &leaders)
        })
    }
}
