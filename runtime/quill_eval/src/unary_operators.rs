//! Unary operator implementations for the evaluator.
//!
//! Leaders (`!`, `-`, `+`) are collected before the operand is parsed and
//! applied right-to-left afterwards. The operand is converted once: a Float
//! stays a Float (so `!1.5` is `0.0`), anything else must convert to a
//! Number.

use quill_value::{EvalResult, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

impl UnaryOp {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'!' => Some(UnaryOp::Not),
            b'-' => Some(UnaryOp::Neg),
            b'+' => Some(UnaryOp::Plus),
            _ => None,
        }
    }
}

/// Apply `leaders` (in source order) to `value`.
pub fn evaluate_unary(value: &Value, leaders: &[UnaryOp]) -> EvalResult {
    if leaders.is_empty() {
        return Ok(value.clone());
    }
    if let Value::Float(f) = value {
        let mut f = *f;
        for op in leaders.iter().rev() {
            match op {
                UnaryOp::Not => f = if f == 0.0 { 1.0 } else { 0.0 },
                UnaryOp::Neg => f = -f,
                UnaryOp::Plus => {}
            }
        }
        return Ok(Value::Float(f));
    }
    let mut n = value.to_number()?;
    for op in leaders.iter().rev() {
        match op {
            UnaryOp::Not => n = i64::from(n == 0),
            UnaryOp::Neg => n = n.wrapping_neg(),
            UnaryOp::Plus => {}
        }
    }
    Ok(Value::Number(n))
}
