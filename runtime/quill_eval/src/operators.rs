//! Binary operator implementations for the evaluator.
//!
//! Provides direct enum-based dispatch for the additive and multiplicative
//! levels. The value set is closed, so pattern matching is preferred over
//! trait objects for exhaustiveness checking.
//!
//! Integer arithmetic wraps. Integer division and modulo by zero never fail:
//! division yields a saturation sentinel whose sign follows the dividend
//! (`i64::MIN` for `0 / 0`) and modulo yields zero.

use quill_value::errors::{float_modulo, wrong_variable_type};
use quill_value::{ContainerStore, EvalError, EvalResult, Value};

/// Additive and multiplicative operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Concat,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// Source spelling, as used in `E734: Wrong variable type for +=`.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Concat => ".",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

/// A numeric operand after coercion.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    #[expect(
        clippy::cast_precision_loss,
        reason = "Number to Float promotion is the language's rule"
    )]
    fn as_float(self) -> f64 {
        match self {
            Numeric::Int(n) => n as f64,
            Numeric::Float(f) => f,
        }
    }
}

/// Coerce an operand: Floats stay Floats, everything else must convert to a
/// Number.
fn numeric(value: &Value) -> Result<Numeric, EvalError> {
    match value {
        Value::Float(f) => Ok(Numeric::Float(*f)),
        other => other.to_number().map(Numeric::Int),
    }
}

/// Evaluate a binary operation using direct pattern matching.
///
/// `store` allocates the result of `List + List`.
pub fn evaluate_binary(
    store: &ContainerStore,
    left: &Value,
    right: &Value,
    op: BinaryOp,
) -> EvalResult {
    match op {
        BinaryOp::Concat => {
            let mut text = left.to_concat_text()?.into_owned();
            text.push_str(&right.to_concat_text()?);
            Ok(Value::string(text))
        }
        BinaryOp::Add => match (left, right) {
            (Value::List(a), Value::List(b)) => {
                let items = a.to_vec().into_iter().chain(b.to_vec());
                Ok(Value::List(store.list_from(items)))
            }
            _ => eval_numeric(numeric(left)?, numeric(right)?, op),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            eval_numeric(numeric(left)?, numeric(right)?, op)
        }
        BinaryOp::Mod => {
            let (a, b) = (numeric(left)?, numeric(right)?);
            match (a, b) {
                (Numeric::Int(a), Numeric::Int(b)) => Ok(Value::Number(int_mod(a, b))),
                _ => Err(float_modulo()),
            }
        }
    }
}

/// Apply a compound assignment `target op= rhs` (`+=`, `-=`, `.=`).
///
/// Returns the value to store back. `List += List` extends `target` in
/// place and returns it. Every other combination fails with `E734`.
pub fn evaluate_compound(target: &Value, rhs: &Value, op: BinaryOp) -> EvalResult {
    let wrong_type = || wrong_variable_type(op.symbol());
    if matches!(rhs, Value::FuncRef(_) | Value::Dict(_)) {
        return Err(wrong_type());
    }
    match target {
        Value::List(list) => match (op, rhs) {
            (BinaryOp::Add, Value::List(other)) => {
                list.extend(other.to_vec(), None)?;
                Ok(target.clone())
            }
            _ => Err(wrong_type()),
        },
        Value::Number(_) | Value::Str(_) => match (op, rhs) {
            (_, Value::List(_)) => Err(wrong_type()),
            (BinaryOp::Add | BinaryOp::Sub, Value::Float(f)) => {
                let n = Numeric::Int(target.to_number()?).as_float();
                Ok(Value::Float(eval_float(n, *f, op)))
            }
            (BinaryOp::Add | BinaryOp::Sub, _) => {
                Ok(Value::Number(eval_int(target.to_number()?, rhs.to_number()?, op)))
            }
            (BinaryOp::Concat, Value::Float(_)) => Err(wrong_type()),
            (BinaryOp::Concat, _) => {
                let mut text = target.to_text()?.into_owned();
                text.push_str(&rhs.to_text()?);
                Ok(Value::string(text))
            }
            _ => Err(wrong_type()),
        },
        Value::Float(f) => {
            let amount = match rhs {
                Value::Float(g) => *g,
                Value::Number(_) | Value::Str(_) => Numeric::Int(rhs.to_number()?).as_float(),
                _ => return Err(wrong_type()),
            };
            match op {
                BinaryOp::Add | BinaryOp::Sub => Ok(Value::Float(eval_float(*f, amount, op))),
                _ => Err(wrong_type()),
            }
        }
        Value::Dict(_) | Value::FuncRef(_) | Value::Partial(_) | Value::Special(_) => {
            Err(wrong_type())
        }
    }
}

fn eval_numeric(a: Numeric, b: Numeric, op: BinaryOp) -> EvalResult {
    match (a, b) {
        (Numeric::Int(a), Numeric::Int(b)) => Ok(Value::Number(eval_int(a, b, op))),
        _ => Ok(Value::Float(eval_float(a.as_float(), b.as_float(), op))),
    }
}

fn eval_int(a: i64, b: i64, op: BinaryOp) -> i64 {
    match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div => int_div(a, b),
        BinaryOp::Mod => int_mod(a, b),
        BinaryOp::Concat => 0,
    }
}

fn eval_float(a: f64, b: f64, op: BinaryOp) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Mod | BinaryOp::Concat => f64::NAN,
    }
}

/// Integer division with the saturating zero-divisor sentinels.
pub fn int_div(a: i64, b: i64) -> i64 {
    if b == 0 {
        return match a.signum() {
            0 => i64::MIN,
            1 => i64::MAX,
            _ => -i64::MAX,
        };
    }
    a.wrapping_div(b)
}

/// Integer remainder; zero when dividing by zero.
pub fn int_mod(a: i64, b: i64) -> i64 {
    if b == 0 {
        0
    } else {
        a.wrapping_rem(b)
    }
}

#[cfg(test)]
mod tests;
