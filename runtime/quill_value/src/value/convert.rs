//! Scalar coercions.

use std::borrow::Cow;

use super::{Special, Value};
use crate::errors::{self, EvalError};

impl Value {
    /// Convert to a Number the way arithmetic and conditions do.
    ///
    /// Strings parse their numeric prefix (`"12abc"` is 12, `"abc"` is 0);
    /// specials are 1 for `v:true` and 0 otherwise.
    pub fn to_number(&self) -> Result<i64, EvalError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Str(s) => Ok(str_to_number(s)),
            Value::Special(Special::True) => Ok(1),
            Value::Special(Special::False | Special::Null) => Ok(0),
            Value::Float(_)
            | Value::List(_)
            | Value::Dict(_)
            | Value::FuncRef(_)
            | Value::Partial(_) => Err(errors::not_a_number(self.type_name())),
        }
    }

    /// Convert to a Float; only Numbers and Floats qualify.
    pub fn to_float(&self) -> Result<f64, EvalError> {
        match self {
            Value::Number(n) => Ok(*n as f64),
            Value::Float(f) => Ok(*f),
            _ => Err(errors::not_a_float(self.type_name())),
        }
    }

    /// Convert to text for keys, indexes and native arguments.
    ///
    /// Numbers become decimal and specials their `v:` name; floats,
    /// containers and functions are errors.
    pub fn to_text(&self) -> Result<Cow<'_, str>, EvalError> {
        match self {
            Value::Str(s) => Ok(Cow::Borrowed(s)),
            Value::Number(n) => Ok(Cow::Owned(n.to_string())),
            Value::Special(special) => Ok(Cow::Borrowed(special.name())),
            Value::Float(_)
            | Value::List(_)
            | Value::Dict(_)
            | Value::FuncRef(_)
            | Value::Partial(_) => Err(errors::not_a_string(self.type_name())),
        }
    }

    /// Convert an operand of `.` to text: only Strings and Numbers qualify.
    pub fn to_concat_text(&self) -> Result<Cow<'_, str>, EvalError> {
        match self {
            Value::Str(s) => Ok(Cow::Borrowed(s)),
            Value::Number(n) => Ok(Cow::Owned(n.to_string())),
            _ => Err(errors::not_a_string(self.type_name())),
        }
    }

    /// Truthiness for conditions: the value as a Number, non-zero is true.
    pub fn is_truthy(&self) -> Result<bool, EvalError> {
        Ok(self.to_number()? != 0)
    }
}

/// Parse the numeric prefix of `s`; text without one is 0.
pub fn str_to_number(s: &str) -> i64 {
    parse_number_prefix(s).0
}

/// Parse a number at the start of `s`, returning the value and the number of
/// bytes consumed (0 if `s` does not start with a number).
///
/// Accepts an optional `-`, then `0x`/`0X` hex, `0b`/`0B` binary, a leading
/// `0` followed only by octal digits as octal, or decimal. Values that do
/// not fit saturate.
pub fn parse_number_prefix(s: &str) -> (i64, usize) {
    let bytes = s.as_bytes();
    let mut pos = 0;
    let negative = bytes.first() == Some(&b'-');
    if negative {
        pos += 1;
    }
    let start = pos;

    let (radix, digits_start) = match (bytes.get(pos), bytes.get(pos + 1), bytes.get(pos + 2)) {
        (Some(b'0'), Some(b'x' | b'X'), Some(c)) if c.is_ascii_hexdigit() => (16, pos + 2),
        (Some(b'0'), Some(b'b' | b'B'), Some(b'0' | b'1')) => (2, pos + 2),
        (Some(b'0'), Some(c), _) if c.is_ascii_digit() => {
            let run = bytes[pos..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            if bytes[pos..pos + run].iter().all(|b| (b'0'..=b'7').contains(b)) {
                (8, pos + 1)
            } else {
                (10, pos)
            }
        }
        _ => (10, pos),
    };

    let mut end = digits_start;
    let mut magnitude: u64 = 0;
    let mut overflow = false;
    while let Some(&b) = bytes.get(end) {
        let Some(digit) = (b as char).to_digit(radix) else {
            break;
        };
        match magnitude
            .checked_mul(u64::from(radix))
            .and_then(|m| m.checked_add(u64::from(digit)))
        {
            Some(m) => magnitude = m,
            None => overflow = true,
        }
        end += 1;
    }

    if end == start {
        return (0, 0);
    }

    let value = if negative {
        if overflow || magnitude > i64::MAX as u64 {
            i64::MIN
        } else {
            -(magnitude as i64)
        }
    } else if overflow || magnitude > i64::MAX as u64 {
        i64::MAX
    } else {
        magnitude as i64
    };
    (value, end)
}

/// Parse a float at the start of `s`, returning the value and the number of
/// bytes consumed (0 if there is none).
///
/// Accepts `[-+]digits[.digits][e[-+]digits]`, `inf` and `nan`.
pub fn str_to_float(s: &str) -> (f64, usize) {
    let bytes = s.as_bytes();
    let mut pos = 0;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        pos += 1;
    }
    let rest = &s[pos..];
    let lower = rest.get(..3).map(str::to_ascii_lowercase);
    match lower.as_deref() {
        Some("inf") => {
            let f = if bytes.first() == Some(&b'-') {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            };
            return (f, pos + 3);
        }
        Some("nan") => return (f64::NAN, pos + 3),
        _ => {}
    }

    let int_digits = count_digits(&bytes[pos..]);
    if int_digits == 0 {
        return (0.0, 0);
    }
    pos += int_digits;
    if bytes.get(pos) == Some(&b'.') {
        let frac = count_digits(&bytes[pos + 1..]);
        if frac > 0 {
            pos += 1 + frac;
        }
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut exp = pos + 1;
        if matches!(bytes.get(exp), Some(b'-' | b'+')) {
            exp += 1;
        }
        let exp_digits = count_digits(&bytes[exp..]);
        if exp_digits > 0 {
            pos = exp + exp_digits;
        }
    }
    match s[..pos].parse::<f64>() {
        Ok(f) => (f, pos),
        Err(_) => (0.0, 0),
    }
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Format a float the way `string()` shows it: `%g`-like with six
/// significant digits, always carrying a `.0` in the mantissa.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let exponent = f.abs().log10().floor() as i32;
    if (-4..6).contains(&exponent) {
        let decimals = (5 - exponent).max(0) as usize;
        ensure_point(trim_zeros(format!("{f:.decimals$}")))
    } else {
        let formatted = format!("{f:.5e}");
        let (mantissa, exp) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
        let mantissa = ensure_point(trim_zeros(mantissa.to_string()));
        format!("{mantissa}e{exp}")
    }
}

fn trim_zeros(mut s: String) -> String {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

fn ensure_point(mut s: String) -> String {
    if !s.contains('.') {
        s.push_str(".0");
    }
    s
}
