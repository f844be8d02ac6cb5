//! The `string()` form of values.

use std::fmt::{self, Write};

use super::{format_float, Value};

impl fmt::Display for Value {
    /// Render as `string()` does: strings quoted, containers bracketed,
    /// a container inside itself shown as `[...]` or `{...}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut open = Vec::new();
        write_value(f, self, &mut open)
    }
}

impl Value {
    /// Render as `echo` and `join()` do: a top-level String or Number is
    /// shown bare, everything else in its `string()` form.
    pub fn to_echo_string(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            Value::Number(n) => n.to_string(),
            _ => self.to_string(),
        }
    }
}

/// Quote `s` with single quotes, doubling embedded ones.
pub(crate) fn quote(out: &mut impl Write, s: &str) -> fmt::Result {
    out.write_char('\'')?;
    for c in s.chars() {
        if c == '\'' {
            out.write_str("''")?;
        } else {
            out.write_char(c)?;
        }
    }
    out.write_char('\'')
}

/// `open` holds the addresses of containers currently being written.
fn write_value(out: &mut impl Write, value: &Value, open: &mut Vec<usize>) -> fmt::Result {
    match value {
        Value::Number(n) => write!(out, "{n}"),
        Value::Float(x) => out.write_str(&format_float(*x)),
        Value::Str(s) => quote(out, s),
        Value::Special(special) => out.write_str(special.name()),
        Value::List(list) => {
            let addr = list.addr();
            if open.contains(&addr) {
                return out.write_str("[...]");
            }
            open.push(addr);
            out.write_char('[')?;
            for (i, item) in list.to_vec().iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write_value(out, item, open)?;
            }
            open.pop();
            out.write_char(']')
        }
        Value::Dict(dict) => {
            let addr = dict.addr();
            if open.contains(&addr) {
                return out.write_str("{...}");
            }
            open.push(addr);
            out.write_char('{')?;
            for (i, (key, item)) in dict.entries().iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                quote(out, key)?;
                out.write_str(": ")?;
                write_value(out, item, open)?;
            }
            open.pop();
            out.write_char('}')
        }
        Value::FuncRef(name) => {
            out.write_str("function(")?;
            quote(out, name)?;
            out.write_char(')')
        }
        Value::Partial(partial) => {
            out.write_str("function(")?;
            quote(out, partial.name())?;
            if !partial.args().is_empty() {
                out.write_str(", [")?;
                for (i, arg) in partial.args().iter().enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    write_value(out, arg, open)?;
                }
                out.write_char(']')?;
            }
            if let Some(receiver) = partial.receiver() {
                out.write_str(", ")?;
                write_value(out, &Value::Dict(receiver.clone()), open)?;
            }
            out.write_char(')')
        }
    }
}
