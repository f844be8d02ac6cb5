//! Runtime values.
//!
//! `Value` is a closed tagged union; every operation matches on it
//! exhaustively. Scalars are stored inline, strings are shared `Rc<str>`
//! (immutable, so sharing is invisible), and lists and dicts are handles into
//! the [`ContainerStore`](crate::ContainerStore).
//!
//! Holding a `List` or `Dict` value holds one reference on its container:
//! `clone` retains, `drop` releases. There is no way to hold a dangling
//! container reference.

mod convert;
mod display;

use std::rc::Rc;

use crate::function::Partial;
use crate::store::{DictRef, ListRef};

pub use convert::{format_float, parse_number_prefix, str_to_float, str_to_number};

/// The three special singletons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Special {
    False,
    True,
    Null,
}

impl Special {
    /// Name as written in scripts: `v:false`, `v:true`, `v:null`.
    pub fn name(self) -> &'static str {
        match self {
            Special::False => "v:false",
            Special::True => "v:true",
            Special::Null => "v:null",
        }
    }
}

/// Runtime value.
#[derive(Clone)]
pub enum Value {
    /// 64-bit signed integer.
    Number(i64),
    /// Double precision float.
    Float(f64),
    /// Immutable byte string (kept as UTF-8).
    Str(Rc<str>),
    /// `v:true`, `v:false` or `v:null`.
    Special(Special),
    /// Shared list container.
    List(ListRef),
    /// Shared dict container.
    Dict(DictRef),
    /// Reference to a function by name.
    FuncRef(Rc<str>),
    /// Function with bound arguments and/or receiver.
    Partial(Rc<Partial>),
}

/// `v:t_*` type codes, as returned by `type()`.
pub mod type_code {
    pub const NUMBER: i64 = 0;
    pub const STRING: i64 = 1;
    pub const FUNC: i64 = 2;
    pub const LIST: i64 = 3;
    pub const DICT: i64 = 4;
    pub const FLOAT: i64 = 5;
    pub const BOOL: i64 = 6;
    pub const NONE: i64 = 7;
}

impl Value {
    #[inline]
    pub fn number(n: i64) -> Self {
        Value::Number(n)
    }

    #[inline]
    pub fn float(f: f64) -> Self {
        Value::Float(f)
    }

    /// Create a string value.
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// The empty string.
    pub fn empty_string() -> Self {
        Value::Str(Rc::from(""))
    }

    /// `v:true` or `v:false`.
    #[inline]
    pub fn boolean(b: bool) -> Self {
        Value::Special(if b { Special::True } else { Special::False })
    }

    /// Number 1 or 0, the result type of comparisons and logic operators.
    #[inline]
    pub fn truth(b: bool) -> Self {
        Value::Number(i64::from(b))
    }

    #[inline]
    pub fn null() -> Self {
        Value::Special(Special::Null)
    }

    /// Reference a function by name.
    pub fn func_ref(name: impl Into<Rc<str>>) -> Self {
        Value::FuncRef(name.into())
    }

    pub fn partial(partial: Partial) -> Self {
        Value::Partial(Rc::new(partial))
    }

    /// Name used in error messages, as in `E745: Using a List as a Number`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Float(_) => "Float",
            Value::Str(_) => "String",
            Value::Special(_) => "Special",
            Value::List(_) => "List",
            Value::Dict(_) => "Dictionary",
            Value::FuncRef(_) | Value::Partial(_) => "Funcref",
        }
    }

    /// The `v:t_*` code reported by `type()`.
    pub fn type_code(&self) -> i64 {
        match self {
            Value::Number(_) => type_code::NUMBER,
            Value::Str(_) => type_code::STRING,
            Value::FuncRef(_) | Value::Partial(_) => type_code::FUNC,
            Value::List(_) => type_code::LIST,
            Value::Dict(_) => type_code::DICT,
            Value::Float(_) => type_code::FLOAT,
            Value::Special(Special::True | Special::False) => type_code::BOOL,
            Value::Special(Special::Null) => type_code::NONE,
        }
    }

    #[inline]
    pub fn is_func(&self) -> bool {
        matches!(self, Value::FuncRef(_) | Value::Partial(_))
    }

    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, Value::List(_) | Value::Dict(_))
    }

    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&DictRef> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the function a `FuncRef` or `Partial` calls.
    pub fn func_name(&self) -> Option<&str> {
        match self {
            Value::FuncRef(name) => Some(name),
            Value::Partial(partial) => Some(partial.name()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    /// Structural equality as `==#` sees it, except that variants never
    /// convert into each other.
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
            && crate::equality::values_equal(self, other, false)
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Float(x) => write!(f, "Float({})", format_float(*x)),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Special(s) => write!(f, "{}", s.name()),
            _ => write!(f, "{self}"),
        }
    }
}

#[cfg(test)]
mod tests;
