//! Structural equality.
//!
//! Like `==`, but Strings and Numbers are different, and so are Floats and
//! Numbers. Lists and dicts compare item by item; a self-referencing
//! structure cannot loop forever because the walk carries a depth budget.
//! Each time the budget is hit it shrinks, and the structures are guessed
//! equal at that depth.

use crate::function::{Callee, Partial};
use crate::store::{DictRef, ListRef};
use crate::value::Value;

const RECURSE_LIMIT: usize = 1000;

/// Whether `a` and `b` are equal, optionally ignoring ASCII case in strings.
pub fn values_equal(a: &Value, b: &Value, ignore_case: bool) -> bool {
    let mut walk = EqualityWalk {
        depth: 0,
        limit: RECURSE_LIMIT,
        ignore_case,
    };
    walk.equal(a, b)
}

/// Whether two strings are equal, optionally ignoring ASCII case.
pub fn str_equal(a: &str, b: &str, ignore_case: bool) -> bool {
    if ignore_case {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

struct EqualityWalk {
    depth: usize,
    limit: usize,
    ignore_case: bool,
}

impl EqualityWalk {
    #[allow(clippy::float_cmp)]
    fn equal(&mut self, a: &Value, b: &Value) -> bool {
        if self.depth >= self.limit {
            self.limit = self.limit.saturating_sub(1);
            return true;
        }
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x == y,
            (Value::Str(x), Value::Str(y)) => str_equal(x, y, self.ignore_case),
            (Value::Special(x), Value::Special(y)) => x == y,
            (Value::List(x), Value::List(y)) => self.nested(|walk| walk.lists(x, y)),
            (Value::Dict(x), Value::Dict(y)) => self.nested(|walk| walk.dicts(x, y)),
            (
                Value::FuncRef(_) | Value::Partial(_),
                Value::FuncRef(_) | Value::Partial(_),
            ) => self.nested(|walk| walk.functions(a, b)),
            _ => false,
        }
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self) -> bool) -> bool {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn lists(&mut self, a: &ListRef, b: &ListRef) -> bool {
        if a.ptr_eq(b) {
            return true;
        }
        if a.len() != b.len() {
            return false;
        }
        let (xs, ys) = (a.to_vec(), b.to_vec());
        xs.iter().zip(&ys).all(|(x, y)| self.equal(x, y))
    }

    fn dicts(&mut self, a: &DictRef, b: &DictRef) -> bool {
        if a.ptr_eq(b) {
            return true;
        }
        if a.len() != b.len() {
            return false;
        }
        a.entries().iter().all(|(key, x)| match b.get(key) {
            Some(y) => self.equal(x, &y),
            None => false,
        })
    }

    /// Same function, same bound receiver, same bound arguments.
    fn functions(&mut self, a: &Value, b: &Value) -> bool {
        if a.func_name() != b.func_name() {
            return false;
        }
        let (pa, pb) = (as_partial(a), as_partial(b));
        if let (Some(x), Some(y)) = (pa, pb) {
            if let (Callee::Function(f), Callee::Function(g)) = (x.callee(), y.callee()) {
                if !std::rc::Rc::ptr_eq(f, g) {
                    return false;
                }
            }
        }
        match (pa.and_then(Partial::receiver), pb.and_then(Partial::receiver)) {
            (None, None) => {}
            (Some(x), Some(y)) => {
                if !self.dicts(x, y) {
                    return false;
                }
            }
            _ => return false,
        }
        let args_a = pa.map_or(&[][..], Partial::args);
        let args_b = pb.map_or(&[][..], Partial::args);
        args_a.len() == args_b.len() && args_a.iter().zip(args_b).all(|(x, y)| self.equal(x, y))
    }
}

fn as_partial(value: &Value) -> Option<&Partial> {
    match value {
        Value::Partial(partial) => Some(partial),
        _ => None,
    }
}
