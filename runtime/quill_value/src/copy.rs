//! Shallow and deep copies.

use std::rc::Rc;

use crate::errors::{self, EvalError};
use crate::store::{ContainerStore, DictRef, ListRef};
use crate::value::Value;

/// Deepest container nesting a deep copy will follow.
pub const MAX_COPY_NEST: usize = 100;

/// Copy the top-level container of `value`; nested containers are shared.
///
/// Scalars and function values are returned as they are.
pub fn shallow_copy(store: &ContainerStore, value: &Value) -> Value {
    match value {
        Value::List(list) => Value::List(store.list_from(list.to_vec())),
        Value::Dict(dict) => Value::Dict(store.dict_from(dict.entries())),
        other => other.clone(),
    }
}

/// Copy `value` and every container nested in it.
///
/// With a non-zero `copy_id`, each source container remembers the copy made
/// of it during this pass, so a container reached twice is copied once and a
/// cycle in the source becomes the same cycle in the copy. With `copy_id`
/// zero every path is copied separately, and a cycle fails with `E698` once
/// nesting passes [`MAX_COPY_NEST`].
pub fn deep_copy(store: &ContainerStore, value: &Value, copy_id: u32) -> Result<Value, EvalError> {
    DeepCopy {
        store,
        copy_id,
        depth: 0,
    }
    .value(value)
}

struct DeepCopy<'a> {
    store: &'a ContainerStore,
    copy_id: u32,
    depth: usize,
}

impl DeepCopy<'_> {
    fn value(&mut self, value: &Value) -> Result<Value, EvalError> {
        match value {
            Value::List(list) => Ok(Value::List(self.list(list)?)),
            Value::Dict(dict) => Ok(Value::Dict(self.dict(dict)?)),
            other => Ok(other.clone()),
        }
    }

    fn list(&mut self, src: &ListRef) -> Result<ListRef, EvalError> {
        let cell = src.cell();
        if self.copy_id != 0 && cell.copy_stamp.get() == self.copy_id {
            if let Some(done) = cell.copy_target.borrow().upgrade() {
                return Ok(ListRef::from_cell(done));
            }
        }
        if self.depth >= MAX_COPY_NEST {
            return Err(errors::copy_nested_too_deep());
        }

        let dst = self.store.new_list();
        if self.copy_id != 0 {
            cell.copy_stamp.set(self.copy_id);
            *cell.copy_target.borrow_mut() = Rc::downgrade(dst.cell());
        }
        self.depth += 1;
        for item in src.to_vec() {
            let copied = self.value(&item)?;
            dst.push(copied)?;
        }
        self.depth -= 1;
        Ok(dst)
    }

    fn dict(&mut self, src: &DictRef) -> Result<DictRef, EvalError> {
        let cell = src.cell();
        if self.copy_id != 0 && cell.copy_stamp.get() == self.copy_id {
            if let Some(done) = cell.copy_target.borrow().upgrade() {
                return Ok(DictRef::from_cell(done));
            }
        }
        if self.depth >= MAX_COPY_NEST {
            return Err(errors::copy_nested_too_deep());
        }

        let dst = self.store.new_dict();
        if self.copy_id != 0 {
            cell.copy_stamp.set(self.copy_id);
            *cell.copy_target.borrow_mut() = Rc::downgrade(dst.cell());
        }
        self.depth += 1;
        for (key, item) in src.entries() {
            let copied = self.value(&item)?;
            dst.insert(&key, copied)?;
        }
        self.depth -= 1;
        Ok(dst)
    }
}

#[cfg(test)]
mod tests;
