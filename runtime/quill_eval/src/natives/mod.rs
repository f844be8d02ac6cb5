//! Native function registry.
//!
//! Natives are looked up by lowercase name. The call engine checks the
//! declared arity before dispatch, so an implementation can index its
//! arguments up to `min_args` without checking.

mod containers;
mod functional;
mod values;

use std::rc::Rc;

use quill_value::{EvalResult, Value};
use rustc_hash::FxHashMap;

use crate::Interpreter;

/// Signature shared by every native implementation.
pub type NativeFn = Rc<dyn Fn(&mut Interpreter, &[Value]) -> EvalResult>;

/// A native function and its accepted argument count.
#[derive(Clone)]
pub struct NativeFunction {
    pub min_args: usize,
    pub max_args: usize,
    pub func: NativeFn,
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeFunction")
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct NativeRegistry {
    table: FxHashMap<Rc<str>, NativeFunction>,
}

impl NativeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the core natives.
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        values::register(&mut registry);
        containers::register(&mut registry);
        functional::register(&mut registry);
        registry
    }

    /// Add or replace a native.
    pub fn register(
        &mut self,
        name: &str,
        min_args: usize,
        max_args: usize,
        func: impl Fn(&mut Interpreter, &[Value]) -> EvalResult + 'static,
    ) {
        self.table.insert(
            Rc::from(name),
            NativeFunction {
                min_args,
                max_args,
                func: Rc::new(func),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<NativeFunction> {
        self.table.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Whether `name` is looked up among natives rather than user functions:
/// it starts with a lowercase letter and has no scope prefix or `#`.
pub fn is_native_name(name: &str) -> bool {
    name.as_bytes().first().is_some_and(u8::is_ascii_lowercase)
        && !name.contains(':')
        && !name.contains('#')
}
