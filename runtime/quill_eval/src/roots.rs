//! Host-registered collector roots.

use quill_value::Value;
use rustc_hash::FxHashMap;

/// Handle returned by [`Interpreter::register_root`](crate::Interpreter::register_root).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RootId(u64);

/// Values the host keeps alive across collections.
#[derive(Default)]
pub(crate) struct RootTable {
    last: u64,
    values: FxHashMap<RootId, Value>,
}

impl RootTable {
    pub(crate) fn register(&mut self, value: Value) -> RootId {
        self.last += 1;
        let id = RootId(self.last);
        self.values.insert(id, value);
        id
    }

    pub(crate) fn unregister(&mut self, id: RootId) -> Option<Value> {
        self.values.remove(&id)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }
}
