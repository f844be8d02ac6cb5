use std::rc::Rc;

use super::{Container, EntryMap, ItemFlags, LockLevel, Slot};
use crate::errors::{self, EvalError};
use crate::value::Value;

/// Whether a dict backs a variable scope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScopeMarker {
    /// An ordinary dict.
    #[default]
    None,
    /// A scope that needs its prefix (`s:`, `a:`, `v:`, host scopes).
    Scope,
    /// A scope used for unprefixed names (`g:`, `l:`).
    DefaultScope,
}

pub(crate) struct DictData {
    pub(crate) entries: EntryMap,
    pub(crate) scope: ScopeMarker,
}

impl DictData {
    pub(super) fn new(scope: ScopeMarker) -> Self {
        DictData {
            entries: EntryMap::default(),
            scope,
        }
    }
}

/// Shared handle to a dict container.
///
/// Clone is a retain; drop is a release.
#[derive(Clone)]
pub struct DictRef(Rc<Container<DictData>>);

impl DictRef {
    pub(crate) fn from_cell(cell: Rc<Container<DictData>>) -> Self {
        DictRef(cell)
    }

    pub(crate) fn cell(&self) -> &Rc<Container<DictData>> {
        &self.0
    }

    pub(super) fn fill(&self, entries: impl Iterator<Item = (String, Slot)>) {
        self.0.data.borrow_mut().entries.extend(entries);
    }

    pub(super) fn take_contents(&self) -> Option<EntryMap> {
        let mut data = self.0.data.try_borrow_mut().ok()?;
        Some(std::mem::take(&mut data.entries))
    }

    // Reads

    pub fn len(&self) -> usize {
        self.0.data.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.data.borrow().entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0
            .data
            .borrow()
            .entries
            .get(key)
            .map(|slot| slot.value.clone())
    }

    /// The whole slot for `key`: value, lock level and flags.
    pub fn slot(&self, key: &str) -> Option<Slot> {
        self.0.data.borrow().entries.get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.data.borrow().entries.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0.data.borrow().entries.keys().cloned().collect()
    }

    /// Values in insertion order.
    pub fn values(&self) -> Vec<Value> {
        self.0
            .data
            .borrow()
            .entries
            .values()
            .map(|slot| slot.value.clone())
            .collect()
    }

    /// Key/value pairs in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .data
            .borrow()
            .entries
            .iter()
            .map(|(key, slot)| (key.clone(), slot.value.clone()))
            .collect()
    }

    /// Key/slot pairs in insertion order.
    pub fn slots(&self) -> Vec<(String, Slot)> {
        self.0
            .data
            .borrow()
            .entries
            .iter()
            .map(|(key, slot)| (key.clone(), slot.clone()))
            .collect()
    }

    pub fn scope(&self) -> ScopeMarker {
        self.0.data.borrow().scope
    }

    pub fn lock_level(&self) -> LockLevel {
        self.0.lock.get()
    }

    /// Container identity.
    #[inline]
    pub fn ptr_eq(&self, other: &DictRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address usable as an identity key while the handle is alive.
    #[inline]
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }

    /// Number of live references to this container.
    pub fn refcount(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    // Lock checks

    /// Fail unless keys may be added or removed.
    pub fn check_structure(&self, key: &str) -> Result<(), EvalError> {
        match self.0.lock.get() {
            LockLevel::Unlocked => Ok(()),
            LockLevel::Locked => Err(errors::value_locked(key)),
            LockLevel::Fixed => Err(errors::value_fixed(key)),
        }
    }

    /// Fail unless the existing entry `key` may be assigned.
    pub fn check_entry(&self, key: &str) -> Result<(), EvalError> {
        if self.0.lock.get() == LockLevel::Fixed {
            return Err(errors::value_fixed(key));
        }
        let data = self.0.data.borrow();
        let Some(slot) = data.entries.get(key) else {
            return Ok(());
        };
        if slot.flags.contains(ItemFlags::READ_ONLY) {
            return Err(errors::read_only_variable(key));
        }
        match slot.lock {
            LockLevel::Unlocked => Ok(()),
            LockLevel::Locked => Err(errors::value_locked(key)),
            LockLevel::Fixed => Err(errors::value_fixed(key)),
        }
    }

    /// Fail unless `key` may be assigned, adding it if new.
    pub fn check_assign(&self, key: &str) -> Result<(), EvalError> {
        if self.contains_key(key) {
            self.check_entry(key)
        } else {
            self.check_structure(key)
        }
    }

    // Mutation

    /// Set `key` to `value`, adding the entry if needed.
    ///
    /// Returns the previous value so it is released outside the borrow.
    pub fn insert(&self, key: &str, value: Value) -> Result<Option<Value>, EvalError> {
        self.check_assign(key)?;
        let mut data = self.0.data.borrow_mut();
        if let Some(slot) = data.entries.get_mut(key) {
            return Ok(Some(std::mem::replace(&mut slot.value, value)));
        }
        data.entries.insert(key.to_string(), Slot::new(value));
        Ok(None)
    }

    /// Add or replace `key` with explicit flags.
    ///
    /// Entry flags and slot locks are not checked, and an existing key may be
    /// replaced in a `Locked` container; this is how the runtime fills scope
    /// dicts with read-only entries and updates `v:` variables.
    pub fn define(&self, key: &str, value: Value, flags: ItemFlags) -> Result<(), EvalError> {
        if self.0.lock.get() == LockLevel::Fixed || !self.contains_key(key) {
            self.check_structure(key)?;
        }
        let old = self
            .0
            .data
            .borrow_mut()
            .entries
            .insert(key.to_string(), Slot::with_flags(value, flags));
        drop(old);
        Ok(())
    }

    /// Remove `key`, returning its value if it existed.
    pub fn remove(&self, key: &str) -> Result<Option<Value>, EvalError> {
        let Some(slot) = self.slot(key) else {
            return Ok(None);
        };
        if slot.flags.contains(ItemFlags::FIXED) {
            return Err(errors::cannot_delete_variable(key));
        }
        if slot.flags.contains(ItemFlags::READ_ONLY) {
            return Err(errors::read_only_variable(key));
        }
        self.check_structure(key)?;
        if slot.lock.is_locked() {
            return Err(errors::value_locked(key));
        }
        let removed = self.0.data.borrow_mut().entries.shift_remove(key);
        Ok(removed.map(|slot| slot.value))
    }

    // Locking

    /// Mark the container fixed: it can never be mutated or unlocked again.
    pub fn fix(&self) {
        self.0.lock.set(LockLevel::Fixed);
    }

    /// Lock the container against new and removed keys.
    ///
    /// Used for scopes such as `v:` whose entries stay individually writable.
    pub fn seal(&self) {
        if self.0.lock.get() != LockLevel::Fixed {
            self.0.lock.set(LockLevel::Locked);
        }
    }

    pub(crate) fn set_lock_level(&self, level: LockLevel) {
        self.0.lock.set(level);
    }

    /// Set the lock level of the entry `key`, if present.
    pub fn set_entry_lock(&self, key: &str, level: LockLevel) {
        if let Some(slot) = self.0.data.borrow_mut().entries.get_mut(key) {
            slot.lock = level;
        }
    }

    // Collector hooks

    /// Stamp with the collector pass `id`; `false` if already stamped.
    pub fn stamp(&self, id: u32) -> bool {
        self.0.stamp(id)
    }

    /// Whether the pass `id` (or its kept-alive sub-pass) reached this dict.
    pub fn is_reached(&self, id: u32) -> bool {
        self.0.is_reached(id)
    }

    /// The exact stamp of the last pass that reached this dict.
    pub fn visit_id(&self) -> u32 {
        self.0.visit.get()
    }
}

impl std::fmt::Debug for DictRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Dict(self.clone()))
    }
}
