use std::rc::Rc;

use super::{Container, LockLevel, Slot};
use crate::errors::{self, EvalError};
use crate::value::Value;

/// Shared handle to a list container.
///
/// Clone is a retain; drop is a release.
#[derive(Clone)]
pub struct ListRef(Rc<Container<Vec<Slot>>>);

impl ListRef {
    pub(crate) fn from_cell(cell: Rc<Container<Vec<Slot>>>) -> Self {
        ListRef(cell)
    }

    pub(crate) fn cell(&self) -> &Rc<Container<Vec<Slot>>> {
        &self.0
    }

    pub(super) fn fill(&self, items: impl Iterator<Item = Slot>) {
        self.0.data.borrow_mut().extend(items);
    }

    pub(super) fn take_contents(&self) -> Option<Vec<Slot>> {
        let mut data = self.0.data.try_borrow_mut().ok()?;
        Some(std::mem::take(&mut *data))
    }

    // Reads

    pub fn len(&self) -> usize {
        self.0.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.data.borrow().is_empty()
    }

    /// Value at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.data.borrow().get(index).map(|slot| slot.value.clone())
    }

    /// Lock level of the item at `index`, if in range.
    pub fn item_lock(&self, index: usize) -> Option<LockLevel> {
        self.0.data.borrow().get(index).map(|slot| slot.lock)
    }

    /// Snapshot of the items.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0
            .data
            .borrow()
            .iter()
            .map(|slot| slot.value.clone())
            .collect()
    }

    /// Snapshot of the items with their lock levels.
    pub fn slots(&self) -> Vec<Slot> {
        self.0.data.borrow().clone()
    }

    pub fn lock_level(&self) -> LockLevel {
        self.0.lock.get()
    }

    /// Container identity.
    #[inline]
    pub fn ptr_eq(&self, other: &ListRef) -> bool {
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

    /// Fail unless items may be added, removed or reordered.
    pub fn check_structure(&self) -> Result<(), EvalError> {
        match self.0.lock.get() {
            LockLevel::Unlocked => Ok(()),
            LockLevel::Locked => Err(errors::value_locked("List")),
            LockLevel::Fixed => Err(errors::value_fixed("List")),
        }
    }

    /// Fail unless the item at `index` may be assigned.
    ///
    /// An out-of-range index is not a lock failure; callers check bounds.
    pub fn check_item(&self, index: usize) -> Result<(), EvalError> {
        if self.0.lock.get() == LockLevel::Fixed {
            return Err(errors::value_fixed("List"));
        }
        match self.item_lock(index) {
            Some(LockLevel::Locked) => Err(errors::value_locked("List item")),
            Some(LockLevel::Fixed) => Err(errors::value_fixed("List item")),
            _ => Ok(()),
        }
    }

    // Mutation

    pub fn push(&self, value: Value) -> Result<(), EvalError> {
        self.check_structure()?;
        self.0.data.borrow_mut().push(Slot::new(value));
        Ok(())
    }

    /// Insert before `index`; `index == len` appends.
    pub fn insert(&self, index: usize, value: Value) -> Result<(), EvalError> {
        self.check_structure()?;
        let mut data = self.0.data.borrow_mut();
        if index > data.len() {
            return Err(errors::list_index_out_of_range(index as i64));
        }
        data.insert(index, Slot::new(value));
        Ok(())
    }

    /// Replace the value at `index`, keeping the slot's lock level.
    ///
    /// Returns the previous value so it is released by the caller, outside
    /// the borrow.
    pub fn set(&self, index: usize, value: Value) -> Result<Value, EvalError> {
        self.check_item(index)?;
        let mut data = self.0.data.borrow_mut();
        let slot = data
            .get_mut(index)
            .ok_or_else(|| errors::list_index_out_of_range(index as i64))?;
        Ok(std::mem::replace(&mut slot.value, value))
    }

    /// Replace the items starting at `start` with `values`, all or nothing.
    ///
    /// Every target must exist and be assignable before anything changes.
    pub fn assign_range(&self, start: usize, values: &[Value]) -> Result<(), EvalError> {
        let end = start + values.len();
        if end > self.len() {
            return Err(errors::slice_has_more_items());
        }
        for index in start..end {
            self.check_item(index)?;
        }
        let old: Vec<Value> = {
            let mut data = self.0.data.borrow_mut();
            data[start..end]
                .iter_mut()
                .zip(values)
                .map(|(slot, value)| std::mem::replace(&mut slot.value, value.clone()))
                .collect()
        };
        drop(old);
        Ok(())
    }

    /// Remove and return the item at `index`.
    pub fn remove(&self, index: usize) -> Result<Value, EvalError> {
        self.check_structure()?;
        self.check_item(index)?;
        let mut data = self.0.data.borrow_mut();
        if index >= data.len() {
            return Err(errors::list_index_out_of_range(index as i64));
        }
        Ok(data.remove(index).value)
    }

    /// Remove items `start..=end` and return them.
    pub fn remove_range(&self, start: usize, end: usize) -> Result<Vec<Value>, EvalError> {
        self.check_structure()?;
        let len = self.len();
        if start >= len {
            return Err(errors::list_index_out_of_range(start as i64));
        }
        if end >= len || end < start {
            return Err(errors::list_index_out_of_range(end as i64));
        }
        for index in start..=end {
            self.check_item(index)?;
        }
        let removed: Vec<Value> = self
            .0
            .data
            .borrow_mut()
            .drain(start..=end)
            .map(|slot| slot.value)
            .collect();
        Ok(removed)
    }

    /// Insert `values` before `before`, or append when `None`.
    pub fn extend(&self, values: Vec<Value>, before: Option<usize>) -> Result<(), EvalError> {
        self.check_structure()?;
        let mut data = self.0.data.borrow_mut();
        let at = before.unwrap_or(data.len());
        if at > data.len() {
            return Err(errors::list_index_out_of_range(at as i64));
        }
        let tail = data.split_off(at);
        data.extend(values.into_iter().map(Slot::new));
        data.extend(tail);
        Ok(())
    }

    /// Reverse in place.
    pub fn reverse(&self) -> Result<(), EvalError> {
        self.check_structure()?;
        self.0.data.borrow_mut().reverse();
        Ok(())
    }

    // Locking

    /// Mark the container fixed: it can never be mutated or unlocked again.
    pub fn fix(&self) {
        self.0.lock.set(LockLevel::Fixed);
    }

    pub(crate) fn set_lock_level(&self, level: LockLevel) {
        self.0.lock.set(level);
    }

    /// Set the lock level of the item at `index`, if present.
    pub fn set_item_lock(&self, index: usize, level: LockLevel) {
        if let Some(slot) = self.0.data.borrow_mut().get_mut(index) {
            slot.lock = level;
        }
    }

    // Collector hooks

    /// Stamp with the collector pass `id`; `false` if already stamped.
    pub fn stamp(&self, id: u32) -> bool {
        self.0.stamp(id)
    }

    /// Whether the pass `id` (or its kept-alive sub-pass) reached this list.
    pub fn is_reached(&self, id: u32) -> bool {
        self.0.is_reached(id)
    }

    /// The exact stamp of the last pass that reached this list.
    pub fn visit_id(&self) -> u32 {
        self.0.visit.get()
    }
}

impl std::fmt::Debug for ListRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::List(self.clone()))
    }
}
