//! The container store.
//!
//! Lists and dicts are shared, mutable, possibly cyclic containers. Each one
//! lives in an `Rc` cell so that cloning a [`Value`] is a retain and dropping
//! it is a release; an acyclic container is freed the moment its last holder
//! goes away.
//!
//! # Construction Enforcement
//!
//! Containers can only be created through [`ContainerStore::new_list`] and
//! [`ContainerStore::new_dict`] (and their convenience variants). The store
//! keeps a weak handle to every container it hands out, which is the
//! membership list the collector sweeps: reference counting alone can never
//! free a cycle, so the collector takes the contents of every container it
//! did not reach, and the cycle falls apart.
//!
//! ```text
//! let list = store.new_list();          // OK
//! let list = ListRef(Rc::new(...));     // ERROR: tuple field is private
//! ```

mod dict;
mod list;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::value::Value;

pub use dict::{DictRef, ScopeMarker};
pub use list::ListRef;

/// Insertion-ordered entry table backing a dict.
pub type EntryMap = IndexMap<String, Slot, FxBuildHasher>;

/// Mutability classification of a container or a slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LockLevel {
    /// Freely mutable.
    #[default]
    Unlocked,
    /// Locked by `lockvar`; `unlockvar` can undo it.
    Locked,
    /// Locked by the runtime itself; never changes again.
    Fixed,
}

impl LockLevel {
    /// Whether anything is locked at all.
    #[inline]
    pub fn is_locked(self) -> bool {
        self != LockLevel::Unlocked
    }
}

bitflags! {
    /// Per-entry flags for dict slots, used by scope dicts.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ItemFlags: u8 {
        /// The value cannot be changed.
        const READ_ONLY = 1 << 0;
        /// The entry cannot be removed.
        const FIXED = 1 << 1;
    }
}

/// One list item or dict entry.
#[derive(Clone)]
pub struct Slot {
    pub value: Value,
    pub lock: LockLevel,
    /// Always empty for list items.
    pub flags: ItemFlags,
}

impl Slot {
    pub fn new(value: Value) -> Self {
        Slot {
            value,
            lock: LockLevel::Unlocked,
            flags: ItemFlags::empty(),
        }
    }

    pub fn with_flags(value: Value, flags: ItemFlags) -> Self {
        Slot {
            value,
            lock: LockLevel::Unlocked,
            flags,
        }
    }
}

/// Shared cell behind both container kinds.
pub(crate) struct Container<T> {
    pub(crate) data: RefCell<T>,
    pub(crate) lock: Cell<LockLevel>,
    /// Collector visit stamp.
    pub(crate) visit: Cell<u32>,
    /// Deep-copy pass that last copied this container.
    pub(crate) copy_stamp: Cell<u32>,
    /// The copy made during `copy_stamp`'s pass.
    pub(crate) copy_target: RefCell<Weak<Container<T>>>,
}

impl<T> Container<T> {
    fn new(data: T) -> Self {
        Container {
            data: RefCell::new(data),
            lock: Cell::new(LockLevel::Unlocked),
            visit: Cell::new(0),
            copy_stamp: Cell::new(0),
            copy_target: RefCell::new(Weak::new()),
        }
    }

    /// Stamp with `id`; returns `false` if it already carried that stamp.
    pub(crate) fn stamp(&self, id: u32) -> bool {
        advance_stamp(&self.visit, id)
    }

    /// Whether a pass with `id` reached this container, counting the
    /// kept-alive sub-stamp `id + 1` as reached.
    pub(crate) fn is_reached(&self, id: u32) -> bool {
        (self.visit.get() & !1) == (id & !1)
    }
}

/// Move a visit stamp to `id`, returning `false` if nothing changed.
///
/// A stamp of `id` is never replaced by the kept-alive sub-stamp `id + 1`.
pub(crate) fn advance_stamp(visit: &Cell<u32>, id: u32) -> bool {
    let current = visit.get();
    if current == id || (id & 1 == 1 && current == id.wrapping_sub(1)) {
        false
    } else {
        visit.set(id);
        true
    }
}

/// Contents taken from unreachable containers.
///
/// Dropping the graveyard releases everything the dead containers held,
/// which is what finally frees the containers themselves.
#[derive(Default)]
pub struct Graveyard {
    lists: Vec<Vec<Slot>>,
    dicts: Vec<EntryMap>,
}

impl Graveyard {
    /// Number of containers whose contents were taken.
    pub fn len(&self) -> usize {
        self.lists.len() + self.dicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty() && self.dicts.is_empty()
    }

    /// Take a list's contents. A list that is currently borrowed is skipped.
    pub fn bury_list(&mut self, list: &ListRef) {
        if let Some(items) = list.take_contents() {
            self.lists.push(items);
        }
    }

    /// Take a dict's contents. A dict that is currently borrowed is skipped.
    pub fn bury_dict(&mut self, dict: &DictRef) {
        if let Some(entries) = dict.take_contents() {
            self.dicts.push(entries);
        }
    }
}

/// Registry of every live container, plus the id counter shared by the
/// collector and deep copy.
pub struct ContainerStore {
    lists: RefCell<Vec<Weak<Container<Vec<Slot>>>>>,
    dicts: RefCell<Vec<Weak<Container<dict::DictData>>>>,
    /// Registry length at which dead handles are pruned next.
    prune_at: Cell<usize>,
    allocations: Cell<u64>,
    last_id: Cell<u32>,
}

const MIN_PRUNE_AT: usize = 256;

impl Default for ContainerStore {
    fn default() -> Self {
        ContainerStore::new()
    }
}

impl ContainerStore {
    pub fn new() -> Self {
        ContainerStore {
            lists: RefCell::new(Vec::new()),
            dicts: RefCell::new(Vec::new()),
            prune_at: Cell::new(MIN_PRUNE_AT),
            allocations: Cell::new(0),
            last_id: Cell::new(0),
        }
    }

    /// Allocate an empty list.
    pub fn new_list(&self) -> ListRef {
        let cell = Rc::new(Container::new(Vec::new()));
        self.lists.borrow_mut().push(Rc::downgrade(&cell));
        self.note_allocation();
        ListRef::from_cell(cell)
    }

    /// Allocate a list holding `items`.
    pub fn list_from(&self, items: impl IntoIterator<Item = Value>) -> ListRef {
        let list = self.new_list();
        list.fill(items.into_iter().map(Slot::new));
        list
    }

    /// Allocate an empty dict.
    pub fn new_dict(&self) -> DictRef {
        self.new_marked_dict(ScopeMarker::None)
    }

    /// Allocate an empty dict that backs a variable scope.
    pub fn new_scope_dict(&self, marker: ScopeMarker) -> DictRef {
        self.new_marked_dict(marker)
    }

    /// Allocate a dict holding `entries`; later duplicates overwrite earlier ones.
    pub fn dict_from<K: Into<String>>(
        &self,
        entries: impl IntoIterator<Item = (K, Value)>,
    ) -> DictRef {
        let dict = self.new_dict();
        dict.fill(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), Slot::new(value))),
        );
        dict
    }

    fn new_marked_dict(&self, marker: ScopeMarker) -> DictRef {
        let cell = Rc::new(Container::new(dict::DictData::new(marker)));
        self.dicts.borrow_mut().push(Rc::downgrade(&cell));
        self.note_allocation();
        DictRef::from_cell(cell)
    }

    fn note_allocation(&self) {
        self.allocations.set(self.allocations.get().saturating_add(1));
        let len = self.lists.borrow().len() + self.dicts.borrow().len();
        if len >= self.prune_at.get() {
            self.prune();
        }
    }

    /// Containers allocated since the last sweep.
    pub fn allocations_since_sweep(&self) -> u64 {
        self.allocations.get()
    }

    /// Fresh id for a collector or deep-copy pass.
    ///
    /// Ids advance by two so `id + 1` is free for the collector's
    /// kept-alive sub-marking, and zero is never handed out.
    pub fn next_pass_id(&self) -> u32 {
        let mut id = self.last_id.get().wrapping_add(2) & !1;
        if id == 0 {
            id = 2;
        }
        self.last_id.set(id);
        id
    }

    /// Lists that are still allocated.
    pub fn live_lists(&self) -> usize {
        self.lists
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Dicts that are still allocated.
    pub fn live_dicts(&self) -> usize {
        self.dicts
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Take the contents of every container the pass `id` did not reach.
    ///
    /// Nothing is released until the returned graveyard is dropped, so the
    /// caller decides when the cascade of frees happens.
    pub fn sweep(&self, id: u32) -> Graveyard {
        let mut graveyard = Graveyard::default();
        let lists: Vec<ListRef> = self
            .lists
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .map(ListRef::from_cell)
            .collect();
        for list in &lists {
            if !list.is_reached(id) {
                graveyard.bury_list(list);
            }
        }
        let dicts: Vec<DictRef> = self
            .dicts
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .map(DictRef::from_cell)
            .collect();
        for dict in &dicts {
            if !dict.is_reached(id) {
                graveyard.bury_dict(dict);
            }
        }
        self.allocations.set(0);
        tracing::trace!(
            scanned_lists = lists.len(),
            scanned_dicts = dicts.len(),
            unreached = graveyard.len(),
            "container sweep"
        );
        graveyard
    }

    /// Forget handles of containers that have been freed.
    pub fn prune(&self) {
        let mut lists = self.lists.borrow_mut();
        lists.retain(|weak| weak.strong_count() > 0);
        let mut dicts = self.dicts.borrow_mut();
        dicts.retain(|weak| weak.strong_count() > 0);
        let len = lists.len() + dicts.len();
        self.prune_at.set((len * 2).max(MIN_PRUNE_AT));
    }
}

#[cfg(test)]
mod tests;
