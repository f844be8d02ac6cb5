//! Quill Value - runtime values and the container store.
//!
//! This crate provides:
//! - [`Value`], the closed tagged union every expression evaluates to
//! - [`ContainerStore`] with the shared [`ListRef`] / [`DictRef`] containers,
//!   their lock levels and the collector's sweep hooks
//! - function, partial and call-frame data ([`UserFunction`], [`Partial`],
//!   [`CallFrame`])
//! - structural equality, shallow and deep copies, and recursive locking
//! - the error taxonomy ([`EvalError`], [`ErrorKind`]) and its factories
//!
//! Evaluation itself lives in `quill_eval`.

mod copy;
mod equality;
pub mod errors;
mod function;
mod lock;
mod store;
mod value;

pub use copy::{deep_copy, shallow_copy, MAX_COPY_NEST};
pub use equality::{str_equal, values_equal};
pub use errors::{ErrorKind, EvalError, EvalResult};
pub use function::{
    CallFrame, Callee, FunctionBody, FunctionDef, FunctionFlags, Partial, ScriptId, UserFunction,
};
pub use lock::{is_locked, lock_value, toggle_lock, MAX_LOCK_NEST};
pub use store::{
    ContainerStore, DictRef, EntryMap, Graveyard, ItemFlags, ListRef, LockLevel, ScopeMarker, Slot,
};
pub use value::{
    format_float, parse_number_prefix, str_to_float, str_to_number, type_code, Special, Value,
};
