//! `lockvar` / `unlockvar` over nested values.

use crate::errors::{self, EvalError};
use crate::store::LockLevel;
use crate::value::Value;

/// Deepest nesting `lock_value` will follow.
pub const MAX_LOCK_NEST: usize = 100;

/// The lock level after a lock (`true`) or unlock (`false`) request.
///
/// Fixed never changes.
pub fn toggle_lock(level: LockLevel, lock: bool) -> LockLevel {
    match level {
        LockLevel::Fixed => LockLevel::Fixed,
        _ if lock => LockLevel::Locked,
        _ => LockLevel::Unlocked,
    }
}

/// Lock or unlock the container `value` refers to, `depth` levels deep.
///
/// Depth 0 does nothing, 1 changes the container itself, larger depths also
/// change each item slot and recurse into nested containers; a negative
/// depth has no limit. The slot holding `value` is the caller's business.
pub fn lock_value(value: &Value, depth: i32, lock: bool) -> Result<(), EvalError> {
    lock_nested(value, depth, lock, 0)
}

fn lock_nested(value: &Value, depth: i32, lock: bool, nest: usize) -> Result<(), EvalError> {
    if depth == 0 {
        return Ok(());
    }
    if nest >= MAX_LOCK_NEST {
        return Err(errors::lock_nested_too_deep());
    }
    let recurse = depth < 0 || depth > 1;
    match value {
        Value::List(list) => {
            list.set_lock_level(toggle_lock(list.lock_level(), lock));
            if recurse {
                for (index, slot) in list.slots().into_iter().enumerate() {
                    list.set_item_lock(index, toggle_lock(slot.lock, lock));
                    lock_nested(&slot.value, depth - 1, lock, nest + 1)?;
                }
            }
        }
        Value::Dict(dict) => {
            dict.set_lock_level(toggle_lock(dict.lock_level(), lock));
            if recurse {
                for (key, slot) in dict.slots() {
                    dict.set_entry_lock(&key, toggle_lock(slot.lock, lock));
                    lock_nested(&slot.value, depth - 1, lock, nest + 1)?;
                }
            }
        }
        Value::Number(_)
        | Value::Float(_)
        | Value::Str(_)
        | Value::Special(_)
        | Value::FuncRef(_)
        | Value::Partial(_) => {}
    }
    Ok(())
}

/// Whether a value is locked, given the lock of the slot holding it:
/// the slot itself or the container it refers to is `Locked`.
pub fn is_locked(slot_lock: LockLevel, value: &Value) -> bool {
    if slot_lock == LockLevel::Locked {
        return true;
    }
    match value {
        Value::List(list) => list.lock_level() == LockLevel::Locked,
        Value::Dict(dict) => dict.lock_level() == LockLevel::Locked,
        _ => false,
    }
}

#[cfg(test)]
mod tests;
