use super::*;
use crate::store::ContainerStore;
use crate::ErrorKind;

#[test]
fn depth_zero_changes_nothing() {
    let store = ContainerStore::new();
    let list = store.new_list();
    lock_value(&Value::List(list.clone()), 0, true).unwrap();
    assert_eq!(list.lock_level(), LockLevel::Unlocked);
}

#[test]
fn depth_one_locks_only_the_container() {
    let store = ContainerStore::new();
    let inner = store.new_list();
    let outer = store.list_from([Value::List(inner.clone())]);
    lock_value(&Value::List(outer.clone()), 1, true).unwrap();
    assert_eq!(outer.lock_level(), LockLevel::Locked);
    assert_eq!(outer.item_lock(0), Some(LockLevel::Unlocked));
    assert_eq!(inner.lock_level(), LockLevel::Unlocked);
}

#[test]
fn depth_two_locks_items_and_their_containers() {
    let store = ContainerStore::new();
    let inner = store.new_list();
    let outer = store.list_from([Value::List(inner.clone())]);
    lock_value(&Value::List(outer.clone()), 2, true).unwrap();
    assert_eq!(outer.item_lock(0), Some(LockLevel::Locked));
    assert_eq!(inner.lock_level(), LockLevel::Locked);
}

#[test]
fn negative_depth_is_unlimited_and_unlock_reverses() {
    let store = ContainerStore::new();
    let deepest = store.new_dict();
    let middle = store.dict_from([("d", Value::Dict(deepest.clone()))]);
    let top = store.list_from([Value::Dict(middle.clone())]);
    lock_value(&Value::List(top.clone()), -1, true).unwrap();
    assert_eq!(deepest.lock_level(), LockLevel::Locked);
    assert_eq!(middle.slot("d").map(|s| s.lock), Some(LockLevel::Locked));

    lock_value(&Value::List(top.clone()), -1, false).unwrap();
    assert_eq!(deepest.lock_level(), LockLevel::Unlocked);
    assert_eq!(top.lock_level(), LockLevel::Unlocked);
}

#[test]
fn fixed_never_changes() {
    let store = ContainerStore::new();
    let list = store.new_list();
    list.fix();
    lock_value(&Value::List(list.clone()), 1, false).unwrap();
    assert_eq!(list.lock_level(), LockLevel::Fixed);
    assert_eq!(toggle_lock(LockLevel::Fixed, true), LockLevel::Fixed);
}

#[test]
fn self_reference_hits_the_nesting_limit() {
    let store = ContainerStore::new();
    let list = store.new_list();
    list.push(Value::List(list.clone())).unwrap();
    let err = lock_value(&Value::List(list.clone()), -1, true).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecursionLimit);
    list.set_lock_level(LockLevel::Unlocked);
    list.set_item_lock(0, LockLevel::Unlocked);
    list.remove(0).unwrap();
}

#[test]
fn is_locked_checks_slot_and_container() {
    let store = ContainerStore::new();
    let list = store.new_list();
    assert!(!is_locked(LockLevel::Unlocked, &Value::List(list.clone())));
    assert!(is_locked(LockLevel::Locked, &Value::number(1)));
    list.set_lock_level(LockLevel::Locked);
    assert!(is_locked(LockLevel::Unlocked, &Value::List(list)));
}
