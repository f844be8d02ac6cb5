use pretty_assertions::assert_eq;

use super::*;
use crate::ErrorKind;

fn numbers(list: &ListRef) -> Vec<i64> {
    list.to_vec()
        .iter()
        .map(|v| v.to_number().unwrap_or(-1))
        .collect()
}

// Allocation and refcounts

#[test]
fn test_clone_is_retain_and_drop_is_release() {
    let store = ContainerStore::new();
    let list = store.new_list();
    assert_eq!(list.refcount(), 1);
    let value = Value::List(list.clone());
    assert_eq!(list.refcount(), 2);
    drop(value);
    assert_eq!(list.refcount(), 1);
}

#[test]
fn test_acyclic_containers_free_immediately() {
    let store = ContainerStore::new();
    let list = store.list_from([Value::number(1)]);
    let dict = store.dict_from([("l", Value::List(list.clone()))]);
    assert_eq!(store.live_lists(), 1);
    assert_eq!(store.live_dicts(), 1);
    drop(list);
    drop(dict);
    assert_eq!(store.live_lists(), 0);
    assert_eq!(store.live_dicts(), 0);
}

#[test]
fn test_cycles_survive_refcounting() {
    let store = ContainerStore::new();
    let list = store.new_list();
    list.push(Value::List(list.clone())).unwrap();
    drop(list);
    assert_eq!(store.live_lists(), 1);

    // Nothing reached it under pass 2, so the sweep takes its contents.
    let graveyard = store.sweep(2);
    assert_eq!(graveyard.len(), 1);
    drop(graveyard);
    assert_eq!(store.live_lists(), 0);
}

#[test]
fn test_sweep_spares_stamped_containers() {
    let store = ContainerStore::new();
    let id = store.next_pass_id();
    let kept = store.list_from([Value::number(1)]);
    let sub = store.new_dict();
    assert!(kept.stamp(id));
    assert!(!kept.stamp(id));
    assert!(sub.stamp(id + 1));

    let graveyard = store.sweep(id);
    assert!(graveyard.is_empty());
    assert_eq!(numbers(&kept), vec![1]);
}

#[test]
fn test_stamp_is_not_downgraded() {
    let store = ContainerStore::new();
    let list = store.new_list();
    assert!(list.stamp(4));
    assert!(!list.stamp(5));
    assert_eq!(list.visit_id(), 4);
    assert!(list.stamp(6));
}

#[test]
fn test_pass_ids_advance_by_two() {
    let store = ContainerStore::new();
    let a = store.next_pass_id();
    let b = store.next_pass_id();
    assert_eq!(b, a + 2);
    assert_eq!(a % 2, 0);
    assert_ne!(a, 0);
}

#[test]
fn test_prune_forgets_dead_handles() {
    let store = ContainerStore::new();
    for _ in 0..10 {
        let _ = store.new_list();
    }
    store.prune();
    assert_eq!(store.live_lists(), 0);
    assert_eq!(store.lists.borrow().len(), 0);
}

// List mutation

#[test]
fn test_list_mutation() {
    let store = ContainerStore::new();
    let list = store.list_from([Value::number(1), Value::number(3)]);
    list.insert(1, Value::number(2)).unwrap();
    list.push(Value::number(4)).unwrap();
    assert_eq!(numbers(&list), vec![1, 2, 3, 4]);
    assert_eq!(list.remove(0).unwrap(), Value::number(1));
    let removed = list.remove_range(0, 1).unwrap();
    assert_eq!(removed, vec![Value::number(2), Value::number(3)]);
    assert_eq!(numbers(&list), vec![4]);
}

#[test]
fn test_list_extend_before() {
    let store = ContainerStore::new();
    let list = store.list_from([Value::number(1), Value::number(4)]);
    list.extend(vec![Value::number(2), Value::number(3)], Some(1))
        .unwrap();
    assert_eq!(numbers(&list), vec![1, 2, 3, 4]);
    let snapshot = list.to_vec();
    list.extend(snapshot, None).unwrap();
    assert_eq!(list.len(), 8);
}

#[test]
fn test_list_out_of_range() {
    let store = ContainerStore::new();
    let list = store.list_from([Value::number(1)]);
    assert_eq!(list.set(3, Value::number(0)).unwrap_err().kind, ErrorKind::Index);
    assert_eq!(list.remove(1).unwrap_err().kind, ErrorKind::Index);
    assert_eq!(list.insert(5, Value::number(0)).unwrap_err().kind, ErrorKind::Index);
}

#[test]
fn test_assign_range_is_all_or_nothing() {
    let store = ContainerStore::new();
    let list = store.list_from([Value::number(1), Value::number(2), Value::number(3)]);
    list.set_item_lock(2, LockLevel::Locked);
    let err = list
        .assign_range(1, &[Value::number(8), Value::number(9)])
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Locked);
    assert_eq!(numbers(&list), vec![1, 2, 3]);

    list.assign_range(0, &[Value::number(7), Value::number(8)])
        .unwrap();
    assert_eq!(numbers(&list), vec![7, 8, 3]);
}

// Locks

#[test]
fn test_locked_list_refuses_structure_but_not_values() {
    let store = ContainerStore::new();
    let list = store.list_from([Value::number(1)]);
    list.set_lock_level(LockLevel::Locked);
    assert!(list.push(Value::number(2)).is_err());
    assert!(list.remove(0).is_err());
    list.set(0, Value::number(5)).unwrap();
    assert_eq!(numbers(&list), vec![5]);
}

#[test]
fn test_fixed_list_refuses_everything() {
    let store = ContainerStore::new();
    let list = store.list_from([Value::number(1), Value::number(2)]);
    list.fix();
    for err in [
        list.push(Value::number(3)).unwrap_err(),
        list.set(0, Value::number(3)).unwrap_err(),
        list.remove(0).unwrap_err(),
        list.reverse().unwrap_err(),
        list.extend(vec![Value::number(3)], None).unwrap_err(),
        list.assign_range(0, &[Value::number(3)]).unwrap_err(),
    ] {
        assert_eq!(err.kind, ErrorKind::Locked);
    }
    assert_eq!(numbers(&list), vec![1, 2]);
}

#[test]
fn test_fixed_dict_refuses_everything() {
    let store = ContainerStore::new();
    let dict = store.dict_from([("a", Value::number(1))]);
    dict.fix();
    assert_eq!(dict.insert("a", Value::number(2)).unwrap_err().kind, ErrorKind::Locked);
    assert_eq!(dict.insert("b", Value::number(2)).unwrap_err().kind, ErrorKind::Locked);
    assert_eq!(dict.remove("a").unwrap_err().kind, ErrorKind::Locked);
    assert_eq!(dict.entries(), vec![("a".to_string(), Value::number(1))]);
}

#[test]
fn test_sealed_dict_keeps_entries_writable() {
    let store = ContainerStore::new();
    let dict = store.dict_from([("errmsg", Value::string(""))]);
    dict.seal();
    dict.insert("errmsg", Value::string("E1")).unwrap();
    assert!(dict.insert("other", Value::number(1)).is_err());
    assert_eq!(dict.get("errmsg"), Some(Value::string("E1")));
}

#[test]
fn test_dict_entry_flags() {
    let store = ContainerStore::new();
    let dict = store.new_dict();
    dict.define("ro", Value::number(1), ItemFlags::READ_ONLY)
        .unwrap();
    dict.define("fix", Value::number(2), ItemFlags::FIXED)
        .unwrap();
    let err = dict.insert("ro", Value::number(9)).unwrap_err();
    assert!(err.message.starts_with("E46"));
    let err = dict.remove("fix").unwrap_err();
    assert!(err.message.starts_with("E795"));
    dict.insert("fix", Value::number(3)).unwrap();
    assert_eq!(dict.get("fix"), Some(Value::number(3)));
}

#[test]
fn test_define_replaces_entries_of_sealed_dict() {
    let store = ContainerStore::new();
    let dict = store.new_dict();
    dict.define("val", Value::number(1), ItemFlags::READ_ONLY | ItemFlags::FIXED)
        .unwrap();
    dict.seal();
    dict.define("val", Value::number(2), ItemFlags::READ_ONLY | ItemFlags::FIXED)
        .unwrap();
    assert_eq!(dict.get("val"), Some(Value::number(2)));
    assert!(dict.define("new", Value::number(0), ItemFlags::empty()).is_err());
    let err = dict.remove("val").unwrap_err();
    assert!(err.message.starts_with("E795"));
}

// Dict ordering

#[test]
fn test_dict_keeps_insertion_order() {
    let store = ContainerStore::new();
    let dict = store.new_dict();
    for key in ["z", "a", "m"] {
        dict.insert(key, Value::string(key)).unwrap();
    }
    dict.remove("a").unwrap();
    dict.insert("b", Value::number(0)).unwrap();
    assert_eq!(dict.keys(), vec!["z", "m", "b"]);
}

#[test]
fn test_scope_marker() {
    let store = ContainerStore::new();
    assert_eq!(store.new_dict().scope(), ScopeMarker::None);
    assert_eq!(
        store.new_scope_dict(ScopeMarker::DefaultScope).scope(),
        ScopeMarker::DefaultScope
    );
}
