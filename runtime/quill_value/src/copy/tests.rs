use pretty_assertions::assert_eq;

use super::*;
use crate::ErrorKind;

fn self_list(store: &ContainerStore) -> ListRef {
    let list = store.new_list();
    list.push(Value::List(list.clone())).unwrap();
    list
}

fn first_list(value: &Value) -> ListRef {
    value
        .as_list()
        .and_then(|l| l.get(0))
        .and_then(|v| v.as_list().cloned())
        .expect("first item is a list")
}

#[test]
fn shallow_copy_aliases_nested_containers() {
    let store = ContainerStore::new();
    let a = self_list(&store);
    let copy = shallow_copy(&store, &Value::List(a.clone()));
    let copy_list = copy.as_list().unwrap();
    assert!(!copy_list.ptr_eq(&a));
    assert!(first_list(&copy).ptr_eq(&a));
    a.remove(0).unwrap();
}

#[test]
fn shallow_copy_of_dict_shares_values() {
    let store = ContainerStore::new();
    let inner = store.new_list();
    let dict = store.dict_from([("x", Value::List(inner.clone()))]);
    let copy = shallow_copy(&store, &Value::Dict(dict.clone()));
    let copy_dict = copy.as_dict().unwrap();
    assert!(!copy_dict.ptr_eq(&dict));
    assert!(copy_dict
        .get("x")
        .and_then(|v| v.as_list().cloned())
        .is_some_and(|l| l.ptr_eq(&inner)));
}

#[test]
fn deep_copy_preserves_cycles() {
    let store = ContainerStore::new();
    let a = self_list(&store);
    let id = store.next_pass_id();
    let copy = deep_copy(&store, &Value::List(a.clone()), id).unwrap();
    let copy_list = copy.as_list().unwrap().clone();
    assert!(!copy_list.ptr_eq(&a));
    assert!(first_list(&copy).ptr_eq(&copy_list));
    a.remove(0).unwrap();
    copy_list.remove(0).unwrap();
}

#[test]
fn deep_copy_preserves_aliasing() {
    let store = ContainerStore::new();
    let shared = store.list_from([Value::number(1)]);
    let outer = store.list_from([Value::List(shared.clone()), Value::List(shared.clone())]);
    let id = store.next_pass_id();
    let copy = deep_copy(&store, &Value::List(outer), id).unwrap();
    let items = copy.as_list().unwrap().to_vec();
    let (x, y) = (items[0].as_list().unwrap(), items[1].as_list().unwrap());
    assert!(x.ptr_eq(y));
    assert!(!x.ptr_eq(&shared));
}

#[test]
fn deep_copy_without_memo_duplicates_aliases() {
    let store = ContainerStore::new();
    let shared = store.list_from([Value::number(1)]);
    let outer = store.list_from([Value::List(shared.clone()), Value::List(shared)]);
    let copy = deep_copy(&store, &Value::List(outer), 0).unwrap();
    let items = copy.as_list().unwrap().to_vec();
    assert!(!items[0].as_list().unwrap().ptr_eq(items[1].as_list().unwrap()));
    assert_eq!(items[0], items[1]);
}

#[test]
fn deep_copy_without_memo_fails_on_cycles() {
    let store = ContainerStore::new();
    let a = self_list(&store);
    let err = deep_copy(&store, &Value::List(a.clone()), 0).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecursionLimit);
    a.remove(0).unwrap();
}

#[test]
fn deep_copy_result_is_unlocked() {
    let store = ContainerStore::new();
    let list = store.list_from([Value::number(1)]);
    list.fix();
    let id = store.next_pass_id();
    let copy = deep_copy(&store, &Value::List(list), id).unwrap();
    copy.as_list().unwrap().push(Value::number(2)).unwrap();
}

#[test]
fn deep_copy_of_scalars_is_identity() {
    let store = ContainerStore::new();
    let id = store.next_pass_id();
    assert_eq!(
        deep_copy(&store, &Value::string("s"), id).unwrap(),
        Value::string("s")
    );
}
