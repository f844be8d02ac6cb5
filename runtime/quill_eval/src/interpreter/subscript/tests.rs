use pretty_assertions::assert_eq;
use quill_value::ErrorKind;

use super::*;

fn list(store: &ContainerStore, items: &[i64]) -> Value {
    Value::List(store.list_from(items.iter().copied().map(Value::number)))
}

fn index(store: &ContainerStore, value: &Value, i: i64) -> EvalResult {
    index_value(store, value, Some(&Value::number(i)), None, false)
}

fn slice(store: &ContainerStore, value: &Value, first: Option<i64>, last: Option<i64>) -> String {
    let first = first.map(Value::number);
    let last = last.map(Value::number);
    index_value(store, value, first.as_ref(), last.as_ref(), true)
        .unwrap()
        .to_string()
}

#[test]
fn list_index_counts_from_either_end() {
    let store = ContainerStore::new();
    let l = list(&store, &[10, 20, 30]);
    assert_eq!(index(&store, &l, 0).unwrap(), Value::number(10));
    assert_eq!(index(&store, &l, -1).unwrap(), Value::number(30));
    let err = index(&store, &l, 3).unwrap_err();
    assert!(err.message.starts_with("E684"));
    let err = index(&store, &l, -4).unwrap_err();
    assert_eq!(err.message, "E684: list index out of range: -4");
}

#[test]
fn list_slices_clamp() {
    let store = ContainerStore::new();
    let l = list(&store, &[10, 20, 30]);
    assert_eq!(slice(&store, &l, Some(1), None), "[20, 30]");
    assert_eq!(slice(&store, &l, None, Some(0)), "[10]");
    assert_eq!(slice(&store, &l, Some(-2), Some(-1)), "[20, 30]");
    assert_eq!(slice(&store, &l, Some(0), Some(99)), "[10, 20, 30]");
    assert_eq!(slice(&store, &l, Some(5), None), "[]");
    assert_eq!(slice(&store, &l, Some(2), Some(1)), "[]");
    assert_eq!(slice(&store, &l, None, Some(-5)), "[]");
}

#[test]
fn list_slice_is_a_new_list() {
    let store = ContainerStore::new();
    let l = list(&store, &[1, 2]);
    let copy = index_value(&store, &l, None, None, true).unwrap();
    assert!(!copy.as_list().unwrap().ptr_eq(l.as_list().unwrap()));
    assert_eq!(copy.to_string(), "[1, 2]");
}

#[test]
fn strings_index_bytes_and_never_fail() {
    let store = ContainerStore::new();
    let s = Value::string("hello");
    assert_eq!(index(&store, &s, 1).unwrap(), Value::string("e"));
    assert_eq!(index(&store, &s, 10).unwrap(), Value::empty_string());
    assert_eq!(index(&store, &s, -1).unwrap(), Value::empty_string());
    assert_eq!(slice(&store, &s, Some(1), Some(3)), "'ell'");
    assert_eq!(slice(&store, &s, Some(-3), None), "'llo'");
    assert_eq!(slice(&store, &s, Some(3), Some(1)), "''");
    assert_eq!(slice(&store, &s, Some(-10), Some(1)), "'he'");
}

#[test]
fn numbers_index_their_decimal_text() {
    let store = ContainerStore::new();
    assert_eq!(index(&store, &Value::number(123), 0).unwrap(), Value::string("1"));
    assert_eq!(slice(&store, &Value::number(-45), Some(1), None), "'45'");
}

#[test]
fn dict_lookup_and_slice() {
    let store = ContainerStore::new();
    let dict = store.new_dict();
    dict.insert("k", Value::number(1)).unwrap();
    let d = Value::Dict(dict);
    let key = Value::string("k");
    assert_eq!(
        index_value(&store, &d, Some(&key), None, false).unwrap(),
        Value::number(1)
    );
    let missing = Value::string("q");
    let err = index_value(&store, &d, Some(&missing), None, false).unwrap_err();
    assert!(err.message.starts_with("E716"));
    let err = index_value(&store, &d, Some(&key), None, true).unwrap_err();
    assert!(err.message.starts_with("E719"));
}

#[test]
fn unindexable_values() {
    let store = ContainerStore::new();
    let err = index(&store, &Value::func_ref("len"), 0).unwrap_err();
    assert!(err.message.starts_with("E695"));
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(index(&store, &Value::float(1.5), 0).is_err());
    assert!(index(&store, &Value::boolean(true), 0).is_err());
}

#[test]
fn slice_bounds_for_strings() {
    assert_eq!(slice_bounds(5, None, None), Some((0, 5)));
    assert_eq!(slice_bounds(5, Some(-10), None), Some((0, 5)));
    assert_eq!(slice_bounds(5, Some(2), Some(2)), Some((2, 3)));
    assert_eq!(slice_bounds(5, Some(5), None), None);
    assert_eq!(slice_bounds(0, None, None), None);
}
