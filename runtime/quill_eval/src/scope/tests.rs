use pretty_assertions::assert_eq;

use super::*;
use quill_value::{ErrorKind, LockLevel};

#[test]
fn split_prefixed_and_plain_names() {
    assert_eq!(
        split_name("g:count").unwrap(),
        VarName { scope: Some(ScopeKind::Global), name: "count" }
    );
    assert_eq!(split_name("x").unwrap(), VarName { scope: None, name: "x" });
    assert_eq!(
        split_name("a:000").unwrap(),
        VarName { scope: Some(ScopeKind::Argument), name: "000" }
    );
    assert_eq!(split_name("l:").unwrap().name, "");
}

#[test]
fn unknown_prefix_is_illegal() {
    let err = split_name("q:x").unwrap_err();
    assert_eq!(err.kind, ErrorKind::IllegalName);
    assert!(err.message.starts_with("E461"));
}

#[test]
fn valid_names() {
    assert!(is_valid_var_name("foo_1"));
    assert!(is_valid_var_name("auto#load#name"));
    assert!(!is_valid_var_name(""));
    assert!(!is_valid_var_name("a-b"));
    assert!(!is_valid_var_name("a.b"));
}

#[test]
fn vim_scope_is_sealed_with_writable_errmsg() {
    let store = ContainerStore::new();
    let scopes = ScopeTable::new(&store).unwrap();
    let vim = scopes.vim();
    assert_eq!(vim.lock_level(), LockLevel::Locked);
    vim.insert("errmsg", Value::string("E1")).unwrap();
    assert!(vim.insert("true", Value::number(1)).is_err());
    assert!(vim.insert("new", Value::number(1)).is_err());
    assert_eq!(vim.get("t_list"), Some(Value::number(3)));
}

#[test]
fn script_scopes_are_created_once() {
    let store = ContainerStore::new();
    let mut scopes = ScopeTable::new(&store).unwrap();
    let a = scopes.script(&store, ScriptId(1));
    let b = scopes.script(&store, ScriptId(1));
    let c = scopes.script(&store, ScriptId(2));
    assert!(a.ptr_eq(&b));
    assert!(!a.ptr_eq(&c));
    assert_eq!(scopes.roots().count(), 7);
}

#[test]
fn host_scopes_can_be_replaced() {
    let store = ContainerStore::new();
    let mut scopes = ScopeTable::new(&store).unwrap();
    let buffer = store.new_scope_dict(ScopeMarker::Scope);
    let old = scopes.set_host(ScopeKind::Buffer, buffer.clone()).unwrap();
    assert!(old.is_some());
    assert!(scopes.host(ScopeKind::Buffer).unwrap().ptr_eq(&buffer));
    assert!(scopes.set_host(ScopeKind::Global, buffer).is_err());
}
