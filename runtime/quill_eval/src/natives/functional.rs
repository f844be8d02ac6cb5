//! Natives that build, call or apply function values.

use std::rc::Rc;

use quill_value::errors::{
    dict_required, list_or_dict_required, list_required, unknown_function_reference,
};
use quill_value::{Callee, DictRef, EvalError, EvalResult, ListRef, Partial, Slot, Value};

use super::{is_native_name, NativeRegistry};
use crate::Interpreter;

pub(super) fn register(registry: &mut NativeRegistry) {
    registry.register("function", 1, 3, native_function);
    registry.register("call", 2, 3, native_call);
    registry.register("garbagecollect", 0, 1, native_garbagecollect);
    registry.register("map", 2, 2, native_map);
    registry.register("filter", 2, 2, native_filter);
}

/// `function(name | func [, arglist] [, dict])`.
///
/// With only a name this is a plain `FuncRef`, except that lambdas and
/// numbered dict functions are held directly so the reference keeps them
/// alive. Bound arguments are appended to an existing partial's and a dict
/// replaces its receiver.
fn native_function(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let (base_callee, mut bound, mut receiver) = match &args[0] {
        Value::Partial(partial) => (
            partial.callee().clone(),
            partial.args().to_vec(),
            partial.receiver().cloned(),
        ),
        Value::FuncRef(name) => (resolve_callee(interp, name)?, Vec::new(), None),
        other => {
            let name = other.to_text()?;
            (resolve_callee(interp, &name)?, Vec::new(), None)
        }
    };

    let (arglist, dict) = match (args.get(1), args.get(2)) {
        (None, _) => (None, None),
        (Some(Value::List(list)), None) => (Some(list), None),
        (Some(Value::Dict(dict)), None) => (None, Some(dict)),
        (Some(Value::List(list)), Some(Value::Dict(dict))) => (Some(list), Some(dict)),
        (Some(Value::List(_)), Some(_)) => return Err(dict_required()),
        (Some(_), _) => return Err(list_or_dict_required("function()")),
    };
    if let Some(list) = arglist {
        bound.extend(list.to_vec());
    }
    let explicit = dict.is_some();
    if let Some(dict) = dict {
        receiver = Some(dict.clone());
    }

    if arglist.is_none() && !explicit {
        if let Value::Partial(_) = &args[0] {
            return Ok(args[0].clone());
        }
    }
    let auto = match &args[0] {
        Value::Partial(partial) if !explicit => partial.is_auto_receiver(),
        _ => false,
    };
    match base_callee {
        Callee::Name(name) if bound.is_empty() && receiver.is_none() => Ok(Value::FuncRef(name)),
        callee => Ok(Value::partial(Partial::new(callee, bound, receiver, auto))),
    }
}

/// What `function('name')` refers to, failing with `E700` when nothing
/// by that name exists.
fn resolve_callee(interp: &Interpreter, name: &str) -> Result<Callee, EvalError> {
    if is_native_name(name) {
        return if interp.natives.contains(name) {
            Ok(Callee::Name(Rc::from(name)))
        } else {
            Err(unknown_function_reference(name))
        };
    }
    let canonical = interp.canonical_function_name(name);
    let function = interp
        .functions
        .get(&canonical)
        .ok_or_else(|| unknown_function_reference(name))?;
    if is_anonymous_name(&canonical) {
        Ok(Callee::Function(function))
    } else {
        Ok(Callee::Name(Rc::from(canonical)))
    }
}

/// `<lambda>N` or `N`.
fn is_anonymous_name(name: &str) -> bool {
    let digits = name.strip_prefix("<lambda>").unwrap_or(name);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `call(func, arglist [, dict])`.
fn native_call(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let arglist = args[1].as_list().ok_or_else(list_required)?.to_vec();
    let receiver = match args.get(2) {
        Some(value) => Some(value.as_dict().ok_or_else(dict_required)?.clone()),
        None => None,
    };
    match &args[0] {
        Value::Str(name) => interp.call_by_name(name, &arglist, receiver),
        func => interp.call_function_value(func, &arglist, receiver),
    }
}

/// `garbagecollect([atexit])` only requests a pass; it runs at the start of
/// the next top-level entry point.
fn native_garbagecollect(interp: &mut Interpreter, _: &[Value]) -> EvalResult {
    interp.request_gc();
    Ok(Value::number(0))
}

fn native_map(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    apply_each(interp, args, Apply::Map)?;
    Ok(args[0].clone())
}

fn native_filter(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    apply_each(interp, args, Apply::Filter)?;
    Ok(args[0].clone())
}

#[derive(Clone, Copy)]
enum Apply {
    Map,
    Filter,
}

/// Run `map()` or `filter()` over `args[0]` in place, with `v:key` and
/// `v:val` bound for each item and restored afterwards.
fn apply_each(interp: &mut Interpreter, args: &[Value], apply: Apply) -> Result<(), EvalError> {
    let saved = VimItemVars::save(interp.scopes.vim());
    let result = match &args[0] {
        Value::List(list) => {
            list.check_structure()?;
            apply_list(interp, list, &args[1], apply)
        }
        Value::Dict(dict) => apply_dict(interp, dict, &args[1], apply),
        _ => Err(list_or_dict_required(match apply {
            Apply::Map => "map()",
            Apply::Filter => "filter()",
        })),
    };
    saved.restore(interp.scopes.vim());
    result
}

fn apply_list(
    interp: &mut Interpreter,
    list: &ListRef,
    expr: &Value,
    apply: Apply,
) -> Result<(), EvalError> {
    let mut index = 0;
    while let Some(item) = list.get(index) {
        let key = Value::number(i64::try_from(index).unwrap_or(i64::MAX));
        let result = eval_item(interp, expr, key, item)?;
        match apply {
            Apply::Map => {
                list.set(index, result)?;
                index += 1;
            }
            Apply::Filter => {
                if result.is_truthy()? {
                    index += 1;
                } else {
                    list.remove(index)?;
                }
            }
        }
    }
    Ok(())
}

fn apply_dict(
    interp: &mut Interpreter,
    dict: &DictRef,
    expr: &Value,
    apply: Apply,
) -> Result<(), EvalError> {
    for key in dict.keys() {
        let Some(item) = dict.get(&key) else {
            continue;
        };
        let result = eval_item(interp, expr, Value::string(key.as_str()), item)?;
        match apply {
            Apply::Map => {
                dict.insert(&key, result)?;
            }
            Apply::Filter => {
                if !result.is_truthy()? {
                    dict.remove(&key)?;
                }
            }
        }
    }
    Ok(())
}

/// Evaluate the `map()`/`filter()` argument for one item: a string is an
/// expression over `v:key` and `v:val`, a function is called with
/// `(key, val)`.
fn eval_item(interp: &mut Interpreter, expr: &Value, key: Value, item: Value) -> EvalResult {
    interp.check_abort()?;
    let vim = interp.scopes.vim().clone();
    VimItemVars::bind(&vim, "key", key.clone())?;
    VimItemVars::bind(&vim, "val", item.clone())?;
    match expr {
        func if func.is_func() => interp.call_function_value(func, &[key, item], None),
        text => {
            let text = text.to_text()?.into_owned();
            interp.eval_complete(&text)
        }
    }
}

/// Saved `v:key` / `v:val`, so nested `map()` calls see their own.
struct VimItemVars {
    key: Option<Slot>,
    val: Option<Slot>,
}

impl VimItemVars {
    fn save(vim: &DictRef) -> Self {
        VimItemVars {
            key: vim.slot("key"),
            val: vim.slot("val"),
        }
    }

    fn bind(vim: &DictRef, name: &str, value: Value) -> Result<(), EvalError> {
        let flags = vim.slot(name).map(|slot| slot.flags).unwrap_or_default();
        vim.define(name, value, flags)
    }

    fn restore(self, vim: &DictRef) {
        for (name, slot) in [("key", self.key), ("val", self.val)] {
            if let Some(slot) = slot {
                if let Err(err) = vim.define(name, slot.value, slot.flags) {
                    tracing::warn!(error = %err, name, "could not restore v: variable");
                }
            }
        }
    }
}
