//! Natives that inspect or copy a single value.

use quill_value::errors::invalid_len_argument;
use quill_value::{deep_copy, shallow_copy, EvalResult, Special, Value};

use super::NativeRegistry;
use crate::Interpreter;

pub(super) fn register(registry: &mut NativeRegistry) {
    registry.register("len", 1, 1, native_len);
    registry.register("empty", 1, 1, native_empty);
    registry.register("type", 1, 1, native_type);
    registry.register("string", 1, 1, native_string);
    registry.register("copy", 1, 1, native_copy);
    registry.register("deepcopy", 1, 2, native_deepcopy);
    registry.register("islocked", 1, 1, native_islocked);
    registry.register("exists", 1, 1, native_exists);
}

/// Length in bytes of a String or Number, or items of a List or Dict.
fn native_len(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    let len = match &args[0] {
        Value::Str(s) => s.len(),
        Value::Number(n) => n.to_string().len(),
        Value::List(list) => list.len(),
        Value::Dict(dict) => dict.len(),
        _ => return Err(invalid_len_argument()),
    };
    Ok(Value::number(i64::try_from(len).unwrap_or(i64::MAX)))
}

fn native_empty(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    let empty = match &args[0] {
        Value::Number(n) => *n == 0,
        Value::Float(f) => *f == 0.0,
        Value::Str(s) => s.is_empty(),
        Value::Special(special) => *special != Special::True,
        Value::List(list) => list.is_empty(),
        Value::Dict(dict) => dict.is_empty(),
        Value::FuncRef(name) => name.is_empty(),
        Value::Partial(_) => false,
    };
    Ok(Value::truth(empty))
}

fn native_type(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    Ok(Value::number(args[0].type_code()))
}

fn native_string(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    Ok(Value::string(args[0].to_string()))
}

fn native_copy(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    Ok(shallow_copy(&interp.store, &args[0]))
}

/// `deepcopy(value [, noref])`: with `noref` set, shared containers are
/// copied separately and a cycle is an error.
fn native_deepcopy(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let noref = match args.get(1) {
        Some(flag) => flag.to_number()? != 0,
        None => false,
    };
    let copy_id = if noref { 0 } else { interp.store.next_pass_id() };
    deep_copy(&interp.store, &args[0], copy_id)
}

fn native_islocked(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let target = args[0].to_text()?;
    let locked = interp.target_locked(&target)?;
    Ok(Value::truth(locked))
}

/// `exists('&opt')`, `exists('*Func')`, `exists('$ENV')` or a variable,
/// item or entry.
fn native_exists(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let text = args[0].to_text()?;
    let text = text.trim();
    let found = if let Some(option) = text.strip_prefix('&') {
        let option = option
            .strip_prefix("g:")
            .or_else(|| option.strip_prefix("l:"))
            .unwrap_or(option);
        interp.options.contains_key(option)
    } else if let Some(function) = text.strip_prefix('*') {
        interp.function_exists(function)
    } else if let Some(name) = text.strip_prefix('$') {
        std::env::var_os(name).is_some()
    } else {
        interp.target_exists(text)
    };
    Ok(Value::truth(found))
}
