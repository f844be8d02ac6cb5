//! List and Dict natives.
//!
//! Mutating natives return their first argument so calls can be chained:
//! `add(add(l, 1), 2)`.

use quill_value::errors::{
    dict_required, invalid_argument, invalid_native_argument, key_already_exists,
    key_not_present, list_index_out_of_range, list_or_dict_required, list_required,
    range_start_past_end, range_stride_is_zero,
};
use quill_value::{values_equal, DictRef, EvalError, EvalResult, ListRef, Value};

use super::NativeRegistry;
use crate::Interpreter;

pub(super) fn register(registry: &mut NativeRegistry) {
    registry.register("add", 2, 2, native_add);
    registry.register("insert", 2, 3, native_insert);
    registry.register("remove", 2, 3, native_remove);
    registry.register("extend", 2, 3, native_extend);
    registry.register("keys", 1, 1, native_keys);
    registry.register("values", 1, 1, native_values);
    registry.register("items", 1, 1, native_items);
    registry.register("has_key", 2, 2, native_has_key);
    registry.register("get", 2, 3, native_get);
    registry.register("join", 1, 2, native_join);
    registry.register("range", 1, 3, native_range);
    registry.register("count", 2, 4, native_count);
    registry.register("index", 2, 4, native_index);
    registry.register("reverse", 1, 1, native_reverse);
}

fn list_arg(value: &Value) -> Result<&ListRef, EvalError> {
    value.as_list().ok_or_else(list_required)
}

fn dict_arg(value: &Value) -> Result<&DictRef, EvalError> {
    value.as_dict().ok_or_else(dict_required)
}

fn number(n: usize) -> Value {
    Value::number(i64::try_from(n).unwrap_or(i64::MAX))
}

/// Resolve a possibly negative index against `len`; `None` if it is still
/// out of `0..=max`.
fn resolve_index(index: i64, len: usize, max: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { len + index } else { index };
    usize::try_from(resolved).ok().filter(|&i| i <= max)
}

fn native_add(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    let list = list_arg(&args[0])?;
    list.push(args[1].clone())?;
    Ok(args[0].clone())
}

/// `insert(list, item [, idx])`: insert before `idx` (default 0); `idx`
/// equal to the length appends.
fn native_insert(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    let list = list_arg(&args[0])?;
    let written = match args.get(2) {
        Some(index) => index.to_number()?,
        None => 0,
    };
    let index = resolve_index(written, list.len(), list.len())
        .ok_or_else(|| list_index_out_of_range(written))?;
    list.insert(index, args[1].clone())?;
    Ok(args[0].clone())
}

/// `remove(list, idx [, end])` returns the item or a list of the removed
/// items; `remove(dict, key)` returns the value.
fn native_remove(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    match &args[0] {
        Value::List(list) => {
            let len = list.len();
            let written = args[1].to_number()?;
            let last = len.checked_sub(1).ok_or_else(|| list_index_out_of_range(written))?;
            let first = resolve_index(written, len, last)
                .ok_or_else(|| list_index_out_of_range(written))?;
            match args.get(2) {
                None => list.remove(first),
                Some(end) => {
                    let written_end = end.to_number()?;
                    let end = resolve_index(written_end, len, last)
                        .filter(|&end| end >= first)
                        .ok_or_else(|| list_index_out_of_range(written_end))?;
                    let removed = list.remove_range(first, end)?;
                    Ok(Value::List(interp.store.list_from(removed)))
                }
            }
        }
        Value::Dict(dict) => {
            if args.len() > 2 {
                return Err(invalid_native_argument("remove()"));
            }
            let key = args[1].to_text()?;
            dict.remove(&key)?.ok_or_else(|| key_not_present(&key))
        }
        _ => Err(list_or_dict_required("remove()")),
    }
}

/// `extend(list, list [, idx])` or `extend(dict, dict [, how])` where `how`
/// is `force` (default), `keep` or `error`.
fn native_extend(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    match (&args[0], &args[1]) {
        (Value::List(target), Value::List(source)) => {
            let before = match args.get(2) {
                Some(index) => {
                    let written = index.to_number()?;
                    Some(
                        resolve_index(written, target.len(), target.len())
                            .ok_or_else(|| list_index_out_of_range(written))?,
                    )
                }
                None => None,
            };
            target.extend(source.to_vec(), before)?;
        }
        (Value::Dict(target), Value::Dict(source)) => {
            let how = match args.get(2) {
                Some(how) => how.to_text()?.into_owned(),
                None => "force".to_string(),
            };
            let keep = match how.as_str() {
                "force" => false,
                "keep" => true,
                "error" => {
                    if let Some(key) = source.keys().into_iter().find(|k| target.contains_key(k)) {
                        return Err(key_already_exists(&key));
                    }
                    false
                }
                _ => return Err(invalid_argument(&how)),
            };
            for (key, value) in source.entries() {
                if keep && target.contains_key(&key) {
                    continue;
                }
                target.insert(&key, value)?;
            }
        }
        _ => return Err(list_or_dict_required("extend()")),
    }
    Ok(args[0].clone())
}

fn native_keys(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let dict = dict_arg(&args[0])?;
    let keys = dict.keys().into_iter().map(Value::string);
    Ok(Value::List(interp.store.list_from(keys)))
}

fn native_values(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let dict = dict_arg(&args[0])?;
    Ok(Value::List(interp.store.list_from(dict.values())))
}

/// `items(dict)`: a list of `[key, value]` pairs.
fn native_items(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let dict = dict_arg(&args[0])?;
    let pairs: Vec<Value> = dict
        .entries()
        .into_iter()
        .map(|(key, value)| Value::List(interp.store.list_from([Value::string(key), value])))
        .collect();
    Ok(Value::List(interp.store.list_from(pairs)))
}

fn native_has_key(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    let dict = dict_arg(&args[0])?;
    let key = args[1].to_text()?;
    Ok(Value::truth(dict.contains_key(&key)))
}

/// `get(list, idx [, default])`, `get(dict, key [, default])`, or a part
/// of a function value: `name`, `func`, `dict` or `args`.
fn native_get(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let default = || args.get(2).cloned().unwrap_or_else(|| Value::number(0));
    match &args[0] {
        Value::List(list) => {
            let written = args[1].to_number()?;
            Ok(list
                .len()
                .checked_sub(1)
                .and_then(|last| resolve_index(written, list.len(), last))
                .and_then(|index| list.get(index))
                .unwrap_or_else(default))
        }
        Value::Dict(dict) => {
            let key = args[1].to_text()?;
            Ok(dict.get(&key).unwrap_or_else(default))
        }
        func @ (Value::FuncRef(_) | Value::Partial(_)) => {
            let what = args[1].to_text()?;
            let partial = match func {
                Value::Partial(partial) => Some(partial),
                _ => None,
            };
            match what.as_ref() {
                "name" => Ok(Value::string(func.func_name().unwrap_or_default())),
                "func" => Ok(Value::func_ref(func.func_name().unwrap_or_default())),
                "dict" => Ok(partial
                    .and_then(|partial| partial.receiver())
                    .map_or_else(default, |dict| Value::Dict(dict.clone()))),
                "args" => {
                    let bound = partial.map(|partial| partial.args().to_vec()).unwrap_or_default();
                    Ok(Value::List(interp.store.list_from(bound)))
                }
                _ => Err(invalid_argument(&what)),
            }
        }
        _ => Err(list_or_dict_required("get()")),
    }
}

/// `join(list [, sep])`: items in their `echo` form, separated by `sep`
/// (default a space).
fn native_join(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    let list = list_arg(&args[0])?;
    let separator = match args.get(1) {
        Some(sep) => sep.to_text()?.into_owned(),
        None => " ".to_string(),
    };
    let parts: Vec<String> = list.to_vec().iter().map(Value::to_echo_string).collect();
    Ok(Value::string(parts.join(&separator)))
}

/// `range(n)` is `0..n`; `range(start, end [, stride])` includes `end`.
fn native_range(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let (start, end) = match args.get(1) {
        Some(end) => (args[0].to_number()?, end.to_number()?),
        None => (0, args[0].to_number()?.saturating_sub(1)),
    };
    let stride = match args.get(2) {
        Some(stride) => stride.to_number()?,
        None => 1,
    };
    if stride == 0 {
        return Err(range_stride_is_zero());
    }
    if (stride > 0 && end.saturating_add(1) < start) || (stride < 0 && end.saturating_sub(1) > start)
    {
        return Err(range_start_past_end());
    }
    let mut items = Vec::new();
    let mut current = start;
    while (stride > 0 && current <= end) || (stride < 0 && current >= end) {
        items.push(Value::number(current));
        match current.checked_add(stride) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(Value::List(interp.store.list_from(items)))
}

/// `count(list|dict, value [, ic [, start]])`.
fn native_count(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    let ignore_case = match args.get(2) {
        Some(flag) => flag.to_number()? != 0,
        None => false,
    };
    let needle = &args[1];
    let found = match &args[0] {
        Value::List(list) => {
            let start = match args.get(3) {
                Some(start) => {
                    let written = start.to_number()?;
                    list.len()
                        .checked_sub(1)
                        .and_then(|last| resolve_index(written, list.len(), last))
                        .ok_or_else(|| list_index_out_of_range(written))?
                }
                None => 0,
            };
            list.to_vec()
                .iter()
                .skip(start)
                .filter(|item| values_equal(item, needle, ignore_case))
                .count()
        }
        Value::Dict(dict) => {
            if args.len() > 3 {
                return Err(invalid_native_argument("count()"));
            }
            dict.values()
                .iter()
                .filter(|item| values_equal(item, needle, ignore_case))
                .count()
        }
        _ => return Err(list_or_dict_required("count()")),
    };
    Ok(number(found))
}

/// `index(list, value [, start [, ic]])`: the first matching index, or -1.
/// No conversion happens: `4` and `'4'` differ.
fn native_index(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    let list = list_arg(&args[0])?;
    let start = match args.get(2) {
        Some(start) => {
            let written = start.to_number()?;
            match list
                .len()
                .checked_sub(1)
                .and_then(|last| resolve_index(written, list.len(), last))
            {
                Some(start) => start,
                None => return Ok(Value::number(-1)),
            }
        }
        None => 0,
    };
    let ignore_case = match args.get(3) {
        Some(flag) => flag.to_number()? != 0,
        None => false,
    };
    let found = list
        .to_vec()
        .iter()
        .skip(start)
        .position(|item| values_equal(item, &args[1], ignore_case));
    Ok(found.map_or_else(|| Value::number(-1), |offset| number(start + offset)))
}

fn native_reverse(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    list_arg(&args[0])?.reverse()?;
    Ok(args[0].clone())
}
