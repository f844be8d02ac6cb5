//! Assignment targets: `let`, `unlet`, `lockvar` and host `assign`.
//!
//! A target is parsed twice. The first pass runs in skip mode and only finds
//! where the target text ends; the right-hand side is evaluated next, and
//! only then is the target resolved against live values. Subscripts in the
//! target therefore see the effects of the right-hand side, the order
//! scripts rely on.

use std::rc::Rc;

use quill_value::errors::{
    cannot_index_for_assignment, cannot_slice_dict, fewer_targets_than_items,
    funcref_name_not_capitalized, illegal_variable_name, internal_error, invalid_argument,
    key_not_present, list_index_out_of_range, list_required, more_targets_than_items,
    no_such_variable, option_name_missing, slice_has_fewer_items, slice_has_more_items,
    slice_requires_list, trailing_characters, undefined_variable, unknown_option,
    wrong_variable_type,
};
use quill_value::{
    is_locked, lock_value, toggle_lock, DictRef, EvalError, ListRef, ScopeMarker, Value,
};

use super::expr::skipped;
use super::primary::{is_key_byte, register_name, scan_name};
use super::Interpreter;
use crate::operators::{evaluate_compound, BinaryOp};
use crate::parse::Cursor;
use crate::scope::is_valid_var_name;

/// Default `lockvar` depth.
const DEFAULT_LOCK_DEPTH: i32 = 2;

/// A resolved assignment target.
#[derive(Debug)]
pub(crate) enum LValue {
    Variable(String),
    ListItem {
        list: ListRef,
        index: usize,
    },
    /// `list[first : last]`; an open end covers the rest of the list.
    ListRange {
        list: ListRef,
        first: usize,
        last: Option<usize>,
    },
    DictEntry {
        dict: DictRef,
        key: String,
    },
    Option(String),
    Register(char),
    Env(String),
}

/// One subscript of a target, before it is applied.
enum Access {
    Key(String),
    Index {
        first: Option<Value>,
        last: Option<Value>,
        is_slice: bool,
    },
}

impl Interpreter {
    /// `let {target} {op} {expr}` and `let [a, b; rest] {op} {expr}`.
    pub(crate) fn let_command(&mut self, args: &str) -> Result<(), EvalError> {
        let mut cur = Cursor::new(args);
        cur.skip_white();
        if cur.peek() == Some(b'[') {
            return self.let_destructure(&mut cur);
        }
        let start = cur.pos();
        self.parse_lvalue(&mut cur, false)?;
        let target = cur.since(start);
        cur.skip_white();
        let op = parse_assign_op(&mut cur).ok_or_else(|| invalid_argument(args))?;
        let value = self.eval_rhs(&mut cur)?;
        let lvalue = self.resolve_lvalue(target)?;
        self.store_lvalue(&lvalue, value, op)
    }

    /// Host-side assignment of `value` to the target written in `target`.
    pub(crate) fn assign_text(&mut self, target: &str, value: Value) -> Result<(), EvalError> {
        let mut cur = Cursor::new(target);
        cur.skip_white();
        let lvalue = self
            .parse_lvalue(&mut cur, true)?
            .ok_or_else(|| internal_error("unresolved assignment target"))?;
        cur.skip_white();
        if !cur.at_end() {
            return Err(trailing_characters(cur.rest()));
        }
        self.store_lvalue(&lvalue, value, None)
    }

    fn let_destructure(&mut self, cur: &mut Cursor<'_>) -> Result<(), EvalError> {
        let text = cur.text();
        let (targets, rest) = self.parse_target_list(cur)?;
        cur.skip_white();
        let op = parse_assign_op(cur).ok_or_else(|| invalid_argument(text))?;
        let value = self.eval_rhs(cur)?;
        self.assign_targets(&targets, rest, &value, op)
    }

    /// Assign `value` to a `[a, b; rest]` pattern, as `for` does per item.
    pub(super) fn assign_pattern(&mut self, pattern: &str, value: &Value) -> Result<(), EvalError> {
        let mut cur = Cursor::new(pattern);
        let (targets, rest) = self.parse_target_list(&mut cur)?;
        cur.skip_white();
        if !cur.at_end() {
            return Err(trailing_characters(cur.rest()));
        }
        self.assign_targets(&targets, rest, value, None)
    }

    /// `[a, b; rest]`, validated in skip mode; the cursor is on the `[`.
    fn parse_target_list<'a>(
        &mut self,
        cur: &mut Cursor<'a>,
    ) -> Result<(Vec<&'a str>, Option<&'a str>), EvalError> {
        let text = cur.text();
        cur.bump(1);
        let mut targets = Vec::new();
        let mut rest = None;
        loop {
            cur.skip_white();
            let start = cur.pos();
            self.parse_lvalue(cur, false)?;
            targets.push(cur.since(start));
            cur.skip_white();
            if cur.eat(b';') {
                cur.skip_white();
                let start = cur.pos();
                self.parse_lvalue(cur, false)?;
                rest = Some(cur.since(start));
                cur.skip_white();
                if !cur.eat(b']') {
                    return Err(invalid_argument(text));
                }
                break;
            }
            if cur.eat(b']') {
                break;
            }
            if !cur.eat(b',') {
                return Err(invalid_argument(text));
            }
        }
        Ok((targets, rest))
    }

    fn assign_targets(
        &mut self,
        targets: &[&str],
        rest: Option<&str>,
        value: &Value,
        op: Option<BinaryOp>,
    ) -> Result<(), EvalError> {
        let Value::List(list) = value else {
            return Err(list_required());
        };
        let items = list.to_vec();
        if items.len() < targets.len() {
            return Err(more_targets_than_items());
        }
        if items.len() > targets.len() && rest.is_none() {
            return Err(fewer_targets_than_items());
        }

        // Resolve and check every target before assigning any.
        let mut resolved = Vec::with_capacity(targets.len() + 1);
        for (target, item) in targets.iter().zip(&items) {
            let lvalue = self.resolve_lvalue(target)?;
            self.check_lvalue(&lvalue, item)?;
            resolved.push((lvalue, item.clone()));
        }
        if let Some(target) = rest {
            let tail = Value::List(self.store.list_from(items[targets.len()..].iter().cloned()));
            let lvalue = self.resolve_lvalue(target)?;
            self.check_lvalue(&lvalue, &tail)?;
            resolved.push((lvalue, tail));
        }
        for (lvalue, item) in resolved {
            self.store_lvalue(&lvalue, item, op)?;
        }
        Ok(())
    }

    /// The right-hand side of `let`; a trailing `"` comment is allowed.
    fn eval_rhs(&mut self, cur: &mut Cursor<'_>) -> Result<Value, EvalError> {
        cur.skip_white();
        let value = self.eval_expression(cur, true)?;
        cur.skip_white();
        if !cur.at_end() && cur.peek() != Some(b'"') {
            return Err(trailing_characters(cur.rest()));
        }
        Ok(value)
    }

    /// Resolve target text that a skip-mode pass already validated.
    pub(super) fn resolve_lvalue(&mut self, target: &str) -> Result<LValue, EvalError> {
        let mut cur = Cursor::new(target);
        self.parse_lvalue(&mut cur, true)?
            .ok_or_else(|| internal_error("unresolved assignment target"))
    }

    /// Parse one target. Returns `None` in skip mode.
    pub(super) fn parse_lvalue(
        &mut self,
        cur: &mut Cursor<'_>,
        evaluate: bool,
    ) -> Result<Option<LValue>, EvalError> {
        let start = cur.pos();
        match cur.peek() {
            Some(b'&') => {
                cur.bump(1);
                if cur.starts_with("g:") || cur.starts_with("l:") {
                    cur.bump(2);
                }
                let name = cur.take_while(|b| b.is_ascii_alphanumeric() || b == b'_');
                if name.is_empty() {
                    return Err(option_name_missing(cur.since(start)));
                }
                return Ok(evaluate.then(|| LValue::Option(name.to_string())));
            }
            Some(b'@') => {
                cur.bump(1);
                let name = register_name(cur.next_char());
                return Ok(evaluate.then_some(LValue::Register(name)));
            }
            Some(b'$') => {
                cur.bump(1);
                let name = cur.take_while(|b| b.is_ascii_alphanumeric() || b == b'_');
                if name.is_empty() {
                    return Err(invalid_argument(cur.since(start)));
                }
                return Ok(evaluate.then(|| LValue::Env(name.to_string())));
            }
            _ => {}
        }

        let name = scan_name(cur);
        if name.is_empty() {
            return Err(illegal_variable_name(cur.rest()));
        }
        if !at_subscript(cur) {
            return Ok(evaluate.then(|| LValue::Variable(name.to_string())));
        }
        let mut container = if evaluate {
            self.get_var(name)?
        } else {
            skipped()
        };
        loop {
            let access = self.parse_access(cur, evaluate)?;
            if !at_subscript(cur) {
                if !evaluate {
                    return Ok(None);
                }
                return resolve_access(container, access).map(Some);
            }
            if evaluate {
                container = match access {
                    Access::Key(key) => match &container {
                        Value::Dict(dict) => dict.get(&key).ok_or_else(|| key_not_present(&key))?,
                        other => return Err(cannot_index_for_assignment(other.type_name())),
                    },
                    Access::Index {
                        first,
                        last,
                        is_slice,
                    } => super::index_value(
                        &self.store,
                        &container,
                        first.as_ref(),
                        last.as_ref(),
                        is_slice,
                    )?,
                };
            }
        }
    }

    /// `.key`, `[expr]` or `[expr : expr]`.
    fn parse_access(&mut self, cur: &mut Cursor<'_>, evaluate: bool) -> Result<Access, EvalError> {
        if cur.eat(b'.') {
            return Ok(Access::Key(cur.take_while(is_key_byte).to_string()));
        }
        let start = cur.pos();
        cur.bump(1);
        cur.skip_white();
        let first = if cur.peek() == Some(b':') {
            None
        } else {
            Some(self.eval_expression(cur, evaluate)?)
        };
        cur.skip_white();
        let is_slice = cur.eat(b':');
        let mut last = None;
        if is_slice {
            cur.skip_white();
            if cur.peek() != Some(b']') {
                last = Some(self.eval_expression(cur, evaluate)?);
                cur.skip_white();
            }
        }
        if !cur.eat(b']') {
            return Err(invalid_argument(cur.since(start)));
        }
        Ok(Access::Index {
            first,
            last,
            is_slice,
        })
    }

    /// Checks a destructuring assignment runs on every target up front.
    fn check_lvalue(&mut self, lvalue: &LValue, value: &Value) -> Result<(), EvalError> {
        match lvalue {
            LValue::Variable(name) => {
                let slot = self.var_slot_for_write(name)?;
                self.check_var_assign(&slot, name, value)
            }
            LValue::ListItem { list, index } => list.check_item(*index),
            LValue::DictEntry { dict, key } => dict.check_assign(key),
            LValue::ListRange { .. }
            | LValue::Option(_)
            | LValue::Register(_)
            | LValue::Env(_) => Ok(()),
        }
    }

    /// Store `value` into a resolved target; `op` makes it `+=`, `-=` or `.=`.
    fn store_lvalue(
        &mut self,
        lvalue: &LValue,
        value: Value,
        op: Option<BinaryOp>,
    ) -> Result<(), EvalError> {
        match lvalue {
            LValue::Variable(name) => {
                let value = match op {
                    Some(op) => {
                        let current = self.get_var(name)?;
                        let updated = evaluate_compound(&current, &value, op)?;
                        if same_list(&current, &updated) {
                            return Ok(());
                        }
                        updated
                    }
                    None => value,
                };
                self.set_var(name, value)
            }
            LValue::ListItem { list, index } => {
                list.check_item(*index)?;
                let value = match op {
                    Some(op) => {
                        let current = list
                            .get(*index)
                            .ok_or_else(|| list_index_out_of_range(*index as i64))?;
                        let updated = evaluate_compound(&current, &value, op)?;
                        if same_list(&current, &updated) {
                            return Ok(());
                        }
                        updated
                    }
                    None => value,
                };
                list.set(*index, value).map(drop)
            }
            LValue::ListRange { list, first, last } => {
                assign_list_range(list, *first, *last, &value, op)
            }
            LValue::DictEntry { dict, key } => {
                let value = match op {
                    Some(op) => {
                        let current = dict.get(key).ok_or_else(|| key_not_present(key))?;
                        let updated = evaluate_compound(&current, &value, op)?;
                        if same_list(&current, &updated) {
                            return Ok(());
                        }
                        updated
                    }
                    None => value,
                };
                if dict.scope() != ScopeMarker::None && !is_valid_var_name(key) {
                    return Err(illegal_variable_name(key));
                }
                if dict.scope() == ScopeMarker::DefaultScope
                    && value.is_func()
                    && !key.as_bytes().first().is_some_and(u8::is_ascii_uppercase)
                {
                    return Err(funcref_name_not_capitalized(key));
                }
                dict.insert(key, value).map(drop)
            }
            LValue::Option(name) => {
                let current = self
                    .options
                    .get(name)
                    .cloned()
                    .ok_or_else(|| unknown_option(name))?;
                let value = match op {
                    Some(op) => evaluate_compound(&current, &value, op)?,
                    None => value,
                };
                let value = match current {
                    Value::Number(_) => Value::number(value.to_number()?),
                    Value::Str(_) => Value::string(value.to_text()?.as_ref()),
                    _ => value,
                };
                tracing::trace!(option = %name, "option set");
                self.options.insert(name.clone(), value);
                Ok(())
            }
            LValue::Register(name) => {
                let current = self.registers.get(name).map(|text| text.to_string());
                let text = append_text(current, &value, op)?;
                self.registers.insert(*name, Rc::from(text));
                Ok(())
            }
            LValue::Env(name) => {
                let text = append_text(std::env::var(name).ok(), &value, op)?;
                std::env::set_var(name, text);
                Ok(())
            }
        }
    }

    /// `unlet[!] {target} ...`
    pub(crate) fn unlet_command(&mut self, args: &str, force: bool) -> Result<(), EvalError> {
        for target in self.split_targets(args)? {
            match self.resolve_lvalue(target)? {
                LValue::Variable(name) => self.remove_var(&name, force)?,
                LValue::DictEntry { dict, key } => {
                    if dict.remove(&key)?.is_none() && !force {
                        return Err(key_not_present(&key));
                    }
                }
                LValue::ListItem { list, index } => {
                    list.remove(index)?;
                }
                LValue::ListRange { list, first, last } => {
                    let len = list.len();
                    let last = match last {
                        Some(last) => last,
                        None if first < len => len - 1,
                        None => continue,
                    };
                    list.remove_range(first, last)?;
                }
                LValue::Env(name) => std::env::remove_var(name),
                LValue::Option(_) | LValue::Register(_) => {
                    return Err(invalid_argument(target));
                }
            }
        }
        Ok(())
    }

    /// `lockvar[!] [depth] {target} ...` and `unlockvar`.
    ///
    /// The bang means unlimited depth.
    pub(crate) fn lock_command(
        &mut self,
        args: &str,
        force: bool,
        lock: bool,
    ) -> Result<(), EvalError> {
        let mut cur = Cursor::new(args);
        cur.skip_white();
        let depth = if force {
            -1
        } else if cur.peek().is_some_and(|b| b.is_ascii_digit()) {
            let digits = cur.take_while(|b| b.is_ascii_digit());
            digits
                .parse::<i32>()
                .map_err(|_| invalid_argument(digits))?
        } else {
            DEFAULT_LOCK_DEPTH
        };
        for target in self.split_targets(cur.rest())? {
            match self.resolve_lvalue(target)? {
                LValue::Variable(name) => {
                    let (dict, key) = self
                        .var_location(&name)?
                        .ok_or_else(|| no_such_variable(&name))?;
                    let Some(slot) = dict.slot(&key) else {
                        return Err(no_such_variable(&name));
                    };
                    dict.set_entry_lock(&key, toggle_lock(slot.lock, lock));
                    lock_value(&slot.value, depth, lock)?;
                }
                LValue::DictEntry { dict, key } => {
                    let slot = dict.slot(&key).ok_or_else(|| key_not_present(&key))?;
                    dict.set_entry_lock(&key, toggle_lock(slot.lock, lock));
                    lock_value(&slot.value, depth, lock)?;
                }
                LValue::ListItem { list, index } => lock_list_items(&list, index, index, depth, lock)?,
                LValue::ListRange { list, first, last } => {
                    let Some(last) = last.or_else(|| list.len().checked_sub(1)) else {
                        continue;
                    };
                    lock_list_items(&list, first, last, depth, lock)?;
                }
                LValue::Option(_) | LValue::Register(_) | LValue::Env(_) => {
                    return Err(invalid_argument(target));
                }
            }
        }
        Ok(())
    }

    /// Whether the variable, item or entry written in `target` is locked,
    /// for `islocked()`.
    pub(crate) fn target_locked(&mut self, target: &str) -> Result<bool, EvalError> {
        let mut cur = Cursor::new(target);
        cur.skip_white();
        let start = cur.pos();
        self.parse_lvalue(&mut cur, false)?;
        let text = cur.since(start);
        cur.skip_white();
        if !cur.at_end() {
            return Err(trailing_characters(cur.rest()));
        }
        let slot = match self.resolve_lvalue(text)? {
            LValue::Variable(name) => {
                let (dict, key) = self
                    .var_location(&name)?
                    .ok_or_else(|| undefined_variable(&name))?;
                dict.slot(&key).ok_or_else(|| undefined_variable(&name))?
            }
            LValue::DictEntry { dict, key } => {
                dict.slot(&key).ok_or_else(|| key_not_present(&key))?
            }
            LValue::ListItem { list, index } => {
                let (Some(lock), Some(value)) = (list.item_lock(index), list.get(index)) else {
                    return Err(list_index_out_of_range(index as i64));
                };
                return Ok(is_locked(lock, &value));
            }
            LValue::ListRange { .. } | LValue::Option(_) | LValue::Register(_) | LValue::Env(_) => {
                return Err(invalid_argument(target));
            }
        };
        Ok(is_locked(slot.lock, &slot.value))
    }

    /// Whether the variable, item or entry written in `target` exists, for
    /// `exists()`. Anything that fails to resolve does not exist.
    pub(crate) fn target_exists(&mut self, target: &str) -> bool {
        let mut cur = Cursor::new(target);
        let start = cur.pos();
        if self.parse_lvalue(&mut cur, false).is_err() || !cur.at_end() {
            return false;
        }
        match self.resolve_lvalue(cur.since(start)) {
            Ok(LValue::Variable(name)) => matches!(self.lookup_var(&name), Ok(Some(_))),
            Ok(LValue::DictEntry { dict, key }) => dict.contains_key(&key),
            Ok(LValue::ListItem { .. }) => true,
            Ok(_) | Err(_) => false,
        }
    }

    /// Split whitespace-separated targets, validating each in skip mode.
    fn split_targets<'a>(&mut self, args: &'a str) -> Result<Vec<&'a str>, EvalError> {
        let mut cur = Cursor::new(args);
        let mut targets = Vec::new();
        loop {
            cur.skip_white();
            if cur.at_end() || cur.peek() == Some(b'"') {
                break;
            }
            let start = cur.pos();
            self.parse_lvalue(&mut cur, false)?;
            if cur.peek().is_some_and(|b| !matches!(b, b' ' | b'\t' | b'"')) {
                return Err(trailing_characters(cur.rest()));
            }
            targets.push(cur.since(start));
        }
        if targets.is_empty() {
            return Err(invalid_argument(args));
        }
        Ok(targets)
    }
}

/// An `=`, `+=`, `-=`, `.=` or `..=` operator; `Some(None)` is plain `=`.
fn parse_assign_op(cur: &mut Cursor<'_>) -> Option<Option<BinaryOp>> {
    let op = if cur.starts_with("==") {
        return None;
    } else if cur.eat(b'=') {
        None
    } else if cur.eat_str("+=") {
        Some(BinaryOp::Add)
    } else if cur.eat_str("-=") {
        Some(BinaryOp::Sub)
    } else if cur.eat_str("..=") || cur.eat_str(".=") {
        Some(BinaryOp::Concat)
    } else {
        return None;
    };
    Some(op)
}

fn at_subscript(cur: &Cursor<'_>) -> bool {
    match cur.peek() {
        Some(b'[') => true,
        Some(b'.') => cur.peek_at(1).is_some_and(is_key_byte),
        _ => false,
    }
}

/// Turn the last subscript of a target into a slot reference.
fn resolve_access(container: Value, access: Access) -> Result<LValue, EvalError> {
    match (container, access) {
        (Value::Dict(dict), Access::Key(key)) => Ok(LValue::DictEntry { dict, key }),
        (Value::Dict(_), Access::Index { is_slice: true, .. }) => Err(cannot_slice_dict()),
        (Value::Dict(dict), Access::Index { first, .. }) => {
            let key = match first {
                Some(key) => key.to_text()?.into_owned(),
                None => String::new(),
            };
            Ok(LValue::DictEntry { dict, key })
        }
        (
            Value::List(list),
            Access::Index {
                first,
                last,
                is_slice,
            },
        ) => {
            let len = list.len() as i64;
            let written = first.as_ref().map(Value::to_number).transpose()?.unwrap_or(0);
            let first = if written < 0 { len + written } else { written };
            if !is_slice {
                let index = usize::try_from(first)
                    .ok()
                    .filter(|&index| index < list.len())
                    .ok_or_else(|| list_index_out_of_range(written))?;
                return Ok(LValue::ListItem { list, index });
            }
            let last = match last {
                Some(last) => {
                    let written = last.to_number()?;
                    let resolved = if written < 0 { len + written } else { written };
                    if resolved < first || resolved >= len {
                        return Err(list_index_out_of_range(written));
                    }
                    Some(resolved)
                }
                None => None,
            };
            // An open-ended range may start just past the end, to append.
            let limit = if last.is_some() { len - 1 } else { len };
            if first < 0 || first > limit {
                return Err(list_index_out_of_range(written));
            }
            Ok(LValue::ListRange {
                list,
                first: usize::try_from(first).map_err(|_| list_index_out_of_range(written))?,
                last: last.and_then(|last| usize::try_from(last).ok()),
            })
        }
        (other, _) => Err(cannot_index_for_assignment(other.type_name())),
    }
}

/// `list[first : last] = value`, all or nothing. An open end takes every
/// remaining item and appends any extra ones.
fn assign_list_range(
    list: &ListRef,
    first: usize,
    last: Option<usize>,
    value: &Value,
    op: Option<BinaryOp>,
) -> Result<(), EvalError> {
    let Value::List(source) = value else {
        return Err(slice_requires_list());
    };
    let items = source.to_vec();
    let overlap = match last {
        Some(last) => last + 1 - first,
        None => list.len() - first,
    };
    if items.len() < overlap {
        return Err(slice_has_fewer_items());
    }
    if items.len() > overlap && last.is_some() {
        return Err(slice_has_more_items());
    }
    let (replace, append) = items.split_at(overlap);
    let replace = match op {
        Some(op) => replace
            .iter()
            .enumerate()
            .map(|(offset, item)| {
                let current = list
                    .get(first + offset)
                    .ok_or_else(|| list_index_out_of_range((first + offset) as i64))?;
                evaluate_compound(&current, item, op)
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => replace.to_vec(),
    };
    if !append.is_empty() {
        list.check_structure()?;
    }
    list.assign_range(first, &replace)?;
    if !append.is_empty() {
        list.extend(append.to_vec(), None)?;
    }
    Ok(())
}

/// Text targets accept `=` and `.=` only.
fn append_text(
    current: Option<String>,
    value: &Value,
    op: Option<BinaryOp>,
) -> Result<String, EvalError> {
    let text = value.to_text()?;
    match op {
        None => Ok(text.into_owned()),
        Some(BinaryOp::Concat) => Ok(current.unwrap_or_default() + &text),
        Some(op) => Err(wrong_variable_type(op.symbol())),
    }
}

fn lock_list_items(
    list: &ListRef,
    first: usize,
    last: usize,
    depth: i32,
    lock: bool,
) -> Result<(), EvalError> {
    for index in first..=last {
        let (Some(level), Some(value)) = (list.item_lock(index), list.get(index)) else {
            return Err(list_index_out_of_range(index as i64));
        };
        list.set_item_lock(index, toggle_lock(level, lock));
        lock_value(&value, depth, lock)?;
    }
    Ok(())
}

/// Whether a compound assignment already updated the list in place.
fn same_list(before: &Value, after: &Value) -> bool {
    matches!((before, after), (Value::List(a), Value::List(b)) if a.ptr_eq(b))
}
