//! Level 7: primaries and their postfix chains.

use std::rc::Rc;

use quill_value::errors::{
    duplicate_argument, duplicate_key, expected_closing_brace, illegal_argument,
    invalid_arguments, invalid_expression, key_not_present, missing_bracket, missing_dict_colon,
    missing_dict_comma, missing_dict_end, missing_list_comma, missing_list_end, missing_paren,
    option_name_missing, unknown_option,
};
use quill_value::{
    Callee, DictRef, EvalError, EvalResult, FunctionBody, FunctionDef, FunctionFlags, Partial,
    Value,
};
use smallvec::SmallVec;

use super::expr::skipped;
use super::Interpreter;
use crate::functions::AnonymousKind;
use crate::parse::{scan_double_quoted, scan_number, scan_single_quoted, Cursor};
use crate::scope::{is_var_name_byte, ScopeKind};
use crate::stack::ensure_sufficient_stack;

/// Argument vector for calls; most calls take few arguments.
pub(crate) type Args = SmallVec<[Value; 8]>;

impl Interpreter {
    pub(super) fn eval_primary(&mut self, cur: &mut Cursor<'_>, evaluate: bool) -> EvalResult {
        ensure_sufficient_stack(|| {
            let Some(first) = cur.peek() else {
                return Err(invalid_expression(cur.text()));
            };
            let value = match first {
                b'0'..=b'9' => {
                    let (value, len) = scan_number(cur.rest());
                    cur.bump(len);
                    value
                }
                b'"' => {
                    let (text, len) = scan_double_quoted(cur.rest())?;
                    cur.bump(len);
                    Value::string(text)
                }
                b'\'' => {
                    let (text, len) = scan_single_quoted(cur.rest())?;
                    cur.bump(len);
                    Value::string(text)
                }
                b'[' => self.eval_list_literal(cur, evaluate)?,
                b'{' => match self.try_lambda(cur, evaluate)? {
                    Some(lambda) => lambda,
                    None => self.eval_dict_literal(cur, evaluate)?,
                },
                b'(' => {
                    cur.bump(1);
                    cur.skip_white();
                    let value = self.eval_expression(cur, evaluate)?;
                    cur.skip_white();
                    if !cur.eat(b')') {
                        return Err(missing_paren(cur.rest()));
                    }
                    value
                }
                b'&' => self.eval_option(cur, evaluate)?,
                b'$' => {
                    cur.bump(1);
                    let name = cur.take_while(|b| b.is_ascii_alphanumeric() || b == b'_');
                    if evaluate {
                        Value::string(std::env::var(name).unwrap_or_default())
                    } else {
                        skipped()
                    }
                }
                b'@' => {
                    cur.bump(1);
                    let name = register_name(cur.next_char());
                    if evaluate {
                        self.registers
                            .get(&name)
                            .map_or_else(Value::empty_string, |text| Value::Str(text.clone()))
                    } else {
                        skipped()
                    }
                }
                _ => {
                    let start = cur.pos();
                    let name = scan_name(cur);
                    if name.is_empty() {
                        cur.set_pos(start);
                        return Err(invalid_expression(cur.rest()));
                    }
                    if cur.peek() == Some(b'(') {
                        cur.bump(1);
                        let args = self.eval_args(cur, evaluate, name)?;
                        if evaluate {
                            self.call_named(name, &args)?
                        } else {
                            skipped()
                        }
                    } else if evaluate {
                        self.get_var(name)?
                    } else {
                        skipped()
                    }
                }
            };
            self.eval_postfix(cur, value, evaluate)
        })
    }

    /// A call written as `name(args)`: a variable holding a function wins
    /// over a function with that name.
    fn call_named(&mut self, name: &str, args: &[Value]) -> EvalResult {
        match self.function_variable(name) {
            Some(func) => self.call_function_value(&func, args, None),
            None => self.call_by_name(name, args, None),
        }
    }

    /// Parse call arguments after the opening `(`, through the closing `)`.
    pub(crate) fn eval_args(
        &mut self,
        cur: &mut Cursor<'_>,
        evaluate: bool,
        name: &str,
    ) -> Result<Args, EvalError> {
        let mut args = Args::new();
        cur.skip_white();
        if cur.eat(b')') {
            return Ok(args);
        }
        loop {
            let value = self.eval_expression(cur, evaluate)?;
            if evaluate {
                args.push(value);
            }
            cur.skip_white();
            if cur.eat(b')') {
                return Ok(args);
            }
            if !cur.eat(b',') {
                return Err(invalid_arguments(name));
            }
            cur.skip_white();
        }
    }

    /// Subscripts and calls following a primary, left to right.
    fn eval_postfix(&mut self, cur: &mut Cursor<'_>, mut value: Value, evaluate: bool) -> EvalResult {
        let mut receiver: Option<DictRef> = None;
        loop {
            match cur.peek() {
                Some(b'(') if !evaluate || value.is_func() => {
                    cur.bump(1);
                    let name = value.func_name().unwrap_or("").to_string();
                    let args = self.eval_args(cur, evaluate, &name)?;
                    if evaluate {
                        value = self.call_function_value(&value, &args, receiver.take())?;
                    }
                    receiver = None;
                }
                Some(b'[') => {
                    receiver = value.as_dict().cloned();
                    value = self.eval_index(cur, &value, evaluate)?;
                }
                Some(b'.')
                    if evaluate
                        && value.as_dict().is_some()
                        && cur.peek_at(1).is_some_and(is_key_byte) =>
                {
                    cur.bump(1);
                    let key = cur.take_while(is_key_byte);
                    let dict = value.as_dict().cloned();
                    value = match &dict {
                        Some(dict) => dict.get(key).ok_or_else(|| key_not_present(key))?,
                        None => value,
                    };
                    receiver = dict;
                }
                _ => break,
            }
        }
        if let Some(dict) = receiver {
            if evaluate && value.is_func() {
                value = self.bind_auto_receiver(value, dict);
            }
        }
        Ok(value)
    }

    /// `[i]` or `[i:j]`; the cursor is on the `[`.
    fn eval_index(&mut self, cur: &mut Cursor<'_>, value: &Value, evaluate: bool) -> EvalResult {
        cur.bump(1);
        cur.skip_white();
        let first = if cur.peek() == Some(b':') {
            None
        } else {
            Some(self.eval_expression(cur, evaluate)?)
        };
        cur.skip_white();
        let mut last = None;
        let is_slice = cur.eat(b':');
        if is_slice {
            cur.skip_white();
            if cur.peek() != Some(b']') {
                last = Some(self.eval_expression(cur, evaluate)?);
                cur.skip_white();
            }
        }
        if !cur.eat(b']') {
            return Err(missing_bracket(cur.rest()));
        }
        if !evaluate {
            return Ok(skipped());
        }
        super::index_value(&self.store, value, first.as_ref(), last.as_ref(), is_slice)
    }

    /// Bind `dict` to a dict function fetched from it, unless the value
    /// already carries an explicit receiver.
    pub(crate) fn bind_auto_receiver(&self, func: Value, dict: DictRef) -> Value {
        if let Value::Partial(partial) = &func {
            if partial.receiver().is_some() && !partial.is_auto_receiver() {
                return func;
            }
        }
        let Some(target) = self.resolve_user_function(&func) else {
            return func;
        };
        if !target.has_flag(FunctionFlags::DICT) {
            return func;
        }
        let partial = match &func {
            Value::FuncRef(name) => Partial::new(Callee::Name(name.clone()), Vec::new(), Some(dict), true),
            Value::Partial(partial) => Partial::new(
                partial.callee().clone(),
                partial.args().to_vec(),
                Some(dict),
                true,
            ),
            _ => return func,
        };
        Value::partial(partial)
    }

    /// `&name`, `&g:name` or `&l:name`.
    fn eval_option(&mut self, cur: &mut Cursor<'_>, evaluate: bool) -> EvalResult {
        let start = cur.pos();
        cur.bump(1);
        if cur.starts_with("g:") || cur.starts_with("l:") {
            cur.bump(2);
        }
        let name = cur.take_while(|b| b.is_ascii_alphanumeric() || b == b'_');
        if name.is_empty() {
            return Err(option_name_missing(&cur.text()[start..]));
        }
        if !evaluate {
            return Ok(skipped());
        }
        self.options
            .get(name)
            .cloned()
            .ok_or_else(|| unknown_option(name))
    }

    /// `[a, b, ...]`; a trailing comma is allowed.
    fn eval_list_literal(&mut self, cur: &mut Cursor<'_>, evaluate: bool) -> EvalResult {
        cur.bump(1);
        cur.skip_white();
        let mut items = Vec::new();
        while cur.peek().is_some_and(|b| b != b']') {
            let item = self.eval_expression(cur, evaluate)?;
            if evaluate {
                items.push(item);
            }
            cur.skip_white();
            if cur.peek() == Some(b']') {
                break;
            }
            if !cur.eat(b',') {
                return Err(missing_list_comma(cur.rest()));
            }
            cur.skip_white();
        }
        if !cur.eat(b']') {
            return Err(missing_list_end(cur.rest()));
        }
        if !evaluate {
            return Ok(skipped());
        }
        Ok(Value::List(self.store.list_from(items)))
    }

    /// `{key: value, ...}`; keys are expressions converted to strings.
    fn eval_dict_literal(&mut self, cur: &mut Cursor<'_>, evaluate: bool) -> EvalResult {
        cur.bump(1);
        cur.skip_white();
        let dict = evaluate.then(|| self.store.new_dict());
        while cur.peek().is_some_and(|b| b != b'}') {
            let key = self.eval_expression(cur, evaluate)?;
            cur.skip_white();
            if !cur.eat(b':') {
                return Err(missing_dict_colon(cur.rest()));
            }
            let key = if evaluate {
                key.to_text()?.into_owned()
            } else {
                String::new()
            };
            cur.skip_white();
            let value = self.eval_expression(cur, evaluate)?;
            if let Some(dict) = &dict {
                if dict.contains_key(&key) {
                    return Err(duplicate_key(&key));
                }
                dict.insert(&key, value)?;
            }
            cur.skip_white();
            if cur.peek() == Some(b'}') {
                break;
            }
            if !cur.eat(b',') {
                return Err(missing_dict_comma(cur.rest()));
            }
            cur.skip_white();
        }
        if !cur.eat(b'}') {
            return Err(missing_dict_end(cur.rest()));
        }
        Ok(dict.map_or_else(skipped, Value::Dict))
    }

    /// `{args -> expr}`. Returns `None`, with the cursor unmoved, when the
    /// text is not lambda syntax so the caller can try a dict.
    fn try_lambda(&mut self, cur: &mut Cursor<'_>, evaluate: bool) -> Result<Option<Value>, EvalError> {
        let start = cur.pos();
        cur.bump(1);
        cur.skip_white();
        let mut params: Vec<String> = Vec::new();
        let mut variadic = false;
        loop {
            if cur.starts_with("->") {
                break;
            }
            if cur.eat_str("...") {
                variadic = true;
                cur.skip_white();
                break;
            }
            let param = cur.take_while(|b| b.is_ascii_alphanumeric() || b == b'_');
            if param.is_empty() || param.as_bytes()[0].is_ascii_digit() {
                cur.set_pos(start);
                return Ok(None);
            }
            if evaluate && params.iter().any(|p| p == param) {
                return Err(duplicate_argument(param));
            }
            if evaluate && (param == "firstline" || param == "lastline") {
                return Err(illegal_argument(param));
            }
            params.push(param.to_string());
            cur.skip_white();
            if cur.eat(b',') {
                cur.skip_white();
                continue;
            }
            break;
        }
        if !cur.eat_str("->") {
            cur.set_pos(start);
            return Ok(None);
        }
        cur.skip_white();
        let body_start = cur.pos();
        self.eval_expression(cur, false)?;
        let body = cur.since(body_start).trim_end().to_string();
        cur.skip_white();
        if !cur.eat(b'}') {
            return Err(expected_closing_brace(cur.rest()));
        }
        if !evaluate {
            return Ok(Some(skipped()));
        }

        let closure_parent = self.current_frame().cloned();
        let mut flags = FunctionFlags::LAMBDA;
        if closure_parent.is_some() {
            flags |= FunctionFlags::CLOSURE;
        }
        let def = FunctionDef {
            name: String::new(),
            params,
            variadic,
            flags,
            body: FunctionBody::Expr(Rc::from(body)),
        };
        let function = self.functions.create_anonymous(
            def,
            AnonymousKind::Lambda,
            self.current_script,
            closure_parent,
        );
        tracing::trace!(function = %function.name, "lambda created");
        Ok(Some(Value::partial(Partial::new(
            Callee::Function(function),
            Vec::new(),
            None,
            false,
        ))))
    }
}

/// Scan a variable or function name: `name`, `x:name`, a bare `x:`,
/// `<SID>name`, `<SNR>12_name` or `<lambda>3`. Returns "" if none is there.
pub(crate) fn scan_name<'a>(cur: &mut Cursor<'a>) -> &'a str {
    let start = cur.pos();
    if cur.peek() == Some(b'<') {
        let rest = cur.rest();
        let prefix_len = ["<SID>", "<SNR>", "<lambda>"]
            .iter()
            .find(|prefix| {
                rest.len() >= prefix.len() && rest[..prefix.len()].eq_ignore_ascii_case(prefix)
            })
            .map_or(0, |prefix| prefix.len());
        if prefix_len == 0 {
            return "";
        }
        cur.bump(prefix_len);
        cur.take_while(is_var_name_byte);
        return cur.since(start);
    }
    if !cur.peek().is_some_and(|b| b.is_ascii_alphabetic() || b == b'_') {
        return "";
    }
    let head = cur.take_while(is_var_name_byte);
    if head.len() == 1 && cur.peek() == Some(b':') && head.as_bytes()[0].is_ascii_alphabetic() {
        let scoped = ScopeKind::from_prefix(head.as_bytes()[0]).is_some();
        let next = cur.peek_at(1);
        // `x:name` or a bare `g:`; a lone `c:` in `a ? b :c` stays a ternary.
        if scoped || next.is_some_and(is_var_name_byte) {
            cur.bump(1);
            cur.take_while(is_var_name_byte);
        }
    }
    cur.since(start)
}

pub(crate) fn is_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `@@` and `@` at the end mean the unnamed register.
pub(crate) fn register_name(c: Option<char>) -> char {
    match c {
        None | Some('@') => '"',
        Some(c) => c,
    }
}
