//! `:function` and `:delfunction`.

use std::rc::Rc;

use quill_value::errors::{
    cannot_delete_unknown_function, closure_at_top_level, dict_entry_exists,
    function_name_not_capitalized, illegal_argument, invalid_argument, missing_open_paren,
    trailing_characters,
};
use quill_value::{Callee, EvalError, FunctionBody, FunctionDef, FunctionFlags, Partial, Value};

use super::lvalue::LValue;
use super::Interpreter;
use crate::functions::AnonymousKind;
use crate::parse::Cursor;

/// A parsed `:function` header.
struct Header<'a> {
    name: &'a str,
    params: Vec<String>,
    variadic: bool,
    flags: FunctionFlags,
}

impl Interpreter {
    /// Define a function from `function[!] {header}` and its body lines.
    ///
    /// `Name`, `g:Name`, `s:name` and `<SID>name` define named functions.
    /// `dict.key` and `dict[key]` store a numbered anonymous function in the
    /// entry instead.
    pub(crate) fn define_command(
        &mut self,
        header: &str,
        force: bool,
        body: Rc<[String]>,
    ) -> Result<(), EvalError> {
        let header = self.parse_function_header(header)?;
        let closure_parent = if header.flags.contains(FunctionFlags::CLOSURE) {
            Some(
                self.current_frame()
                    .cloned()
                    .ok_or_else(|| closure_at_top_level(header.name))?,
            )
        } else {
            None
        };
        let mut def = FunctionDef {
            name: header.name.to_string(),
            params: header.params,
            variadic: header.variadic,
            flags: header.flags,
            body: FunctionBody::Lines(body),
        };
        self.validate_params(header.name, &def.params)?;

        if !is_dict_target(header.name) {
            def.name = self.function_definition_name(header.name)?;
            let function = self
                .functions
                .define(def, self.current_script, closure_parent, force)?;
            tracing::debug!(function = %function.name, "function defined");
            return Ok(());
        }

        let LValue::DictEntry { dict, key } = self.resolve_lvalue(header.name)? else {
            return Err(function_name_not_capitalized(header.name));
        };
        if dict.contains_key(&key) && !force {
            return Err(dict_entry_exists(&key));
        }
        dict.check_assign(&key)?;
        let function = self.functions.create_anonymous(
            def,
            AnonymousKind::Numbered,
            self.current_script,
            closure_parent,
        );
        tracing::debug!(function = %function.name, key = %key, "dict function defined");
        let value = Value::partial(Partial::new(
            Callee::Function(function),
            Vec::new(),
            None,
            false,
        ));
        dict.insert(&key, value).map(drop)
    }

    /// `delfunction[!] {name}`; the bang ignores unknown functions.
    pub(crate) fn delfunction_command(&mut self, args: &str, force: bool) -> Result<(), EvalError> {
        let mut cur = Cursor::new(args);
        cur.skip_white();
        let start = cur.pos();
        self.parse_lvalue(&mut cur, false)?;
        let name = cur.since(start);
        cur.skip_white();
        if !cur.at_end() && cur.peek() != Some(b'"') {
            return Err(trailing_characters(cur.rest()));
        }
        if name.is_empty() {
            return Err(invalid_argument(args));
        }

        if is_dict_target(name) {
            let LValue::DictEntry { dict, key } = self.resolve_lvalue(name)? else {
                return Err(cannot_delete_unknown_function(name));
            };
            return match dict.get(&key) {
                Some(value) if value.is_func() => dict.remove(&key).map(drop),
                _ if force => Ok(()),
                _ => Err(cannot_delete_unknown_function(name)),
            };
        }
        let canonical = self.canonical_function_name(name);
        match self.functions.delete(&canonical) {
            Err(_) if force => Ok(()),
            result => {
                if result.is_ok() {
                    tracing::debug!(function = %canonical, "function deleted");
                }
                result
            }
        }
    }

    /// `name(a, b, ...) [range] [abort] [dict] [closure]`.
    fn parse_function_header<'a>(&mut self, header: &'a str) -> Result<Header<'a>, EvalError> {
        let mut cur = Cursor::new(header);
        cur.skip_white();
        if cur.at_end() {
            return Err(invalid_argument(header));
        }
        let start = cur.pos();
        if matches!(cur.peek(), Some(b'&' | b'@' | b'$')) {
            return Err(function_name_not_capitalized(cur.rest()));
        }
        self.parse_lvalue(&mut cur, false)?;
        let name = cur.since(start);
        cur.skip_white();
        if !cur.eat(b'(') {
            return Err(missing_open_paren(name));
        }

        let mut params = Vec::new();
        let mut variadic = false;
        cur.skip_white();
        while !cur.eat(b')') {
            if cur.eat_str("...") {
                variadic = true;
                cur.skip_white();
                if !cur.eat(b')') {
                    return Err(illegal_argument(cur.rest()));
                }
                break;
            }
            let param = cur.take_while(|b| b.is_ascii_alphanumeric() || b == b'_');
            if param.is_empty() {
                return Err(illegal_argument(cur.rest()));
            }
            params.push(param.to_string());
            cur.skip_white();
            if cur.eat(b',') {
                cur.skip_white();
            } else if cur.peek() != Some(b')') {
                return Err(illegal_argument(cur.rest()));
            }
        }

        let mut flags = FunctionFlags::empty();
        loop {
            cur.skip_white();
            if cur.at_end() || cur.peek() == Some(b'"') {
                break;
            }
            let word = cur.take_while(|b| b.is_ascii_alphabetic());
            flags |= match word {
                "range" => FunctionFlags::RANGE,
                "abort" => FunctionFlags::ABORT,
                "dict" => FunctionFlags::DICT,
                "closure" => FunctionFlags::CLOSURE,
                _ => return Err(trailing_characters(&cur.text()[cur.pos() - word.len()..])),
            };
        }
        Ok(Header {
            name,
            params,
            variadic,
            flags,
        })
    }
}

/// Whether a written function name is a dict entry (`d.key`, `d[k]`).
fn is_dict_target(name: &str) -> bool {
    name.bytes().any(|b| b == b'.' || b == b'[')
}
