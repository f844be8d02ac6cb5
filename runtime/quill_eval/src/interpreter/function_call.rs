//! Function call evaluation methods for the Interpreter.

use std::rc::Rc;

use quill_value::errors::{
    call_depth_exceeded, dict_function_without_dict, duplicate_argument,
    function_name_not_capitalized, funcref_required, illegal_argument, not_enough_arguments,
    too_many_arguments, too_many_parameters, unknown_function,
};
use quill_value::{
    CallFrame, Callee, DictRef, EvalError, EvalResult, FunctionBody, FunctionFlags, ItemFlags,
    ScopeMarker, UserFunction, Value,
};

use super::primary::Args;
use super::Interpreter;
use crate::natives::{is_native_name, NativeFunction};
use crate::scope::is_var_name_byte;

/// Most parameters a user function may declare.
pub const MAX_FUNC_ARGS: usize = 20;

impl Interpreter {
    /// Call a `FuncRef` or `Partial`.
    ///
    /// A partial's bound arguments go before `args`. Its bound receiver is
    /// used unless the call site supplies one and the binding was automatic.
    pub(crate) fn call_function_value(
        &mut self,
        func: &Value,
        args: &[Value],
        receiver: Option<DictRef>,
    ) -> EvalResult {
        match func {
            Value::FuncRef(name) => self.call_by_name(name, args, receiver),
            Value::Partial(partial) => {
                let receiver = match partial.receiver() {
                    Some(bound) if receiver.is_none() || !partial.is_auto_receiver() => {
                        Some(bound.clone())
                    }
                    _ => receiver,
                };
                let all_args: Args = partial.args().iter().chain(args).cloned().collect();
                match partial.callee() {
                    Callee::Name(name) => self.call_by_name(name, &all_args, receiver),
                    Callee::Function(function) => {
                        self.call_user(function.clone(), &all_args, receiver)
                    }
                }
            }
            _ => Err(funcref_required()),
        }
    }

    /// Call a native or user function by name.
    pub(crate) fn call_by_name(
        &mut self,
        name: &str,
        args: &[Value],
        receiver: Option<DictRef>,
    ) -> EvalResult {
        if is_native_name(name) {
            let native = self
                .natives
                .get(name)
                .ok_or_else(|| unknown_function(name))?;
            return self.call_native(name, &native, args);
        }
        let canonical = self.canonical_function_name(name);
        let function = self
            .functions
            .get(&canonical)
            .ok_or_else(|| unknown_function(name))?;
        self.call_user(function, args, receiver)
    }

    fn call_native(&mut self, name: &str, native: &NativeFunction, args: &[Value]) -> EvalResult {
        self.check_abort()?;
        if args.len() < native.min_args {
            return Err(not_enough_arguments(name));
        }
        if args.len() > native.max_args {
            return Err(too_many_arguments(name));
        }
        tracing::trace!(native = name, args = args.len(), "native call");
        (native.func)(self, args)
    }

    /// Invoke a user function: check arity, receiver and depth, bind a
    /// frame, run the body.
    #[tracing::instrument(level = "debug", skip_all, fields(function = %function.name))]
    pub(crate) fn call_user(
        &mut self,
        function: Rc<UserFunction>,
        args: &[Value],
        receiver: Option<DictRef>,
    ) -> EvalResult {
        self.check_abort()?;
        let arity = function.arity();
        if args.len() < arity {
            return Err(not_enough_arguments(&function.name));
        }
        if args.len() > arity && !function.variadic {
            return Err(too_many_arguments(&function.name));
        }
        let is_dict = function.has_flag(FunctionFlags::DICT);
        if is_dict && receiver.is_none() {
            return Err(dict_function_without_dict(&function.name));
        }
        if self.call_stack.len() >= self.max_call_depth() {
            return Err(call_depth_exceeded());
        }
        let depth = self.call_stack.len() + 1;
        let frame = self.bind_frame(&function, args, receiver.filter(|_| is_dict), depth)?;
        let mut call = self.push_call(frame);
        call.run_body(&function)
    }

    /// Build the frame for one call: `a:` entries are read-only and fixed,
    /// `a:000` is a fixed list, and `l:self` is bound for dict functions.
    fn bind_frame(
        &mut self,
        function: &Rc<UserFunction>,
        args: &[Value],
        receiver: Option<DictRef>,
        depth: usize,
    ) -> Result<Rc<CallFrame>, EvalError> {
        let fixed = ItemFlags::READ_ONLY | ItemFlags::FIXED;
        let locals = self.store.new_scope_dict(ScopeMarker::DefaultScope);
        let arg_dict = self.store.new_scope_dict(ScopeMarker::Scope);
        let (named, extra) = args.split_at(function.arity());

        let varargs = self.store.list_from(extra.iter().cloned());
        varargs.fix();
        let extra_count = i64::try_from(extra.len()).unwrap_or(i64::MAX);
        arg_dict.define("0", Value::number(extra_count), fixed)?;
        arg_dict.define("000", Value::List(varargs.clone()), fixed)?;
        for (index, value) in extra.iter().enumerate() {
            arg_dict.define(&(index + 1).to_string(), value.clone(), fixed)?;
        }
        arg_dict.define("firstline", Value::number(0), fixed)?;
        arg_dict.define("lastline", Value::number(0), fixed)?;

        let is_lambda = function.has_flag(FunctionFlags::LAMBDA);
        for (param, value) in function.params.iter().zip(named) {
            arg_dict.define(param, value.clone(), fixed)?;
            if is_lambda {
                locals.define(param, value.clone(), fixed)?;
            }
        }
        if let Some(dict) = receiver {
            locals.define("self", Value::Dict(dict), fixed)?;
        }
        arg_dict.fix();

        let caller = self.current_frame().map(Rc::downgrade);
        Ok(Rc::new(CallFrame::new(
            function.clone(),
            locals,
            arg_dict,
            varargs,
            caller,
            depth,
        )))
    }

    fn run_body(&mut self, function: &Rc<UserFunction>) -> EvalResult {
        match &function.body {
            FunctionBody::Expr(expr) => {
                let expr = expr.clone();
                self.eval_complete(&expr)
            }
            FunctionBody::Lines(lines) => {
                let lines = lines.clone();
                let abort = function.has_flag(FunctionFlags::ABORT);
                self.run_function_lines(&lines, abort)
            }
        }
    }

    /// The user function a function value calls, if it is a user function.
    pub(crate) fn resolve_user_function(&self, func: &Value) -> Option<Rc<UserFunction>> {
        match func {
            Value::FuncRef(name) if !is_native_name(name) => {
                self.functions.get(&self.canonical_function_name(name))
            }
            Value::Partial(partial) => match partial.callee() {
                Callee::Function(function) => Some(function.clone()),
                Callee::Name(name) if !is_native_name(name) => {
                    self.functions.get(&self.canonical_function_name(name))
                }
                Callee::Name(_) => None,
            },
            _ => None,
        }
    }

    /// Registry key for a function name as written: `g:` is dropped and
    /// `s:name` / `<SID>name` become `<SNR>{script}_name`.
    pub(crate) fn canonical_function_name(&self, name: &str) -> String {
        if let Some(bare) = name.strip_prefix("g:") {
            return bare.to_string();
        }
        if let Some(bare) = script_local_name(name) {
            return format!("<SNR>{}_{bare}", self.current_script.0);
        }
        name.to_string()
    }

    /// Validate and canonicalize the name of a `:function` definition.
    pub(crate) fn function_definition_name(&self, name: &str) -> Result<String, EvalError> {
        let canonical = self.canonical_function_name(name);
        let script_local = canonical.starts_with("<SNR>");
        let bare = canonical
            .strip_prefix("<SNR>")
            .unwrap_or(canonical.as_str());
        let valid_chars = !bare.is_empty() && bare.bytes().all(is_var_name_byte);
        let capitalized = bare.as_bytes().first().is_some_and(u8::is_ascii_uppercase);
        if !valid_chars || !(script_local || capitalized || bare.contains('#')) {
            return Err(function_name_not_capitalized(name));
        }
        Ok(canonical)
    }

    /// Parameter rules shared by `:function`, lambdas and host definitions.
    pub(crate) fn validate_params(&self, name: &str, params: &[String]) -> Result<(), EvalError> {
        if params.len() > MAX_FUNC_ARGS {
            return Err(too_many_parameters(name));
        }
        for (index, param) in params.iter().enumerate() {
            let valid = param
                .as_bytes()
                .first()
                .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_')
                && param.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
            if !valid || param == "firstline" || param == "lastline" {
                return Err(illegal_argument(param));
            }
            if params[..index].contains(param) {
                return Err(duplicate_argument(param));
            }
        }
        Ok(())
    }
}

/// The bare part of `s:name` or `<SID>name`.
fn script_local_name(name: &str) -> Option<&str> {
    if let Some(bare) = name.strip_prefix("s:") {
        return Some(bare);
    }
    let prefix = "<SID>";
    if name.len() >= prefix.len() && name[..prefix.len()].eq_ignore_ascii_case(prefix) {
        return Some(&name[prefix.len()..]);
    }
    None
}
