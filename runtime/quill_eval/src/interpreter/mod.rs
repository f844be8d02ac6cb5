//! The interpreter context.
//!
//! One [`Interpreter`] owns everything an evaluation touches: the container
//! store, the scope table, the function and native registries, the call
//! stack, the options and registers, and the collector state. There are no
//! process-wide globals, so independent interpreters can coexist.
//!
//! # Entry points
//!
//! Hosts go through [`Interpreter::eval_expr`], [`Interpreter::execute`],
//! [`Interpreter::assign`] and [`Interpreter::call_value`]. A pending
//! collection runs when an entry point is entered from the top level, never
//! in the middle of an evaluation.

mod builder;
mod call_guard;
mod define;
mod exec;
mod expr;
mod function_call;
mod lvalue;
mod primary;
mod subscript;
mod variables;

use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use quill_value::errors::{interrupted, trailing_characters};
use quill_value::{
    CallFrame, ContainerStore, DictRef, EvalError, EvalResult, FunctionDef, ScriptId, Value,
};
use rustc_hash::FxHashMap;

use crate::functions::FunctionRegistry;
use crate::gc::Collector;
use crate::natives::NativeRegistry;
use crate::parse::Cursor;
use crate::pattern::PatternMatcher;
use crate::roots::{RootId, RootTable};
use crate::scope::{ScopeKind, ScopeTable};

pub use builder::InterpreterBuilder;
pub use subscript::index_value;

/// Default for the `maxfuncdepth` option.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 100;

/// Kept-alive frame handles held before dead ones are dropped.
pub(crate) const MIN_KEPT_PRUNE_AT: usize = 64;

/// Option names the runtime itself consults.
pub(crate) mod option_names {
    pub const MAX_FUNC_DEPTH: &str = "maxfuncdepth";
    pub const IGNORE_CASE: &str = "ignorecase";
}

/// Embedded expression runtime.
pub struct Interpreter {
    pub(crate) store: ContainerStore,
    pub(crate) scopes: ScopeTable,
    pub(crate) functions: FunctionRegistry,
    pub(crate) natives: NativeRegistry,
    /// `&name` options.
    pub(crate) options: FxHashMap<String, Value>,
    /// `@r` registers.
    pub(crate) registers: FxHashMap<char, Rc<str>>,
    pub(crate) roots: RootTable,
    pub(crate) matcher: Box<dyn PatternMatcher>,
    /// Active calls, innermost last.
    pub(crate) call_stack: Vec<Rc<CallFrame>>,
    /// Frames that outlived their call because a closure captured them.
    pub(crate) kept_frames: Vec<Weak<CallFrame>>,
    /// Length at which `kept_frames` is next pruned.
    pub(crate) kept_prune_at: usize,
    /// Script whose `s:` scope applies.
    pub(crate) current_script: ScriptId,
    /// Errors swallowed by functions without `abort`.
    pub(crate) error_log: Vec<EvalError>,
    pub(crate) abort: Arc<AtomicBool>,
    pub(crate) gc: Collector,
    /// Nesting of host entry points; zero when idle.
    pub(crate) active_entries: usize,
}

impl Interpreter {
    /// An interpreter with default configuration.
    pub fn new() -> Result<Self, EvalError> {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    // Host entry points

    /// Evaluate `text` as one complete expression.
    pub fn eval_expr(&mut self, text: &str) -> EvalResult {
        self.enter(|interp| interp.eval_complete(text))
    }

    /// Evaluate (or, with `evaluate` false, only parse) the expression at the
    /// start of `text`.
    ///
    /// Returns the value and the offset just past the expression, so a
    /// statement parser can continue from there. In parse-only mode only
    /// syntax errors are reported and no value is produced.
    pub fn eval_expr_partial(
        &mut self,
        text: &str,
        evaluate: bool,
    ) -> Result<(Option<Value>, usize), EvalError> {
        self.enter(|interp| {
            let mut cur = Cursor::new(text);
            cur.skip_white();
            let value = interp.eval_expression(&mut cur, evaluate)?;
            Ok((evaluate.then_some(value), cur.pos()))
        })
    }

    /// Assign `value` to the lvalue written in `target` (`name`, `g:x`,
    /// `d.key`, `l[0]`, `l[1:2]`, `&opt`, `@r`, `$ENV`).
    pub fn assign(&mut self, target: &str, value: Value) -> Result<(), EvalError> {
        self.enter(|interp| interp.assign_text(target, value))
    }

    /// Run statement lines at the top level, stopping at the first error.
    pub fn execute<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<(), EvalError> {
        let lines: Vec<String> = lines.iter().map(|l| l.as_ref().to_string()).collect();
        self.enter(|interp| interp.execute_lines(&lines))
    }

    /// Call a function value (a `FuncRef` or `Partial`) with `args`.
    ///
    /// This is how host callbacks (timers, jobs, RPC handlers) run user code.
    pub fn call_value(&mut self, func: &Value, args: &[Value]) -> EvalResult {
        self.enter(|interp| interp.call_function_value(func, args, None))
    }

    /// Call a function by name, native or user-defined.
    pub fn call_function(&mut self, name: &str, args: &[Value]) -> EvalResult {
        self.enter(|interp| interp.call_by_name(name, args, None))
    }

    fn enter<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        if self.active_entries == 0 {
            self.run_pending_gc();
        }
        self.active_entries += 1;
        let result = f(self);
        self.active_entries -= 1;
        result
    }

    // Functions

    /// Define a named user function from a host-built definition.
    ///
    /// The name follows the same rules as `:function` (`Name`, `g:Name`,
    /// `s:name`); `s:` names bind to the current script.
    pub fn define_function(&mut self, mut def: FunctionDef, force: bool) -> Result<(), EvalError> {
        def.name = self.function_definition_name(&def.name)?;
        self.validate_params(&def.name, &def.params)?;
        self.functions
            .define(def, self.current_script, None, force)
            .map(|_| ())
    }

    /// Remove a named user function from lookups.
    pub fn delete_function(&mut self, name: &str) -> Result<(), EvalError> {
        let canonical = self.canonical_function_name(name);
        self.functions.delete(&canonical)
    }

    /// Whether `name` resolves to a native or a live user function.
    pub fn function_exists(&self, name: &str) -> bool {
        if crate::natives::is_native_name(name) {
            return self.natives.contains(name);
        }
        self.functions.contains(&self.canonical_function_name(name))
    }

    /// Add or replace a native function.
    pub fn register_native(
        &mut self,
        name: &str,
        min_args: usize,
        max_args: usize,
        func: impl Fn(&mut Interpreter, &[Value]) -> EvalResult + 'static,
    ) {
        self.natives.register(name, min_args, max_args, func);
    }

    // Options, registers, scopes

    pub fn set_option(&mut self, name: &str, value: Value) {
        self.options.insert(name.to_string(), value);
    }

    pub fn option(&self, name: &str) -> Option<Value> {
        self.options.get(name).cloned()
    }

    pub fn set_register(&mut self, name: char, text: &str) {
        self.registers.insert(name, Rc::from(text));
    }

    pub fn register(&self, name: char) -> Option<Rc<str>> {
        self.registers.get(&name).cloned()
    }

    /// Swap the dict behind `b:`, `w:` or `t:`, returning the previous one.
    pub fn set_host_scope(
        &mut self,
        kind: ScopeKind,
        dict: DictRef,
    ) -> Result<Option<DictRef>, EvalError> {
        self.scopes.set_host(kind, dict)
    }

    /// Select the script whose `s:` variables and functions apply.
    pub fn set_current_script(&mut self, script: ScriptId) {
        self.current_script = script;
    }

    pub fn current_script(&self) -> ScriptId {
        self.current_script
    }

    /// The `g:` dict.
    pub fn globals(&self) -> DictRef {
        self.scopes.globals().clone()
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.scopes.globals().get(name)
    }

    /// Set `g:name`, with the same checks as `let g:name = value`.
    pub fn set_global(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        self.enter(|interp| interp.set_var(&format!("g:{name}"), value))
    }

    /// The container store, for building values to pass in.
    pub fn store(&self) -> &ContainerStore {
        &self.store
    }

    // Collector roots

    /// Keep `value` (and everything it reaches) alive across collections
    /// until [`Interpreter::unregister_root`] is called.
    pub fn register_root(&mut self, value: Value) -> RootId {
        self.roots.register(value)
    }

    pub fn unregister_root(&mut self, id: RootId) -> Option<Value> {
        self.roots.unregister(id)
    }

    // Abort flag and error log

    /// Ask the running evaluation to stop at its next safe point.
    pub fn request_abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    pub fn clear_abort(&self) {
        self.abort.store(false, Ordering::Relaxed);
    }

    /// Shared handle to the abort flag, for setting it from another thread.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    pub fn is_aborting(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    /// Drain the errors reported by functions that continue after errors.
    pub fn take_error_log(&mut self) -> Vec<EvalError> {
        std::mem::take(&mut self.error_log)
    }

    /// Evaluate `text`, which must be exactly one expression.
    pub(crate) fn eval_complete(&mut self, text: &str) -> EvalResult {
        let mut cur = Cursor::new(text);
        cur.skip_white();
        let value = self.eval_expression(&mut cur, true)?;
        cur.skip_white();
        if !cur.at_end() {
            return Err(trailing_characters(cur.rest()));
        }
        Ok(value)
    }

    pub(crate) fn check_abort(&self) -> Result<(), EvalError> {
        if self.is_aborting() {
            Err(interrupted())
        } else {
            Ok(())
        }
    }

    /// Record an error that execution continues past.
    pub(crate) fn report_error(&mut self, err: EvalError) {
        tracing::debug!(error = %err, "error reported; continuing");
        if err.is_interrupt() || self.is_aborting() {
            return;
        }
        let message = Value::string(err.message.as_str());
        let flags = self
            .scopes
            .vim()
            .slot("errmsg")
            .map(|slot| slot.flags)
            .unwrap_or_default();
        if let Err(define_err) = self.scopes.vim().define("errmsg", message, flags) {
            tracing::warn!(error = %define_err, "could not update v:errmsg");
        }
        self.error_log.push(err);
    }

    // Live options

    pub(crate) fn max_call_depth(&self) -> usize {
        self.options
            .get(option_names::MAX_FUNC_DEPTH)
            .and_then(|value| value.to_number().ok())
            .map_or(DEFAULT_MAX_CALL_DEPTH, |n| usize::try_from(n).unwrap_or(0))
    }

    pub(crate) fn ignore_case(&self) -> bool {
        self.options
            .get(option_names::IGNORE_CASE)
            .and_then(|value| value.is_truthy().ok())
            .unwrap_or(false)
    }

    /// The innermost active call, if any.
    pub(crate) fn current_frame(&self) -> Option<&Rc<CallFrame>> {
        self.call_stack.last()
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("call_depth", &self.call_stack.len())
            .field("kept_frames", &self.kept_frames.len())
            .field("roots", &self.roots.len())
            .field("current_script", &self.current_script)
            .finish_non_exhaustive()
    }
}
