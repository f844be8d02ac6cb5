//! Quill Eval - expression evaluator and call engine for the quill runtime.
//!
//! This crate provides the [`Interpreter`], the single entry point a host
//! uses to evaluate expressions, run statement lines and call functions.
//!
//! # Architecture
//!
//! The evaluator uses:
//! - a recursive-descent evaluator over the expression text (`interpreter`),
//!   with one parse-only mode so skipped branches still report syntax errors
//! - `ScopeTable`: `g:`, `v:`, per-script `s:` and host `b:`/`w:`/`t:` dicts;
//!   `l:` and `a:` live in call frames
//! - `FunctionRegistry` for named and anonymous user functions and
//!   [`NativeRegistry`] for natives, both reached through the call engine
//! - direct enum dispatch for binary and unary operators and comparisons
//! - a minimal command layer for function bodies (`let`, `if`, `for`, ...)
//! - a mark-and-sweep cycle collector that runs only between top-level calls
//!
//! # Re-exports
//!
//! Value types come from `quill_value`:
//! - `Value`, `ListRef`, `DictRef`, `ContainerStore`, `Partial`
//! - `EvalError`, `ErrorKind`, `EvalResult`

mod comparison;
mod functions;
mod gc;
mod interpreter;
mod natives;
mod operators;
mod parse;
mod pattern;
mod roots;
mod scope;
mod stack;
mod trace;
mod unary_operators;

pub use quill_value::{
    errors, Callee, ContainerStore, DictRef, ErrorKind, EvalError, EvalResult, FunctionBody,
    FunctionDef, FunctionFlags, ListRef, LockLevel, Partial, ScriptId, Special, Value,
};

pub use gc::{GcOutcome, GcStats, DEFAULT_GC_INTERVAL};
pub use interpreter::{index_value, Interpreter, InterpreterBuilder, DEFAULT_MAX_CALL_DEPTH};
pub use natives::{is_native_name, NativeFn, NativeFunction, NativeRegistry};
pub use pattern::{PatternMatcher, RegexMatcher};
pub use roots::RootId;
pub use scope::ScopeKind;
pub use trace::init_tracing;

#[cfg(test)]
mod tests;
