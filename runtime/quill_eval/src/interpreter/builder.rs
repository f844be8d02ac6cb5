//! `InterpreterBuilder` for creating Interpreter instances with various configurations.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use quill_value::{ContainerStore, EvalError, ScriptId, Value};
use rustc_hash::FxHashMap;

use super::{option_names, Interpreter, DEFAULT_MAX_CALL_DEPTH, MIN_KEPT_PRUNE_AT};
use crate::functions::FunctionRegistry;
use crate::gc::{Collector, DEFAULT_GC_INTERVAL};
use crate::natives::NativeRegistry;
use crate::pattern::{PatternMatcher, RegexMatcher};
use crate::roots::RootTable;
use crate::scope::ScopeTable;

/// Builder for creating Interpreter instances.
///
/// ```text
/// let mut interp = Interpreter::builder()
///     .max_call_depth(200)
///     .gc_interval(None)
///     .build()?;
/// ```
pub struct InterpreterBuilder {
    max_call_depth: usize,
    gc_interval: Option<u64>,
    ignore_case: bool,
    matcher: Option<Box<dyn PatternMatcher>>,
    natives: Option<NativeRegistry>,
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            gc_interval: Some(DEFAULT_GC_INTERVAL),
            ignore_case: false,
            matcher: None,
            natives: None,
        }
    }

    /// Initial value of the `maxfuncdepth` option.
    ///
    /// The option is consulted on every call, so a script can change it later.
    #[must_use]
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Container allocations between automatic collections; `None` leaves
    /// collection to explicit requests.
    #[must_use]
    pub fn gc_interval(mut self, interval: Option<u64>) -> Self {
        self.gc_interval = interval;
        self
    }

    /// Initial value of the `ignorecase` option, the default for comparisons
    /// without a `#` or `?` suffix.
    #[must_use]
    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    /// Replace the regex-backed matcher used by `=~` and `!~`.
    #[must_use]
    pub fn matcher(mut self, matcher: impl PatternMatcher + 'static) -> Self {
        self.matcher = Some(Box::new(matcher));
        self
    }

    /// Start from this native registry instead of the core set.
    #[must_use]
    pub fn natives(mut self, natives: NativeRegistry) -> Self {
        self.natives = Some(natives);
        self
    }

    pub fn build(self) -> Result<Interpreter, EvalError> {
        let store = ContainerStore::new();
        let scopes = ScopeTable::new(&store)?;
        let mut options = FxHashMap::default();
        options.insert(
            option_names::MAX_FUNC_DEPTH.to_string(),
            Value::number(i64::try_from(self.max_call_depth).unwrap_or(i64::MAX)),
        );
        options.insert(
            option_names::IGNORE_CASE.to_string(),
            Value::truth(self.ignore_case),
        );
        tracing::debug!(
            max_call_depth = self.max_call_depth,
            gc_interval = ?self.gc_interval,
            "interpreter created"
        );
        Ok(Interpreter {
            store,
            scopes,
            functions: FunctionRegistry::new(),
            natives: self.natives.unwrap_or_else(NativeRegistry::with_core),
            options,
            registers: FxHashMap::default(),
            roots: RootTable::default(),
            matcher: self
                .matcher
                .unwrap_or_else(|| Box::new(RegexMatcher::new())),
            call_stack: Vec::new(),
            kept_frames: Vec::new(),
            kept_prune_at: MIN_KEPT_PRUNE_AT,
            current_script: ScriptId::default(),
            error_log: Vec::new(),
            abort: Arc::new(AtomicBool::new(false)),
            gc: Collector::new(self.gc_interval),
            active_entries: 0,
        })
    }
}
