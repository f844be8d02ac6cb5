//! Mark-and-sweep cycle collector.
//!
//! Reference counting frees most values as soon as they are dropped; this
//! pass finds containers that only keep each other alive. Marking starts at
//! the roots (scope dicts, active frames, named functions and host roots)
//! and stamps everything reachable with a fresh pass id. Containers left
//! with an older stamp have their contents taken and dropped, which breaks
//! the cycles.
//!
//! Frames that outlived their call because a closure captured them are
//! stamped with `id + 1` first. That keeps their scopes alive for this pass;
//! if nothing reachable from a root refers to the frame, the scopes that
//! only the frame reached are cleared and the frame is forgotten.

use std::collections::TryReserveError;
use std::rc::Rc;

use quill_value::{CallFrame, Graveyard, UserFunction, Value};

use crate::interpreter::MIN_KEPT_PRUNE_AT;
use crate::Interpreter;

/// Container allocations between automatic collections.
pub const DEFAULT_GC_INTERVAL: u64 = 10_000;

/// Result of [`Interpreter::collect_garbage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GcOutcome {
    /// The pass ran and released `freed` containers.
    Completed { freed: usize },
    /// An evaluation is active or a pass is already running.
    Skipped,
    /// The mark stack could not grow; nothing was freed.
    Aborted,
}

/// Running totals, for hosts that report memory use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GcStats {
    pub passes: u64,
    pub freed_total: u64,
    pub live_lists: usize,
    pub live_dicts: usize,
}

pub(crate) struct Collector {
    in_progress: bool,
    requested: bool,
    interval: Option<u64>,
    passes: u64,
    freed_total: u64,
}

impl Collector {
    pub(crate) fn new(interval: Option<u64>) -> Self {
        Collector {
            in_progress: false,
            requested: false,
            interval,
            passes: 0,
            freed_total: 0,
        }
    }
}

/// Something the mark phase still has to visit.
enum Mark {
    Value(Value),
    Frame(Rc<CallFrame>),
    Function(Rc<UserFunction>),
}

impl Mark {
    /// Scalars and plain funcrefs hold no containers.
    fn of(value: &Value) -> Option<Mark> {
        match value {
            Value::List(_) | Value::Dict(_) | Value::Partial(_) => Some(Mark::Value(value.clone())),
            _ => None,
        }
    }
}

impl Interpreter {
    /// Run a collection pass now.
    ///
    /// Returns [`GcOutcome::Skipped`] while an evaluation is active: values
    /// held only on the Rust stack are not roots, so a pass is only safe
    /// between top-level entry points.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn collect_garbage(&mut self) -> GcOutcome {
        if self.active_entries > 0 || self.gc.in_progress {
            tracing::debug!(active = self.active_entries, "collection skipped");
            return GcOutcome::Skipped;
        }
        self.gc.in_progress = true;
        self.gc.requested = false;
        let outcome = match self.run_collection() {
            Ok(freed) => {
                self.gc.passes += 1;
                self.gc.freed_total += u64::try_from(freed).unwrap_or(u64::MAX);
                tracing::debug!(
                    freed,
                    live_lists = self.store.live_lists(),
                    live_dicts = self.store.live_dicts(),
                    kept_frames = self.kept_frames.len(),
                    "collection finished"
                );
                GcOutcome::Completed { freed }
            }
            Err(err) => {
                tracing::warn!(error = %err, "collection aborted: mark stack allocation failed");
                GcOutcome::Aborted
            }
        };
        self.gc.in_progress = false;
        outcome
    }

    /// Ask for a pass at the start of the next top-level entry point.
    pub fn request_gc(&mut self) {
        self.gc.requested = true;
    }

    pub fn gc_stats(&self) -> GcStats {
        GcStats {
            passes: self.gc.passes,
            freed_total: self.gc.freed_total,
            live_lists: self.store.live_lists(),
            live_dicts: self.store.live_dicts(),
        }
    }

    /// Collect if a pass was requested or the allocation interval passed.
    pub(crate) fn run_pending_gc(&mut self) {
        let due = self
            .gc
            .interval
            .is_some_and(|interval| self.store.allocations_since_sweep() >= interval);
        if self.gc.requested || due {
            self.collect_garbage();
        }
    }

    fn run_collection(&mut self) -> Result<usize, TryReserveError> {
        let id = self.store.next_pass_id();
        let mut stack = Vec::new();

        self.kept_frames.retain(|weak| weak.strong_count() > 0);
        let kept: Vec<Rc<CallFrame>> = self.kept_frames.iter().filter_map(|w| w.upgrade()).collect();
        stack.try_reserve(kept.len())?;
        stack.extend(kept.iter().cloned().map(Mark::Frame));
        mark(&mut stack, id + 1)?;

        self.push_roots(&mut stack)?;
        mark(&mut stack, id)?;

        let graveyard = self.store.sweep(id);
        let mut freed = graveyard.len();
        drop(graveyard);

        let mut cleared = Graveyard::default();
        for frame in &kept {
            if frame.visit_id() == id {
                continue;
            }
            if frame.locals.visit_id() != id {
                cleared.bury_dict(&frame.locals);
            }
            if frame.args.visit_id() != id {
                cleared.bury_dict(&frame.args);
            }
            if frame.varargs.visit_id() != id {
                cleared.bury_list(&frame.varargs);
            }
        }
        self.kept_frames
            .retain(|weak| weak.upgrade().is_some_and(|frame| frame.visit_id() == id));
        self.kept_prune_at = (self.kept_frames.len() * 2).max(MIN_KEPT_PRUNE_AT);
        drop(kept);
        freed += cleared.len();
        drop(cleared);

        self.store.prune();
        self.functions.prune_anonymous();
        Ok(freed)
    }

    fn push_roots(&self, stack: &mut Vec<Mark>) -> Result<(), TryReserveError> {
        for scope in self.scopes.roots() {
            stack.try_reserve(1)?;
            stack.push(Mark::Value(Value::Dict(scope.clone())));
        }
        stack.try_reserve(self.call_stack.len())?;
        stack.extend(self.call_stack.iter().cloned().map(Mark::Frame));
        for function in self.functions.named() {
            stack.try_reserve(1)?;
            stack.push(Mark::Function(function.clone()));
        }
        for value in self.roots.values().chain(self.options.values()) {
            if let Some(item) = Mark::of(value) {
                stack.try_reserve(1)?;
                stack.push(item);
            }
        }
        Ok(())
    }
}

/// Stamp everything reachable from `stack` with `id`.
fn mark(stack: &mut Vec<Mark>, id: u32) -> Result<(), TryReserveError> {
    while let Some(item) = stack.pop() {
        match item {
            Mark::Value(Value::List(list)) => {
                if list.stamp(id) {
                    push_values(stack, &list.to_vec())?;
                }
            }
            Mark::Value(Value::Dict(dict)) => {
                if dict.stamp(id) {
                    push_values(stack, &dict.values())?;
                }
            }
            Mark::Value(Value::Partial(partial)) => {
                push_values(stack, partial.args())?;
                stack.try_reserve(2)?;
                if let Some(receiver) = partial.receiver() {
                    stack.push(Mark::Value(Value::Dict(receiver.clone())));
                }
                if let Some(function) = partial.function() {
                    stack.push(Mark::Function(function.clone()));
                }
            }
            Mark::Value(_) => {}
            Mark::Function(function) => {
                if function.stamp(id) {
                    if let Some(parent) = &function.closure_parent {
                        stack.try_reserve(1)?;
                        stack.push(Mark::Frame(parent.clone()));
                    }
                }
            }
            Mark::Frame(frame) => {
                if frame.stamp(id) {
                    stack.try_reserve(4)?;
                    stack.push(Mark::Value(Value::Dict(frame.locals.clone())));
                    stack.push(Mark::Value(Value::Dict(frame.args.clone())));
                    stack.push(Mark::Value(Value::List(frame.varargs.clone())));
                    stack.push(Mark::Function(frame.function.clone()));
                }
            }
        }
    }
    Ok(())
}

fn push_values(stack: &mut Vec<Mark>, values: &[Value]) -> Result<(), TryReserveError> {
    stack.try_reserve(values.len())?;
    stack.extend(values.iter().filter_map(Mark::of));
    Ok(())
}
