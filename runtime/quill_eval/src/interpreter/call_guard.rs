//! RAII guard for an active user-function call.
//!
//! Pushing a frame also marks the function in use and switches the current
//! script; the guard undoes all three when dropped, on error paths included.
//! A frame that is still referenced after the pop (a closure captured it)
//! moves to the kept-alive list for the collector.

use std::ops::{Deref, DerefMut};
use std::rc::{Rc, Weak};

use quill_value::{CallFrame, ScriptId};

use super::{Interpreter, MIN_KEPT_PRUNE_AT};

pub(crate) struct ActiveCall<'interp> {
    interpreter: &'interp mut Interpreter,
    frame: Rc<CallFrame>,
    saved_script: ScriptId,
}

impl Interpreter {
    /// Make `frame` the innermost call until the guard drops.
    pub(crate) fn push_call(&mut self, frame: Rc<CallFrame>) -> ActiveCall<'_> {
        frame.function.enter();
        let saved_script = std::mem::replace(&mut self.current_script, frame.function.script);
        self.call_stack.push(frame.clone());
        ActiveCall {
            interpreter: self,
            frame,
            saved_script,
        }
    }
}

impl Drop for ActiveCall<'_> {
    fn drop(&mut self) {
        self.interpreter.call_stack.pop();
        self.interpreter.current_script = self.saved_script;
        self.frame.function.exit();
        // Only the guard's own handle left means nothing captured the frame.
        if Rc::strong_count(&self.frame) > 1 {
            tracing::trace!(
                function = %self.frame.function.name,
                "frame outlives its call"
            );
            self.interpreter.keep_frame(Rc::downgrade(&self.frame));
        }
    }
}

impl Interpreter {
    /// Add `frame` to the kept-alive list, first dropping handles whose
    /// frame is gone once the list reaches its prune threshold.
    fn keep_frame(&mut self, frame: Weak<CallFrame>) {
        if self.kept_frames.len() >= self.kept_prune_at {
            self.kept_frames.retain(|weak| weak.strong_count() > 0);
            self.kept_prune_at = (self.kept_frames.len() * 2).max(MIN_KEPT_PRUNE_AT);
        }
        self.kept_frames.push(frame);
    }
}

impl Deref for ActiveCall<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ActiveCall<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}
