//! Function, partial and call-frame data.
//!
//! These are plain data: the call engine that binds arguments, executes
//! bodies and decides frame lifetimes lives in `quill_eval`. They sit here
//! because values hold them (a `Partial` owns its function, a closure owns its
//! parent frame) and the collector walks them alongside containers.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use bitflags::bitflags;

use crate::store::{advance_stamp, DictRef, ListRef};
use crate::value::Value;

/// Identifier of a loaded script, used to keep `s:` names apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScriptId(pub u32);

bitflags! {
    /// Attributes of a user function.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FunctionFlags: u8 {
        /// Stop at the first error instead of continuing with the next line.
        const ABORT = 1 << 0;
        /// Accepts a line range.
        const RANGE = 1 << 1;
        /// Needs a receiver dict, bound as `self`.
        const DICT = 1 << 2;
        /// Resolves free names through the frame it was defined in.
        const CLOSURE = 1 << 3;
        /// Removed from the registry; only in-flight calls still see it.
        const DELETED = 1 << 4;
        /// Created by a `{args -> expr}` literal.
        const LAMBDA = 1 << 5;
    }
}

/// What a function executes.
#[derive(Clone, Debug)]
pub enum FunctionBody {
    /// Statement lines run by the command layer.
    Lines(Rc<[String]>),
    /// A lambda's single expression.
    Expr(Rc<str>),
}

/// A parsed function header plus body, before registration.
#[derive(Clone, Debug)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub variadic: bool,
    pub flags: FunctionFlags,
    pub body: FunctionBody,
}

/// A defined user function.
pub struct UserFunction {
    pub name: Rc<str>,
    pub params: Vec<String>,
    pub variadic: bool,
    pub body: FunctionBody,
    pub script: ScriptId,
    /// The frame a closure resolves free names through.
    pub closure_parent: Option<Rc<CallFrame>>,
    flags: Cell<FunctionFlags>,
    active_calls: Cell<usize>,
    visit: Cell<u32>,
}

impl UserFunction {
    pub fn new(
        def: FunctionDef,
        name: Rc<str>,
        script: ScriptId,
        closure_parent: Option<Rc<CallFrame>>,
    ) -> Self {
        UserFunction {
            name,
            params: def.params,
            variadic: def.variadic,
            body: def.body,
            script,
            closure_parent,
            flags: Cell::new(def.flags),
            active_calls: Cell::new(0),
            visit: Cell::new(0),
        }
    }

    #[inline]
    pub fn flags(&self) -> FunctionFlags {
        self.flags.get()
    }

    #[inline]
    pub fn has_flag(&self, flag: FunctionFlags) -> bool {
        self.flags.get().contains(flag)
    }

    pub fn mark_deleted(&self) {
        self.flags.set(self.flags.get() | FunctionFlags::DELETED);
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.has_flag(FunctionFlags::DELETED)
    }

    /// Number of declared parameters, not counting `...`.
    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Note that a call started.
    pub fn enter(&self) {
        self.active_calls.set(self.active_calls.get() + 1);
    }

    /// Note that a call finished.
    pub fn exit(&self) {
        self.active_calls.set(self.active_calls.get().saturating_sub(1));
    }

    /// Whether a call to this function is executing.
    pub fn in_use(&self) -> bool {
        self.active_calls.get() > 0
    }

    /// Stamp with the collector pass `id`; `false` if already stamped.
    pub fn stamp(&self, id: u32) -> bool {
        advance_stamp(&self.visit, id)
    }
}

impl std::fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("variadic", &self.variadic)
            .field("flags", &self.flags.get())
            .finish_non_exhaustive()
    }
}

/// Storage for one function invocation.
pub struct CallFrame {
    pub function: Rc<UserFunction>,
    /// `l:`
    pub locals: DictRef,
    /// `a:`
    pub args: DictRef,
    /// `a:000`
    pub varargs: ListRef,
    pub caller: Option<Weak<CallFrame>>,
    /// Nesting depth, 1 for a call made from top level.
    pub depth: usize,
    visit: Cell<u32>,
}

impl CallFrame {
    pub fn new(
        function: Rc<UserFunction>,
        locals: DictRef,
        args: DictRef,
        varargs: ListRef,
        caller: Option<Weak<CallFrame>>,
        depth: usize,
    ) -> Self {
        CallFrame {
            function,
            locals,
            args,
            varargs,
            caller,
            depth,
            visit: Cell::new(0),
        }
    }

    /// Stamp with the collector pass `id`; `false` if already stamped
    /// (a frame stamped `id` is never downgraded to `id + 1`).
    pub fn stamp(&self, id: u32) -> bool {
        advance_stamp(&self.visit, id)
    }

    /// The exact stamp of the last pass that reached this frame.
    pub fn visit_id(&self) -> u32 {
        self.visit.get()
    }
}

impl std::fmt::Debug for CallFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallFrame")
            .field("function", &self.function.name)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

/// The function a partial calls.
#[derive(Clone, Debug)]
pub enum Callee {
    /// Looked up by name at call time.
    Name(Rc<str>),
    /// Held directly (lambdas, dict functions, closures).
    Function(Rc<UserFunction>),
}

/// A function with bound leading arguments and/or a bound receiver.
///
/// Immutable once built.
pub struct Partial {
    callee: Callee,
    args: Vec<Value>,
    receiver: Option<DictRef>,
    auto_receiver: bool,
}

impl Partial {
    pub fn new(callee: Callee, args: Vec<Value>, receiver: Option<DictRef>, auto_receiver: bool) -> Self {
        Partial {
            callee,
            args,
            receiver,
            auto_receiver,
        }
    }

    pub fn callee(&self) -> &Callee {
        &self.callee
    }

    /// Name of the function this partial calls.
    pub fn name(&self) -> &str {
        match &self.callee {
            Callee::Name(name) => name,
            Callee::Function(function) => &function.name,
        }
    }

    pub fn function(&self) -> Option<&Rc<UserFunction>> {
        match &self.callee {
            Callee::Function(function) => Some(function),
            Callee::Name(_) => None,
        }
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn receiver(&self) -> Option<&DictRef> {
        self.receiver.as_ref()
    }

    /// Whether the receiver was bound implicitly by fetching a function from
    /// a dict, in which case a call-site receiver replaces it.
    pub fn is_auto_receiver(&self) -> bool {
        self.auto_receiver
    }
}

impl std::fmt::Debug for Partial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partial")
            .field("name", &self.name())
            .field("args", &self.args.len())
            .field("receiver", &self.receiver.is_some())
            .field("auto_receiver", &self.auto_receiver)
            .finish()
    }
}
