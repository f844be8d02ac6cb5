//! User function registry.
//!
//! Named functions are owned by the registry. Anonymous functions (lambdas
//! and dict functions) are owned by the values that refer to them; the
//! registry only keeps a weak handle so `function('<lambda>3')` can find them
//! while they are alive.

use std::rc::{Rc, Weak};

use quill_value::errors::{cannot_delete_unknown_function, function_exists, function_in_use};
use quill_value::{CallFrame, EvalError, FunctionDef, ScriptId, UserFunction};
use rustc_hash::FxHashMap;

/// Kind of anonymous function, which decides its generated name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnonymousKind {
    /// `<lambda>N`
    Lambda,
    /// `N`, for `function dict.key()`.
    Numbered,
}

#[derive(Default)]
pub struct FunctionRegistry {
    named: FxHashMap<Rc<str>, Rc<UserFunction>>,
    anonymous: FxHashMap<Rc<str>, Weak<UserFunction>>,
    last_lambda: u32,
    last_numbered: u32,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live, non-deleted function by its canonical name.
    pub fn get(&self, name: &str) -> Option<Rc<UserFunction>> {
        if let Some(function) = self.named.get(name) {
            return Some(function.clone());
        }
        self.anonymous
            .get(name)
            .and_then(Weak::upgrade)
            .filter(|function| !function.is_deleted())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Register a named function.
    ///
    /// An existing definition is replaced only when `force` is set; the old
    /// one is marked deleted and lives on in calls that are still running.
    pub fn define(
        &mut self,
        def: FunctionDef,
        script: ScriptId,
        closure_parent: Option<Rc<CallFrame>>,
        force: bool,
    ) -> Result<Rc<UserFunction>, EvalError> {
        let name: Rc<str> = Rc::from(def.name.as_str());
        if let Some(existing) = self.named.get(&name) {
            if !force {
                return Err(if existing.in_use() {
                    function_in_use(&name)
                } else {
                    function_exists(&name)
                });
            }
            existing.mark_deleted();
            tracing::debug!(function = %name, "replacing function definition");
        }
        let function = Rc::new(UserFunction::new(def, name.clone(), script, closure_parent));
        self.named.insert(name, function.clone());
        Ok(function)
    }

    /// Create an anonymous function with a fresh generated name.
    pub fn create_anonymous(
        &mut self,
        mut def: FunctionDef,
        kind: AnonymousKind,
        script: ScriptId,
        closure_parent: Option<Rc<CallFrame>>,
    ) -> Rc<UserFunction> {
        let name: Rc<str> = match kind {
            AnonymousKind::Lambda => {
                self.last_lambda += 1;
                Rc::from(format!("<lambda>{}", self.last_lambda))
            }
            AnonymousKind::Numbered => {
                self.last_numbered += 1;
                Rc::from(self.last_numbered.to_string())
            }
        };
        def.name = name.to_string();
        let function = Rc::new(UserFunction::new(def, name.clone(), script, closure_parent));
        if self.anonymous.len() >= self.prune_at() {
            self.prune_anonymous();
        }
        self.anonymous.insert(name, Rc::downgrade(&function));
        function
    }

    /// Remove `name` from lookups. A function that is running stays alive
    /// until its calls return.
    pub fn delete(&mut self, name: &str) -> Result<(), EvalError> {
        if let Some(function) = self.named.remove(name) {
            function.mark_deleted();
            return Ok(());
        }
        match self.anonymous.remove(name).and_then(|weak| weak.upgrade()) {
            Some(function) => {
                function.mark_deleted();
                Ok(())
            }
            None => Err(cannot_delete_unknown_function(name)),
        }
    }

    /// Every named function, for the collector's root walk.
    pub fn named(&self) -> impl Iterator<Item = &Rc<UserFunction>> {
        self.named.values()
    }

    /// Names of the registered named functions, sorted.
    pub fn names(&self) -> Vec<Rc<str>> {
        let mut names: Vec<Rc<str>> = self.named.keys().cloned().collect();
        names.sort();
        names
    }

    /// Forget anonymous functions that have been freed.
    pub fn prune_anonymous(&mut self) {
        self.anonymous.retain(|_, weak| weak.strong_count() > 0);
    }

    fn prune_at(&self) -> usize {
        (self.named.len() + 64) * 2
    }
}
