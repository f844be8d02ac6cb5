//! Variable lookup and assignment across scopes and closure chains.
//!
//! An unprefixed name is `l:` inside a function and `g:` outside. `l:` and
//! `a:` lookups that miss in the current frame continue through the frames
//! closures were defined in, for reads, writes to existing variables and
//! `unlet`.

use std::rc::Rc;

use quill_value::errors::{
    cannot_delete_variable, funcref_name_not_capitalized, illegal_variable_name,
    no_such_variable, read_only_variable, undefined_variable, variable_conflicts_with_function,
};
use quill_value::{CallFrame, DictRef, EvalError, EvalResult, Value};

use super::Interpreter;
use crate::scope::{is_valid_var_name, split_name, ScopeKind};

/// Where a variable lives (or would be created).
pub(crate) struct VarSlot {
    pub(crate) dict: DictRef,
    pub(crate) key: String,
    /// The scope after resolving an implicit prefix.
    pub(crate) scope: ScopeKind,
}

impl Interpreter {
    /// Read a variable; unknown names fail with `E121`.
    pub(crate) fn get_var(&mut self, name: &str) -> EvalResult {
        self.lookup_var(name)?
            .ok_or_else(|| undefined_variable(name))
    }

    /// Read a variable, `None` if it does not exist. A bare prefix such as
    /// `g:` yields the scope dict itself.
    pub(crate) fn lookup_var(&mut self, name: &str) -> Result<Option<Value>, EvalError> {
        let parts = split_name(name)?;
        let scope = self.effective_scope(parts.scope);
        if parts.name.is_empty() {
            return Ok(self.scope_dict(scope).map(Value::Dict));
        }
        Ok(self
            .find_slot(scope, parts.name)
            .and_then(|dict| dict.get(parts.name)))
    }

    /// The value of `name` if it is a variable holding a function.
    pub(crate) fn function_variable(&mut self, name: &str) -> Option<Value> {
        if name.starts_with('<') {
            return None;
        }
        self.lookup_var(name)
            .ok()
            .flatten()
            .filter(Value::is_func)
    }

    /// Assign `value` to the variable `name`, creating it if needed.
    pub(crate) fn set_var(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        let slot = self.var_slot_for_write(name)?;
        self.check_var_assign(&slot, name, &value)?;
        let old = slot.dict.insert(&slot.key, value)?;
        drop(old);
        Ok(())
    }

    /// Resolve the slot an assignment to `name` writes.
    pub(crate) fn var_slot_for_write(&mut self, name: &str) -> Result<VarSlot, EvalError> {
        let parts = split_name(name)?;
        if !is_valid_var_name(parts.name) {
            return Err(illegal_variable_name(name));
        }
        let scope = self.effective_scope(parts.scope);
        let dict = match scope {
            ScopeKind::Local => match self.find_slot(scope, parts.name) {
                Some(dict) => dict,
                None => self
                    .scope_dict(scope)
                    .ok_or_else(|| illegal_variable_name(name))?,
            },
            ScopeKind::Argument => {
                return Err(match self.find_slot(scope, parts.name) {
                    Some(_) => read_only_variable(name),
                    None => illegal_variable_name(name),
                });
            }
            ScopeKind::Vim => {
                let vim = self.scopes.vim().clone();
                if !vim.contains_key(parts.name) {
                    return Err(illegal_variable_name(name));
                }
                vim
            }
            _ => self
                .scope_dict(scope)
                .ok_or_else(|| illegal_variable_name(name))?,
        };
        Ok(VarSlot {
            dict,
            key: parts.name.to_string(),
            scope,
        })
    }

    /// Whether `value` may be stored in `slot`: the slot and its dict must
    /// accept the write, a function value needs a capitalized name outside
    /// `b: w: s: t:`, and a new one may not hide a function.
    pub(crate) fn check_var_assign(
        &self,
        slot: &VarSlot,
        name: &str,
        value: &Value,
    ) -> Result<(), EvalError> {
        slot.dict.check_assign(&slot.key)?;
        if !value.is_func() {
            return Ok(());
        }
        let first_upper = slot.key.as_bytes().first().is_some_and(u8::is_ascii_uppercase);
        if !first_upper && !slot.scope.allows_lowercase_funcref() {
            return Err(funcref_name_not_capitalized(name));
        }
        if !slot.dict.contains_key(&slot.key) {
            let function_name = match slot.scope {
                ScopeKind::Script => format!("s:{}", slot.key),
                _ => slot.key.clone(),
            };
            if self.function_exists(&function_name) {
                return Err(variable_conflicts_with_function(name));
            }
        }
        Ok(())
    }

    /// The dict holding the existing variable `name`, with its bare key.
    pub(crate) fn var_location(
        &mut self,
        name: &str,
    ) -> Result<Option<(DictRef, String)>, EvalError> {
        let parts = split_name(name)?;
        let scope = self.effective_scope(parts.scope);
        Ok(self
            .find_slot(scope, parts.name)
            .map(|dict| (dict, parts.name.to_string())))
    }

    /// `unlet name`; `force` (`unlet!`) ignores a missing variable.
    pub(crate) fn remove_var(&mut self, name: &str, force: bool) -> Result<(), EvalError> {
        let parts = split_name(name)?;
        if parts.name.is_empty() {
            return Err(cannot_delete_variable(name));
        }
        let scope = self.effective_scope(parts.scope);
        let removed = match self.find_slot(scope, parts.name) {
            Some(dict) => dict.remove(parts.name)?,
            None => None,
        };
        if removed.is_none() && !force {
            return Err(no_such_variable(name));
        }
        Ok(())
    }

    /// Resolve a missing prefix: `l:` in a function, `g:` outside.
    pub(crate) fn effective_scope(&self, scope: Option<ScopeKind>) -> ScopeKind {
        match scope {
            Some(scope) => scope,
            None if self.current_frame().is_some() => ScopeKind::Local,
            None => ScopeKind::Global,
        }
    }

    /// The dict backing `scope` right now, if there is one.
    pub(crate) fn scope_dict(&mut self, scope: ScopeKind) -> Option<DictRef> {
        match scope {
            ScopeKind::Global => Some(self.scopes.globals().clone()),
            ScopeKind::Vim => Some(self.scopes.vim().clone()),
            ScopeKind::Script => Some(self.scopes.script(&self.store, self.current_script)),
            ScopeKind::Local => self.current_frame().map(|frame| frame.locals.clone()),
            ScopeKind::Argument => self.current_frame().map(|frame| frame.args.clone()),
            ScopeKind::Buffer | ScopeKind::Window | ScopeKind::Tab => {
                self.scopes.host(scope).cloned()
            }
        }
    }

    /// The dict that holds `key` in `scope`, following closure parents for
    /// `l:` and `a:`.
    fn find_slot(&mut self, scope: ScopeKind, key: &str) -> Option<DictRef> {
        match scope {
            ScopeKind::Local | ScopeKind::Argument => {
                let mut frame: Option<Rc<CallFrame>> = self.current_frame().cloned();
                while let Some(current) = frame {
                    let dict = if scope == ScopeKind::Local {
                        &current.locals
                    } else {
                        &current.args
                    };
                    if dict.contains_key(key) {
                        return Some(dict.clone());
                    }
                    frame = current.function.closure_parent.clone();
                }
                None
            }
            _ => self
                .scope_dict(scope)
                .filter(|dict| dict.contains_key(key)),
        }
    }
}
