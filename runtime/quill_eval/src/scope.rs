//! Variable scopes and name splitting.
//!
//! Every scope is a dict: `g:`, `v:`, one `s:` per script, and the host
//! scopes `b:`, `w:`, `t:` live in the [`ScopeTable`]; `l:` and `a:` belong
//! to call frames. Resolution against frames (and the closure chain) happens
//! in the interpreter, which knows the call stack.

use quill_value::errors::illegal_variable_name;
use quill_value::{
    type_code, ContainerStore, DictRef, EvalError, ItemFlags, ScopeMarker, ScriptId, Value,
};
use rustc_hash::FxHashMap;

/// The namespace selected by a one-letter prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Global,
    Script,
    Local,
    Argument,
    Vim,
    Buffer,
    Window,
    Tab,
}

impl ScopeKind {
    pub fn from_prefix(prefix: u8) -> Option<Self> {
        match prefix {
            b'g' => Some(ScopeKind::Global),
            b's' => Some(ScopeKind::Script),
            b'l' => Some(ScopeKind::Local),
            b'a' => Some(ScopeKind::Argument),
            b'v' => Some(ScopeKind::Vim),
            b'b' => Some(ScopeKind::Buffer),
            b'w' => Some(ScopeKind::Window),
            b't' => Some(ScopeKind::Tab),
            _ => None,
        }
    }

    pub fn prefix(self) -> char {
        match self {
            ScopeKind::Global => 'g',
            ScopeKind::Script => 's',
            ScopeKind::Local => 'l',
            ScopeKind::Argument => 'a',
            ScopeKind::Vim => 'v',
            ScopeKind::Buffer => 'b',
            ScopeKind::Window => 'w',
            ScopeKind::Tab => 't',
        }
    }

    /// Scopes whose variables may hold a function under a lowercase name.
    pub fn allows_lowercase_funcref(self) -> bool {
        matches!(
            self,
            ScopeKind::Buffer | ScopeKind::Window | ScopeKind::Script | ScopeKind::Tab
        )
    }

    fn is_host(self) -> bool {
        matches!(self, ScopeKind::Buffer | ScopeKind::Window | ScopeKind::Tab)
    }
}

/// A variable name split into its scope and bare name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VarName<'a> {
    /// `None` when the name has no prefix.
    pub scope: Option<ScopeKind>,
    /// Empty for a bare prefix such as `g:`.
    pub name: &'a str,
}

/// Split `full` into prefix and name.
///
/// Any other single-letter prefix is an illegal name.
pub fn split_name(full: &str) -> Result<VarName<'_>, EvalError> {
    let bytes = full.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' {
        let scope =
            ScopeKind::from_prefix(bytes[0]).ok_or_else(|| illegal_variable_name(full))?;
        return Ok(VarName {
            scope: Some(scope),
            name: &full[2..],
        });
    }
    Ok(VarName {
        scope: None,
        name: full,
    })
}

/// Whether `name` is a valid bare variable name: `[A-Za-z0-9_#]+`.
pub fn is_valid_var_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(is_var_name_byte)
}

#[inline]
pub fn is_var_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'#'
}

/// Built-in `v:` variables other than the type codes.
const VIM_VARIABLES: &[&str] = &["errmsg", "key", "val", "exception"];

/// The scope dicts that outlive every call.
pub struct ScopeTable {
    globals: DictRef,
    vim: DictRef,
    scripts: FxHashMap<ScriptId, DictRef>,
    host: FxHashMap<ScopeKind, DictRef>,
}

impl ScopeTable {
    pub fn new(store: &ContainerStore) -> Result<Self, EvalError> {
        let vim = store.new_scope_dict(ScopeMarker::Scope);
        let fixed = ItemFlags::READ_ONLY | ItemFlags::FIXED;
        vim.define("true", Value::boolean(true), fixed)?;
        vim.define("false", Value::boolean(false), fixed)?;
        vim.define("null", Value::null(), fixed)?;
        for (name, code) in [
            ("t_number", type_code::NUMBER),
            ("t_string", type_code::STRING),
            ("t_func", type_code::FUNC),
            ("t_list", type_code::LIST),
            ("t_dict", type_code::DICT),
            ("t_float", type_code::FLOAT),
            ("t_bool", type_code::BOOL),
        ] {
            vim.define(name, Value::number(code), fixed)?;
        }
        for name in VIM_VARIABLES {
            let flags = if *name == "errmsg" {
                ItemFlags::FIXED
            } else {
                fixed
            };
            vim.define(name, Value::empty_string(), flags)?;
        }
        vim.seal();

        let mut host = FxHashMap::default();
        for kind in [ScopeKind::Buffer, ScopeKind::Window, ScopeKind::Tab] {
            host.insert(kind, store.new_scope_dict(ScopeMarker::Scope));
        }
        Ok(ScopeTable {
            globals: store.new_scope_dict(ScopeMarker::DefaultScope),
            vim,
            scripts: FxHashMap::default(),
            host,
        })
    }

    /// `g:`
    pub fn globals(&self) -> &DictRef {
        &self.globals
    }

    /// `v:`
    pub fn vim(&self) -> &DictRef {
        &self.vim
    }

    /// The `s:` dict of `script`, created on first use.
    pub fn script(&mut self, store: &ContainerStore, script: ScriptId) -> DictRef {
        self.scripts
            .entry(script)
            .or_insert_with(|| store.new_scope_dict(ScopeMarker::Scope))
            .clone()
    }

    /// A host scope (`b:`, `w:` or `t:`).
    pub fn host(&self, kind: ScopeKind) -> Option<&DictRef> {
        self.host.get(&kind)
    }

    /// Swap in the dict backing a host scope, e.g. when the current buffer
    /// changes. Returns the previous dict.
    pub fn set_host(
        &mut self,
        kind: ScopeKind,
        dict: DictRef,
    ) -> Result<Option<DictRef>, EvalError> {
        if !kind.is_host() {
            return Err(illegal_variable_name(&format!("{}:", kind.prefix())));
        }
        Ok(self.host.insert(kind, dict))
    }

    /// Every scope dict, for the collector.
    pub fn roots(&self) -> impl Iterator<Item = &DictRef> {
        [&self.globals, &self.vim]
            .into_iter()
            .chain(self.scripts.values())
            .chain(self.host.values())
    }
}

#[cfg(test)]
mod tests;
