//! Namespaces and their function tables.
//!
//! A namespace maps lowercase names to [`Executable`]s. Built-ins are
//! installed first; an action of the same name replaces the entry in that
//! namespace only, and dropping the action puts the built-in back.

use std::sync::Arc;

use lq_ast::ActionDef;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::builtins::{self, BUILTINS};
use crate::errors::{action_exists, namespace_exists, unknown_action, ExecError};
use crate::executable::Executable;

#[derive(Clone, Debug)]
pub struct Namespace {
    name: String,
    functions: FxHashMap<String, Arc<Executable>>,
    /// Source definitions of user actions, kept for introspection.
    actions: FxHashMap<String, Arc<ActionDef>>,
    builtins: bool,
}

impl Namespace {
    pub fn new(name: impl Into<String>, builtins: bool) -> Self {
        let mut functions = FxHashMap::default();
        if builtins {
            for builtin in BUILTINS {
                functions.insert(builtin.name.to_string(), Arc::new(Executable::builtin(builtin)));
            }
        }
        Namespace {
            name: name.into(),
            functions,
            actions: FxHashMap::default(),
            builtins,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Callable by lowercase name: an action, or a built-in it does not shadow.
    pub fn function(&self, name: &str) -> Option<&Arc<Executable>> {
        self.functions.get(name)
    }

    pub fn action(&self, name: &str) -> Option<&ActionDef> {
        self.actions.get(name).map(AsRef::as_ref)
    }

    /// Names of user actions, sorted.
    pub fn action_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Compile and install an action.
    ///
    /// Returns `false` when an action of that name exists and
    /// `if_not_exists` is set.
    pub fn create_action(
        &mut self,
        mut def: ActionDef,
        or_replace: bool,
        if_not_exists: bool,
    ) -> Result<bool, ExecError> {
        def.name = def.name.to_ascii_lowercase();
        if self.actions.contains_key(&def.name) {
            if if_not_exists {
                return Ok(false);
            }
            if !or_replace {
                return Err(action_exists(&self.name, &def.name));
            }
        }
        debug!(namespace = %self.name, action = %def.name, "create action");
        let executable = Executable::action(&self.name, &def);
        self.functions.insert(def.name.clone(), Arc::new(executable));
        self.actions.insert(def.name.clone(), Arc::new(def));
        Ok(true)
    }

    /// Remove an action, restoring a built-in it shadowed.
    ///
    /// Returns `false` when no such action exists and `if_exists` is set.
    pub fn drop_action(&mut self, name: &str, if_exists: bool) -> Result<bool, ExecError> {
        let name = name.to_ascii_lowercase();
        if self.actions.remove(&name).is_none() {
            if if_exists {
                return Ok(false);
            }
            return Err(unknown_action(&self.name, &name));
        }
        debug!(namespace = %self.name, action = %name, "drop action");
        match builtins::lookup(&name).filter(|_| self.builtins) {
            Some(builtin) => {
                self.functions.insert(name, Arc::new(Executable::builtin(builtin)));
            }
            None => {
                self.functions.remove(&name);
            }
        }
        Ok(true)
    }
}

/// Every namespace of a database.
///
/// Cloning is shallow: compiled executables are shared.
#[derive(Clone, Debug, Default)]
pub struct Namespaces {
    map: FxHashMap<String, Namespace>,
    builtins: bool,
}

impl Namespaces {
    pub fn new(builtins: bool) -> Self {
        Namespaces {
            map: FxHashMap::default(),
            builtins,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Namespace> {
        self.map.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Namespace> {
        self.map.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Create an empty namespace. Returns `false` when it exists and
    /// `if_not_exists` is set.
    pub fn create(&mut self, name: &str, if_not_exists: bool) -> Result<bool, ExecError> {
        if self.map.contains_key(name) {
            if if_not_exists {
                return Ok(false);
            }
            return Err(namespace_exists(name));
        }
        self.map
            .insert(name.to_string(), Namespace::new(name, self.builtins));
        Ok(true)
    }

    /// The namespace `name`, created empty if missing.
    pub fn ensure(&mut self, name: &str) -> &mut Namespace {
        let builtins = self.builtins;
        self.map
            .entry(name.to_string())
            .or_insert_with(|| Namespace::new(name, builtins))
    }

    pub fn remove(&mut self, name: &str) -> Option<Namespace> {
        self.map.remove(name)
    }

    /// Namespace names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.map.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
