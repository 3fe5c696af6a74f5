//! Lexical variable scopes.
//!
//! A [`Scope`] is one frame of a singly-linked chain. Blocks (`IF` bodies,
//! loop iterations) get a child frame that sees its parents; an action call
//! gets a fresh root, so a callee never sees its caller's locals.
//!
//! Frames hold plain `$` variables only. `@` names are resolved from the
//! transaction context by [`ExecutionContext`](crate::ExecutionContext).

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use lq_value::Value;
use rustc_hash::FxHashMap;

use crate::errors::{duplicate_variable, type_mismatch, ExecError};

/// Single-threaded shared handle to a scope frame.
///
/// All frame allocations go through [`LocalScope::new`]. The handle is `Rc`
/// based, which keeps an execution context `!Send`.
#[repr(transparent)]
pub struct LocalScope<T>(Rc<RefCell<T>>);

impl<T> LocalScope<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        LocalScope(Rc::new(RefCell::new(value)))
    }

    /// Whether two handles point at the same frame.
    #[inline]
    pub fn ptr_eq(&self, other: &LocalScope<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for LocalScope<T> {
    #[inline]
    fn clone(&self) -> Self {
        LocalScope(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for LocalScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalScope").field(&self.0).finish()
    }
}

impl<T> Deref for LocalScope<T> {
    type Target = RefCell<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// One frame of variable bindings.
#[derive(Debug)]
pub struct Scope {
    variables: FxHashMap<String, Value>,
    parent: Option<LocalScope<Scope>>,
    /// Namespace unqualified names resolve in.
    namespace: String,
    /// Namespace of the action that called into this chain, `None` at top
    /// level.
    caller_namespace: Option<String>,
}

impl Scope {
    /// A root frame.
    pub fn root(namespace: impl Into<String>, caller_namespace: Option<String>) -> Self {
        Scope {
            variables: FxHashMap::default(),
            parent: None,
            namespace: namespace.into(),
            caller_namespace,
        }
    }

    /// A block frame under `parent`, in the same namespace.
    pub fn child(parent: &LocalScope<Scope>) -> Self {
        let (namespace, caller_namespace) = {
            let parent = parent.borrow();
            (parent.namespace.clone(), parent.caller_namespace.clone())
        };
        Scope {
            variables: FxHashMap::default(),
            parent: Some(parent.clone()),
            namespace,
            caller_namespace,
        }
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[inline]
    pub fn caller_namespace(&self) -> Option<&str> {
        self.caller_namespace.as_deref()
    }

    /// Look a variable up from this frame outward.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.variables.get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.borrow().get(name))
    }

    /// Declare `name` in this frame. Shadowing an outer frame is allowed;
    /// redeclaring in the same frame is not.
    pub fn allocate(&mut self, name: &str, value: Value) -> Result<(), ExecError> {
        if self.variables.contains_key(name) {
            return Err(duplicate_variable(name));
        }
        self.variables.insert(name.to_string(), value);
        Ok(())
    }

    /// Overwrite `name` in the nearest frame that declares it, or declare it
    /// here when none does.
    ///
    /// An existing variable keeps its type: a null takes that type and any
    /// other value must match it exactly.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), ExecError> {
        if let Some(value) = self.assign(name, value)? {
            self.variables.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Assign to an existing variable. Hands the value back when no frame
    /// declares `name`.
    fn assign(&mut self, name: &str, value: Value) -> Result<Option<Value>, ExecError> {
        if let Some(slot) = self.variables.get_mut(name) {
            *slot = typed_assignment(slot, value)?;
            return Ok(None);
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => Ok(Some(value)),
        }
    }
}

/// The value to store when assigning `value` over `current`.
fn typed_assignment(current: &Value, value: Value) -> Result<Value, ExecError> {
    let Some(declared) = current.data_type() else {
        // Records carry no type descriptor; any record may replace one.
        return match value {
            Value::Record(_) => Ok(value),
            other => Err(type_mismatch("record", other.type_name())),
        };
    };
    if declared.is_null() {
        return Ok(value);
    }
    if value.has_type(&declared) {
        Ok(value.retype_null(declared))
    } else {
        Err(type_mismatch(declared, value.type_name()))
    }
}
