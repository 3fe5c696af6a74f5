//! Per-call execution state.
//!
//! One [`ExecutionContext`] lives for one top-level statement or call.
//! Nested action calls reuse it and swap its scope (see
//! [`ScopeSwap`](crate::scope_guard::ScopeSwap)).

use lq_ast::{CONTEXT_PREFIX, VARIABLE_PREFIX};
use lq_sql::{Planner, Store};
use lq_types::{ActionModifiers, Privilege};
use lq_value::Value;

use crate::access::AccessController;
use crate::diagnostics::CallStack;
use crate::environment::{LocalScope, Scope};
use crate::errors::{
    action_mutates_state, action_owner_only, action_private, invalid_variable, permission_denied,
    read_only_variable, unknown_variable, ExecError,
};
use crate::namespace::Namespaces;

/// The transaction an interpreter call runs in.
///
/// Read by the `@` variables. Every field is part of the replicated
/// transaction, so actions reading them stay deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxContext {
    /// Identity of the sender, as text.
    pub caller: String,
    /// Raw signer bytes.
    pub signer: Vec<u8>,
    /// Name of the authenticator that verified the signer.
    pub authenticator: String,
    pub txid: String,
    pub height: i64,
    pub block_timestamp: i64,
}

impl TxContext {
    /// A context for `caller` with every other field empty.
    pub fn new(caller: impl Into<String>) -> Self {
        TxContext {
            caller: caller.into(),
            ..TxContext::default()
        }
    }
}

pub struct ExecutionContext<'a> {
    pub(crate) tx: &'a TxContext,
    pub(crate) store: &'a mut dyn Store,
    pub(crate) namespaces: &'a Namespaces,
    pub(crate) access: &'a dyn AccessController,
    pub(crate) planner: &'a dyn Planner,
    pub(crate) scope: LocalScope<Scope>,
    pub(crate) call_stack: CallStack,
    pub(crate) notices: Vec<String>,
    /// Whether statements may modify state. Fixed by the store's access mode.
    pub(crate) mutating: bool,
}

impl<'a> ExecutionContext<'a> {
    #[allow(clippy::too_many_arguments, reason = "one field per collaborator")]
    pub(crate) fn new(
        tx: &'a TxContext,
        store: &'a mut dyn Store,
        namespaces: &'a Namespaces,
        access: &'a dyn AccessController,
        planner: &'a dyn Planner,
        scope: Scope,
        max_call_depth: usize,
    ) -> Self {
        let mutating = store.access_mode().is_read_write();
        ExecutionContext {
            tx,
            store,
            namespaces,
            access,
            planner,
            scope: LocalScope::new(scope),
            call_stack: CallStack::new(max_call_depth),
            notices: Vec::new(),
            mutating,
        }
    }

    /// Namespace unqualified names resolve in.
    pub fn namespace(&self) -> String {
        self.scope.borrow().namespace().to_string()
    }

    pub fn is_mutating(&self) -> bool {
        self.mutating
    }

    pub fn is_owner(&self) -> bool {
        self.access.is_owner(&self.tx.caller)
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub(crate) fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Read a variable. `@` names come from the transaction, `$` names from
    /// the scope chain.
    pub fn get_variable(&self, name: &str) -> Result<Value, ExecError> {
        if let Some(context_name) = name.strip_prefix(CONTEXT_PREFIX) {
            return self
                .context_variable(context_name)
                .ok_or_else(|| invalid_variable(name));
        }
        if name.starts_with(VARIABLE_PREFIX) {
            return self.scope.borrow().get(name).ok_or_else(|| unknown_variable(name));
        }
        Err(invalid_variable(name))
    }

    pub fn set_variable(&mut self, name: &str, value: Value) -> Result<(), ExecError> {
        check_writable(name)?;
        self.scope.borrow_mut().set(name, value)
    }

    pub fn allocate_variable(&mut self, name: &str, value: Value) -> Result<(), ExecError> {
        check_writable(name)?;
        self.scope.borrow_mut().allocate(name, value)
    }

    fn context_variable(&self, name: &str) -> Option<Value> {
        Some(match name {
            "caller" => Value::text(&self.tx.caller),
            "txid" => Value::text(&self.tx.txid),
            "signer" => Value::blob(self.tx.signer.clone()),
            "height" => Value::Int(self.tx.height),
            "block_timestamp" => Value::Int(self.tx.block_timestamp),
            "authenticator" => Value::text(&self.tx.authenticator),
            "foreign_caller" => Value::text(self.scope.borrow().caller_namespace().unwrap_or_default()),
            _ => return None,
        })
    }

    /// Check that the current caller may run action `name` of `namespace`.
    ///
    /// Runs before arguments are bound, in the current (caller's) scope.
    pub(crate) fn can_execute(
        &self,
        namespace: &str,
        name: &str,
        modifiers: ActionModifiers,
    ) -> Result<(), ExecError> {
        if !self.mutating && !modifiers.is_view() {
            return Err(action_mutates_state(name));
        }

        let entering = self.call_stack.is_empty() || self.scope.borrow().namespace() != namespace;
        if !modifiers.is_public() && entering {
            return Err(action_private(name));
        }

        if modifiers.is_owner_only() && !self.is_owner() {
            return Err(action_owner_only(name));
        }

        // Call is checked when control enters a namespace, not for calls within it.
        if entering
            && !self
                .access
                .has_privilege(&self.tx.caller, Some(namespace), Privilege::Call)
        {
            return Err(permission_denied(Privilege::Call, Some(namespace)));
        }
        Ok(())
    }

    /// Check a privilege for the transaction's caller.
    pub(crate) fn require(&self, privilege: Privilege, namespace: Option<&str>) -> Result<(), ExecError> {
        if self.access.has_privilege(&self.tx.caller, namespace, privilege) {
            Ok(())
        } else {
            Err(permission_denied(privilege, namespace))
        }
    }
}

fn check_writable(name: &str) -> Result<(), ExecError> {
    if name.starts_with(CONTEXT_PREFIX) {
        return Err(read_only_variable(name));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests unwrap for brevity")]
mod tests;
