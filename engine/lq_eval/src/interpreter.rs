//! The interpreter façade.
//!
//! [`Interpreter`] owns every namespace and the access controller behind one
//! lock and exposes the two entry points a transaction uses: [`execute`] for
//! statement text and [`call`] for a pre-compiled action.
//!
//! Read-only transactions share the lock. Read-write transactions hold it
//! exclusively and work on the live state; if they fail, the state is put
//! back as it was before the call, matching the store's rollback.
//!
//! [`execute`]: Interpreter::execute
//! [`call`]: Interpreter::call

mod builder;

use lq_ast::{ParseError, Parser, SqlStatement, TopLevelKind, TopLevelStatement, VARIABLE_PREFIX};
use lq_sql::{Planner, Store};
use lq_types::Privilege;
use lq_value::Value;
use parking_lot::RwLock;
use tracing::field::Empty;
use tracing::{debug, warn};

pub use builder::{InterpreterBuilder, InterpreterConfig};

use crate::access::AccessController;
use crate::context::{ExecutionContext, TxContext};
use crate::environment::Scope;
use crate::errors::{
    cannot_call_builtin, cannot_drop_default_namespace, owner_only, permission_denied, statement_mutates_state,
    unknown_action, unknown_namespace, ExecResult,
};
use crate::executable::RowSink;
use crate::namespace::Namespaces;
use crate::sql_bridge;

/// What a successful call leaves behind besides its rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Lines logged with `notice`, in order.
    pub notices: Vec<String>,
}

/// Everything a failed read-write call must roll back.
#[derive(Clone)]
struct State {
    namespaces: Namespaces,
    access: Box<dyn AccessController>,
}

/// The state as one call may touch it.
enum StateAccess<'s> {
    Shared(&'s State),
    Exclusive(&'s mut State),
}

impl StateAccess<'_> {
    fn shared(&self) -> &State {
        match self {
            StateAccess::Shared(state) => state,
            StateAccess::Exclusive(state) => &**state,
        }
    }

    fn exclusive(&mut self, statement: &'static str) -> ExecResult<&mut State> {
        match self {
            StateAccess::Shared(_) => Err(statement_mutates_state(statement)),
            StateAccess::Exclusive(state) => Ok(&mut **state),
        }
    }
}

pub struct Interpreter {
    config: InterpreterConfig,
    parser: Option<Box<dyn Parser>>,
    planner: Box<dyn Planner>,
    state: RwLock<State>,
}

impl Interpreter {
    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Names of every namespace, sorted.
    pub fn namespace_names(&self) -> Vec<String> {
        let state = self.state.read();
        state.namespaces.names().into_iter().map(str::to_string).collect()
    }

    /// Names of the user actions in `namespace`, sorted. Empty for an unknown
    /// namespace.
    pub fn action_names(&self, namespace: &str) -> Vec<String> {
        let state = self.state.read();
        state
            .namespaces
            .get(&namespace.to_ascii_lowercase())
            .map(|ns| ns.action_names().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Whether `user` holds `privilege`, globally or on `namespace`.
    pub fn has_privilege(&self, user: &str, namespace: Option<&str>, privilege: Privilege) -> bool {
        self.state.read().access.has_privilege(user, namespace, privilege)
    }

    /// Parse `text` and run every statement in it.
    ///
    /// `params` become root variables of each statement; a missing `$` is
    /// added to their names.
    pub fn execute(
        &self,
        tx: &TxContext,
        store: &mut dyn Store,
        text: &str,
        params: &[(&str, Value)],
        sink: &mut RowSink<'_>,
    ) -> ExecResult<Outcome> {
        let parser = self
            .parser
            .as_deref()
            .ok_or_else(|| ParseError::new("no parser configured"))?;
        let statements = parser.parse(text)?;
        self.execute_statements(tx, store, &statements, params, sink)
    }

    /// Run already-parsed statements in order, stopping at the first error.
    #[tracing::instrument(level = "debug", skip_all, fields(caller = %tx.caller, statements = statements.len()))]
    pub fn execute_statements(
        &self,
        tx: &TxContext,
        store: &mut dyn Store,
        statements: &[TopLevelStatement],
        params: &[(&str, Value)],
        sink: &mut RowSink<'_>,
    ) -> ExecResult<Outcome> {
        let params: Vec<(String, Value)> = params
            .iter()
            .map(|(name, value)| {
                let name = if name.starts_with(VARIABLE_PREFIX) {
                    (*name).to_string()
                } else {
                    format!("{VARIABLE_PREFIX}{name}")
                };
                (name, value.clone())
            })
            .collect();

        let read_write = store.access_mode().is_read_write();
        self.with_state(read_write, |state| {
            let mut outcome = Outcome::default();
            for statement in statements {
                self.run_statement(tx, &mut *store, state, statement, &params, sink, &mut outcome)?;
            }
            Ok(outcome)
        })
    }

    /// Call `action` of `namespace` with `args`. An empty namespace means the
    /// default one.
    #[tracing::instrument(level = "debug", skip_all, fields(caller = %tx.caller, namespace = Empty, action = Empty))]
    pub fn call(
        &self,
        tx: &TxContext,
        store: &mut dyn Store,
        namespace: &str,
        action: &str,
        args: &[Value],
        sink: &mut RowSink<'_>,
    ) -> ExecResult<Outcome> {
        let namespace = self.resolve_namespace(Some(namespace));
        let action = action.to_ascii_lowercase();
        tracing::Span::current()
            .record("namespace", namespace.as_str())
            .record("action", action.as_str());

        let read_write = store.access_mode().is_read_write();
        self.with_state(read_write, |state| {
            let state = state.shared();
            let executable = state
                .namespaces
                .get(&namespace)
                .ok_or_else(|| unknown_namespace(&namespace))?
                .function(&action)
                .cloned()
                .ok_or_else(|| unknown_action(&namespace, &action))?;
            if executable.is_builtin() {
                return Err(cannot_call_builtin(&action));
            }

            let mut ctx = self.context(tx, &mut *store, state, Scope::root(namespace.as_str(), None));
            executable.call(&mut ctx, args, sink)?;
            Ok(Outcome {
                notices: ctx.take_notices(),
            })
        })
    }

    /// Lock the state for one call. A failed read-write call restores the
    /// state it started from.
    fn with_state<R>(&self, read_write: bool, f: impl FnOnce(&mut StateAccess<'_>) -> ExecResult<R>) -> ExecResult<R> {
        if !read_write {
            let state = self.state.read();
            return f(&mut StateAccess::Shared(&*state));
        }

        let mut state = self.state.write();
        let snapshot = state.clone();
        let result = f(&mut StateAccess::Exclusive(&mut *state));
        if let Err(err) = &result {
            warn!(error = %err, "call failed, restoring namespaces");
            *state = snapshot;
        }
        result
    }

    fn context<'a>(
        &'a self,
        tx: &'a TxContext,
        store: &'a mut dyn Store,
        state: &'a State,
        scope: Scope,
    ) -> ExecutionContext<'a> {
        ExecutionContext::new(
            tx,
            store,
            &state.namespaces,
            state.access.as_ref(),
            self.planner.as_ref(),
            scope,
            self.config.max_call_depth,
        )
    }

    fn resolve_namespace(&self, namespace: Option<&str>) -> String {
        match namespace {
            Some(namespace) if !namespace.is_empty() => namespace.to_ascii_lowercase(),
            _ => self.config.default_namespace.clone(),
        }
    }

    #[allow(clippy::too_many_arguments, reason = "per-statement execution state")]
    fn run_statement(
        &self,
        tx: &TxContext,
        store: &mut dyn Store,
        state: &mut StateAccess<'_>,
        statement: &TopLevelStatement,
        params: &[(String, Value)],
        sink: &mut RowSink<'_>,
        outcome: &mut Outcome,
    ) -> ExecResult<()> {
        let kind = &statement.kind;
        if kind.mutates() && !store.access_mode().is_read_write() {
            return Err(statement_mutates_state(kind.name()));
        }
        let namespace = self.resolve_namespace(statement.namespace.as_deref());
        debug!(statement = kind.name(), %namespace, "top-level statement");

        let require = |state: &State, privilege: Privilege, namespace: Option<&str>| {
            if state.access.has_privilege(&tx.caller, namespace, privilege) {
                Ok(())
            } else {
                Err(permission_denied(privilege, namespace))
            }
        };

        match kind {
            TopLevelKind::Sql(sql) => {
                let shared = state.shared();
                if !shared.namespaces.contains(&namespace) {
                    return Err(unknown_namespace(&namespace));
                }
                require(shared, sql_privilege(sql), Some(&namespace))?;

                let mut scope = Scope::root(namespace.as_str(), None);
                for (name, value) in params {
                    scope.allocate(name, value.clone())?;
                }
                let mut ctx = self.context(tx, &mut *store, shared, scope);
                let rows = sql_bridge::query(&mut ctx, sql)?;
                outcome.notices.extend(ctx.take_notices());
                for row in rows {
                    sink(row)?;
                }
            }
            TopLevelKind::CreateAction {
                action,
                or_replace,
                if_not_exists,
            } => {
                require(state.shared(), Privilege::Create, Some(&namespace))?;
                state
                    .exclusive(kind.name())?
                    .namespaces
                    .get_mut(&namespace)
                    .ok_or_else(|| unknown_namespace(&namespace))?
                    .create_action(action.clone(), *or_replace, *if_not_exists)?;
            }
            TopLevelKind::DropAction { name, if_exists } => {
                require(state.shared(), Privilege::Drop, Some(&namespace))?;
                state
                    .exclusive(kind.name())?
                    .namespaces
                    .get_mut(&namespace)
                    .ok_or_else(|| unknown_namespace(&namespace))?
                    .drop_action(name, *if_exists)?;
            }
            TopLevelKind::CreateNamespace { name, if_not_exists } => {
                require(state.shared(), Privilege::Create, None)?;
                let name = name.to_ascii_lowercase();
                let state = state.exclusive(kind.name())?;
                if state.namespaces.create(&name, *if_not_exists)? {
                    state.access.register_namespace(&name);
                    debug!(namespace = %name, "created namespace");
                }
            }
            TopLevelKind::DropNamespace { name, if_exists } => {
                require(state.shared(), Privilege::Drop, None)?;
                let name = name.to_ascii_lowercase();
                if name == self.config.default_namespace {
                    return Err(cannot_drop_default_namespace(&name));
                }
                let state = state.exclusive(kind.name())?;
                if state.namespaces.remove(&name).is_none() {
                    if *if_exists {
                        return Ok(());
                    }
                    return Err(unknown_namespace(&name));
                }
                store.drop_namespace(&name)?;
                state.access.unregister_namespace(&name);
                debug!(namespace = %name, "dropped namespace");
            }
            TopLevelKind::CreateRole { name, if_not_exists } => {
                require(state.shared(), Privilege::Roles, None)?;
                state.exclusive(kind.name())?.access.create_role(name, *if_not_exists)?;
            }
            TopLevelKind::DropRole { name, if_exists } => {
                require(state.shared(), Privilege::Roles, None)?;
                state.exclusive(kind.name())?.access.drop_role(name, *if_exists)?;
            }
            TopLevelKind::GrantPrivileges {
                grant,
                privileges,
                namespace,
                role,
            } => {
                require(state.shared(), Privilege::Roles, None)?;
                let namespace = namespace.as_deref().map(str::to_ascii_lowercase);
                let access = &mut state.exclusive(kind.name())?.access;
                if *grant {
                    access.grant_privileges(role, privileges, namespace.as_deref())?;
                } else {
                    access.revoke_privileges(role, privileges, namespace.as_deref())?;
                }
            }
            TopLevelKind::GrantRole { grant, role, user } => {
                require(state.shared(), Privilege::Roles, None)?;
                let access = &mut state.exclusive(kind.name())?.access;
                if *grant {
                    access.grant_role(role, user)?;
                } else {
                    access.revoke_role(role, user)?;
                }
            }
            TopLevelKind::TransferOwnership { to } => {
                if !state.shared().access.is_owner(&tx.caller) {
                    return Err(owner_only("transfer ownership"));
                }
                state.exclusive(kind.name())?.access.transfer_ownership(to);
            }
        }
        Ok(())
    }
}

/// Privilege a top-level SQL statement needs on its namespace.
fn sql_privilege(statement: &SqlStatement) -> Privilege {
    match statement {
        SqlStatement::Select(_) => Privilege::Select,
        SqlStatement::Insert(_) => Privilege::Insert,
        SqlStatement::Update(_) => Privilege::Update,
        SqlStatement::Delete(_) => Privilege::Delete,
        SqlStatement::CreateTable(_) => Privilege::Create,
        SqlStatement::DropTable(_) => Privilege::Drop,
    }
}
