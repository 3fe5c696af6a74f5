//! LedgerQL Eval - the action interpreter.
//!
//! Runs procedural actions and top-level statements inside a replicated
//! transaction. Every validator runs the same statements against the same
//! state, so everything here is deterministic.
//!
//! # Architecture
//!
//! - `compile`: turns action bodies into closure trees, once per definition
//! - `executable`: one callable shape for built-ins and user actions
//! - `environment`: lexical scopes; `scope_guard` swaps them per call
//! - `context`: per-call state and the `@` variables
//! - `sql_bridge`: plans and runs embedded SQL against the store
//! - `access`: roles and privileges
//! - `interpreter`: the façade owning namespaces behind a lock

mod access;
mod builtins;
mod compile;
mod context;
mod diagnostics;
mod environment;
pub mod errors;
mod executable;
mod interpreter;
mod namespace;
mod scope_guard;
mod sql_bridge;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

pub use access::{AccessController, AccessError, MemoryAccessController, DEFAULT_ROLE, OWNER_ROLE};
pub use builtins::{Builtin, BUILTINS};
pub use compile::ControlSignal;
pub use context::{ExecutionContext, TxContext};
pub use diagnostics::{CallFrame, CallStack};
pub use environment::{LocalScope, Scope};
pub use errors::{CallTrace, ExecError, ExecErrorKind, ExecResult};
pub use executable::{Executable, ExecutableKind, RowSink};
pub use interpreter::{Interpreter, InterpreterBuilder, InterpreterConfig, Outcome};
pub use namespace::{Namespace, Namespaces};
pub use scope_guard::ScopeSwap;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=lq_eval=debug`, or
/// `RUST_LOG=lq_eval=trace,lq_sql=trace` to see every planned statement.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
