//! Closure compilation of action bodies.
//!
//! Each AST node is visited exactly once and becomes a boxed closure that
//! calls its already-compiled children. Running an action is then a walk
//! over closures with no AST matching left on the hot path.
//!
//! Control flow rides on the `Ok` side: a statement returns a
//! [`ControlSignal`], so `BREAK`, `CONTINUE` and `RETURN` are never confused
//! with failures.

mod expressions;
mod loops;
mod statements;

use std::sync::Arc;

use lq_ast::CallExpr;
use lq_stack::ensure_sufficient_stack;
use lq_types::ActionReturn;
use lq_value::Value;
use smallvec::SmallVec;

pub(crate) use expressions::expression;
pub(crate) use statements::block;

use crate::context::ExecutionContext;
use crate::errors::{no_return_values, type_mismatch, unknown_action, unknown_namespace, ExecError};
use crate::executable::{Executable, RowSink};

/// How a statement finished.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControlSignal {
    Normal,
    Break,
    Continue,
    /// Stop the current action. Not an error.
    Return,
}

pub(crate) type StmtFn =
    Box<dyn Fn(&mut ExecutionContext<'_>, &mut RowSink<'_>) -> Result<ControlSignal, ExecError> + Send + Sync>;

pub(crate) type ExprFn = Box<dyn Fn(&mut ExecutionContext<'_>) -> Result<Value, ExecError> + Send + Sync>;

/// Box a statement closure. Going through a generic bound pins the
/// higher-ranked signature.
fn stmt_fn<F>(f: F) -> StmtFn
where
    F: Fn(&mut ExecutionContext<'_>, &mut RowSink<'_>) -> Result<ControlSignal, ExecError> + Send + Sync + 'static,
{
    Box::new(f)
}

fn expr_fn<F>(f: F) -> ExprFn
where
    F: Fn(&mut ExecutionContext<'_>) -> Result<Value, ExecError> + Send + Sync + 'static,
{
    Box::new(f)
}

/// Run statements in order until one signals something other than
/// [`ControlSignal::Normal`].
pub(crate) fn run_block(
    ctx: &mut ExecutionContext<'_>,
    stmts: &[StmtFn],
    sink: &mut RowSink<'_>,
) -> Result<ControlSignal, ExecError> {
    ensure_sufficient_stack(|| {
        for stmt in stmts {
            match stmt(ctx, sink)? {
                ControlSignal::Normal => {}
                signal => return Ok(signal),
            }
        }
        Ok(ControlSignal::Normal)
    })
}

/// Truth value of a condition. Null counts as false.
fn truth(value: &Value) -> Result<bool, ExecError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Null(_) => Ok(false),
        other => Err(type_mismatch("bool", other.type_name())),
    }
}

/// A compiled call site, shared by call statements, call expressions and
/// loops over calls.
struct CallSite {
    namespace: Option<String>,
    name: String,
    args: Vec<ExprFn>,
}

type Arguments = SmallVec<[Value; 4]>;

impl CallSite {
    fn new(call: &CallExpr) -> Self {
        CallSite {
            namespace: call.namespace.as_deref().map(str::to_ascii_lowercase),
            name: call.name.to_ascii_lowercase(),
            args: call.args.iter().map(expression).collect(),
        }
    }

    fn arguments(&self, ctx: &mut ExecutionContext<'_>) -> Result<Arguments, ExecError> {
        self.args.iter().map(|arg| arg(ctx)).collect()
    }

    /// Look the callee up in the named namespace, or the current one.
    fn resolve(&self, ctx: &ExecutionContext<'_>) -> Result<Arc<Executable>, ExecError> {
        let namespace = match &self.namespace {
            Some(namespace) => namespace.clone(),
            None => ctx.namespace(),
        };
        let functions = ctx
            .namespaces
            .get(&namespace)
            .ok_or_else(|| unknown_namespace(&namespace))?;
        functions
            .function(&self.name)
            .cloned()
            .ok_or_else(|| unknown_action(&namespace, &self.name))
    }

    /// Evaluate the arguments, call the callee and collect every row it
    /// produces, together with its declared result shape.
    fn collect(&self, ctx: &mut ExecutionContext<'_>) -> Result<(ActionReturn, Vec<Vec<Value>>), ExecError> {
        let args = self.arguments(ctx)?;
        let callee = self.resolve(ctx)?;
        let Some(returns) = callee.return_type(&args)? else {
            return Err(no_return_values(callee.name()));
        };
        let mut rows = Vec::new();
        callee.call(ctx, &args, &mut |row: Vec<Value>| {
            rows.push(row);
            Ok(())
        })?;
        Ok((returns, rows))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests unwrap for brevity")]
mod tests;
