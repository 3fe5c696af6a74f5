//! Statement compilation.

use lq_ast::{ActionStmt, AssignTarget, CallExpr, IfBranch, LoopControl, SqlStatement};
use lq_types::DataType;
use lq_value::{ArrayValue, Value};

use super::expressions::array_index;
use super::loops::for_loop;
use super::{expression, run_block, stmt_fn, truth, CallSite, ControlSignal, ExprFn, StmtFn};
use crate::context::ExecutionContext;
use crate::errors::{invalid_operand, no_return_values, return_arity, row_count, type_mismatch, ExecError};
use crate::executable::RowSink;
use crate::scope_guard::ScopeSwap;
use crate::sql_bridge;

pub(crate) fn block(stmts: &[ActionStmt]) -> Vec<StmtFn> {
    stmts.iter().map(statement).collect()
}

pub(super) fn statement(stmt: &ActionStmt) -> StmtFn {
    match stmt {
        ActionStmt::Declare { name, data_type, init } => declare(name, *data_type, init.as_ref().map(expression)),
        ActionStmt::Assign { target, value } => assign(target, expression(value)),
        ActionStmt::Call { receivers, call } => call_statement(receivers, call),
        ActionStmt::ForLoop { receiver, term, body } => for_loop(receiver, term, block(body)),
        ActionStmt::If { branches, otherwise } => conditional(branches, otherwise.as_deref()),
        ActionStmt::Sql(sql) => {
            let sql = sql.clone();
            stmt_fn(move |ctx, _| {
                sql_bridge::query(ctx, &sql)?;
                Ok(ControlSignal::Normal)
            })
        }
        ActionStmt::LoopControl(LoopControl::Break) => stmt_fn(|_, _| Ok(ControlSignal::Break)),
        ActionStmt::LoopControl(LoopControl::Continue) => stmt_fn(|_, _| Ok(ControlSignal::Continue)),
        ActionStmt::Return(values) => {
            let values: Vec<ExprFn> = values.iter().map(expression).collect();
            stmt_fn(move |ctx, sink| {
                if !values.is_empty() {
                    let row = evaluate_row(ctx, &values)?;
                    sink(row)?;
                }
                Ok(ControlSignal::Return)
            })
        }
        ActionStmt::ReturnNext(values) => {
            let values: Vec<ExprFn> = values.iter().map(expression).collect();
            stmt_fn(move |ctx, sink| {
                let row = evaluate_row(ctx, &values)?;
                sink(row)?;
                Ok(ControlSignal::Normal)
            })
        }
        ActionStmt::ReturnQuery(sql) => return_query(sql.clone()),
    }
}

fn evaluate_row(ctx: &mut ExecutionContext<'_>, values: &[ExprFn]) -> Result<Vec<Value>, ExecError> {
    values.iter().map(|value| value(ctx)).collect()
}

/// Run `body` in a block scope under the current one.
pub(super) fn run_scoped(
    ctx: &mut ExecutionContext<'_>,
    body: &[StmtFn],
    sink: &mut RowSink<'_>,
) -> Result<ControlSignal, ExecError> {
    run_scoped_with(ctx, body, sink, |_| Ok(()))
}

/// Like [`run_scoped`], with `setup` run in the new scope first.
pub(super) fn run_scoped_with(
    ctx: &mut ExecutionContext<'_>,
    body: &[StmtFn],
    sink: &mut RowSink<'_>,
    setup: impl FnOnce(&mut ExecutionContext<'_>) -> Result<(), ExecError>,
) -> Result<ControlSignal, ExecError> {
    let mut scoped = ScopeSwap::block(ctx);
    setup(&mut *scoped)?;
    run_block(&mut scoped, body, sink)
}

fn declare(name: &str, data_type: DataType, init: Option<ExprFn>) -> StmtFn {
    let name = name.to_string();
    stmt_fn(move |ctx, _| {
        let value = match &init {
            Some(init) => {
                let value = init(ctx)?;
                if !value.has_type(&data_type) {
                    return Err(type_mismatch(data_type, value.type_name()));
                }
                value.retype_null(data_type)
            }
            None => Value::zero(data_type),
        };
        ctx.allocate_variable(&name, value)?;
        Ok(ControlSignal::Normal)
    })
}

fn assign(target: &AssignTarget, value: ExprFn) -> StmtFn {
    match target {
        AssignTarget::Variable(name) => {
            let name = name.clone();
            stmt_fn(move |ctx, _| {
                let value = value(ctx)?;
                ctx.set_variable(&name, value)?;
                Ok(ControlSignal::Normal)
            })
        }
        AssignTarget::ArrayElement { variable, index } => {
            let variable = variable.clone();
            let index = expression(index);
            stmt_fn(move |ctx, _| {
                let value = value(ctx)?;
                if !value.is_scalar() {
                    return Err(invalid_operand("array element", "a scalar", value.type_name()));
                }
                let index = array_index(&index(ctx)?)?;
                let array = match ctx.get_variable(&variable)? {
                    Value::Array(mut array) => {
                        array.set(index, value)?;
                        array
                    }
                    // Writing into a null array starts it.
                    Value::Null(ty) if ty.is_array => {
                        let mut array = ArrayValue::new(ty.element());
                        array.set(index, value)?;
                        array
                    }
                    other => return Err(invalid_operand("assignment target", "an array", other.type_name())),
                };
                ctx.set_variable(&variable, Value::Array(array))?;
                Ok(ControlSignal::Normal)
            })
        }
    }
}

/// `[$a, _, $c :=] ns.action(args)`.
///
/// With receivers the callee must produce exactly one row; its values are
/// bound positionally and `_` receivers skip a column. Each execution counts
/// rows afresh.
fn call_statement(receivers: &[Option<String>], call: &CallExpr) -> StmtFn {
    let site = CallSite::new(call);
    let receivers = receivers.to_vec();
    stmt_fn(move |ctx, _| {
        let args = site.arguments(ctx)?;
        let callee = site.resolve(ctx)?;
        let returns = callee.return_type(&args)?;

        if receivers.is_empty() {
            callee.call(ctx, &args, &mut |_| Ok(()))?;
            return Ok(ControlSignal::Normal);
        }

        match &returns {
            None => return Err(no_return_values(callee.name())),
            Some(returns) if returns.fields.len() < receivers.len() => {
                return Err(return_arity(callee.name(), receivers.len(), returns.fields.len()));
            }
            Some(_) => {}
        }

        let mut rows = 0usize;
        let mut first = None;
        callee.call(ctx, &args, &mut |row: Vec<Value>| {
            rows += 1;
            if first.is_none() {
                first = Some(row);
            }
            Ok(())
        })?;
        let Some(row) = first.filter(|_| rows == 1) else {
            return Err(row_count(callee.name(), rows));
        };

        for (receiver, value) in receivers.iter().zip(row) {
            if let Some(name) = receiver {
                ctx.set_variable(name, value)?;
            }
        }
        Ok(ControlSignal::Normal)
    })
}

fn conditional(branches: &[IfBranch], otherwise: Option<&[ActionStmt]>) -> StmtFn {
    let branches: Vec<(ExprFn, Vec<StmtFn>)> = branches
        .iter()
        .map(|branch| (expression(&branch.condition), block(&branch.then)))
        .collect();
    let otherwise = otherwise.map(block);
    stmt_fn(move |ctx, sink| {
        for (condition, body) in &branches {
            if truth(&condition(ctx)?)? {
                return run_scoped(ctx, body, sink);
            }
        }
        match &otherwise {
            Some(body) => run_scoped(ctx, body, sink),
            None => Ok(ControlSignal::Normal),
        }
    })
}

/// `RETURN SELECT ...`: every row is returned, then the action stops.
fn return_query(sql: SqlStatement) -> StmtFn {
    stmt_fn(move |ctx, sink| {
        for row in sql_bridge::query(ctx, &sql)? {
            sink(row)?;
        }
        Ok(ControlSignal::Return)
    })
}
