//! `FOR` loops.
//!
//! Each term yields its items one at a time and the body runs once per item
//! in a fresh block scope holding the receiver. Ranges are never
//! materialized. SQL queries and action calls finish before the first
//! iteration, so the body may write to the tables it iterates; their rows
//! are turned into records only as the loop reaches them.

use lq_ast::LoopTerm;
use lq_types::NamedType;
use lq_value::{RecordValue, Value};

use super::statements::run_scoped_with;
use super::{expression, stmt_fn, CallSite, ControlSignal, ExprFn, StmtFn};
use crate::context::ExecutionContext;
use crate::errors::{invalid_operand, ExecError};
use crate::sql_bridge;

type Items = Box<dyn Iterator<Item = Result<Value, ExecError>>>;

type ItemsFn = Box<dyn Fn(&mut ExecutionContext<'_>) -> Result<Items, ExecError> + Send + Sync>;

fn items_fn<F>(f: F) -> ItemsFn
where
    F: Fn(&mut ExecutionContext<'_>) -> Result<Items, ExecError> + Send + Sync + 'static,
{
    Box::new(f)
}

pub(super) fn for_loop(receiver: &str, term: &LoopTerm, body: Vec<StmtFn>) -> StmtFn {
    let receiver = receiver.to_string();
    let items = loop_items(term);
    stmt_fn(move |ctx, sink| {
        for item in items(ctx)? {
            let item = item?;
            let signal = run_scoped_with(ctx, &body, sink, |ctx| ctx.allocate_variable(&receiver, item))?;
            if let Some(signal) = after(signal) {
                return Ok(signal);
            }
        }
        Ok(ControlSignal::Normal)
    })
}

/// What the loop does after one iteration: `None` to go on, or the signal
/// the loop statement itself finishes with.
fn after(signal: ControlSignal) -> Option<ControlSignal> {
    match signal {
        ControlSignal::Normal | ControlSignal::Continue => None,
        ControlSignal::Break => Some(ControlSignal::Normal),
        ControlSignal::Return => Some(ControlSignal::Return),
    }
}

fn loop_items(term: &LoopTerm) -> ItemsFn {
    match term {
        LoopTerm::Range { start, end } => range(expression(start), expression(end)),
        LoopTerm::Sql(sql) => {
            let sql = sql.clone();
            items_fn(move |ctx| {
                let records = sql_bridge::query_records(ctx, &sql)?;
                Ok(Box::new(records.map(|record| record.map(Value::Record))))
            })
        }
        LoopTerm::Array(array) => {
            let array = expression(array);
            items_fn(move |ctx| match array(ctx)? {
                Value::Array(array) => Ok(Box::new(array.into_items().into_iter().map(Ok::<_, ExecError>))),
                Value::Null(ty) if ty.is_array || ty.is_null() => Ok(Box::new(std::iter::empty::<Result<Value, ExecError>>())),
                other => Err(invalid_operand("loop term", "an array", other.type_name())),
            })
        }
        LoopTerm::Call(call) => {
            let site = CallSite::new(call);
            items_fn(move |ctx| {
                let (returns, rows) = site.collect(ctx)?;
                Ok(Box::new(
                    rows.into_iter()
                        .map(move |row| to_record(&returns.fields, row).map(Value::Record)),
                ))
            })
        }
    }
}

/// `start..end`, both inclusive. Empty when `start > end`.
fn range(start: ExprFn, end: ExprFn) -> ItemsFn {
    items_fn(move |ctx| {
        let start = bound(start(ctx)?)?;
        let end = bound(end(ctx)?)?;
        Ok(Box::new((start..=end).map(|i| Ok::<_, ExecError>(Value::Int(i)))))
    })
}

fn bound(value: Value) -> Result<i64, ExecError> {
    value
        .as_int()
        .ok_or_else(|| invalid_operand("range bound", "a non-null int8", value.type_name()))
}

fn to_record(fields: &[NamedType], row: Vec<Value>) -> Result<RecordValue, ExecError> {
    let mut record = RecordValue::new();
    for (field, value) in fields.iter().zip(row) {
        record.add_field(field.name.clone(), value)?;
    }
    Ok(record)
}
