//! Running embedded SQL from inside an action.
//!
//! A statement is planned against the store's catalog and the variables in
//! scope, its parameters are read from the scope in `$n` order, and every
//! returned value is conformed to the column type the planner promised.

use lq_ast::SqlStatement;
use lq_sql::{PlanContext, PlanError, PreparedStatement, VariableTypes};
use lq_types::DataType;
use lq_value::{RecordValue, Value};
use tracing::debug;

use crate::context::ExecutionContext;
use crate::errors::{internal, unknown_field, ExecError};

/// Variable types as the planner sees them: whatever the scope holds now.
struct ScopeTypes<'c, 'a> {
    ctx: &'c ExecutionContext<'a>,
}

impl VariableTypes for ScopeTypes<'_, '_> {
    fn variable_type(&self, name: &str, field: Option<&str>) -> Result<DataType, PlanError> {
        let value = self
            .ctx
            .get_variable(name)
            .map_err(|_| PlanError::UnknownVariable { name: name.to_string() })?;
        let unknown_field = |field: &str| PlanError::UnknownField {
            name: name.to_string(),
            field: field.to_string(),
        };
        match (field, &value) {
            (None, value) => value.data_type().ok_or_else(|| PlanError::UnknownVariable {
                name: name.to_string(),
            }),
            (Some(field), Value::Record(record)) => record
                .get(field)
                .and_then(Value::data_type)
                .ok_or_else(|| unknown_field(field)),
            (Some(field), _) => Err(unknown_field(field)),
        }
    }
}

/// Plan `statement` in the current namespace.
pub(crate) fn prepare(ctx: &ExecutionContext<'_>, statement: &SqlStatement) -> Result<PreparedStatement, ExecError> {
    let namespace = ctx.namespace();
    let variables = ScopeTypes { ctx };
    let plan_ctx = PlanContext {
        catalog: ctx.store.catalog(),
        variables: &variables,
        namespace: &namespace,
        mutating: ctx.mutating,
    };
    Ok(ctx.planner.plan(statement, &plan_ctx)?)
}

/// Run `statement` and return its rows.
#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn query(ctx: &mut ExecutionContext<'_>, statement: &SqlStatement) -> Result<Vec<Vec<Value>>, ExecError> {
    let prepared = prepare(ctx, statement)?;
    debug!(sql = %prepared.sql, "embedded statement");
    let params = bind_params(ctx, &prepared)?;
    let rows = ctx.store.execute(&prepared, &params)?;
    rows.rows
        .into_iter()
        .map(|row| conform_row(&prepared, row))
        .collect()
}

/// Run `statement` and yield one record per row, converted as it is taken.
/// Unnamed columns are left out.
pub(crate) fn query_records(
    ctx: &mut ExecutionContext<'_>,
    statement: &SqlStatement,
) -> Result<impl Iterator<Item = Result<RecordValue, ExecError>> + 'static, ExecError> {
    let prepared = prepare(ctx, statement)?;
    debug!(sql = %prepared.sql, "embedded query");
    let params = bind_params(ctx, &prepared)?;
    let rows = ctx.store.execute(&prepared, &params)?;
    Ok(rows.rows.into_iter().map(move |row| -> Result<RecordValue, ExecError> {
        let row = conform_row(&prepared, row)?;
        let mut record = RecordValue::new();
        for (field, value) in prepared.fields.iter().zip(row) {
            if !field.name.is_empty() {
                record.add_field(field.name.clone(), value)?;
            }
        }
        Ok(record)
    }))
}

fn bind_params(ctx: &ExecutionContext<'_>, prepared: &PreparedStatement) -> Result<Vec<Value>, ExecError> {
    prepared
        .params
        .iter()
        .map(|param| -> Result<Value, ExecError> {
            let value = ctx.get_variable(&param.name)?;
            match (&param.field, value) {
                (None, value) => Ok(value),
                (Some(field), Value::Record(record)) => {
                    record.get(field).cloned().ok_or_else(|| unknown_field(field))
                }
                (Some(field), _) => Err(unknown_field(field)),
            }
        })
        .collect()
}

fn conform_row(prepared: &PreparedStatement, row: Vec<Value>) -> Result<Vec<Value>, ExecError> {
    if row.len() != prepared.fields.len() {
        return Err(internal(format!(
            "store returned {} columns for {}, planned {}",
            row.len(),
            prepared.sql,
            prepared.fields.len()
        )));
    }
    row.into_iter()
        .zip(&prepared.fields)
        .map(|(value, field)| {
            value.conform(&field.data_type).map_err(|err| {
                internal(format!("column {} of {}: {err}", field.name, prepared.sql))
            })
        })
        .collect()
}
