//! Logical planning of embedded SQL.
//!
//! Planning resolves every table, column and variable a statement mentions,
//! qualifies table names with the current namespace, and replaces variable
//! references with positional parameters. The result carries everything the
//! caller needs to run it: SQL text, parameter names in `$n` order, and the
//! typed shape of the rows it will produce.

use lq_ast::{SelectItem, SqlExpr, SqlStatement, TableRef};
use lq_types::{DataType, NamedType};
use tracing::trace;

use crate::errors::PlanError;
use crate::generate;
use crate::schema::{Catalog, TableSchema};

/// The variable a positional parameter is bound from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParamRef {
    /// Variable name with its prefix (`$id`, `@caller`).
    pub name: String,
    /// Record field, for `$row.field`.
    pub field: Option<String>,
}

/// A planned statement, ready to execute.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedStatement {
    /// Deterministic SQL text with `$1..$n` placeholders.
    pub sql: String,
    /// The rewritten tree the text was generated from.
    pub statement: SqlStatement,
    /// `params[i]` binds placeholder `$(i + 1)`.
    pub params: Vec<ParamRef>,
    /// Result row shape. Unnamed expression columns have an empty name.
    pub fields: Vec<NamedType>,
    pub mutates: bool,
}

/// Types of the variables visible to a statement.
pub trait VariableTypes {
    /// Type of `name` (with prefix), or of one field when `field` is set.
    fn variable_type(&self, name: &str, field: Option<&str>) -> Result<DataType, PlanError>;
}

/// Everything planning depends on besides the statement itself.
pub struct PlanContext<'a> {
    pub catalog: &'a dyn Catalog,
    pub variables: &'a dyn VariableTypes,
    /// Namespace unqualified tables resolve in.
    pub namespace: &'a str,
    /// Whether the statement may modify state.
    pub mutating: bool,
}

pub trait Planner: Send + Sync {
    fn plan(&self, statement: &SqlStatement, ctx: &PlanContext<'_>) -> Result<PreparedStatement, PlanError>;
}

/// Plans against the catalog alone: no statistics, no cost model.
#[derive(Clone, Copy, Debug, Default)]
pub struct CatalogPlanner;

impl Planner for CatalogPlanner {
    fn plan(&self, statement: &SqlStatement, ctx: &PlanContext<'_>) -> Result<PreparedStatement, PlanError> {
        let mutates = statement.mutates();
        if mutates && !ctx.mutating {
            return Err(PlanError::MutatesState {
                statement: statement_name(statement),
            });
        }

        let mut statement = statement.clone();
        let table = statement.table_mut();
        if table.namespace.is_none() {
            table.namespace = Some(ctx.namespace.to_string());
        }

        let mut binder = Binder {
            ctx,
            params: Vec::new(),
        };
        let fields = binder.bind_statement(&mut statement)?;
        let sql = generate::statement(&statement);
        trace!(%sql, params = binder.params.len(), "planned statement");

        Ok(PreparedStatement {
            sql,
            statement,
            params: binder.params,
            fields,
            mutates,
        })
    }
}

fn statement_name(statement: &SqlStatement) -> &'static str {
    match statement {
        SqlStatement::Select(_) => "SELECT",
        SqlStatement::Insert(_) => "INSERT",
        SqlStatement::Update(_) => "UPDATE",
        SqlStatement::Delete(_) => "DELETE",
        SqlStatement::CreateTable(_) => "CREATE TABLE",
        SqlStatement::DropTable(_) => "DROP TABLE",
    }
}

fn display_table(table: &TableRef) -> String {
    match &table.namespace {
        Some(namespace) => format!("{namespace}.{}", table.name),
        None => table.name.clone(),
    }
}

/// Walks a statement in text order, assigning parameter numbers by first
/// appearance.
struct Binder<'p, 'a> {
    ctx: &'p PlanContext<'a>,
    params: Vec<ParamRef>,
}

impl Binder<'_, '_> {
    fn table(&self, table: &TableRef) -> Result<&TableSchema, PlanError> {
        self.ctx
            .catalog
            .table(table)
            .ok_or_else(|| PlanError::UnknownTable {
                table: display_table(table),
            })
    }

    fn bind_statement(&mut self, statement: &mut SqlStatement) -> Result<Vec<NamedType>, PlanError> {
        match statement {
            SqlStatement::Select(select) => {
                let schema = self.table(&select.from)?.clone();
                let mut fields = Vec::with_capacity(select.projection.len());
                for item in &mut select.projection {
                    match item {
                        SelectItem::Wildcard => fields.extend(
                            schema
                                .columns
                                .iter()
                                .map(|column| NamedType::new(column.name.clone(), column.data_type)),
                        ),
                        SelectItem::Expr { expr, alias } => {
                            let data_type = self.bind_expr(expr, Some(&schema))?;
                            let name = match (alias, &*expr) {
                                (Some(alias), _) => alias.clone(),
                                (None, SqlExpr::Column(column)) => column.clone(),
                                (None, _) => String::new(),
                            };
                            fields.push(NamedType::new(name, data_type));
                        }
                    }
                }
                if let Some(filter) = &mut select.filter {
                    self.bind_expr(filter, Some(&schema))?;
                }
                for order in &mut select.order_by {
                    self.bind_expr(&mut order.expr, Some(&schema))?;
                }
                if let Some(limit) = &mut select.limit {
                    self.bind_expr(limit, None)?;
                }
                Ok(fields)
            }
            SqlStatement::Insert(insert) => {
                let schema = self.table(&insert.table)?.clone();
                let expected = if insert.columns.is_empty() {
                    schema.columns.len()
                } else {
                    self.check_columns(&schema, insert.columns.iter())?;
                    insert.columns.len()
                };
                for row in &mut insert.rows {
                    if row.len() != expected {
                        return Err(PlanError::ValueCount {
                            table: schema.qualified_name(),
                            expected,
                            got: row.len(),
                        });
                    }
                    for value in row {
                        self.bind_expr(value, None)?;
                    }
                }
                Ok(Vec::new())
            }
            SqlStatement::Update(update) => {
                let schema = self.table(&update.table)?.clone();
                self.check_columns(&schema, update.assignments.iter().map(|(column, _)| column))?;
                for (_, value) in &mut update.assignments {
                    self.bind_expr(value, Some(&schema))?;
                }
                if let Some(filter) = &mut update.filter {
                    self.bind_expr(filter, Some(&schema))?;
                }
                Ok(Vec::new())
            }
            SqlStatement::Delete(delete) => {
                let schema = self.table(&delete.table)?.clone();
                if let Some(filter) = &mut delete.filter {
                    self.bind_expr(filter, Some(&schema))?;
                }
                Ok(Vec::new())
            }
            SqlStatement::CreateTable(create) => {
                let table = display_table(&create.table);
                if self.ctx.catalog.table(&create.table).is_some() && !create.if_not_exists {
                    return Err(PlanError::TableExists { table });
                }
                for (i, column) in create.columns.iter().enumerate() {
                    let duplicate = create.columns[..i]
                        .iter()
                        .any(|earlier| earlier.name.eq_ignore_ascii_case(&column.name));
                    if duplicate {
                        return Err(PlanError::DuplicateColumn {
                            table,
                            column: column.name.clone(),
                        });
                    }
                }
                if create.columns.iter().filter(|column| column.primary_key).count() > 1 {
                    return Err(PlanError::MultiplePrimaryKeys { table });
                }
                Ok(Vec::new())
            }
            SqlStatement::DropTable(drop) => {
                if self.ctx.catalog.table(&drop.table).is_none() && !drop.if_exists {
                    return Err(PlanError::UnknownTable {
                        table: display_table(&drop.table),
                    });
                }
                Ok(Vec::new())
            }
        }
    }

    fn check_columns<'c>(
        &self,
        schema: &TableSchema,
        columns: impl Iterator<Item = &'c String>,
    ) -> Result<(), PlanError> {
        let mut seen: Vec<&str> = Vec::new();
        for column in columns {
            if schema.column(column).is_none() {
                return Err(PlanError::UnknownColumn {
                    table: schema.qualified_name(),
                    column: column.clone(),
                });
            }
            if seen.iter().any(|name| name.eq_ignore_ascii_case(column)) {
                return Err(PlanError::DuplicateColumn {
                    table: schema.qualified_name(),
                    column: column.clone(),
                });
            }
            seen.push(column);
        }
        Ok(())
    }

    /// Placeholder number for a variable, reusing the first one assigned.
    fn param(&mut self, name: &str, field: Option<&str>) -> usize {
        let existing = self
            .params
            .iter()
            .position(|param| param.name == name && param.field.as_deref() == field);
        match existing {
            Some(index) => index + 1,
            None => {
                self.params.push(ParamRef {
                    name: name.to_string(),
                    field: field.map(str::to_string),
                });
                self.params.len()
            }
        }
    }

    /// Resolve names in `expr`, rewriting variables to placeholders, and
    /// infer its type.
    fn bind_expr(&mut self, expr: &mut SqlExpr, scope: Option<&TableSchema>) -> Result<DataType, PlanError> {
        match expr {
            SqlExpr::Column(name) => {
                let Some(schema) = scope else {
                    return Err(PlanError::UnknownColumn {
                        table: String::new(),
                        column: name.clone(),
                    });
                };
                schema
                    .column(name)
                    .map(|(_, column)| column.data_type)
                    .ok_or_else(|| PlanError::UnknownColumn {
                        table: schema.qualified_name(),
                        column: name.clone(),
                    })
            }
            SqlExpr::Variable { name, field } => {
                let data_type = self.ctx.variables.variable_type(name, field.as_deref())?;
                let index = self.param(name, field.as_deref());
                *expr = SqlExpr::Param(index);
                Ok(data_type)
            }
            SqlExpr::ContextVariable(name) => {
                let data_type = self.ctx.variables.variable_type(name, None)?;
                let index = self.param(name, None);
                *expr = SqlExpr::Param(index);
                Ok(data_type)
            }
            SqlExpr::Literal(value) => Ok(value.data_type().unwrap_or(DataType::NULL)),
            SqlExpr::Param(_) => Ok(DataType::NULL),
            SqlExpr::Binary { op, left, right } => {
                let left = self.bind_expr(left, scope)?;
                let right = self.bind_expr(right, scope)?;
                Ok(if op.is_comparison() || op.is_logical() {
                    DataType::BOOL
                } else if left.is_null() {
                    right
                } else {
                    left
                })
            }
            SqlExpr::Unary { op, operand } => {
                let operand = self.bind_expr(operand, scope)?;
                Ok(match op {
                    lq_ast::UnaryOp::Not => DataType::BOOL,
                    lq_ast::UnaryOp::Neg | lq_ast::UnaryOp::Pos => operand,
                })
            }
            SqlExpr::IsNull { expr, .. } => {
                self.bind_expr(expr, scope)?;
                Ok(DataType::BOOL)
            }
        }
    }
}
