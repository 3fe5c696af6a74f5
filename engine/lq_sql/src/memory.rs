//! In-memory transactional store.
//!
//! A [`MemoryDb`] holds committed tables behind a lock. [`MemoryDb::begin`]
//! hands out a [`MemoryTx`] working on its own copy; [`MemoryTx::commit`]
//! publishes that copy and dropping the transaction discards it. Commits
//! replace the whole table set, so concurrent writers are last-writer-wins.
//! Replicated execution runs one writer at a time.
//!
//! Every statement is atomic: a failing `INSERT` or `UPDATE` leaves the
//! table as it was.

mod eval;

use std::sync::Arc;

use lq_ast::{SelectItem, SqlStatement, TableRef};
use lq_types::AccessMode;
use lq_value::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use self::eval::{eval, matches, order, Row};
use crate::errors::StoreError;
use crate::plan::PreparedStatement;
use crate::schema::{Catalog, TableSchema};
use crate::store::{RowSet, Store};
use crate::table_key;

#[derive(Clone, Debug)]
struct Table {
    schema: TableSchema,
    rows: Vec<Vec<Value>>,
}

type Tables = FxHashMap<String, Table>;

/// Committed state shared by all transactions.
#[derive(Clone, Debug, Default)]
pub struct MemoryDb {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        MemoryDb::default()
    }

    /// Start a transaction on a snapshot of the committed tables.
    pub fn begin(&self, mode: AccessMode) -> MemoryTx {
        MemoryTx {
            db: Arc::clone(&self.tables),
            tables: self.tables.read().clone(),
            mode,
        }
    }

    /// Committed table keys (`namespace.table`), sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tables.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

/// One transaction. Changes are private until [`commit`](MemoryTx::commit).
#[derive(Debug)]
pub struct MemoryTx {
    db: Arc<RwLock<Tables>>,
    tables: Tables,
    mode: AccessMode,
}

impl MemoryTx {
    /// Publish this transaction's tables.
    pub fn commit(self) {
        debug!(tables = self.tables.len(), "commit");
        *self.db.write() = self.tables;
    }

    /// Discard this transaction's changes.
    pub fn rollback(self) {
        debug!("rollback");
    }

    fn table_mut(&mut self, table: &TableRef) -> Result<&mut Table, StoreError> {
        let key = table_key(table.namespace.as_deref().unwrap_or_default(), &table.name);
        self.tables
            .get_mut(&key)
            .ok_or(StoreError::TableNotFound { table: key })
    }

    fn select(
        &mut self,
        statement: &PreparedStatement,
        select: &lq_ast::Select,
        params: &[Value],
    ) -> Result<Vec<Vec<Value>>, StoreError> {
        let table = self.table_mut(&select.from)?;
        let schema = &table.schema;

        let mut selected = Vec::new();
        for values in &table.rows {
            let row = Row { schema, values };
            if matches(select.filter.as_ref(), row, params)? {
                selected.push(values.as_slice());
            }
        }

        if !select.order_by.is_empty() {
            let mut keyed = Vec::with_capacity(selected.len());
            for values in selected {
                let row = Row { schema, values };
                let keys = select
                    .order_by
                    .iter()
                    .map(|order| eval(&order.expr, Some(row), params))
                    .collect::<Result<Vec<_>, _>>()?;
                keyed.push((keys, values));
            }
            let mut failure = None;
            keyed.sort_by(|(a, _), (b, _)| {
                for (i, spec) in select.order_by.iter().enumerate() {
                    match order(&a[i], &b[i]) {
                        Ok(std::cmp::Ordering::Equal) => {}
                        Ok(ordering) if spec.descending => return ordering.reverse(),
                        Ok(ordering) => return ordering,
                        Err(err) => {
                            failure.get_or_insert(err);
                            return std::cmp::Ordering::Equal;
                        }
                    }
                }
                std::cmp::Ordering::Equal
            });
            if let Some(err) = failure {
                return Err(err);
            }
            selected = keyed.into_iter().map(|(_, values)| values).collect();
        }

        if let Some(limit) = &select.limit {
            match eval(limit, None, params)? {
                Value::Int(n) if n >= 0 => {
                    selected.truncate(usize::try_from(n).unwrap_or(usize::MAX));
                }
                Value::Null(_) => {}
                other => {
                    return Err(StoreError::InvalidOperand {
                        what: "LIMIT",
                        expected: "a non-negative int8",
                        got: other.to_string(),
                    })
                }
            }
        }

        let mut rows = Vec::with_capacity(selected.len());
        for values in selected {
            let row = Row { schema, values };
            let mut out = Vec::with_capacity(statement.fields.len());
            for item in &select.projection {
                match item {
                    SelectItem::Wildcard => out.extend_from_slice(values),
                    SelectItem::Expr { expr, .. } => out.push(eval(expr, Some(row), params)?),
                }
            }
            rows.push(out);
        }
        Ok(rows)
    }

    fn insert(&mut self, insert: &lq_ast::Insert, params: &[Value]) -> Result<(), StoreError> {
        let table = self.table_mut(&insert.table)?;
        let schema = &table.schema;
        let targets = if insert.columns.is_empty() {
            (0..schema.columns.len()).collect::<Vec<_>>()
        } else {
            insert
                .columns
                .iter()
                .map(|name| {
                    schema
                        .column(name)
                        .map(|(index, _)| index)
                        .ok_or_else(|| StoreError::ColumnNotFound {
                            table: schema.qualified_name(),
                            column: name.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut fresh: Vec<Vec<Value>> = Vec::with_capacity(insert.rows.len());
        for exprs in &insert.rows {
            let mut row: Vec<Value> = schema
                .columns
                .iter()
                .map(|column| Value::zero(column.data_type))
                .collect();
            for (&index, expr) in targets.iter().zip(exprs) {
                row[index] = conform(schema, index, eval(expr, None, params)?)?;
            }
            check_not_null(schema, &row)?;
            check_unique(schema, table.rows.iter().chain(fresh.iter()), &row)?;
            fresh.push(row);
        }

        trace!(table = %schema.qualified_name(), rows = fresh.len(), "insert");
        table.rows.extend(fresh);
        Ok(())
    }

    fn update(&mut self, update: &lq_ast::Update, params: &[Value]) -> Result<(), StoreError> {
        let table = self.table_mut(&update.table)?;
        let schema = &table.schema;

        let mut rows = table.rows.clone();
        let mut changed = Vec::new();
        for (position, values) in table.rows.iter().enumerate() {
            let row = Row { schema, values };
            if !matches(update.filter.as_ref(), row, params)? {
                continue;
            }
            let mut next = values.clone();
            for (name, expr) in &update.assignments {
                let (index, _) = schema.column(name).ok_or_else(|| StoreError::ColumnNotFound {
                    table: schema.qualified_name(),
                    column: name.clone(),
                })?;
                next[index] = conform(schema, index, eval(expr, Some(row), params)?)?;
            }
            check_not_null(schema, &next)?;
            rows[position] = next;
            changed.push(position);
        }

        for &position in &changed {
            let others = rows
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != position)
                .map(|(_, row)| row);
            check_unique(schema, others, &rows[position])?;
        }

        trace!(table = %schema.qualified_name(), rows = changed.len(), "update");
        table.rows = rows;
        Ok(())
    }

    fn delete(&mut self, delete: &lq_ast::Delete, params: &[Value]) -> Result<(), StoreError> {
        let table = self.table_mut(&delete.table)?;
        let schema = &table.schema;
        let mut keep = Vec::with_capacity(table.rows.len());
        for values in &table.rows {
            let row = Row { schema, values };
            keep.push(!matches(delete.filter.as_ref(), row, params)?);
        }
        let mut flags = keep.into_iter();
        table.rows.retain(|_| flags.next().unwrap_or(true));
        Ok(())
    }
}

/// Fit a value to its column's type.
fn conform(schema: &TableSchema, index: usize, value: Value) -> Result<Value, StoreError> {
    let column = &schema.columns[index];
    value
        .conform(&column.data_type)
        .map_err(|source| StoreError::Column {
            table: schema.qualified_name(),
            column: column.name.clone(),
            source,
        })
}

fn check_not_null(schema: &TableSchema, row: &[Value]) -> Result<(), StoreError> {
    for (column, value) in schema.columns.iter().zip(row) {
        if column.not_null && value.is_null() {
            return Err(StoreError::NotNull {
                table: schema.qualified_name(),
                column: column.name.clone(),
            });
        }
    }
    Ok(())
}

fn check_unique<'r>(
    schema: &TableSchema,
    existing: impl Iterator<Item = &'r Vec<Value>>,
    row: &[Value],
) -> Result<(), StoreError> {
    let Some(pk) = schema.primary_key() else {
        return Ok(());
    };
    for other in existing {
        if other[pk].not_distinct(&row[pk])? {
            return Err(StoreError::DuplicateKey {
                table: schema.qualified_name(),
                key: row[pk].to_string(),
            });
        }
    }
    Ok(())
}

impl Catalog for MemoryTx {
    fn table(&self, table: &TableRef) -> Option<&TableSchema> {
        let key = table_key(table.namespace.as_deref().unwrap_or_default(), &table.name);
        self.tables.get(&key).map(|table| &table.schema)
    }
}

impl Store for MemoryTx {
    fn access_mode(&self) -> AccessMode {
        self.mode
    }

    fn catalog(&self) -> &dyn Catalog {
        self
    }

    fn execute(&mut self, statement: &PreparedStatement, params: &[Value]) -> Result<RowSet, StoreError> {
        if statement.mutates && !self.mode.is_read_write() {
            return Err(StoreError::ReadOnly);
        }
        debug!(sql = %statement.sql, params = params.len(), "execute");

        let rows = match &statement.statement {
            SqlStatement::Select(select) => self.select(statement, select, params)?,
            SqlStatement::Insert(insert) => {
                self.insert(insert, params)?;
                Vec::new()
            }
            SqlStatement::Update(update) => {
                self.update(update, params)?;
                Vec::new()
            }
            SqlStatement::Delete(delete) => {
                self.delete(delete, params)?;
                Vec::new()
            }
            SqlStatement::CreateTable(create) => {
                let namespace = create.table.namespace.clone().unwrap_or_default();
                let key = table_key(&namespace, &create.table.name);
                if self.tables.contains_key(&key) {
                    if create.if_not_exists {
                        return Ok(RowSet::empty());
                    }
                    return Err(StoreError::TableExists { table: key });
                }
                let schema = TableSchema::new(namespace, create.table.name.clone(), create.columns.clone());
                self.tables.insert(key, Table {
                    schema,
                    rows: Vec::new(),
                });
                Vec::new()
            }
            SqlStatement::DropTable(drop) => {
                let key = table_key(drop.table.namespace.as_deref().unwrap_or_default(), &drop.table.name);
                if self.tables.remove(&key).is_none() && !drop.if_exists {
                    return Err(StoreError::TableNotFound { table: key });
                }
                Vec::new()
            }
        };

        Ok(RowSet {
            columns: statement.fields.clone(),
            rows,
        })
    }

    fn drop_namespace(&mut self, namespace: &str) -> Result<(), StoreError> {
        if !self.mode.is_read_write() {
            return Err(StoreError::ReadOnly);
        }
        let prefix = table_key(namespace, "");
        self.tables.retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }
}
