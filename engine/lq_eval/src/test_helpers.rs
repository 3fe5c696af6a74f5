//! Test helpers for running compiled code against the in-memory store.
//!
//! [`Harness`] owns everything an [`ExecutionContext`] borrows: a read-write
//! or read-only transaction on a fresh [`MemoryDb`], a `main` namespace with
//! built-ins, and an access controller owned by the harness caller.

#![allow(clippy::unwrap_used)]

use lq_ast::{ActionDef, ActionStmt, ColumnDef, CreateTable, Expr, Insert, SqlExpr, SqlStatement, TableRef};
use lq_sql::{CatalogPlanner, MemoryDb, MemoryTx};
use lq_types::{AccessMode, ActionModifiers, DataType};
use lq_value::Value;

use crate::access::{AccessController, MemoryAccessController};
use crate::compile::{self, ControlSignal};
use crate::context::{ExecutionContext, TxContext};
use crate::environment::Scope;
use crate::errors::ExecError;
use crate::namespace::Namespaces;
use crate::sql_bridge;

pub(crate) const OWNER: &str = "owner";

pub(crate) struct Harness {
    pub tx: TxContext,
    pub store: MemoryTx,
    pub namespaces: Namespaces,
    pub access: MemoryAccessController,
    _db: MemoryDb,
}

impl Harness {
    pub fn new(mode: AccessMode) -> Self {
        let db = MemoryDb::new();
        let store = db.begin(mode);
        let mut namespaces = Namespaces::new(true);
        namespaces.ensure("main");
        let mut access = MemoryAccessController::new(Some(OWNER));
        access.register_namespace("main");
        Harness {
            tx: TxContext::new(OWNER),
            store,
            namespaces,
            access,
            _db: db,
        }
    }

    pub fn read_write() -> Self {
        Harness::new(AccessMode::ReadWrite)
    }

    pub fn read_only() -> Self {
        Harness::new(AccessMode::ReadOnly)
    }

    /// A top-level context in `main`.
    pub fn ctx(&mut self) -> ExecutionContext<'_> {
        ExecutionContext::new(
            &self.tx,
            &mut self.store,
            &self.namespaces,
            &self.access,
            &CatalogPlanner,
            Scope::root("main", None),
            500,
        )
    }

    /// Install an action into `main`.
    pub fn define(&mut self, def: ActionDef) {
        self.namespaces
            .get_mut("main")
            .unwrap()
            .create_action(def, false, false)
            .unwrap();
    }

    pub fn sql(&mut self, statement: SqlStatement) -> Vec<Vec<Value>> {
        let mut ctx = self.ctx();
        sql_bridge::query(&mut ctx, &statement).unwrap()
    }

    /// Call an action of `main` at top level and collect its rows.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Vec<Vec<Value>>, ExecError> {
        let callee = self.namespaces.get("main").unwrap().function(name).unwrap().clone();
        let mut ctx = self.ctx();
        let mut rows = Vec::new();
        callee.call(&mut ctx, args, &mut |row: Vec<Value>| {
            rows.push(row);
            Ok(())
        })?;
        Ok(rows)
    }

    /// `users(id int8 primary key, name text not null, age int8)` with Alice
    /// (30) and Bob (25).
    pub fn with_users(mut self) -> Self {
        self.sql(SqlStatement::CreateTable(CreateTable {
            table: TableRef::new("users"),
            columns: vec![
                ColumnDef::new("id", DataType::INT).primary_key(),
                ColumnDef::new("name", DataType::TEXT).not_null(),
                ColumnDef::new("age", DataType::INT),
            ],
            if_not_exists: false,
        }));
        self.sql(insert_user(1, "Alice", 30));
        self.sql(insert_user(2, "Bob", 25));
        self
    }
}

pub(crate) fn insert_user(id: i64, name: &str, age: i64) -> SqlStatement {
    SqlStatement::Insert(Insert {
        table: TableRef::new("users"),
        columns: Vec::new(),
        rows: vec![vec![SqlExpr::int(id), SqlExpr::text(name), SqlExpr::int(age)]],
    })
}

/// A public action, callable from the harness at top level.
pub(crate) fn public(name: &str) -> ActionDef {
    ActionDef::new(name).modifiers(ActionModifiers::PUBLIC)
}

/// Compile and evaluate one expression.
pub(crate) fn eval(ctx: &mut ExecutionContext<'_>, expr: &Expr) -> Result<Value, ExecError> {
    compile::expression(expr)(ctx)
}

/// Compile and run statements in the current scope, collecting returned rows.
pub(crate) fn run(
    ctx: &mut ExecutionContext<'_>,
    stmts: &[ActionStmt],
) -> Result<(ControlSignal, Vec<Vec<Value>>), ExecError> {
    let body = compile::block(stmts);
    let mut rows = Vec::new();
    let signal = compile::run_block(ctx, &body, &mut |row: Vec<Value>| {
        rows.push(row);
        Ok(())
    })?;
    Ok((signal, rows))
}
