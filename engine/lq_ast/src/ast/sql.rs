//! Embedded SQL.
//!
//! Statements reference locals as `$name` (or `$record.field`) and context
//! values as `@name`. Planning replaces those with positional parameters.

use lq_types::DataType;
use lq_value::Value;

use crate::operators::{BinaryOp, UnaryOp};

/// A table, optionally qualified with its namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub namespace: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        TableRef {
            namespace: None,
            name: name.into(),
        }
    }

    pub fn qualified(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TableRef {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SqlStatement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    CreateTable(CreateTable),
    DropTable(DropTable),
}

impl SqlStatement {
    /// Whether running the statement changes database state.
    pub fn mutates(&self) -> bool {
        !matches!(self, SqlStatement::Select(_))
    }

    /// The single table the statement touches.
    pub fn table(&self) -> &TableRef {
        match self {
            SqlStatement::Select(s) => &s.from,
            SqlStatement::Insert(s) => &s.table,
            SqlStatement::Update(s) => &s.table,
            SqlStatement::Delete(s) => &s.table,
            SqlStatement::CreateTable(s) => &s.table,
            SqlStatement::DropTable(s) => &s.table,
        }
    }

    pub fn table_mut(&mut self) -> &mut TableRef {
        match self {
            SqlStatement::Select(s) => &mut s.from,
            SqlStatement::Insert(s) => &mut s.table,
            SqlStatement::Update(s) => &mut s.table,
            SqlStatement::Delete(s) => &mut s.table,
            SqlStatement::CreateTable(s) => &mut s.table,
            SqlStatement::DropTable(s) => &mut s.table,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Select {
    pub projection: Vec<SelectItem>,
    pub from: TableRef,
    pub filter: Option<SqlExpr>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<SqlExpr>,
}

impl Select {
    pub fn new(projection: Vec<SelectItem>, from: TableRef) -> Self {
        Select {
            projection,
            from,
            filter: None,
            order_by: Vec::new(),
            limit: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SelectItem {
    Wildcard,
    Expr { expr: SqlExpr, alias: Option<String> },
}

impl SelectItem {
    pub fn column(name: impl Into<String>) -> Self {
        SelectItem::Expr {
            expr: SqlExpr::column(name),
            alias: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    pub expr: SqlExpr,
    pub descending: bool,
}

/// `INSERT INTO table [(columns)] VALUES (...), (...)`
///
/// An empty column list means every column in table order.
#[derive(Clone, Debug, PartialEq)]
pub struct Insert {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlExpr>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Update {
    pub table: TableRef,
    pub assignments: Vec<(String, SqlExpr)>,
    pub filter: Option<SqlExpr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Delete {
    pub table: TableRef,
    pub filter: Option<SqlExpr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateTable {
    pub table: TableRef,
    pub columns: Vec<ColumnDef>,
    pub if_not_exists: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub primary_key: bool,
    pub not_null: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        ColumnDef {
            name: name.into(),
            data_type,
            primary_key: false,
            not_null: false,
        }
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DropTable {
    pub table: TableRef,
    pub if_exists: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SqlExpr {
    Column(String),
    /// `$name` or `$name.field`, bound from the current scope.
    Variable { name: String, field: Option<String> },
    /// `@name`, bound from the transaction context.
    ContextVariable(String),
    Literal(Value),
    /// `$n`, 1-based. Only present after planning.
    Param(usize),
    Binary {
        op: BinaryOp,
        left: Box<SqlExpr>,
        right: Box<SqlExpr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<SqlExpr>,
    },
    /// `expr IS [NOT] NULL`
    IsNull { expr: Box<SqlExpr>, negated: bool },
}

impl SqlExpr {
    pub fn column(name: impl Into<String>) -> Self {
        SqlExpr::Column(name.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        SqlExpr::Variable {
            name: name.into(),
            field: None,
        }
    }

    pub fn var_field(name: impl Into<String>, field: impl Into<String>) -> Self {
        SqlExpr::Variable {
            name: name.into(),
            field: Some(field.into()),
        }
    }

    pub fn int(value: i64) -> Self {
        SqlExpr::Literal(Value::Int(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        SqlExpr::Literal(Value::text(value))
    }

    pub fn binary(op: BinaryOp, left: SqlExpr, right: SqlExpr) -> Self {
        SqlExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}
