//! Deterministic SQL text.
//!
//! Rendering depends only on the tree: no hash-map iteration, no locale, no
//! configuration. Identifiers are emitted as written; literals carry an
//! explicit cast whenever their type is not implied by the literal form.

use std::fmt::{self, Display, Formatter};

use lq_ast::{BinaryOp, SelectItem, SqlExpr, SqlStatement, TableRef};
use lq_value::Value;

/// Render a statement.
pub fn statement(statement: &SqlStatement) -> String {
    StatementSql(statement).to_string()
}

/// Render one expression.
pub fn expr(expr: &SqlExpr) -> String {
    ExprSql(expr).to_string()
}

/// Render a literal value.
pub fn literal(value: &Value) -> String {
    LiteralSql(value).to_string()
}

struct StatementSql<'a>(&'a SqlStatement);
struct ExprSql<'a>(&'a SqlExpr);
struct LiteralSql<'a>(&'a Value);
struct TableSql<'a>(&'a TableRef);

/// Write `items` separated by `", "`.
fn comma_list<T>(
    f: &mut Formatter<'_>,
    items: impl IntoIterator<Item = T>,
    mut each: impl FnMut(&mut Formatter<'_>, T) -> fmt::Result,
) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        each(f, item)?;
    }
    Ok(())
}

impl Display for TableSql<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.0.namespace {
            write!(f, "{namespace}.")?;
        }
        f.write_str(&self.0.name)
    }
}

impl Display for StatementSql<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            SqlStatement::Select(select) => {
                f.write_str("SELECT ")?;
                comma_list(f, &select.projection, |f, item| match item {
                    SelectItem::Wildcard => f.write_str("*"),
                    SelectItem::Expr { expr, alias: None } => write!(f, "{}", ExprSql(expr)),
                    SelectItem::Expr {
                        expr,
                        alias: Some(alias),
                    } => write!(f, "{} AS {alias}", ExprSql(expr)),
                })?;
                write!(f, " FROM {}", TableSql(&select.from))?;
                if let Some(filter) = &select.filter {
                    write!(f, " WHERE {}", ExprSql(filter))?;
                }
                if !select.order_by.is_empty() {
                    f.write_str(" ORDER BY ")?;
                    comma_list(f, &select.order_by, |f, order| {
                        write!(f, "{}", ExprSql(&order.expr))?;
                        if order.descending {
                            f.write_str(" DESC")?;
                        }
                        Ok(())
                    })?;
                }
                if let Some(limit) = &select.limit {
                    write!(f, " LIMIT {}", ExprSql(limit))?;
                }
                Ok(())
            }
            SqlStatement::Insert(insert) => {
                write!(f, "INSERT INTO {}", TableSql(&insert.table))?;
                if !insert.columns.is_empty() {
                    f.write_str(" (")?;
                    comma_list(f, &insert.columns, |f, column| f.write_str(column))?;
                    f.write_str(")")?;
                }
                f.write_str(" VALUES ")?;
                comma_list(f, &insert.rows, |f, row| {
                    f.write_str("(")?;
                    comma_list(f, row, |f, value| write!(f, "{}", ExprSql(value)))?;
                    f.write_str(")")
                })
            }
            SqlStatement::Update(update) => {
                write!(f, "UPDATE {} SET ", TableSql(&update.table))?;
                comma_list(f, &update.assignments, |f, (column, value)| {
                    write!(f, "{column} = {}", ExprSql(value))
                })?;
                if let Some(filter) = &update.filter {
                    write!(f, " WHERE {}", ExprSql(filter))?;
                }
                Ok(())
            }
            SqlStatement::Delete(delete) => {
                write!(f, "DELETE FROM {}", TableSql(&delete.table))?;
                if let Some(filter) = &delete.filter {
                    write!(f, " WHERE {}", ExprSql(filter))?;
                }
                Ok(())
            }
            SqlStatement::CreateTable(create) => {
                f.write_str("CREATE TABLE ")?;
                if create.if_not_exists {
                    f.write_str("IF NOT EXISTS ")?;
                }
                write!(f, "{} (", TableSql(&create.table))?;
                comma_list(f, &create.columns, |f, column| {
                    write!(f, "{} {}", column.name, column.data_type)?;
                    if column.primary_key {
                        f.write_str(" PRIMARY KEY")
                    } else if column.not_null {
                        f.write_str(" NOT NULL")
                    } else {
                        Ok(())
                    }
                })?;
                f.write_str(")")
            }
            SqlStatement::DropTable(drop) => {
                f.write_str("DROP TABLE ")?;
                if drop.if_exists {
                    f.write_str("IF EXISTS ")?;
                }
                write!(f, "{}", TableSql(&drop.table))
            }
        }
    }
}

/// Precedence of an expression as an operand. Non-binary forms never need
/// parentheses.
fn precedence(expr: &SqlExpr) -> u8 {
    match expr {
        SqlExpr::Binary { op, .. } => op.precedence(),
        SqlExpr::IsNull { .. } => 3,
        _ => u8::MAX,
    }
}

fn operand(f: &mut Formatter<'_>, expr: &SqlExpr, parenthesize: bool) -> fmt::Result {
    if parenthesize {
        write!(f, "({})", ExprSql(expr))
    } else {
        write!(f, "{}", ExprSql(expr))
    }
}

impl Display for ExprSql<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            SqlExpr::Column(name) => f.write_str(name),
            SqlExpr::Variable { name, field: None } | SqlExpr::ContextVariable(name) => {
                f.write_str(name)
            }
            SqlExpr::Variable {
                name,
                field: Some(field),
            } => write!(f, "{name}.{field}"),
            SqlExpr::Literal(value) => write!(f, "{}", LiteralSql(value)),
            SqlExpr::Param(index) => write!(f, "${index}"),
            SqlExpr::Binary { op, left, right } => {
                let own = op.precedence();
                // Left-associative: an equal-precedence right operand keeps
                // its parentheses.
                operand(f, left, precedence(left) < own)?;
                write!(f, " {} ", op.as_symbol())?;
                operand(f, right, precedence(right) <= own && !is_associative(*op))?;
                Ok(())
            }
            SqlExpr::Unary { op, operand: inner } => {
                f.write_str(op.as_symbol())?;
                operand(f, inner, precedence(inner) != u8::MAX)
            }
            SqlExpr::IsNull { expr, negated } => {
                operand(f, expr, precedence(expr) <= 3)?;
                f.write_str(if *negated { " IS NOT NULL" } else { " IS NULL" })
            }
        }
    }
}

/// Operators where `a op (b op c)` equals `(a op b) op c`.
fn is_associative(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::And | BinaryOp::Or | BinaryOp::Concat)
}

impl Display for LiteralSql<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Null(ty) if ty.is_null() => f.write_str("NULL"),
            Value::Null(ty) => write!(f, "NULL::{ty}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Text(s) => quoted(f, s),
            Value::Blob(_) => write!(f, "'{}'::bytea", self.0),
            Value::Uuid(u) => write!(f, "'{u}'::uuid"),
            Value::Decimal(d) => write!(f, "{d}::{}", d.data_type()),
            Value::Array(array) => {
                f.write_str("ARRAY[")?;
                comma_list(f, array.iter(), |f, item| write!(f, "{}", LiteralSql(item)))?;
                write!(f, "]::{}", array.data_type())
            }
            Value::Record(record) => {
                f.write_str("ROW(")?;
                comma_list(f, record.iter(), |f, (_, value)| {
                    write!(f, "{}", LiteralSql(value))
                })?;
                f.write_str(")")
            }
        }
    }
}

/// Single-quoted string with embedded quotes doubled.
fn quoted(f: &mut Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for (i, part) in s.split('\'').enumerate() {
        if i > 0 {
            f.write_str("''")?;
        }
        f.write_str(part)?;
    }
    f.write_str("'")
}
