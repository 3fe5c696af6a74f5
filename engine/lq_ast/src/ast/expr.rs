//! Procedural expressions.
//!
//! Every expression evaluates to exactly one value.

use lq_types::DataType;
use lq_value::Value;

use crate::operators::{BinaryOp, UnaryOp};

/// Call of an action or built-in function.
///
/// `namespace` is `None` for the caller's own namespace.
#[derive(Clone, Debug, PartialEq)]
pub struct CallExpr {
    pub namespace: Option<String>,
    pub name: String,
    pub args: Vec<Expr>,
}

impl CallExpr {
    pub fn new(name: impl Into<String>, args: Vec<Expr>) -> Self {
        CallExpr {
            namespace: None,
            name: name.into(),
            args,
        }
    }

    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// `$name` for locals and parameters, `@name` for context variables.
    Variable(String),
    Call(CallExpr),
    /// `array[index]`, 1-based.
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    /// `array[from:to]`, inclusive on both ends. Missing bounds default to
    /// the start and end of the array.
    ArraySlice {
        array: Box<Expr>,
        from: Option<Box<Expr>>,
        to: Option<Box<Expr>>,
    },
    /// `ARRAY[a, b, ...]`
    MakeArray(Vec<Expr>),
    /// `record.field`
    FieldAccess {
        record: Box<Expr>,
        field: String,
    },
    Paren(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `left IS [NOT] [DISTINCT FROM] right`
    Is {
        left: Box<Expr>,
        right: Box<Expr>,
        not: bool,
        distinct: bool,
    },
    /// `expr::type`
    Cast {
        expr: Box<Expr>,
        target: DataType,
    },
}

// Shorthand constructors, mostly for hand-built trees in tests.
impl Expr {
    pub fn int(value: i64) -> Self {
        Expr::Literal(Value::Int(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Expr::Literal(Value::text(value))
    }

    pub fn bool(value: bool) -> Self {
        Expr::Literal(Value::Bool(value))
    }

    pub fn null() -> Self {
        Expr::Literal(Value::null())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call(CallExpr::new(name, args))
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn index(array: Expr, index: Expr) -> Self {
        Expr::ArrayAccess {
            array: Box::new(array),
            index: Box::new(index),
        }
    }

    pub fn field(record: Expr, field: impl Into<String>) -> Self {
        Expr::FieldAccess {
            record: Box::new(record),
            field: field.into(),
        }
    }

    pub fn cast(expr: Expr, target: DataType) -> Self {
        Expr::Cast {
            expr: Box::new(expr),
            target,
        }
    }
}
