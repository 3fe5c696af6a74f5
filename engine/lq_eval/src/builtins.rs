//! Built-in scalar functions.
//!
//! Every built-in is deterministic. Each one has a signature check that
//! validates the arguments and computes the return type, and a body that
//! runs after the check passed. Built-ins are installed into every namespace
//! and may be shadowed there by an action of the same name.

use lq_types::DataType;
use lq_value::{ArrayValue, UnaryOp, Value};

use crate::context::ExecutionContext;
use crate::errors::{argument_type, arity_mismatch, raised, ExecError};

type SignatureFn = fn(&'static str, &[Value]) -> Result<Option<DataType>, ExecError>;
type RunFn = fn(&mut ExecutionContext<'_>, &[Value]) -> Result<Option<Value>, ExecError>;

pub struct Builtin {
    pub name: &'static str,
    signature: SignatureFn,
    run: RunFn,
}

impl Builtin {
    /// Validate `args` and return the result type, `None` for functions that
    /// return nothing.
    pub fn signature(&self, args: &[Value]) -> Result<Option<DataType>, ExecError> {
        (self.signature)(self.name, args)
    }

    /// Run the function. Arguments must have passed [`signature`](Self::signature).
    pub(crate) fn run(&self, ctx: &mut ExecutionContext<'_>, args: &[Value]) -> Result<Option<Value>, ExecError> {
        (self.run)(ctx, args)
    }
}

pub static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "abs",
        signature: abs_signature,
        run: abs,
    },
    Builtin {
        name: "upper",
        signature: text_to_text,
        run: upper,
    },
    Builtin {
        name: "lower",
        signature: text_to_text,
        run: lower,
    },
    Builtin {
        name: "length",
        signature: length_signature,
        run: length,
    },
    Builtin {
        name: "array_length",
        signature: array_length_signature,
        run: array_length,
    },
    Builtin {
        name: "array_append",
        signature: array_append_signature,
        run: array_append,
    },
    Builtin {
        name: "coalesce",
        signature: coalesce_signature,
        run: coalesce,
    },
    Builtin {
        name: "notice",
        signature: message_signature,
        run: notice,
    },
    Builtin {
        name: "error",
        signature: message_signature,
        run: error,
    },
];

/// Look a built-in up by (lowercase) name.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

fn arity(name: &str, args: &[Value], expected: usize) -> Result<(), ExecError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(arity_mismatch(name, expected, args.len()))
    }
}

/// Type of argument `position` (1-based) when it satisfies `accept`.
fn argument(
    name: &str,
    args: &[Value],
    position: usize,
    expected: &str,
    accept: impl Fn(&DataType) -> bool,
) -> Result<DataType, ExecError> {
    let value = &args[position - 1];
    match value.data_type() {
        Some(ty) if ty.is_null() || accept(&ty) => Ok(ty),
        _ => Err(argument_type(name, position, expected, value.type_name())),
    }
}

fn text_argument(name: &str, args: &[Value]) -> Result<(), ExecError> {
    arity(name, args, 1)?;
    argument(name, args, 1, "text", |ty| *ty == DataType::TEXT)?;
    Ok(())
}

// abs

fn abs_signature(name: &str, args: &[Value]) -> Result<Option<DataType>, ExecError> {
    arity(name, args, 1)?;
    let ty = argument(name, args, 1, "int8 or numeric", DataType::is_numeric)?;
    Ok(Some(if ty.is_null() { DataType::INT } else { ty }))
}

fn abs(_: &mut ExecutionContext<'_>, args: &[Value]) -> Result<Option<Value>, ExecError> {
    let value = &args[0];
    let negative = match value {
        Value::Int(i) => *i < 0,
        Value::Decimal(d) => d.value().is_sign_negative(),
        _ => false,
    };
    let result = if negative {
        value.unary(UnaryOp::Neg)?
    } else {
        value.clone().coerce_null(DataType::INT)
    };
    Ok(Some(result))
}

// text

fn text_to_text(name: &str, args: &[Value]) -> Result<Option<DataType>, ExecError> {
    text_argument(name, args)?;
    Ok(Some(DataType::TEXT))
}

fn map_text(args: &[Value], f: impl Fn(&str) -> String) -> Value {
    match &args[0] {
        Value::Text(s) => Value::Text(f(s)),
        _ => Value::zero(DataType::TEXT),
    }
}

fn upper(_: &mut ExecutionContext<'_>, args: &[Value]) -> Result<Option<Value>, ExecError> {
    Ok(Some(map_text(args, str::to_uppercase)))
}

fn lower(_: &mut ExecutionContext<'_>, args: &[Value]) -> Result<Option<Value>, ExecError> {
    Ok(Some(map_text(args, str::to_lowercase)))
}

fn length_signature(name: &str, args: &[Value]) -> Result<Option<DataType>, ExecError> {
    text_argument(name, args)?;
    Ok(Some(DataType::INT))
}

/// Length in characters, not bytes.
fn length(_: &mut ExecutionContext<'_>, args: &[Value]) -> Result<Option<Value>, ExecError> {
    Ok(Some(match &args[0] {
        Value::Text(s) => Value::Int(count(s.chars().count())),
        _ => Value::zero(DataType::INT),
    }))
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

// arrays

fn array_length_signature(name: &str, args: &[Value]) -> Result<Option<DataType>, ExecError> {
    arity(name, args, 1)?;
    argument(name, args, 1, "an array", |ty| ty.is_array)?;
    Ok(Some(DataType::INT))
}

fn array_length(_: &mut ExecutionContext<'_>, args: &[Value]) -> Result<Option<Value>, ExecError> {
    Ok(Some(match &args[0] {
        Value::Array(array) => Value::Int(count(array.len())),
        _ => Value::zero(DataType::INT),
    }))
}

fn array_append_signature(name: &str, args: &[Value]) -> Result<Option<DataType>, ExecError> {
    arity(name, args, 2)?;
    let array = argument(name, args, 1, "an array", |ty| ty.is_array)?;
    let element = &args[1];
    if !element.is_scalar() {
        return Err(argument_type(name, 2, "a scalar", element.type_name()));
    }
    let element_type = element.data_type().unwrap_or(DataType::NULL);
    if array.is_null() {
        return Ok(Some(element_type.as_array()));
    }
    if !element.has_type(&array.element()) && !(array.is_decimal() && element_type.is_decimal()) {
        return Err(argument_type(name, 2, array.element(), element.type_name()));
    }
    Ok(Some(array))
}

/// Append to an array. A null array starts a new one.
fn array_append(_: &mut ExecutionContext<'_>, args: &[Value]) -> Result<Option<Value>, ExecError> {
    let mut array = match &args[0] {
        Value::Array(array) => array.clone(),
        _ => {
            let element = match &args[0] {
                Value::Null(ty) if !ty.is_null() => ty.element(),
                _ => args[1].data_type().unwrap_or(DataType::NULL),
            };
            ArrayValue::new(element)
        }
    };
    array.push(args[1].clone())?;
    Ok(Some(Value::Array(array)))
}

// nulls

fn coalesce_signature(name: &str, args: &[Value]) -> Result<Option<DataType>, ExecError> {
    arity(name, args, 2)?;
    let first = args[0].data_type();
    let second = args[1].data_type();
    match (first, second) {
        (Some(a), Some(b)) if a.compatible_kind(&b) => Ok(Some(if a.is_null() { b } else { a })),
        (Some(_), _) => Err(argument_type(name, 2, args[0].type_name(), args[1].type_name())),
        (None, _) => Err(argument_type(name, 1, "a scalar or array", "record")),
    }
}

fn coalesce(_: &mut ExecutionContext<'_>, args: &[Value]) -> Result<Option<Value>, ExecError> {
    let chosen = if args[0].is_null() { &args[1] } else { &args[0] };
    Ok(Some(chosen.clone()))
}

// messages

fn message_signature(name: &str, args: &[Value]) -> Result<Option<DataType>, ExecError> {
    text_argument(name, args)?;
    Ok(None)
}

fn message(args: &[Value]) -> String {
    match &args[0] {
        Value::Text(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Append a line to the call's notice log.
fn notice(ctx: &mut ExecutionContext<'_>, args: &[Value]) -> Result<Option<Value>, ExecError> {
    ctx.notices.push(message(args));
    Ok(None)
}

fn error(_: &mut ExecutionContext<'_>, args: &[Value]) -> Result<Option<Value>, ExecError> {
    Err(raised(message(args)))
}
