//! Uniform callables.
//!
//! Built-in functions and user actions both become an [`Executable`]: a name,
//! a function computing the result shape from the arguments, and the body.
//! A namespace's function table holds them interchangeably, which is what
//! lets an action shadow a built-in in one namespace only.

use std::fmt;

use lq_ast::ActionDef;
use lq_stack::ensure_sufficient_stack;
use lq_types::{ActionModifiers, ActionReturn, NamedType};
use lq_value::Value;
use tracing::trace;

use crate::builtins::Builtin;
use crate::compile::{self, ControlSignal, StmtFn};
use crate::context::ExecutionContext;
use crate::diagnostics::CallFrame;
use crate::environment::Scope;
use crate::errors::{
    argument_type, arity_mismatch, internal, no_return_values, return_arity, type_mismatch, ExecError,
};
use crate::scope_guard::ScopeSwap;

/// Receives each row a callable produces.
///
/// Returning an error stops the callable and becomes its error.
pub type RowSink<'s> = dyn FnMut(Vec<Value>) -> Result<(), ExecError> + 's;

type ReturnTypeFn = Box<dyn Fn(&[Value]) -> Result<Option<ActionReturn>, ExecError> + Send + Sync>;

type CallFn =
    Box<dyn Fn(&mut ExecutionContext<'_>, &[Value], &mut RowSink<'_>) -> Result<(), ExecError> + Send + Sync>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExecutableKind {
    Builtin,
    Action,
}

pub struct Executable {
    name: String,
    kind: ExecutableKind,
    return_type: ReturnTypeFn,
    func: CallFn,
}

impl fmt::Debug for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executable")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Executable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ExecutableKind {
        self.kind
    }

    pub fn is_builtin(&self) -> bool {
        self.kind == ExecutableKind::Builtin
    }

    /// Result shape for these arguments, `None` when nothing is returned.
    pub fn return_type(&self, args: &[Value]) -> Result<Option<ActionReturn>, ExecError> {
        (self.return_type)(args)
    }

    pub fn call(
        &self,
        ctx: &mut ExecutionContext<'_>,
        args: &[Value],
        sink: &mut RowSink<'_>,
    ) -> Result<(), ExecError> {
        (self.func)(ctx, args, sink)
    }

    /// Wrap a built-in function.
    pub(crate) fn builtin(builtin: &'static Builtin) -> Self {
        Executable {
            name: builtin.name.to_string(),
            kind: ExecutableKind::Builtin,
            return_type: Box::new(move |args: &[Value]| {
                Ok(builtin
                    .signature(args)?
                    .map(|ty| ActionReturn::values(vec![NamedType::new(builtin.name, ty)])))
            }),
            func: Box::new(move |ctx: &mut ExecutionContext<'_>, args: &[Value], sink: &mut RowSink<'_>| {
                builtin.signature(args)?;
                if let Some(value) = builtin.run(ctx, args)? {
                    sink(vec![value])?;
                }
                Ok(())
            }),
        }
    }

    /// Compile an action of `namespace`.
    ///
    /// The body is compiled here, once; every call reuses the closures.
    pub(crate) fn action(namespace: &str, def: &ActionDef) -> Self {
        let body = compile::block(&def.body);
        let action = ActionBody {
            namespace: namespace.to_string(),
            name: def.name.clone(),
            parameters: def.parameters.clone(),
            modifiers: def.modifiers,
            returns: def.returns.clone(),
            body,
        };
        let returns = def.returns.clone();
        Executable {
            name: def.name.clone(),
            kind: ExecutableKind::Action,
            return_type: Box::new(move |_: &[Value]| Ok(returns.clone())),
            func: Box::new(
                move |ctx: &mut ExecutionContext<'_>, args: &[Value], sink: &mut RowSink<'_>| {
                    action.invoke(ctx, args, sink)
                },
            ),
        }
    }
}

struct ActionBody {
    namespace: String,
    name: String,
    parameters: Vec<NamedType>,
    modifiers: ActionModifiers,
    returns: Option<ActionReturn>,
    body: Vec<StmtFn>,
}

impl ActionBody {
    fn invoke(
        &self,
        ctx: &mut ExecutionContext<'_>,
        args: &[Value],
        sink: &mut RowSink<'_>,
    ) -> Result<(), ExecError> {
        ctx.can_execute(&self.namespace, &self.name, self.modifiers)?;
        let args = self.bind_arguments(args)?;

        let caller = (!ctx.call_stack.is_empty()).then(|| ctx.namespace());
        if let Err(err) = ctx
            .call_stack
            .push(CallFrame::new(self.namespace.as_str(), self.name.as_str()))
        {
            return Err(ctx.call_stack.attach(err));
        }
        trace!(
            namespace = %self.namespace,
            action = %self.name,
            depth = ctx.call_stack.depth(),
            stack = ?lq_stack::remaining_stack(),
            "enter action"
        );

        let result = {
            let mut scoped = ScopeSwap::enter(ctx, Scope::root(self.namespace.as_str(), caller));
            self.run(&mut scoped, args, sink)
        };
        let result = result.map_err(|err| ctx.call_stack.attach(err));
        ctx.call_stack.pop();
        result
    }

    /// Check arity and argument types. Nulls are accepted for any parameter
    /// and take its type.
    fn bind_arguments(&self, args: &[Value]) -> Result<Vec<Value>, ExecError> {
        if args.len() != self.parameters.len() {
            return Err(arity_mismatch(&self.name, self.parameters.len(), args.len()));
        }
        self.parameters
            .iter()
            .zip(args)
            .enumerate()
            .map(|(i, (param, arg))| {
                if arg.has_type(&param.data_type) {
                    Ok(arg.clone().retype_null(param.data_type))
                } else {
                    Err(argument_type(&self.name, i + 1, param.data_type, arg.type_name()))
                }
            })
            .collect()
    }

    fn run(
        &self,
        ctx: &mut ExecutionContext<'_>,
        args: Vec<Value>,
        sink: &mut RowSink<'_>,
    ) -> Result<(), ExecError> {
        for (param, value) in self.parameters.iter().zip(args) {
            ctx.allocate_variable(&param.name, value)?;
        }

        let mut checked = |row: Vec<Value>| -> Result<(), ExecError> {
            let row = self.check_row(row)?;
            sink(row)
        };
        let signal = ensure_sufficient_stack(|| compile::run_block(ctx, &self.body, &mut checked))?;
        match signal {
            ControlSignal::Normal | ControlSignal::Return => Ok(()),
            ControlSignal::Break | ControlSignal::Continue => {
                Err(internal(format!("loop control escaped action {}", self.name)))
            }
        }
    }

    /// Check a returned row against the declared result shape.
    fn check_row(&self, row: Vec<Value>) -> Result<Vec<Value>, ExecError> {
        let Some(returns) = &self.returns else {
            return Err(no_return_values(&self.name));
        };
        if row.len() != returns.fields.len() {
            return Err(return_arity(&self.name, returns.fields.len(), row.len()));
        }
        row.into_iter()
            .zip(&returns.fields)
            .map(|(value, field)| {
                if value.has_type(&field.data_type) {
                    Ok(value.retype_null(field.data_type))
                } else {
                    Err(type_mismatch(field.data_type, value.type_name()))
                }
            })
            .collect()
    }
}
