//! Error types for the interpreter.
//!
//! [`ExecErrorKind`] is the structured category; [`ExecError`] pairs it with
//! the action call trace captured where the error surfaced. Errors from the
//! lower crates convert with `?` and keep their original kind as a wrapped
//! variant.
//!
//! Factory functions build the common kinds so that call sites stay short and
//! messages stay consistent.

use std::fmt;

use lq_ast::ParseError;
use lq_sql::{PlanError, StoreError};
use lq_types::Privilege;
use lq_value::ValueError;

use crate::access::AccessError;

/// Result of interpreter operations.
pub type ExecResult<T> = Result<T, ExecError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ExecErrorKind {
    // Values
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },
    #[error("{what} must be {expected}, got {got}")]
    InvalidOperand {
        what: &'static str,
        expected: &'static str,
        got: String,
    },

    // Scoping
    #[error("unknown variable {name}")]
    UnknownVariable { name: String },
    #[error("variable {name} is already declared in this block")]
    DuplicateVariable { name: String },
    #[error("invalid variable {name}")]
    InvalidVariable { name: String },
    #[error("variable {name} is read-only")]
    ReadOnlyVariable { name: String },
    #[error("record has no field {field}")]
    UnknownField { field: String },

    // Calls
    #[error("namespace {namespace} does not exist")]
    UnknownNamespace { namespace: String },
    #[error("namespace {namespace} already exists")]
    NamespaceExists { namespace: String },
    #[error("the default namespace {namespace} cannot be dropped")]
    CannotDropDefaultNamespace { namespace: String },
    #[error("unknown action {name} in namespace {namespace}")]
    UnknownAction { namespace: String, name: String },
    #[error("action {name} already exists in namespace {namespace}")]
    ActionExists { namespace: String, name: String },
    #[error("{name} expects {expected} arguments, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("argument {position} of {name} must be {expected}, got {got}")]
    ArgumentType {
        name: String,
        position: usize,
        expected: String,
        got: String,
    },
    #[error("{name} does not return values")]
    NoReturnValues { name: String },
    #[error("{name} returns {got} values, expected {expected}")]
    ReturnArity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("expected {name} to return a single row, got {got}")]
    RowCount { name: String, got: usize },
    #[error("maximum call depth exceeded (limit: {depth})")]
    CallDepthExceeded { depth: usize },

    // Access
    #[error("action {name} may modify state and needs a read-write transaction")]
    ActionMutatesState { name: String },
    #[error("action {name} can only be called by the owner")]
    ActionOwnerOnly { name: String },
    #[error("action {name} is private")]
    ActionPrivate { name: String },
    #[error("{statement} modifies state and needs a read-write transaction")]
    StatementMutatesState { statement: &'static str },
    #[error("caller lacks the {privilege} privilege{}", on_namespace(.namespace.as_deref()))]
    PermissionDenied {
        privilege: Privilege,
        namespace: Option<String>,
    },
    #[error("built-in function {name} cannot be called directly")]
    CannotCallBuiltin { name: String },
    #[error("only the owner may {operation}")]
    OwnerOnly { operation: &'static str },
    #[error(transparent)]
    Access(#[from] AccessError),

    // Collaborators
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Plan(PlanError),
    #[error(transparent)]
    Store(#[from] StoreError),

    // User and internal
    #[error("{message}")]
    Raised { message: String },
    #[error("internal bug: {message}")]
    Internal { message: String },
}

fn on_namespace(namespace: Option<&str>) -> String {
    namespace.map_or_else(String::new, |ns| format!(" on namespace {ns}"))
}

/// Actions that were executing when an error surfaced, innermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallTrace {
    frames: Vec<String>,
}

impl CallTrace {
    pub fn new(frames: Vec<String>) -> Self {
        CallTrace { frames }
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl fmt::Display for CallTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        f.write_str(" (in ")?;
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                f.write_str(" <- ")?;
            }
            f.write_str(frame)?;
        }
        f.write_str(")")
    }
}

/// An interpreter error.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{kind}{trace}")]
pub struct ExecError {
    pub kind: ExecErrorKind,
    pub trace: CallTrace,
}

impl ExecError {
    #[cold]
    pub fn new(kind: ExecErrorKind) -> Self {
        ExecError {
            kind,
            trace: CallTrace::default(),
        }
    }

    /// Attach a call trace unless one is already present.
    #[must_use]
    pub fn with_trace(mut self, trace: CallTrace) -> Self {
        if self.trace.is_empty() {
            self.trace = trace;
        }
        self
    }

    /// Whether this is an internal invariant violation rather than a user
    /// error.
    pub fn is_internal(&self) -> bool {
        matches!(self.kind, ExecErrorKind::Internal { .. })
    }
}

impl From<ExecErrorKind> for ExecError {
    #[cold]
    fn from(kind: ExecErrorKind) -> Self {
        ExecError::new(kind)
    }
}

impl From<ValueError> for ExecError {
    #[cold]
    fn from(err: ValueError) -> Self {
        ExecError::new(ExecErrorKind::Value(err))
    }
}

impl From<PlanError> for ExecError {
    #[cold]
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::MutatesState { statement } => statement_mutates_state(statement),
            other => ExecError::new(ExecErrorKind::Plan(other)),
        }
    }
}

impl From<StoreError> for ExecError {
    #[cold]
    fn from(err: StoreError) -> Self {
        ExecError::new(ExecErrorKind::Store(err))
    }
}

impl From<ParseError> for ExecError {
    #[cold]
    fn from(err: ParseError) -> Self {
        ExecError::new(ExecErrorKind::Parse(err))
    }
}

impl From<AccessError> for ExecError {
    #[cold]
    fn from(err: AccessError) -> Self {
        ExecError::new(ExecErrorKind::Access(err))
    }
}

// Values

#[cold]
pub fn type_mismatch(expected: impl ToString, got: impl ToString) -> ExecError {
    ExecErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    }
    .into()
}

#[cold]
pub fn invalid_operand(what: &'static str, expected: &'static str, got: impl ToString) -> ExecError {
    ExecErrorKind::InvalidOperand {
        what,
        expected,
        got: got.to_string(),
    }
    .into()
}

// Scoping

#[cold]
pub fn unknown_variable(name: &str) -> ExecError {
    ExecErrorKind::UnknownVariable {
        name: name.to_string(),
    }
    .into()
}

#[cold]
pub fn duplicate_variable(name: &str) -> ExecError {
    ExecErrorKind::DuplicateVariable {
        name: name.to_string(),
    }
    .into()
}

#[cold]
pub fn invalid_variable(name: &str) -> ExecError {
    ExecErrorKind::InvalidVariable {
        name: name.to_string(),
    }
    .into()
}

#[cold]
pub fn read_only_variable(name: &str) -> ExecError {
    ExecErrorKind::ReadOnlyVariable {
        name: name.to_string(),
    }
    .into()
}

#[cold]
pub fn unknown_field(field: &str) -> ExecError {
    ExecErrorKind::UnknownField {
        field: field.to_string(),
    }
    .into()
}

// Calls

#[cold]
pub fn unknown_namespace(namespace: &str) -> ExecError {
    ExecErrorKind::UnknownNamespace {
        namespace: namespace.to_string(),
    }
    .into()
}

#[cold]
pub fn namespace_exists(namespace: &str) -> ExecError {
    ExecErrorKind::NamespaceExists {
        namespace: namespace.to_string(),
    }
    .into()
}

#[cold]
pub fn cannot_drop_default_namespace(namespace: &str) -> ExecError {
    ExecErrorKind::CannotDropDefaultNamespace {
        namespace: namespace.to_string(),
    }
    .into()
}

#[cold]
pub fn action_exists(namespace: &str, name: &str) -> ExecError {
    ExecErrorKind::ActionExists {
        namespace: namespace.to_string(),
        name: name.to_string(),
    }
    .into()
}

#[cold]
pub fn unknown_action(namespace: &str, name: &str) -> ExecError {
    ExecErrorKind::UnknownAction {
        namespace: namespace.to_string(),
        name: name.to_string(),
    }
    .into()
}

#[cold]
pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> ExecError {
    ExecErrorKind::ArityMismatch {
        name: name.to_string(),
        expected,
        got,
    }
    .into()
}

#[cold]
pub fn argument_type(name: &str, position: usize, expected: impl ToString, got: impl ToString) -> ExecError {
    ExecErrorKind::ArgumentType {
        name: name.to_string(),
        position,
        expected: expected.to_string(),
        got: got.to_string(),
    }
    .into()
}

#[cold]
pub fn no_return_values(name: &str) -> ExecError {
    ExecErrorKind::NoReturnValues {
        name: name.to_string(),
    }
    .into()
}

#[cold]
pub fn return_arity(name: &str, expected: usize, got: usize) -> ExecError {
    ExecErrorKind::ReturnArity {
        name: name.to_string(),
        expected,
        got,
    }
    .into()
}

#[cold]
pub fn row_count(name: &str, got: usize) -> ExecError {
    ExecErrorKind::RowCount {
        name: name.to_string(),
        got,
    }
    .into()
}

#[cold]
pub fn call_depth_exceeded(depth: usize) -> ExecError {
    ExecErrorKind::CallDepthExceeded { depth }.into()
}

// Access

#[cold]
pub fn action_mutates_state(name: &str) -> ExecError {
    ExecErrorKind::ActionMutatesState {
        name: name.to_string(),
    }
    .into()
}

#[cold]
pub fn action_owner_only(name: &str) -> ExecError {
    ExecErrorKind::ActionOwnerOnly {
        name: name.to_string(),
    }
    .into()
}

#[cold]
pub fn action_private(name: &str) -> ExecError {
    ExecErrorKind::ActionPrivate {
        name: name.to_string(),
    }
    .into()
}

#[cold]
pub fn statement_mutates_state(statement: &'static str) -> ExecError {
    ExecErrorKind::StatementMutatesState { statement }.into()
}

#[cold]
pub fn permission_denied(privilege: Privilege, namespace: Option<&str>) -> ExecError {
    ExecErrorKind::PermissionDenied {
        privilege,
        namespace: namespace.map(str::to_string),
    }
    .into()
}

#[cold]
pub fn cannot_call_builtin(name: &str) -> ExecError {
    ExecErrorKind::CannotCallBuiltin {
        name: name.to_string(),
    }
    .into()
}

#[cold]
pub fn owner_only(operation: &'static str) -> ExecError {
    ExecErrorKind::OwnerOnly { operation }.into()
}

// User and internal

#[cold]
pub fn raised(message: impl Into<String>) -> ExecError {
    ExecErrorKind::Raised {
        message: message.into(),
    }
    .into()
}

#[cold]
pub fn internal(message: impl Into<String>) -> ExecError {
    ExecErrorKind::Internal {
        message: message.into(),
    }
    .into()
}
