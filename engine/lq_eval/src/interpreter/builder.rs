//! `InterpreterBuilder` for creating [`Interpreter`] instances.

use lq_ast::Parser;
use lq_sql::{CatalogPlanner, Planner};
use parking_lot::RwLock;
use tracing::debug;

use super::{Interpreter, State};
use crate::access::{AccessController, MemoryAccessController};
use crate::namespace::Namespaces;

/// Settings fixed for the life of an interpreter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Nested action calls allowed before a call fails.
    pub max_call_depth: usize,
    /// Namespace used when a statement or call names none. Always exists and
    /// cannot be dropped.
    pub default_namespace: String,
    /// Database owner, for the default access controller.
    pub owner: Option<String>,
    /// Install built-in functions into every namespace.
    pub builtins: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            max_call_depth: 500,
            default_namespace: "main".to_string(),
            owner: None,
            builtins: true,
        }
    }
}

/// Builder for [`Interpreter`].
///
/// Without a parser, only pre-parsed statements and calls can run. The
/// planner defaults to [`CatalogPlanner`] and the access controller to a
/// [`MemoryAccessController`] owned by [`owner`](Self::owner).
pub struct InterpreterBuilder {
    config: InterpreterConfig,
    parser: Option<Box<dyn Parser>>,
    planner: Box<dyn Planner>,
    access: Option<Box<dyn AccessController>>,
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        InterpreterBuilder::new()
    }
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        InterpreterBuilder {
            config: InterpreterConfig::default(),
            parser: None,
            planner: Box::new(CatalogPlanner),
            access: None,
        }
    }

    #[must_use]
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.config.max_call_depth = depth;
        self
    }

    /// Lowercased.
    #[must_use]
    pub fn default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.default_namespace = namespace.into().to_ascii_lowercase();
        self
    }

    /// Ignored when an access controller is supplied.
    #[must_use]
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.config.owner = Some(owner.into());
        self
    }

    #[must_use]
    pub fn builtins(mut self, enabled: bool) -> Self {
        self.config.builtins = enabled;
        self
    }

    #[must_use]
    pub fn parser(mut self, parser: impl Parser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    #[must_use]
    pub fn planner(mut self, planner: impl Planner + 'static) -> Self {
        self.planner = Box::new(planner);
        self
    }

    #[must_use]
    pub fn access_controller(mut self, access: impl AccessController + 'static) -> Self {
        self.access = Some(Box::new(access));
        self
    }

    pub fn build(self) -> Interpreter {
        let config = self.config;
        let mut access = self
            .access
            .unwrap_or_else(|| Box::new(MemoryAccessController::new(config.owner.as_deref())));
        let mut namespaces = Namespaces::new(config.builtins);
        namespaces.ensure(&config.default_namespace);
        access.register_namespace(&config.default_namespace);
        debug!(
            default_namespace = %config.default_namespace,
            max_call_depth = config.max_call_depth,
            builtins = config.builtins,
            "interpreter ready"
        );

        Interpreter {
            config,
            parser: self.parser,
            planner: self.planner,
            state: RwLock::new(State { namespaces, access }),
        }
    }
}
