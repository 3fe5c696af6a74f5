//! Parsed action definitions.

use lq_types::{ActionModifiers, ActionReturn, DataType, NamedType};

use crate::ast::ActionStmt;

/// `CREATE ACTION name($a type, ...) modifiers [RETURNS ...] { body }`
#[derive(Clone, Debug, PartialEq)]
pub struct ActionDef {
    pub name: String,
    pub parameters: Vec<NamedType>,
    pub modifiers: ActionModifiers,
    pub returns: Option<ActionReturn>,
    pub body: Vec<ActionStmt>,
}

impl ActionDef {
    /// A private, mutating action with no parameters and no return.
    pub fn new(name: impl Into<String>) -> Self {
        ActionDef {
            name: name.into(),
            parameters: Vec::new(),
            modifiers: ActionModifiers::empty(),
            returns: None,
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.parameters.push(NamedType::new(name, data_type));
        self
    }

    #[must_use]
    pub fn modifiers(mut self, modifiers: ActionModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub fn returns(mut self, returns: ActionReturn) -> Self {
        self.returns = Some(returns);
        self
    }

    #[must_use]
    pub fn body(mut self, body: Vec<ActionStmt>) -> Self {
        self.body = body;
        self
    }
}
