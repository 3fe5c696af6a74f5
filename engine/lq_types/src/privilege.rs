//! Privileges checked by the access controller.

use std::fmt;

/// A privilege a role may hold, globally or on one namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Privilege {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Roles,
    Call,
    Use,
}

impl Privilege {
    pub const ALL: [Privilege; 9] = [
        Privilege::Select,
        Privilege::Insert,
        Privilege::Update,
        Privilege::Delete,
        Privilege::Create,
        Privilege::Drop,
        Privilege::Roles,
        Privilege::Call,
        Privilege::Use,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Privilege::Select => "SELECT",
            Privilege::Insert => "INSERT",
            Privilege::Update => "UPDATE",
            Privilege::Delete => "DELETE",
            Privilege::Create => "CREATE",
            Privilege::Drop => "DROP",
            Privilege::Roles => "ROLES",
            Privilege::Call => "CALL",
            Privilege::Use => "USE",
        }
    }

    /// Whether the privilege can be scoped to a single namespace.
    ///
    /// `ROLES` and `USE` are database-wide.
    pub fn namespaceable(self) -> bool {
        !matches!(self, Privilege::Roles | Privilege::Use)
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
