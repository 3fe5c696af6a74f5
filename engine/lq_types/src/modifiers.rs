//! Action declaration metadata.

use bitflags::bitflags;

use crate::NamedType;

bitflags! {
    /// Visibility and access modifiers declared on an action.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ActionModifiers: u8 {
        /// Callable directly by transaction senders, not only by other actions.
        const PUBLIC = 1 << 0;
        /// Never mutates state; callable under read-only transactions.
        const VIEW = 1 << 1;
        /// Only the database owner may call it.
        const OWNER = 1 << 2;
    }
}

impl ActionModifiers {
    #[inline]
    pub fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    #[inline]
    pub fn is_view(self) -> bool {
        self.contains(Self::VIEW)
    }

    #[inline]
    pub fn is_owner_only(self) -> bool {
        self.contains(Self::OWNER)
    }
}

/// The declared result shape of an action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionReturn {
    /// `RETURNS TABLE(...)` rather than a fixed tuple of values.
    pub is_table: bool,
    pub fields: Vec<NamedType>,
}

impl ActionReturn {
    pub fn values(fields: Vec<NamedType>) -> Self {
        ActionReturn {
            is_table: false,
            fields,
        }
    }

    pub fn table(fields: Vec<NamedType>) -> Self {
        ActionReturn {
            is_table: true,
            fields,
        }
    }
}

/// Whether the store transaction may write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    #[inline]
    pub fn is_read_write(self) -> bool {
        matches!(self, AccessMode::ReadWrite)
    }
}
