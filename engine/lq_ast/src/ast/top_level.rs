//! Statements a transaction can run directly.

use lq_types::Privilege;

use crate::action::ActionDef;

use super::sql::SqlStatement;

/// A top-level statement with its optional `{namespace}` prefix.
///
/// The prefix sets the namespace unqualified names resolve in.
#[derive(Clone, Debug, PartialEq)]
pub struct TopLevelStatement {
    pub namespace: Option<String>,
    pub kind: TopLevelKind,
}

impl TopLevelStatement {
    pub fn new(kind: TopLevelKind) -> Self {
        TopLevelStatement {
            namespace: None,
            kind,
        }
    }

    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl From<TopLevelKind> for TopLevelStatement {
    fn from(kind: TopLevelKind) -> Self {
        TopLevelStatement::new(kind)
    }
}

impl From<SqlStatement> for TopLevelStatement {
    fn from(statement: SqlStatement) -> Self {
        TopLevelStatement::new(TopLevelKind::Sql(statement))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TopLevelKind {
    Sql(SqlStatement),
    CreateAction {
        action: ActionDef,
        or_replace: bool,
        if_not_exists: bool,
    },
    DropAction {
        name: String,
        if_exists: bool,
    },
    CreateNamespace {
        name: String,
        if_not_exists: bool,
    },
    DropNamespace {
        name: String,
        if_exists: bool,
    },
    CreateRole {
        name: String,
        if_not_exists: bool,
    },
    DropRole {
        name: String,
        if_exists: bool,
    },
    /// `GRANT|REVOKE privileges [ON namespace] TO role`
    GrantPrivileges {
        grant: bool,
        privileges: Vec<Privilege>,
        namespace: Option<String>,
        role: String,
    },
    /// `GRANT|REVOKE role TO user`
    GrantRole {
        grant: bool,
        role: String,
        user: String,
    },
    TransferOwnership {
        to: String,
    },
}

impl TopLevelKind {
    /// Whether the statement changes state (catalog, roles or tables).
    pub fn mutates(&self) -> bool {
        match self {
            TopLevelKind::Sql(sql) => sql.mutates(),
            _ => true,
        }
    }

    /// Short statement name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            TopLevelKind::Sql(SqlStatement::Select(_)) => "SELECT",
            TopLevelKind::Sql(SqlStatement::Insert(_)) => "INSERT",
            TopLevelKind::Sql(SqlStatement::Update(_)) => "UPDATE",
            TopLevelKind::Sql(SqlStatement::Delete(_)) => "DELETE",
            TopLevelKind::Sql(SqlStatement::CreateTable(_)) => "CREATE TABLE",
            TopLevelKind::Sql(SqlStatement::DropTable(_)) => "DROP TABLE",
            TopLevelKind::CreateAction { .. } => "CREATE ACTION",
            TopLevelKind::DropAction { .. } => "DROP ACTION",
            TopLevelKind::CreateNamespace { .. } => "CREATE NAMESPACE",
            TopLevelKind::DropNamespace { .. } => "DROP NAMESPACE",
            TopLevelKind::CreateRole { .. } => "CREATE ROLE",
            TopLevelKind::DropRole { .. } => "DROP ROLE",
            TopLevelKind::GrantPrivileges { grant: true, .. }
            | TopLevelKind::GrantRole { grant: true, .. } => "GRANT",
            TopLevelKind::GrantPrivileges { grant: false, .. }
            | TopLevelKind::GrantRole { grant: false, .. } => "REVOKE",
            TopLevelKind::TransferOwnership { .. } => "TRANSFER OWNERSHIP",
        }
    }
}
