//! Roles and privileges.
//!
//! Two roles always exist: `owner`, which holds every privilege and belongs
//! to the database owner alone, and `default`, which every user holds
//! implicitly. Privileges are granted to roles either globally or on one
//! namespace; a global grant covers every namespace.

use std::collections::BTreeSet;

use lq_types::Privilege;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// Role of the database owner.
pub const OWNER_ROLE: &str = "owner";

/// Role every user holds.
pub const DEFAULT_ROLE: &str = "default";

/// Privileges the default role starts with.
const DEFAULT_PRIVILEGES: [Privilege; 2] = [Privilege::Select, Privilege::Call];

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("role {role} already exists")]
    RoleExists { role: String },
    #[error("role {role} does not exist")]
    UnknownRole { role: String },
    #[error("built-in role {role} cannot be modified this way")]
    BuiltInRole { role: String },
    #[error("user {user} already has role {role}")]
    RoleAlreadyGranted { role: String, user: String },
    #[error("user {user} does not have role {role}")]
    RoleNotGranted { role: String, user: String },
    #[error("privilege {privilege} cannot be granted on a namespace")]
    PrivilegeNotNamespaceable { privilege: Privilege },
    #[error("namespace {namespace} does not exist")]
    UnknownNamespace { namespace: String },
}

/// Decides who may do what.
///
/// Implementations must be deterministic: every validator holds the same
/// grants and must reach the same answer.
pub trait AccessController: Send + Sync {
    /// Whether `user` holds `privilege`, on `namespace` when given or
    /// globally otherwise.
    fn has_privilege(&self, user: &str, namespace: Option<&str>, privilege: Privilege) -> bool;

    fn is_owner(&self, user: &str) -> bool;

    fn create_role(&mut self, role: &str, if_not_exists: bool) -> Result<(), AccessError>;

    fn drop_role(&mut self, role: &str, if_exists: bool) -> Result<(), AccessError>;

    fn grant_privileges(
        &mut self,
        role: &str,
        privileges: &[Privilege],
        namespace: Option<&str>,
    ) -> Result<(), AccessError>;

    fn revoke_privileges(
        &mut self,
        role: &str,
        privileges: &[Privilege],
        namespace: Option<&str>,
    ) -> Result<(), AccessError>;

    fn grant_role(&mut self, role: &str, user: &str) -> Result<(), AccessError>;

    fn revoke_role(&mut self, role: &str, user: &str) -> Result<(), AccessError>;

    fn transfer_ownership(&mut self, to: &str);

    /// Make `namespace` available to namespaced grants.
    fn register_namespace(&mut self, namespace: &str);

    /// Forget `namespace` and every grant on it.
    fn unregister_namespace(&mut self, namespace: &str);

    /// Snapshot used to roll back a failed transaction.
    fn clone_box(&self) -> Box<dyn AccessController>;
}

impl Clone for Box<dyn AccessController> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Privileges held by one role.
#[derive(Clone, Debug, Default)]
struct Perms {
    global: BTreeSet<Privilege>,
    namespaced: FxHashMap<String, BTreeSet<Privilege>>,
}

impl Perms {
    fn all() -> Self {
        Perms {
            global: Privilege::ALL.into_iter().collect(),
            namespaced: FxHashMap::default(),
        }
    }

    fn has(&self, namespace: Option<&str>, privilege: Privilege) -> bool {
        if self.global.contains(&privilege) {
            return true;
        }
        namespace
            .and_then(|namespace| self.namespaced.get(namespace))
            .is_some_and(|privileges| privileges.contains(&privilege))
    }
}

/// In-process access controller. Grants live only as long as the value.
#[derive(Clone, Debug)]
pub struct MemoryAccessController {
    owner: Option<String>,
    roles: FxHashMap<String, Perms>,
    /// Roles granted to each user, besides `default`.
    users: FxHashMap<String, BTreeSet<String>>,
    namespaces: FxHashSet<String>,
}

impl MemoryAccessController {
    pub fn new(owner: Option<&str>) -> Self {
        let mut roles = FxHashMap::default();
        roles.insert(OWNER_ROLE.to_string(), Perms::all());
        roles.insert(
            DEFAULT_ROLE.to_string(),
            Perms {
                global: DEFAULT_PRIVILEGES.into_iter().collect(),
                namespaced: FxHashMap::default(),
            },
        );
        MemoryAccessController {
            owner: owner.map(str::to_string),
            roles,
            users: FxHashMap::default(),
            namespaces: FxHashSet::default(),
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Roles explicitly granted to `user`, sorted.
    pub fn roles_of(&self, user: &str) -> Vec<String> {
        self.users
            .get(user)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn role_mut(&mut self, role: &str) -> Result<&mut Perms, AccessError> {
        self.roles.get_mut(role).ok_or_else(|| AccessError::UnknownRole {
            role: role.to_string(),
        })
    }

    fn check_namespace(&self, namespace: Option<&str>, privileges: &[Privilege]) -> Result<(), AccessError> {
        let Some(namespace) = namespace else {
            return Ok(());
        };
        if let Some(&privilege) = privileges.iter().find(|p| !p.namespaceable()) {
            return Err(AccessError::PrivilegeNotNamespaceable { privilege });
        }
        if !self.namespaces.contains(namespace) {
            return Err(AccessError::UnknownNamespace {
                namespace: namespace.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MemoryAccessController {
    fn default() -> Self {
        MemoryAccessController::new(None)
    }
}

fn built_in(role: &str) -> bool {
    role == OWNER_ROLE || role == DEFAULT_ROLE
}

impl AccessController for MemoryAccessController {
    fn has_privilege(&self, user: &str, namespace: Option<&str>, privilege: Privilege) -> bool {
        if self.is_owner(user) {
            return true;
        }
        if self
            .roles
            .get(DEFAULT_ROLE)
            .is_some_and(|perms| perms.has(namespace, privilege))
        {
            return true;
        }
        self.users.get(user).is_some_and(|roles| {
            roles
                .iter()
                .filter_map(|role| self.roles.get(role))
                .any(|perms| perms.has(namespace, privilege))
        })
    }

    fn is_owner(&self, user: &str) -> bool {
        self.owner.as_deref() == Some(user)
    }

    fn create_role(&mut self, role: &str, if_not_exists: bool) -> Result<(), AccessError> {
        let role = role.to_ascii_lowercase();
        if built_in(&role) {
            return Err(AccessError::BuiltInRole { role });
        }
        if self.roles.contains_key(&role) {
            return if if_not_exists {
                Ok(())
            } else {
                Err(AccessError::RoleExists { role })
            };
        }
        debug!(%role, "create role");
        self.roles.insert(role, Perms::default());
        Ok(())
    }

    fn drop_role(&mut self, role: &str, if_exists: bool) -> Result<(), AccessError> {
        let role = role.to_ascii_lowercase();
        if built_in(&role) {
            return Err(AccessError::BuiltInRole { role });
        }
        if self.roles.remove(&role).is_none() {
            return if if_exists {
                Ok(())
            } else {
                Err(AccessError::UnknownRole { role })
            };
        }
        debug!(%role, "drop role");
        for roles in self.users.values_mut() {
            roles.remove(&role);
        }
        Ok(())
    }

    fn grant_privileges(
        &mut self,
        role: &str,
        privileges: &[Privilege],
        namespace: Option<&str>,
    ) -> Result<(), AccessError> {
        let role = role.to_ascii_lowercase();
        if role == OWNER_ROLE {
            return Err(AccessError::BuiltInRole { role });
        }
        self.check_namespace(namespace, privileges)?;
        let perms = self.role_mut(&role)?;
        match namespace {
            Some(namespace) => perms
                .namespaced
                .entry(namespace.to_string())
                .or_default()
                .extend(privileges.iter().copied()),
            None => perms.global.extend(privileges.iter().copied()),
        }
        Ok(())
    }

    fn revoke_privileges(
        &mut self,
        role: &str,
        privileges: &[Privilege],
        namespace: Option<&str>,
    ) -> Result<(), AccessError> {
        let role = role.to_ascii_lowercase();
        if role == OWNER_ROLE {
            return Err(AccessError::BuiltInRole { role });
        }
        self.check_namespace(namespace, privileges)?;
        let perms = self.role_mut(&role)?;
        match namespace {
            Some(namespace) => {
                if let Some(held) = perms.namespaced.get_mut(namespace) {
                    for privilege in privileges {
                        held.remove(privilege);
                    }
                }
            }
            // A global revoke also clears the privilege from every namespace.
            None => {
                for privilege in privileges {
                    perms.global.remove(privilege);
                    for held in perms.namespaced.values_mut() {
                        held.remove(privilege);
                    }
                }
            }
        }
        Ok(())
    }

    fn grant_role(&mut self, role: &str, user: &str) -> Result<(), AccessError> {
        let role = role.to_ascii_lowercase();
        if built_in(&role) {
            return Err(AccessError::BuiltInRole { role });
        }
        if !self.roles.contains_key(&role) {
            return Err(AccessError::UnknownRole { role });
        }
        let granted = self.users.entry(user.to_string()).or_default();
        if !granted.insert(role.clone()) {
            return Err(AccessError::RoleAlreadyGranted {
                role,
                user: user.to_string(),
            });
        }
        Ok(())
    }

    fn revoke_role(&mut self, role: &str, user: &str) -> Result<(), AccessError> {
        let role = role.to_ascii_lowercase();
        if built_in(&role) {
            return Err(AccessError::BuiltInRole { role });
        }
        if !self.roles.contains_key(&role) {
            return Err(AccessError::UnknownRole { role });
        }
        let removed = self
            .users
            .get_mut(user)
            .is_some_and(|granted| granted.remove(&role));
        if !removed {
            return Err(AccessError::RoleNotGranted {
                role,
                user: user.to_string(),
            });
        }
        Ok(())
    }

    fn transfer_ownership(&mut self, to: &str) {
        debug!(to, "transfer ownership");
        self.owner = Some(to.to_string());
    }

    fn register_namespace(&mut self, namespace: &str) {
        self.namespaces.insert(namespace.to_string());
    }

    fn unregister_namespace(&mut self, namespace: &str) {
        self.namespaces.remove(namespace);
        for perms in self.roles.values_mut() {
            perms.namespaced.remove(namespace);
        }
    }

    fn clone_box(&self) -> Box<dyn AccessController> {
        Box::new(self.clone())
    }
}
