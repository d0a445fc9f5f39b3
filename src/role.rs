//! System roles and role membership records.

use crate::{
    error::{Error, Result},
    object::OrgType,
    registry::{Registry, TokenRegistry},
};
use std::sync::LazyLock;

/// A fixed system-defined administrative role.
///
/// The set is closed; roles are never created at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Role {
    SuperAdmin,
    SysAdmin,
    AuditAdmin,
    SecAdmin,
    OrgManager,
    OrgAudit,
}

static ROLE_TOKENS: &[(&str, Role)] = &[
    ("super_admin", Role::SuperAdmin),
    ("sys_admin", Role::SysAdmin),
    ("audit_admin", Role::AuditAdmin),
    ("sec_admin", Role::SecAdmin),
    ("org_manager", Role::OrgManager),
    ("org_audit", Role::OrgAudit),
];

static ROLES: LazyLock<Registry<Role>> = LazyLock::new(|| Registry::new(ROLE_TOKENS));

impl Role {
    /// The shared role registry.
    pub fn registry() -> &'static Registry<Role> {
        &ROLES
    }

    /// Resolve a role token, returning `None` when it is unknown.
    pub fn from_token(token: &str) -> Option<Self> {
        ROLES.resolve_token(token)
    }

    /// Resolve a role token, failing with `InvalidRole`.
    pub fn parse(token: &str) -> Result<Self> {
        Self::from_token(token).ok_or_else(|| Error::InvalidRole(token.to_string()))
    }

    /// Get the external token of the role.
    pub fn as_str(&self) -> &'static str {
        ROLES.token_for(*self)
    }

    /// Whether a search under this role covers the whole organization tree
    /// rather than only the departments the visitor manages.
    pub fn sees_whole_tree(&self) -> bool {
        match self {
            Role::SuperAdmin | Role::SysAdmin | Role::AuditAdmin | Role::SecAdmin => true,
            Role::OrgManager | Role::OrgAudit => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// One member of a role.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct RoleMember {
    /// Identity of the member.
    pub id: String,
    /// Kind of the member; always [`OrgType::User`] for now.
    #[cfg_attr(feature = "persistence", serde(rename = "type"))]
    pub member_type: OrgType,
}

impl RoleMember {
    /// Create a user member.
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            member_type: OrgType::User,
        }
    }
}

/// The resolved members of one role.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct RoleMembers {
    pub role: Role,
    pub members: Vec<RoleMember>,
}

impl RoleMembers {
    /// Member ids in order.
    pub fn member_ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|member| member.id.as_str())
    }
}
