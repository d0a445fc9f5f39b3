//! Role membership resolution.

#[cfg(feature = "audit")]
use log::debug;

use crate::{
    core::OrgAuthz,
    error::Result,
    role::{Role, RoleMember, RoleMembers},
    storage::Storage,
};

/// Resolve role tokens, dropping repeats while keeping first-seen order.
///
/// Fails on the first unknown token.
pub fn dedup_roles<T>(tokens: &[T]) -> Result<Vec<Role>>
where
    T: AsRef<str>,
{
    let mut roles = Vec::with_capacity(tokens.len());
    for token in tokens {
        let role = Role::parse(token.as_ref())?;
        if !roles.contains(&role) {
            roles.push(role);
        }
    }
    Ok(roles)
}

impl<S> OrgAuthz<S>
where
    S: Storage,
{
    /// Expand role tokens into their members.
    ///
    /// The result holds one entry per distinct role, in the order the roles
    /// were first named. A role without members yields an empty member list.
    /// Membership is looked up on every call.
    pub fn get_members_by_roles<T>(&self, role_tokens: &[T]) -> Result<Vec<RoleMembers>>
    where
        T: AsRef<str>,
    {
        let roles = dedup_roles(role_tokens)?;
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let mut found = self.storage().members_of_roles(&roles)?;

        let resolved: Vec<RoleMembers> = roles
            .into_iter()
            .map(|role| RoleMembers {
                role,
                members: found
                    .remove(&role)
                    .unwrap_or_default()
                    .into_iter()
                    .map(RoleMember::user)
                    .collect(),
            })
            .collect();

        #[cfg(feature = "audit")]
        if self.config().enable_audit {
            for entry in &resolved {
                debug!("Role '{}' resolved to {} members", entry.role, entry.members.len());
            }
        }

        Ok(resolved)
    }
}
