//! Core org-authz implementation.
//!
//! This module contains the central [`OrgAuthz`] struct, which validates
//! requests coming from the adapter layer and turns them into calls on a
//! backing [`Storage`].
//!
//! # Architecture
//!
//! - **Grants**: per-subject, per-object-type permission bitmasks
//!   (`set_org_perm`, `delete_org_perm`, `get_org_perms`, `check_org_perm`)
//! - **Role membership**: expansion of system roles into members
//!   (see the `membership` module)
//! - **Directory search**: scoped, per-kind paginated search
//!   (see the `search` module)
//!
//! Every validation runs before the store is touched, and each write
//! operation issues a single store call.
//!
//! # Thread Safety
//!
//! All operations take `&self` and keep no state between calls, so one
//! instance can be shared across threads behind an `Arc`.

#[cfg(feature = "audit")]
use log::{info, warn};

use crate::{
    error::{Error, Result},
    grant::{OrgPerm, OrgPermRequest},
    object::OrgType,
    permission,
    storage::{MemoryStorage, Storage},
    subject::Subject,
};
use chrono::Utc;
use std::collections::BTreeSet;

/// Configuration for the org-authz core.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct OrgAuthzConfig {
    /// Page size used when a search does not give a limit.
    pub default_limit: i64,
    /// Largest page size a search may ask for.
    pub max_limit: i64,
    /// Whether to emit audit log records.
    pub enable_audit: bool,
}

impl Default for OrgAuthzConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 1000,
            enable_audit: true,
        }
    }
}

impl OrgAuthzConfig {
    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_limit < 1 {
            return Err(Error::InvalidConfiguration(format!(
                "max_limit must be positive, got {}",
                self.max_limit
            )));
        }
        if self.default_limit < 1 || self.default_limit > self.max_limit {
            return Err(Error::InvalidConfiguration(format!(
                "default_limit must be between 1 and max_limit ({}), got {}",
                self.max_limit, self.default_limit
            )));
        }
        Ok(())
    }

    /// Load a configuration from JSON; absent fields keep their defaults.
    #[cfg(feature = "persistence")]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Access-control and directory-resolution core.
pub struct OrgAuthz<S = MemoryStorage>
where
    S: Storage,
{
    storage: S,
    config: OrgAuthzConfig,
}

impl OrgAuthz<MemoryStorage> {
    /// Create a core with default configuration and memory storage.
    pub fn new() -> Self {
        Self {
            storage: MemoryStorage::new(),
            config: OrgAuthzConfig::default(),
        }
    }
}

impl Default for OrgAuthz<MemoryStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> OrgAuthz<S>
where
    S: Storage,
{
    /// Create a core over a custom store.
    pub fn with_storage(storage: S, config: OrgAuthzConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { storage, config })
    }

    /// The backing store.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The active configuration.
    pub fn config(&self) -> &OrgAuthzConfig {
        &self.config
    }

    /// Set a subject's permissions on one or more object types.
    ///
    /// `url_objects` are the object type tokens named in the request path and
    /// must be unique; `grants` are the body records. Both must name exactly
    /// the same object types. Each grant replaces whatever the subject held on
    /// that object type, and all grants are written in one store call.
    /// Expiry is always cleared: grants written here never expire.
    pub fn set_org_perm<T>(
        &self,
        subject_id: &str,
        subject_type: &str,
        url_objects: &[T],
        grants: &[OrgPermRequest],
    ) -> Result<Vec<OrgPerm>>
    where
        T: AsRef<str>,
    {
        let (subject, rows) = self
            .validate_set(subject_id, subject_type, url_objects, grants)
            .inspect_err(|err| self.audit_rejected("set", subject_id, err))?;

        self.storage.set_org_perms(&subject, rows.clone())?;

        #[cfg(feature = "audit")]
        if self.config.enable_audit {
            let objects: Vec<&str> = rows.iter().map(|row| row.object.as_str()).collect();
            info!("Org permissions set for '{subject}' on [{}]", objects.join(","));
        }

        Ok(rows)
    }

    /// Remove a subject's grants on the given object types.
    ///
    /// Unlike [`OrgAuthz::set_org_perm`], repeated object types are accepted;
    /// removing an object twice has the same effect as removing it once.
    pub fn delete_org_perm<T>(&self, subject_id: &str, subject_type: &str, objects: &[T]) -> Result<()>
    where
        T: AsRef<str>,
    {
        let (subject, objects) = self
            .validate_delete(subject_id, subject_type, objects)
            .inspect_err(|err| self.audit_rejected("delete", subject_id, err))?;

        self.storage.delete_org_perms(&subject, &objects)?;

        #[cfg(feature = "audit")]
        if self.config.enable_audit {
            let objects: Vec<&str> = objects.iter().map(OrgType::as_str).collect();
            info!("Org permissions deleted for '{subject}' on [{}]", objects.join(","));
        }

        Ok(())
    }

    /// Get a subject's grants that are still in force.
    ///
    /// When `objects` is empty every object type is returned. Results are
    /// ordered by object type.
    pub fn get_org_perms<T>(&self, subject_id: &str, subject_type: &str, objects: &[T]) -> Result<Vec<OrgPerm>>
    where
        T: AsRef<str>,
    {
        let subject = Subject::from_token(subject_id, subject_type)?;
        let wanted = objects
            .iter()
            .map(|token| OrgType::parse(token.as_ref()))
            .collect::<Result<BTreeSet<_>>>()?;

        let now = Utc::now();
        let mut perms: Vec<OrgPerm> = self
            .storage
            .get_org_perms(&subject)?
            .into_iter()
            .filter(|perm| wanted.is_empty() || wanted.contains(&perm.object))
            .filter(|perm| perm.is_active_at(now))
            .collect();
        perms.sort_by_key(|perm| perm.object);
        Ok(perms)
    }

    /// Check whether a subject currently holds a capability on an object type.
    pub fn check_org_perm(
        &self,
        subject_id: &str,
        subject_type: &str,
        object: &str,
        permission_name: &str,
    ) -> Result<bool> {
        let object = OrgType::parse(object)?;
        // Reject unknown names even when the subject holds nothing.
        permission::encode([permission_name])?;

        let perms = self.get_org_perms(subject_id, subject_type, &[object.as_str()])?;
        for perm in perms {
            if perm.value.contains_name(permission_name)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // Internal implementation

    fn validate_set<T>(
        &self,
        subject_id: &str,
        subject_type: &str,
        url_objects: &[T],
        grants: &[OrgPermRequest],
    ) -> Result<(Subject, Vec<OrgPerm>)>
    where
        T: AsRef<str>,
    {
        let subject = Subject::from_token(subject_id, subject_type)?;

        let mut url_set = BTreeSet::new();
        for token in url_objects {
            let token = token.as_ref();
            let object = OrgType::parse(token)?;
            if !url_set.insert(object) {
                return Err(Error::NotUnique {
                    field: "object type in path".to_string(),
                    value: token.to_string(),
                });
            }
        }

        let mut body_set = BTreeSet::new();
        for grant in grants {
            let object = OrgType::parse(&grant.object)?;
            if !body_set.insert(object) {
                return Err(Error::NotUnique {
                    field: "object type in body".to_string(),
                    value: grant.object.clone(),
                });
            }
        }

        if let Some(missing) = url_set.difference(&body_set).next() {
            return Err(Error::ConsistencyViolation(format!(
                "object type '{missing}' is in the path but not in the body"
            )));
        }
        if let Some(extra) = body_set.difference(&url_set).next() {
            return Err(Error::ConsistencyViolation(format!(
                "object type '{extra}' is in the body but not in the path"
            )));
        }

        let rows = grants
            .iter()
            .map(|grant| {
                let object = OrgType::parse(&grant.object)?;
                let value = permission::encode(&grant.perms)?;
                Ok(OrgPerm::new(&subject, object, value))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((subject, rows))
    }

    fn validate_delete<T>(
        &self,
        subject_id: &str,
        subject_type: &str,
        objects: &[T],
    ) -> Result<(Subject, Vec<OrgType>)>
    where
        T: AsRef<str>,
    {
        let subject = Subject::from_token(subject_id, subject_type)?;
        let mut resolved = Vec::with_capacity(objects.len());
        for token in objects {
            let object = OrgType::parse(token.as_ref())?;
            if !resolved.contains(&object) {
                resolved.push(object);
            }
        }
        Ok((subject, resolved))
    }

    fn audit_rejected(&self, _operation: &str, _subject_id: &str, _err: &Error) {
        #[cfg(feature = "audit")]
        if self.config.enable_audit {
            warn!("Org permission {_operation} for subject '{_subject_id}' rejected: {_err}");
        }
    }
}
