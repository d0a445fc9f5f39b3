//! Async support for org-authz (requires 'async' feature).
//!
//! The core is synchronous and stateless between calls, so the async wrapper
//! shares it behind an `Arc` and runs each operation on tokio's blocking
//! pool. Store implementations are free to block.

use crate::{
    core::{OrgAuthz, OrgAuthzConfig},
    error::{Error, Result},
    grant::{OrgPerm, OrgPermRequest},
    role::RoleMembers,
    search::{SearchRequest, SearchResult},
    storage::Storage,
    subject::Subject,
};
use std::sync::Arc;

/// Async wrapper around [`OrgAuthz`] for non-blocking callers.
pub struct AsyncOrgAuthz<S>
where
    S: Storage + 'static,
{
    inner: Arc<OrgAuthz<S>>,
}

impl<S> Clone for AsyncOrgAuthz<S>
where
    S: Storage + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> AsyncOrgAuthz<S>
where
    S: Storage + 'static,
{
    /// Wrap an existing core.
    pub fn new(authz: OrgAuthz<S>) -> Self {
        Self {
            inner: Arc::new(authz),
        }
    }

    /// Build a core over `storage` and wrap it.
    pub fn with_storage(storage: S, config: OrgAuthzConfig) -> Result<Self> {
        Ok(Self::new(OrgAuthz::with_storage(storage, config)?))
    }

    /// The wrapped core, for synchronous use.
    pub fn inner(&self) -> &OrgAuthz<S> {
        &self.inner
    }

    async fn run<F, T>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&OrgAuthz<S>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&inner))
            .await
            .map_err(|e| Error::TaskFailed(e.to_string()))?
    }

    /// See [`OrgAuthz::set_org_perm`].
    pub async fn set_org_perm(
        &self,
        subject_id: &str,
        subject_type: &str,
        url_objects: Vec<String>,
        grants: Vec<OrgPermRequest>,
    ) -> Result<Vec<OrgPerm>> {
        let (subject_id, subject_type) = (subject_id.to_string(), subject_type.to_string());
        self.run(move |authz| authz.set_org_perm(&subject_id, &subject_type, &url_objects, &grants))
            .await
    }

    /// See [`OrgAuthz::delete_org_perm`].
    pub async fn delete_org_perm(
        &self,
        subject_id: &str,
        subject_type: &str,
        objects: Vec<String>,
    ) -> Result<()> {
        let (subject_id, subject_type) = (subject_id.to_string(), subject_type.to_string());
        self.run(move |authz| authz.delete_org_perm(&subject_id, &subject_type, &objects))
            .await
    }

    /// See [`OrgAuthz::get_org_perms`].
    pub async fn get_org_perms(
        &self,
        subject_id: &str,
        subject_type: &str,
        objects: Vec<String>,
    ) -> Result<Vec<OrgPerm>> {
        let (subject_id, subject_type) = (subject_id.to_string(), subject_type.to_string());
        self.run(move |authz| authz.get_org_perms(&subject_id, &subject_type, &objects))
            .await
    }

    /// See [`OrgAuthz::check_org_perm`].
    pub async fn check_org_perm(
        &self,
        subject_id: &str,
        subject_type: &str,
        object: &str,
        permission_name: &str,
    ) -> Result<bool> {
        let args = (
            subject_id.to_string(),
            subject_type.to_string(),
            object.to_string(),
            permission_name.to_string(),
        );
        self.run(move |authz| authz.check_org_perm(&args.0, &args.1, &args.2, &args.3))
            .await
    }

    /// See [`OrgAuthz::get_members_by_roles`].
    pub async fn get_members_by_roles(&self, roles: Vec<String>) -> Result<Vec<RoleMembers>> {
        self.run(move |authz| authz.get_members_by_roles(&roles)).await
    }

    /// See [`OrgAuthz::search_in_org_tree`].
    pub async fn search_in_org_tree(&self, visitor: Subject, request: SearchRequest) -> Result<SearchResult> {
        self.run(move |authz| authz.search_in_org_tree(&visitor, &request))
            .await
    }

    /// See [`OrgAuthz::search_in_org_tree_privileged`].
    pub async fn search_in_org_tree_privileged(
        &self,
        visitor: Subject,
        request: SearchRequest,
    ) -> Result<SearchResult> {
        self.run(move |authz| authz.search_in_org_tree_privileged(&visitor, &request))
            .await
    }
}
