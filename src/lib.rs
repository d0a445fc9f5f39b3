//! # Org Authz
//!
//! Access-control and directory-resolution core for an identity-management
//! service. It stores per-subject permission grants on organization object
//! types, expands administrative roles into their members, and runs scoped,
//! paginated searches over the user and department directory.
//!
//! ## Features
//!
//! - Permission grants keyed by (subject, object type), stored as bitmasks
//! - Strict request validation before any store access
//! - All-or-nothing grant writes in a single store call
//! - Role membership expansion with first-seen ordering
//! - Directory search with independent per-kind paging and totals
//! - Pluggable storage through the [`Storage`] trait
//! - Audit logging of grant changes and rejected requests
//! - Optional JSON file persistence and async wrapper
//!
//! ## Quick Start
//!
//! ```rust
//! use org_authz::{OrgAuthz, OrgPermRequest};
//!
//! let authz = OrgAuthz::new();
//!
//! // Grant read on departments to a real-name user
//! authz.set_org_perm(
//!     "user1",
//!     "realname",
//!     &["department"],
//!     &[OrgPermRequest::new("department", ["read"])],
//! )?;
//!
//! assert!(authz.check_org_perm("user1", "realname", "department", "read")?);
//! assert!(!authz.check_org_perm("user1", "realname", "user", "read")?);
//!
//! // Revoke it again
//! authz.delete_org_perm("user1", "realname", &["department"])?;
//! assert!(authz.get_org_perms::<&str>("user1", "realname", &[])?.is_empty());
//! # Ok::<(), org_authz::Error>(())
//! ```
//!
//! ## Audit Logging
//!
//! When the `audit` feature is enabled, grant changes and rejected requests
//! are logged through the `log` facade. To enable logging:
//!
//! ```rust
//! use org_authz::init_audit_logger;
//!
//! // Initialize logging (must be called early in program execution)
//! init_audit_logger();
//!
//! // Configure log level through RUST_LOG environment variable:
//! // RUST_LOG=info,org_authz=debug
//! ```
//!
//! The following events are logged:
//! - Grants set and deleted (info)
//! - Rejected grant and search requests (warn)
//! - Role expansion and search outcomes (debug)
//!

#[cfg(feature = "audit")]
pub fn init_audit_logger() {
    env_logger::init();
}

pub mod core;
pub mod error;
pub mod grant;
pub mod membership;
pub mod object;
pub mod permission;
pub mod registry;
pub mod role;
pub mod search;
pub mod storage;
pub mod subject;

#[cfg(test)]
mod property_tests;

#[cfg(feature = "async")]
pub mod async_support;

// Re-export main types for convenience
pub use crate::{
    core::{OrgAuthz, OrgAuthzConfig},
    error::{Error, ErrorKind, StoreError, TokenAxis},
    grant::{NO_EXPIRY, OrgPerm, OrgPermRequest},
    object::OrgType,
    permission::PermissionValue,
    registry::{TokenRegistry, parse_token_list},
    role::{Role, RoleMember, RoleMembers},
    search::{SearchDepartInfo, SearchPage, SearchRequest, SearchResult, SearchUserInfo},
    storage::{DirectoryDepartment, DirectoryStore, DirectoryUser, MemoryStorage, OrgPermStore, RoleStore, Storage},
    subject::{Subject, SubjectType},
};

#[cfg(feature = "async")]
pub use crate::async_support::AsyncOrgAuthz;

#[cfg(feature = "persistence")]
pub use crate::storage::file_storage::FileStorage;
