//! Organizational object types.

use crate::{
    error::{Error, Result, TokenAxis},
    registry::{Registry, TokenRegistry},
};
use std::sync::LazyLock;

/// The kind of organizational object a grant or search result refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum OrgType {
    /// A user account.
    User,
    /// A department in the organization tree.
    Department,
    /// A user group.
    Group,
}

static ORG_TYPE_TOKENS: &[(&str, OrgType)] = &[
    ("user", OrgType::User),
    ("department", OrgType::Department),
    ("group", OrgType::Group),
];

static ORG_TYPES: LazyLock<Registry<OrgType>> = LazyLock::new(|| Registry::new(ORG_TYPE_TOKENS));

impl OrgType {
    /// The shared object type registry.
    pub fn registry() -> &'static Registry<OrgType> {
        &ORG_TYPES
    }

    /// Resolve an object type token, returning `None` when it is unknown.
    pub fn from_token(token: &str) -> Option<Self> {
        ORG_TYPES.resolve_token(token)
    }

    /// Resolve an object type token, failing with `InvalidToken`.
    pub fn parse(token: &str) -> Result<Self> {
        Self::from_token(token).ok_or_else(|| Error::invalid_token(TokenAxis::ObjectType, token))
    }

    /// Get the external token of the object type.
    pub fn as_str(&self) -> &'static str {
        ORG_TYPES.token_for(*self)
    }

    /// Whether the directory search can return this kind of object.
    pub fn is_searchable(&self) -> bool {
        match self {
            OrgType::User | OrgType::Department => true,
            OrgType::Group => false,
        }
    }
}

impl std::fmt::Display for OrgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrgType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
