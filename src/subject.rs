//! Subject definitions (principals that hold grants or visit the service).

use crate::{
    error::{Error, Result, TokenAxis},
    registry::{Registry, TokenRegistry},
};
use std::sync::LazyLock;

/// Types of principals known to the service.
///
/// Grants are held by real-name accounts today; the other types describe
/// visitors authenticated by the surrounding service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum SubjectType {
    /// A real-name user account.
    RealName,
    /// A registered application account.
    App,
    /// An anonymous visitor.
    Anonymous,
}

static SUBJECT_TYPE_TOKENS: &[(&str, SubjectType)] = &[
    ("realname", SubjectType::RealName),
    ("app", SubjectType::App),
    ("anonymous", SubjectType::Anonymous),
];

static SUBJECT_TYPES: LazyLock<Registry<SubjectType>> =
    LazyLock::new(|| Registry::new(SUBJECT_TYPE_TOKENS));

impl SubjectType {
    /// The shared subject type registry.
    pub fn registry() -> &'static Registry<SubjectType> {
        &SUBJECT_TYPES
    }

    /// Resolve a subject type token, returning `None` when it is unknown.
    pub fn from_token(token: &str) -> Option<Self> {
        SUBJECT_TYPES.resolve_token(token)
    }

    /// Resolve a subject type token, failing with `InvalidToken`.
    pub fn parse(token: &str) -> Result<Self> {
        Self::from_token(token).ok_or_else(|| Error::invalid_token(TokenAxis::SubjectType, token))
    }

    /// Get the string representation of the subject type.
    pub fn as_str(&self) -> &'static str {
        SUBJECT_TYPES.token_for(*self)
    }

    /// Check if this is a real-name subject type.
    pub fn is_real_name(&self) -> bool {
        matches!(self, SubjectType::RealName)
    }
}

impl std::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubjectType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A principal identified by id and type.
///
/// Used both for the holder of a grant and for the already-authenticated
/// visitor on whose behalf a request runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Subject {
    /// Unique identifier for the subject.
    id: String,
    /// Type of subject.
    subject_type: SubjectType,
}

impl Subject {
    /// Create a subject with an explicit type.
    pub fn new(id: impl Into<String>, subject_type: SubjectType) -> Self {
        Self {
            id: id.into(),
            subject_type,
        }
    }

    /// Create a real-name user subject.
    pub fn realname(id: impl Into<String>) -> Self {
        Self::new(id, SubjectType::RealName)
    }

    /// Create an application subject.
    pub fn app(id: impl Into<String>) -> Self {
        Self::new(id, SubjectType::App)
    }

    /// Create an anonymous subject.
    pub fn anonymous(id: impl Into<String>) -> Self {
        Self::new(id, SubjectType::Anonymous)
    }

    /// Create a subject from an id and a subject type token.
    pub fn from_token(id: impl Into<String>, subject_type: &str) -> Result<Self> {
        Ok(Self::new(id, SubjectType::parse(subject_type)?))
    }

    /// Get the subject's unique identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the subject's type.
    pub fn subject_type(&self) -> SubjectType {
        self.subject_type
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.subject_type, self.id)
    }
}
