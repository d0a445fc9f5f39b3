//! Error types for the org-authz core.

use thiserror::Error;

/// Vocabulary a string token is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenAxis {
    /// Organizational object types (`user`, `department`, `group`).
    ObjectType,
    /// Subject / visitor types (`realname`, `app`, `anonymous`).
    SubjectType,
    /// System role names.
    Role,
    /// Permission capability names.
    Permission,
}

impl TokenAxis {
    /// Human-readable name of the axis, used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenAxis::ObjectType => "object type",
            TokenAxis::SubjectType => "subject type",
            TokenAxis::Role => "role",
            TokenAxis::Permission => "permission",
        }
    }
}

impl std::fmt::Display for TokenAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a backing store.
///
/// The core never retries or rewraps these; they reach the caller with their
/// message unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The store refused the request for the given visitor.
    #[error("{0}")]
    Forbidden(String),

    /// The store could not be reached or failed mid-operation.
    #[error("{0}")]
    Unavailable(String),

    /// Reading or writing the on-disk snapshot failed.
    #[error("{0}")]
    Io(String),

    /// The on-disk snapshot could not be encoded or decoded.
    #[error("{0}")]
    Serialization(String),
}

/// Result type for backing store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The main error type for org-authz operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A token is not part of the vocabulary of its axis.
    #[error("Invalid {axis} '{token}'")]
    InvalidToken { axis: TokenAxis, token: String },

    /// The object types named in the path and in the body disagree.
    #[error("Object types in path and body do not match: {0}")]
    ConsistencyViolation(String),

    /// A value that must be unique was repeated.
    #[error("Duplicate {field} '{value}'")]
    NotUnique { field: String, value: String },

    /// A permission name is not registered.
    #[error("Invalid permission name '{0}'")]
    InvalidPermissionName(String),

    /// A pagination parameter is out of range.
    #[error("Invalid {field} {value}: {reason}")]
    InvalidRange {
        field: &'static str,
        value: i64,
        reason: &'static str,
    },

    /// An optional filter could not be parsed.
    #[error("Invalid value '{value}' for filter '{filter}'")]
    InvalidFilterValue { filter: &'static str, value: String },

    /// A filter was given to a search variant that does not accept it.
    #[error("Filter '{filter}' is only available to privileged searches")]
    RestrictedFilter { filter: &'static str },

    /// A role token does not name a system role.
    #[error("Invalid role '{0}'")]
    InvalidRole(String),

    /// A search type token does not name a searchable entity kind.
    #[error("Invalid search type '{0}'")]
    InvalidType(String),

    /// A required request parameter is missing or blank.
    #[error("Missing required parameter '{0}'")]
    MissingParameter(&'static str),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The backing store failed; the cause is surfaced unchanged.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// A blocking task running a core operation did not complete.
    #[cfg(feature = "async")]
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

/// Stable classification of [`Error`] values for adapters that map errors
/// onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidToken,
    ConsistencyViolation,
    NotUnique,
    InvalidPermissionName,
    InvalidRange,
    InvalidFilterValue,
    InvalidRole,
    InvalidType,
    MissingParameter,
    InvalidConfiguration,
    BackingStoreFailure,
    Internal,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidToken { .. } => ErrorKind::InvalidToken,
            Error::ConsistencyViolation(_) => ErrorKind::ConsistencyViolation,
            Error::NotUnique { .. } => ErrorKind::NotUnique,
            Error::InvalidPermissionName(_) => ErrorKind::InvalidPermissionName,
            Error::InvalidRange { .. } => ErrorKind::InvalidRange,
            Error::InvalidFilterValue { .. } | Error::RestrictedFilter { .. } => {
                ErrorKind::InvalidFilterValue
            }
            Error::InvalidRole(_) => ErrorKind::InvalidRole,
            Error::InvalidType(_) => ErrorKind::InvalidType,
            Error::MissingParameter(_) => ErrorKind::MissingParameter,
            Error::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Error::Storage(_) => ErrorKind::BackingStoreFailure,
            #[cfg(feature = "async")]
            Error::TaskFailed(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if the request was rejected before reaching the store.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::BackingStoreFailure | ErrorKind::Internal | ErrorKind::InvalidConfiguration
        )
    }

    pub(crate) fn invalid_token(axis: TokenAxis, token: &str) -> Self {
        Error::InvalidToken {
            axis,
            token: token.to_string(),
        }
    }
}

/// Result type alias for org-authz operations.
pub type Result<T> = std::result::Result<T, Error>;
