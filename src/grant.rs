//! Organization permission grants and their expiry.

use crate::{
    object::OrgType,
    permission::{self, PermissionValue},
    subject::{Subject, SubjectType},
};
use chrono::{DateTime, TimeZone, Utc};

/// `end_time` sentinel for a grant that never expires.
pub const NO_EXPIRY: i64 = -1;

/// One grant binding a subject to an object type.
///
/// There is at most one grant per (subject, object type); writing a grant for
/// an object the subject already holds replaces it entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct OrgPerm {
    pub subject_id: String,
    pub subject_type: SubjectType,
    pub object: OrgType,
    pub value: PermissionValue,
    /// Expiry as Unix milliseconds, or [`NO_EXPIRY`].
    pub end_time: i64,
}

impl OrgPerm {
    /// Create a grant without expiry.
    pub fn new(subject: &Subject, object: OrgType, value: PermissionValue) -> Self {
        Self {
            subject_id: subject.id().to_string(),
            subject_type: subject.subject_type(),
            object,
            value,
            end_time: NO_EXPIRY,
        }
    }

    /// Set an expiry time.
    pub fn expiring_at(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = end_time.timestamp_millis();
        self
    }

    /// The subject holding this grant.
    pub fn subject(&self) -> Subject {
        Subject::new(self.subject_id.clone(), self.subject_type)
    }

    /// Whether the grant has no expiry.
    pub fn is_permanent(&self) -> bool {
        self.end_time == NO_EXPIRY
    }

    /// Expiry as a timestamp, `None` for permanent grants.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.is_permanent() {
            return None;
        }
        Utc.timestamp_millis_opt(self.end_time).single()
    }

    /// Check if the grant is still in force at the given time.
    ///
    /// A grant is in force up to and including its expiry instant.
    pub fn is_active_at(&self, time: DateTime<Utc>) -> bool {
        self.is_permanent() || time.timestamp_millis() <= self.end_time
    }

    /// Check if the grant is currently in force.
    pub fn is_currently_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// Names of the capabilities this grant carries.
    pub fn permission_names(&self) -> Vec<&'static str> {
        permission::decode(self.value)
    }
}

/// One record of a set-permissions request body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct OrgPermRequest {
    /// Object type token.
    pub object: String,
    /// Permission names granted on the object type.
    pub perms: Vec<String>,
}

impl OrgPermRequest {
    /// Create a request record.
    pub fn new<I, S>(object: impl Into<String>, perms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            object: object.into(),
            perms: perms.into_iter().map(Into::into).collect(),
        }
    }
}
