//! Permission values and the name codec.
//!
//! A grant's capabilities are stored as a bitmask; callers exchange them as
//! lists of names. Each registered name owns exactly one bit and the
//! name table fixes the order in which [`decode`] lists them, so responses
//! are deterministic.

use crate::{
    error::{Error, Result},
    registry::{Registry, TokenRegistry},
};
use bitflags::bitflags;
use std::sync::LazyLock;

bitflags! {
    /// Bitmask of capabilities carried by a grant.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "persistence", serde(transparent))]
    pub struct PermissionValue: u32 {
        /// Read access to the object type.
        const READ = 1;
    }
}

static PERMISSION_NAMES: &[(&str, PermissionValue)] = &[("read", PermissionValue::READ)];

static PERMISSIONS: LazyLock<Registry<PermissionValue>> =
    LazyLock::new(|| Registry::new(PERMISSION_NAMES));

/// Encode permission names into a bitmask.
///
/// An empty input yields an empty value. Repeating a name is harmless. Any
/// unregistered name fails the whole call.
pub fn encode<I, S>(names: I) -> Result<PermissionValue>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().try_fold(PermissionValue::empty(), |value, name| {
        let name = name.as_ref();
        PERMISSIONS
            .resolve_token(name)
            .map(|bit| value | bit)
            .ok_or_else(|| Error::InvalidPermissionName(name.to_string()))
    })
}

/// Decode a bitmask into permission names, in registry order.
pub fn decode(value: PermissionValue) -> Vec<&'static str> {
    PERMISSIONS
        .entries()
        .iter()
        .filter(|(_, bit)| value.contains(*bit))
        .map(|(name, _)| *name)
        .collect()
}

impl PermissionValue {
    /// Build a value from a raw integer read from storage, dropping bits that
    /// have no registered name.
    pub fn from_raw(raw: u32) -> Self {
        Self::from_bits_truncate(raw)
    }

    /// Check whether the value carries the named capability.
    pub fn contains_name(&self, name: &str) -> Result<bool> {
        let bit = PERMISSIONS
            .resolve_token(name)
            .ok_or_else(|| Error::InvalidPermissionName(name.to_string()))?;
        Ok(self.contains(bit))
    }

    /// Names of the capabilities carried by the value.
    pub fn names(&self) -> Vec<&'static str> {
        decode(*self)
    }

    /// All registered permission names.
    pub fn registered_names() -> impl Iterator<Item = &'static str> {
        PERMISSIONS.tokens()
    }
}

impl std::fmt::Display for PermissionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", decode(*self).join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_read() {
        assert_eq!(encode(["read"]).unwrap(), PermissionValue::READ);
        assert_eq!(encode(["read"]).unwrap().bits(), 1);
    }

    #[test]
    fn test_encode_empty_and_duplicates() {
        assert_eq!(encode(Vec::<String>::new()).unwrap(), PermissionValue::empty());
        assert_eq!(encode(["read", "read"]).unwrap(), PermissionValue::READ);
    }

    #[test]
    fn test_encode_rejects_unknown_name() {
        assert_eq!(
            encode(["read", "write"]),
            Err(Error::InvalidPermissionName("write".to_string()))
        );
        assert!(encode(["READ"]).is_err());
        assert!(encode([""]).is_err());
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode(PermissionValue::READ), vec!["read"]);
        assert!(decode(PermissionValue::empty()).is_empty());
        assert_eq!(PermissionValue::from_raw(0b1001).names(), vec!["read"]);
        assert_eq!(PermissionValue::READ.to_string(), "read");
    }

    #[test]
    fn test_contains_name() {
        assert!(PermissionValue::READ.contains_name("read").unwrap());
        assert!(!PermissionValue::empty().contains_name("read").unwrap());
        assert!(PermissionValue::READ.contains_name("delete").is_err());
    }
}
