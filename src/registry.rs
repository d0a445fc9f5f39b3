//! Token registries.
//!
//! Every enum exchanged with the surrounding service (object types, subject
//! types, roles, permission names) is backed by one immutable [`Registry`]
//! that maps external string tokens to domain values and back. Registries are
//! built lazily on first use and shared by `&'static` reference; each axis has
//! its own table, so a token valid for one axis is never accepted by another.

use std::collections::HashMap;
use std::hash::Hash;

/// Lookup capability between external tokens and domain values.
///
/// Both directions are total: an unknown token yields `None` and leaves the
/// error shape to the caller.
pub trait TokenRegistry<T> {
    /// Resolve an external token to its domain value.
    fn resolve_token(&self, token: &str) -> Option<T>;

    /// The external token for a domain value.
    fn token_for(&self, value: T) -> &'static str;
}

/// Immutable bidirectional table for one token axis.
#[derive(Debug)]
pub struct Registry<T: 'static> {
    entries: &'static [(&'static str, T)],
    by_token: HashMap<&'static str, T>,
    by_value: HashMap<T, &'static str>,
}

impl<T> Registry<T>
where
    T: Copy + Eq + Hash + 'static,
{
    /// Build a registry from a static table.
    ///
    /// Table order is preserved by [`Registry::entries`] and is the canonical
    /// order used when listing values.
    pub fn new(entries: &'static [(&'static str, T)]) -> Self {
        let by_token = entries.iter().map(|(token, value)| (*token, *value)).collect();
        let by_value = entries.iter().map(|(token, value)| (*value, *token)).collect();
        Self {
            entries,
            by_token,
            by_value,
        }
    }

    /// All `(token, value)` pairs in canonical order.
    pub fn entries(&self) -> &'static [(&'static str, T)] {
        self.entries
    }

    /// All tokens in canonical order.
    pub fn tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(token, _)| *token)
    }

    /// Number of registered values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> TokenRegistry<T> for Registry<T>
where
    T: Copy + Eq + Hash + 'static,
{
    fn resolve_token(&self, token: &str) -> Option<T> {
        self.by_token.get(token).copied()
    }

    fn token_for(&self, value: T) -> &'static str {
        // Every value is constructed from the same table, so the lookup only
        // misses for a table that omits a variant.
        self.by_value.get(&value).copied().unwrap_or("")
    }
}

/// Split a comma-separated path segment into tokens.
///
/// Whitespace around tokens is trimmed and empty pieces are skipped, so
/// `"user, department,"` yields `["user", "department"]`. Duplicates are kept;
/// whether they are allowed is decided by the operation consuming the list.
pub fn parse_token_list(segment: &str) -> Vec<&str> {
    segment
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}
