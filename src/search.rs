//! Directory search across users and departments.
//!
//! A search is scoped by the visitor, an administrative role and a keyword.
//! Users and departments are searched separately: each kind gets the same
//! offset/limit window applied on its own and reports its own total, and the
//! two result sets are returned side by side rather than merged.

#[cfg(feature = "audit")]
use log::{debug, warn};

use crate::{
    core::OrgAuthz,
    error::{Error, Result},
    object::OrgType,
    role::Role,
    storage::Storage,
    subject::Subject,
};

/// A directory search request as received from the adapter.
///
/// Values are kept raw so that validation can report exactly which parameter
/// was wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchRequest {
    /// Requested entity kinds (`user`, `department`); repeatable.
    #[cfg_attr(feature = "persistence", serde(default, rename = "type"))]
    pub types: Vec<String>,
    /// Administrative role the search runs under.
    pub role: Option<String>,
    pub keyword: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    /// Boolean filter on the user enabled flag.
    pub user_enabled: Option<String>,
    /// Boolean filter on department assignment; privileged searches only.
    pub user_assigned: Option<String>,
}

impl SearchRequest {
    /// Create a request for a keyword under a role.
    pub fn new(role: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            keyword: Some(keyword.into()),
            ..Self::default()
        }
    }

    /// Request an entity kind.
    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.types.push(kind.into());
        self
    }

    /// Set the page offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set the page size.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filter users by enabled flag.
    pub fn with_user_enabled(mut self, value: impl Into<String>) -> Self {
        self.user_enabled = Some(value.into());
        self
    }

    /// Filter users by department assignment.
    pub fn with_user_assigned(mut self, value: impl Into<String>) -> Self {
        self.user_assigned = Some(value.into());
        self
    }
}

/// A user matched by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchUserInfo {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "persistence", serde(rename = "type"))]
    pub kind: OrgType,
}

impl SearchUserInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: OrgType::User,
        }
    }
}

/// A department matched by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchDepartInfo {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "persistence", serde(rename = "type"))]
    pub kind: OrgType,
}

impl SearchDepartInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: OrgType::Department,
        }
    }
}

/// One page of matches together with the size of the full match set.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchPage<T> {
    pub entries: Vec<T>,
    pub total_count: u64,
}

impl<T> SearchPage<T> {
    /// An empty page with a zero total.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            total_count: 0,
        }
    }
}

impl<T> Default for SearchPage<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Result of a directory search.
///
/// A bucket is `None` when its entity kind was not requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchResult {
    #[cfg_attr(feature = "persistence", serde(skip_serializing_if = "Option::is_none"))]
    pub users: Option<SearchPage<SearchUserInfo>>,
    #[cfg_attr(feature = "persistence", serde(skip_serializing_if = "Option::is_none"))]
    pub departments: Option<SearchPage<SearchDepartInfo>>,
}

impl SearchResult {
    /// Total number of matching users, 0 if users were not requested.
    pub fn user_total(&self) -> u64 {
        self.users.as_ref().map_or(0, |page| page.total_count)
    }

    /// Total number of matching departments, 0 if departments were not
    /// requested.
    pub fn depart_total(&self) -> u64 {
        self.departments.as_ref().map_or(0, |page| page.total_count)
    }

    /// Users on this page.
    pub fn user_entries(&self) -> &[SearchUserInfo] {
        self.users
            .as_ref()
            .map(|page| page.entries.as_slice())
            .unwrap_or_default()
    }

    /// Departments on this page.
    pub fn depart_entries(&self) -> &[SearchDepartInfo] {
        self.departments
            .as_ref()
            .map(|page| page.entries.as_slice())
            .unwrap_or_default()
    }
}

/// Validated offset/limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: usize,
    pub limit: usize,
}

impl PageWindow {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Cut one page out of a full, ordered match list.
    pub fn page<T>(&self, matches: Vec<T>) -> SearchPage<T> {
        let total_count = matches.len() as u64;
        SearchPage {
            entries: matches.into_iter().skip(self.offset).take(self.limit).collect(),
            total_count,
        }
    }
}

/// Optional user filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserFilters {
    pub enabled: Option<bool>,
    pub assigned: Option<bool>,
}

/// A validated search as handed to the directory store.
#[derive(Debug, Clone)]
pub struct DirectoryQuery<'a> {
    pub visitor: &'a Subject,
    pub role: Role,
    pub keyword: &'a str,
    pub window: PageWindow,
    pub filters: UserFilters,
}

/// Search parameters after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SearchParams {
    pub(crate) kinds: Vec<OrgType>,
    pub(crate) role: Role,
    pub(crate) keyword: String,
    pub(crate) window: PageWindow,
    pub(crate) filters: UserFilters,
}

impl SearchParams {
    /// Validate a request, stopping at the first failing step.
    pub(crate) fn validate(
        request: &SearchRequest,
        privileged: bool,
        default_limit: i64,
        max_limit: i64,
    ) -> Result<Self> {
        let kinds = parse_kinds(&request.types)?;

        let role = match request.role.as_deref() {
            None | Some("") => return Err(Error::MissingParameter("role")),
            Some(token) => Role::parse(token)?,
        };

        let keyword = match request.keyword.as_deref() {
            Some(keyword) if !keyword.trim().is_empty() => keyword.to_string(),
            _ => return Err(Error::MissingParameter("keyword")),
        };

        let offset = request.offset.unwrap_or(0);
        if offset < 0 {
            return Err(Error::InvalidRange {
                field: "offset",
                value: offset,
                reason: "must not be negative",
            });
        }

        let limit = request.limit.unwrap_or(default_limit);
        if limit < 1 || limit > max_limit {
            return Err(Error::InvalidRange {
                field: "limit",
                value: limit,
                reason: "must be between 1 and the maximum page size",
            });
        }

        let enabled = parse_filter("user_enabled", request.user_enabled.as_deref())?;
        let assigned = match request.user_assigned.as_deref() {
            Some(_) if !privileged => {
                return Err(Error::RestrictedFilter {
                    filter: "user_assigned",
                });
            }
            value => parse_filter("user_assigned", value)?,
        };

        Ok(Self {
            kinds,
            role,
            keyword,
            window: PageWindow::new(to_usize(offset), to_usize(limit)),
            filters: UserFilters { enabled, assigned },
        })
    }

    pub(crate) fn wants(&self, kind: OrgType) -> bool {
        self.kinds.contains(&kind)
    }
}

fn to_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Resolve the requested kinds, collapsing repeats in first-seen order.
fn parse_kinds(tokens: &[String]) -> Result<Vec<OrgType>> {
    if tokens.is_empty() {
        return Err(Error::MissingParameter("type"));
    }

    let mut kinds = Vec::with_capacity(tokens.len());
    for token in tokens {
        let kind = OrgType::from_token(token)
            .filter(OrgType::is_searchable)
            .ok_or_else(|| Error::InvalidType(token.clone()))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

fn parse_filter(filter: &'static str, value: Option<&str>) -> Result<Option<bool>> {
    value
        .map(|raw| {
            parse_bool(raw).ok_or_else(|| Error::InvalidFilterValue {
                filter,
                value: raw.to_string(),
            })
        })
        .transpose()
}

/// Parse a boolean query value.
///
/// Accepts the same spellings as the surrounding service: `1 t T TRUE true
/// True` and `0 f F FALSE false False`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

impl<S> OrgAuthz<S>
where
    S: Storage,
{
    /// Search users and departments visible to the visitor.
    ///
    /// The `user_assigned` filter is not available here; use
    /// [`OrgAuthz::search_in_org_tree_privileged`].
    pub fn search_in_org_tree(&self, visitor: &Subject, request: &SearchRequest) -> Result<SearchResult> {
        self.search(visitor, request, false)
    }

    /// Search variant for privileged callers, accepting the `user_assigned`
    /// filter.
    pub fn search_in_org_tree_privileged(
        &self,
        visitor: &Subject,
        request: &SearchRequest,
    ) -> Result<SearchResult> {
        self.search(visitor, request, true)
    }

    fn search(&self, visitor: &Subject, request: &SearchRequest, privileged: bool) -> Result<SearchResult> {
        let config = self.config();
        let params = match SearchParams::validate(
            request,
            privileged,
            config.default_limit,
            config.max_limit,
        ) {
            Ok(params) => params,
            Err(err) => {
                #[cfg(feature = "audit")]
                if config.enable_audit {
                    warn!("Search by '{visitor}' rejected: {err}");
                }
                return Err(err);
            }
        };

        let query = DirectoryQuery {
            visitor,
            role: params.role,
            keyword: &params.keyword,
            window: params.window,
            filters: params.filters,
        };

        let mut result = SearchResult::default();
        if params.wants(OrgType::User) {
            result.users = Some(self.storage().search_users(&query)?);
        }
        if params.wants(OrgType::Department) {
            result.departments = Some(self.storage().search_departments(&query)?);
        }

        #[cfg(feature = "audit")]
        if config.enable_audit {
            debug!(
                "Search by '{visitor}' as '{}' for '{}': {} users, {} departments",
                params.role,
                params.keyword,
                result.user_total(),
                result.depart_total()
            );
        }

        Ok(result)
    }
}
