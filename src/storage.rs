//! Backing store abstractions.
//!
//! The core issues exactly one logical store call per write operation and
//! treats it as succeed-or-fail; atomicity of multi-object writes is the
//! store's responsibility.

use crate::{
    error::{StoreError, StoreResult},
    grant::OrgPerm,
    object::OrgType,
    role::Role,
    search::{DirectoryQuery, SearchDepartInfo, SearchPage, SearchUserInfo},
    subject::Subject,
};
use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

/// Persistence of organization permission grants.
pub trait OrgPermStore: Send + Sync {
    /// Write every grant for the subject in one transaction, replacing any
    /// existing grant for the same object type.
    fn set_org_perms(&self, subject: &Subject, grants: Vec<OrgPerm>) -> StoreResult<()>;

    /// Remove the subject's grants for the given object types.
    fn delete_org_perms(&self, subject: &Subject, objects: &[OrgType]) -> StoreResult<()>;

    /// All grants held by the subject, expired ones included.
    fn get_org_perms(&self, subject: &Subject) -> StoreResult<Vec<OrgPerm>>;
}

/// Role membership lookup.
pub trait RoleStore: Send + Sync {
    /// Member ids of each role. Roles without members may be absent from the
    /// returned map.
    fn members_of_roles(&self, roles: &[Role]) -> StoreResult<HashMap<Role, Vec<String>>>;
}

/// Scoped keyword search over the organization directory.
pub trait DirectoryStore: Send + Sync {
    /// Search users visible to the visitor under the query's role.
    fn search_users(&self, query: &DirectoryQuery<'_>) -> StoreResult<SearchPage<SearchUserInfo>>;

    /// Search departments visible to the visitor under the query's role.
    fn search_departments(
        &self,
        query: &DirectoryQuery<'_>,
    ) -> StoreResult<SearchPage<SearchDepartInfo>>;
}

/// Everything the core needs from its backing store.
pub trait Storage: OrgPermStore + RoleStore + DirectoryStore {}

impl<T> Storage for T where T: OrgPermStore + RoleStore + DirectoryStore {}

/// A user record in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectoryUser {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    /// Departments the user is assigned to; empty for unassigned users.
    pub departments: Vec<String>,
}

impl DirectoryUser {
    /// Create an enabled, unassigned user.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: true,
            departments: Vec::new(),
        }
    }

    /// Create a user with a generated id.
    pub fn generated(name: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string(), name)
    }

    /// Mark the user as disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Assign the user to a department.
    pub fn in_department(mut self, department_id: impl Into<String>) -> Self {
        self.departments.push(department_id.into());
        self
    }

    /// Whether the user belongs to at least one department.
    pub fn is_assigned(&self) -> bool {
        !self.departments.is_empty()
    }
}

/// A department record in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectoryDepartment {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
}

impl DirectoryDepartment {
    /// Create a top-level department.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
        }
    }

    /// Create a department with a generated id.
    pub fn generated(name: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string(), name)
    }

    /// Place the department under a parent.
    pub fn under(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

/// In-memory storage implementation using DashMap for thread safety.
///
/// Clones share the same underlying maps.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    org_perms: Arc<DashMap<Subject, BTreeMap<OrgType, OrgPerm>>>,
    role_members: Arc<DashMap<Role, Vec<String>>>,
    users: Arc<DashMap<String, DirectoryUser>>,
    departments: Arc<DashMap<String, DirectoryDepartment>>,
    // visitor id -> ids of the departments the visitor manages
    managed_departments: Arc<DashMap<String, BTreeSet<String>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a directory user.
    pub fn add_user(&self, user: DirectoryUser) {
        self.users.insert(user.id.clone(), user);
    }

    /// Add or replace a directory department.
    pub fn add_department(&self, department: DirectoryDepartment) {
        self.departments.insert(department.id.clone(), department);
    }

    /// Add a member to a role; adding an existing member is a no-op.
    pub fn assign_role(&self, role: Role, member_id: impl Into<String>) {
        let member_id = member_id.into();
        let mut members = self.role_members.entry(role).or_default();
        if !members.contains(&member_id) {
            members.push(member_id);
        }
    }

    /// Remove a member from a role.
    pub fn revoke_role(&self, role: Role, member_id: &str) {
        if let Some(mut members) = self.role_members.get_mut(&role) {
            members.retain(|id| id != member_id);
        }
    }

    /// Set the departments a visitor manages, replacing any previous set.
    pub fn set_managed_departments<I, S>(&self, visitor_id: impl Into<String>, departments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.managed_departments.insert(
            visitor_id.into(),
            departments.into_iter().map(Into::into).collect(),
        );
    }

    /// Get the number of subjects holding at least one grant.
    pub fn subject_count(&self) -> usize {
        self.org_perms.len()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.org_perms.clear();
        self.role_members.clear();
        self.users.clear();
        self.departments.clear();
        self.managed_departments.clear();
    }

    fn holds_role(&self, member_id: &str, role: Role) -> bool {
        self.role_members
            .get(&role)
            .is_some_and(|members| members.iter().any(|id| id == member_id))
    }

    /// Ids of the departments visible under the query, `None` meaning the
    /// whole tree.
    fn visible_departments(&self, query: &DirectoryQuery<'_>) -> StoreResult<Option<BTreeSet<String>>> {
        let visitor_id = query.visitor.id();
        if !self.holds_role(visitor_id, query.role) {
            return Err(StoreError::Forbidden(format!(
                "visitor '{visitor_id}' does not hold role '{}'",
                query.role
            )));
        }

        if query.role.sees_whole_tree() {
            return Ok(None);
        }

        let roots = self
            .managed_departments
            .get(visitor_id)
            .map(|managed| managed.clone())
            .unwrap_or_default();

        Ok(Some(self.with_descendants(roots)))
    }

    fn with_descendants(&self, roots: BTreeSet<String>) -> BTreeSet<String> {
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for entry in self.departments.iter() {
            if let Some(parent) = &entry.value().parent_id {
                children
                    .entry(parent.clone())
                    .or_default()
                    .push(entry.key().clone());
            }
        }

        let mut visible = BTreeSet::new();
        let mut queue: VecDeque<String> = roots.into_iter().collect();
        while let Some(id) = queue.pop_front() {
            if visible.insert(id.clone())
                && let Some(kids) = children.get(&id)
            {
                queue.extend(kids.iter().cloned());
            }
        }
        visible
    }
}

fn matches_keyword(name: &str, keyword: &str) -> bool {
    name.to_lowercase().contains(&keyword.to_lowercase())
}

impl OrgPermStore for MemoryStorage {
    fn set_org_perms(&self, subject: &Subject, grants: Vec<OrgPerm>) -> StoreResult<()> {
        if grants.is_empty() {
            return Ok(());
        }
        // A single entry guard covers every row, so readers never observe a
        // partially applied set.
        let mut perms = self.org_perms.entry(subject.clone()).or_default();
        for grant in grants {
            perms.insert(grant.object, grant);
        }
        Ok(())
    }

    fn delete_org_perms(&self, subject: &Subject, objects: &[OrgType]) -> StoreResult<()> {
        if let Some(mut perms) = self.org_perms.get_mut(subject) {
            for object in objects {
                perms.remove(object);
            }
        }
        self.org_perms.remove_if(subject, |_, perms| perms.is_empty());
        Ok(())
    }

    fn get_org_perms(&self, subject: &Subject) -> StoreResult<Vec<OrgPerm>> {
        Ok(self
            .org_perms
            .get(subject)
            .map(|perms| perms.values().cloned().collect())
            .unwrap_or_default())
    }
}

impl RoleStore for MemoryStorage {
    fn members_of_roles(&self, roles: &[Role]) -> StoreResult<HashMap<Role, Vec<String>>> {
        Ok(roles
            .iter()
            .filter_map(|role| {
                self.role_members
                    .get(role)
                    .map(|members| (*role, members.clone()))
            })
            .collect())
    }
}

impl DirectoryStore for MemoryStorage {
    fn search_users(&self, query: &DirectoryQuery<'_>) -> StoreResult<SearchPage<SearchUserInfo>> {
        let visible = self.visible_departments(query)?;

        let mut matches: Vec<SearchUserInfo> = self
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|user| match &visible {
                None => true,
                Some(departments) => user.departments.iter().any(|d| departments.contains(d)),
            })
            .filter(|user| query.filters.enabled.is_none_or(|enabled| user.enabled == enabled))
            .filter(|user| {
                query
                    .filters
                    .assigned
                    .is_none_or(|assigned| user.is_assigned() == assigned)
            })
            .filter(|user| matches_keyword(&user.name, query.keyword))
            .map(|user| SearchUserInfo::new(user.id, user.name))
            .collect();

        matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(query.window.page(matches))
    }

    fn search_departments(
        &self,
        query: &DirectoryQuery<'_>,
    ) -> StoreResult<SearchPage<SearchDepartInfo>> {
        let visible = self.visible_departments(query)?;

        let mut matches: Vec<SearchDepartInfo> = self
            .departments
            .iter()
            .filter(|entry| visible.as_ref().is_none_or(|ids| ids.contains(entry.key())))
            .filter(|entry| matches_keyword(&entry.value().name, query.keyword))
            .map(|entry| SearchDepartInfo::new(entry.key().clone(), entry.value().name.clone()))
            .collect();

        matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(query.window.page(matches))
    }
}

/// File-based storage implementation (requires persistence feature).
#[cfg(feature = "persistence")]
pub mod file_storage {
    use super::*;
    use std::{
        fs::{File, OpenOptions},
        io::{BufReader, BufWriter, Write},
        path::{Path, PathBuf},
        sync::Mutex,
    };

    #[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
    struct Snapshot {
        #[serde(default)]
        org_perms: Vec<OrgPerm>,
        #[serde(default)]
        role_members: BTreeMap<Role, Vec<String>>,
        #[serde(default)]
        users: Vec<DirectoryUser>,
        #[serde(default)]
        departments: Vec<DirectoryDepartment>,
        #[serde(default)]
        managed_departments: BTreeMap<String, BTreeSet<String>>,
    }

    /// Storage that keeps its data in memory and writes a JSON snapshot to
    /// disk after every grant change.
    #[derive(Debug)]
    pub struct FileStorage {
        storage_path: PathBuf,
        inner: MemoryStorage,
        write_lock: Mutex<()>,
    }

    impl FileStorage {
        /// Open a file storage, loading the snapshot if the file exists.
        pub fn new(storage_path: impl AsRef<Path>) -> StoreResult<Self> {
            let storage_path = storage_path.as_ref().to_path_buf();

            if let Some(parent) = storage_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Io(format!("Failed to create storage directory: {e}"))
                })?;
            }

            let storage = Self {
                storage_path,
                inner: MemoryStorage::new(),
                write_lock: Mutex::new(()),
            };
            storage.load_from_disk()?;
            Ok(storage)
        }

        /// The in-memory view, for seeding directory and role data.
        ///
        /// Changes made through it reach the disk on the next grant change or
        /// [`FileStorage::flush`].
        pub fn memory(&self) -> &MemoryStorage {
            &self.inner
        }

        /// Get the storage file path.
        pub fn storage_path(&self) -> &Path {
            &self.storage_path
        }

        /// Write the current state to disk.
        pub fn flush(&self) -> StoreResult<()> {
            let _guard = self.lock_writes()?;
            self.save_to_disk()
        }

        fn load_from_disk(&self) -> StoreResult<()> {
            if !self.storage_path.exists() {
                return Ok(());
            }

            let file = File::open(&self.storage_path)
                .map_err(|e| StoreError::Io(format!("Failed to open storage file: {e}")))?;
            let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))
                .map_err(|e| StoreError::Serialization(format!("Failed to read snapshot: {e}")))?;

            for grant in snapshot.org_perms {
                let subject = grant.subject();
                self.inner.set_org_perms(&subject, vec![grant])?;
            }
            for (role, members) in snapshot.role_members {
                for member in members {
                    self.inner.assign_role(role, member);
                }
            }
            for user in snapshot.users {
                self.inner.add_user(user);
            }
            for department in snapshot.departments {
                self.inner.add_department(department);
            }
            for (visitor, departments) in snapshot.managed_departments {
                self.inner.set_managed_departments(visitor, departments);
            }
            Ok(())
        }

        fn snapshot(&self) -> Snapshot {
            let inner = &self.inner;
            let mut org_perms: Vec<OrgPerm> = inner
                .org_perms
                .iter()
                .flat_map(|entry| entry.value().values().cloned().collect::<Vec<_>>())
                .collect();
            org_perms.sort_by(|a, b| {
                (&a.subject_id, a.subject_type, a.object).cmp(&(&b.subject_id, b.subject_type, b.object))
            });

            let mut users: Vec<DirectoryUser> =
                inner.users.iter().map(|entry| entry.value().clone()).collect();
            users.sort_by(|a, b| a.id.cmp(&b.id));

            let mut departments: Vec<DirectoryDepartment> = inner
                .departments
                .iter()
                .map(|entry| entry.value().clone())
                .collect();
            departments.sort_by(|a, b| a.id.cmp(&b.id));

            Snapshot {
                org_perms,
                role_members: inner
                    .role_members
                    .iter()
                    .map(|entry| (*entry.key(), entry.value().clone()))
                    .collect(),
                users,
                departments,
                managed_departments: inner
                    .managed_departments
                    .iter()
                    .map(|entry| (entry.key().clone(), entry.value().clone()))
                    .collect(),
            }
        }

        fn save_to_disk(&self) -> StoreResult<()> {
            self.write_snapshot(&self.snapshot())
        }

        fn write_snapshot(&self, snapshot: &Snapshot) -> StoreResult<()> {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.storage_path)
                .map_err(|e| StoreError::Io(format!("Failed to create storage file: {e}")))?;

            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, snapshot)
                .map_err(|e| StoreError::Serialization(format!("Failed to write snapshot: {e}")))?;
            writer
                .flush()
                .map_err(|e| StoreError::Io(format!("Failed to flush storage file: {e}")))
        }

        fn lock_writes(&self) -> StoreResult<std::sync::MutexGuard<'_, ()>> {
            self.write_lock
                .lock()
                .map_err(|_| StoreError::Unavailable("storage write lock poisoned".to_string()))
        }
    }

    // Grant changes reach the disk before memory, so a failed write leaves
    // the visible state untouched.
    impl OrgPermStore for FileStorage {
        fn set_org_perms(&self, subject: &Subject, grants: Vec<OrgPerm>) -> StoreResult<()> {
            let _guard = self.lock_writes()?;

            let mut snapshot = self.snapshot();
            snapshot.org_perms.retain(|row| {
                row.subject() != *subject || !grants.iter().any(|grant| grant.object == row.object)
            });
            snapshot.org_perms.extend(grants.iter().cloned());
            self.write_snapshot(&snapshot)?;

            self.inner.set_org_perms(subject, grants)
        }

        fn delete_org_perms(&self, subject: &Subject, objects: &[OrgType]) -> StoreResult<()> {
            let _guard = self.lock_writes()?;

            let mut snapshot = self.snapshot();
            snapshot
                .org_perms
                .retain(|row| row.subject() != *subject || !objects.contains(&row.object));
            self.write_snapshot(&snapshot)?;

            self.inner.delete_org_perms(subject, objects)
        }

        fn get_org_perms(&self, subject: &Subject) -> StoreResult<Vec<OrgPerm>> {
            self.inner.get_org_perms(subject)
        }
    }

    impl RoleStore for FileStorage {
        fn members_of_roles(&self, roles: &[Role]) -> StoreResult<HashMap<Role, Vec<String>>> {
            self.inner.members_of_roles(roles)
        }
    }

    impl DirectoryStore for FileStorage {
        fn search_users(
            &self,
            query: &DirectoryQuery<'_>,
        ) -> StoreResult<SearchPage<SearchUserInfo>> {
            self.inner.search_users(query)
        }

        fn search_departments(
            &self,
            query: &DirectoryQuery<'_>,
        ) -> StoreResult<SearchPage<SearchDepartInfo>> {
            self.inner.search_departments(query)
        }
    }
}

#[cfg(feature = "persistence")]
pub use file_storage::FileStorage;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        permission::PermissionValue,
        search::{PageWindow, UserFilters},
    };

    fn query<'a>(visitor: &'a Subject, role: Role, keyword: &'a str) -> DirectoryQuery<'a> {
        DirectoryQuery {
            visitor,
            role,
            keyword,
            window: PageWindow::new(0, 100),
            filters: UserFilters::default(),
        }
    }

    #[test]
    fn test_memory_storage_grants() {
        let storage = MemoryStorage::new();
        let subject = Subject::realname("u1");

        storage
            .set_org_perms(
                &subject,
                vec![
                    OrgPerm::new(&subject, OrgType::User, PermissionValue::READ),
                    OrgPerm::new(&subject, OrgType::Department, PermissionValue::READ),
                ],
            )
            .unwrap();
        assert_eq!(storage.get_org_perms(&subject).unwrap().len(), 2);
        assert_eq!(storage.subject_count(), 1);

        // Replacing one object leaves the other untouched.
        storage
            .set_org_perms(
                &subject,
                vec![OrgPerm::new(&subject, OrgType::User, PermissionValue::empty())],
            )
            .unwrap();
        let perms = storage.get_org_perms(&subject).unwrap();
        assert_eq!(perms.len(), 2);
        assert_eq!(perms[0].object, OrgType::User);
        assert!(perms[0].value.is_empty());

        storage
            .delete_org_perms(&subject, &[OrgType::User, OrgType::Department])
            .unwrap();
        assert!(storage.get_org_perms(&subject).unwrap().is_empty());
        assert_eq!(storage.subject_count(), 0);
    }

    #[test]
    fn test_grants_are_keyed_by_subject_type() {
        let storage = MemoryStorage::new();
        let user = Subject::realname("x");
        let app = Subject::app("x");
        storage
            .set_org_perms(&user, vec![OrgPerm::new(&user, OrgType::Group, PermissionValue::READ)])
            .unwrap();
        assert!(storage.get_org_perms(&app).unwrap().is_empty());
    }

    #[test]
    fn test_role_members() {
        let storage = MemoryStorage::new();
        storage.assign_role(Role::SysAdmin, "u1");
        storage.assign_role(Role::SysAdmin, "u2");
        storage.assign_role(Role::SysAdmin, "u1");
        storage.revoke_role(Role::SysAdmin, "u2");

        let members = storage
            .members_of_roles(&[Role::SysAdmin, Role::OrgAudit])
            .unwrap();
        assert_eq!(members.get(&Role::SysAdmin), Some(&vec!["u1".to_string()]));
        assert!(!members.contains_key(&Role::OrgAudit));
    }

    #[test]
    fn test_search_requires_role_membership() {
        let storage = MemoryStorage::new();
        let visitor = Subject::realname("admin");
        let result = storage.search_users(&query(&visitor, Role::SysAdmin, "a"));
        assert!(matches!(result, Err(StoreError::Forbidden(_))));
    }

    #[test]
    fn test_manager_scope_includes_sub_departments() {
        let storage = MemoryStorage::new();
        storage.add_department(DirectoryDepartment::new("d1", "Research"));
        storage.add_department(DirectoryDepartment::new("d2", "Research Lab").under("d1"));
        storage.add_department(DirectoryDepartment::new("d3", "Research Ops"));
        storage.add_user(DirectoryUser::new("u1", "Rita").in_department("d2"));
        storage.add_user(DirectoryUser::new("u2", "Rob").in_department("d3"));
        storage.assign_role(Role::OrgManager, "mgr");
        storage.set_managed_departments("mgr", ["d1"]);

        let visitor = Subject::realname("mgr");
        let departments = storage
            .search_departments(&query(&visitor, Role::OrgManager, "research"))
            .unwrap();
        assert_eq!(departments.total_count, 2);
        let ids: Vec<_> = departments.entries.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d2"]);

        let users = storage
            .search_users(&query(&visitor, Role::OrgManager, "r"))
            .unwrap();
        assert_eq!(users.total_count, 1);
        assert_eq!(users.entries[0].id, "u1");
    }

    #[test]
    fn test_user_filters() {
        let storage = MemoryStorage::new();
        storage.add_user(DirectoryUser::new("u1", "Ann").in_department("d1"));
        storage.add_user(DirectoryUser::new("u2", "Anna").disabled());
        storage.assign_role(Role::SuperAdmin, "root");
        let visitor = Subject::realname("root");

        let mut q = query(&visitor, Role::SuperAdmin, "ann");
        assert_eq!(storage.search_users(&q).unwrap().total_count, 2);

        q.filters.enabled = Some(false);
        let page = storage.search_users(&q).unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.entries[0].id, "u2");

        q.filters = UserFilters {
            enabled: None,
            assigned: Some(true),
        };
        let page = storage.search_users(&q).unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.entries[0].id, "u1");
    }

    #[cfg(feature = "persistence")]
    #[test]
    fn test_file_storage() {
        let storage_path = std::env::temp_dir().join(format!("org_authz_{}.json", Uuid::new_v4()));
        let subject = Subject::realname("u1");

        {
            let storage = FileStorage::new(&storage_path).unwrap();
            storage.memory().assign_role(Role::SysAdmin, "u1");
            storage
                .set_org_perms(
                    &subject,
                    vec![OrgPerm::new(&subject, OrgType::Department, PermissionValue::READ)],
                )
                .unwrap();
            assert!(storage_path.exists());
        }

        {
            let storage = FileStorage::new(&storage_path).unwrap();
            let perms = storage.get_org_perms(&subject).unwrap();
            assert_eq!(perms.len(), 1);
            assert_eq!(perms[0].object, OrgType::Department);
            let members = storage.members_of_roles(&[Role::SysAdmin]).unwrap();
            assert_eq!(members[&Role::SysAdmin], vec!["u1".to_string()]);
        }

        let _ = std::fs::remove_file(&storage_path);
    }

    #[cfg(feature = "persistence")]
    #[test]
    fn test_file_storage_failed_write_changes_nothing() {
        use crate::core::{OrgAuthz, OrgAuthzConfig};
        use crate::grant::OrgPermRequest;

        let storage_path = std::env::temp_dir().join(format!("org_authz_{}.json", Uuid::new_v4()));
        let storage = FileStorage::new(&storage_path).unwrap();
        let authz = OrgAuthz::with_storage(storage, OrgAuthzConfig::default()).unwrap();
        authz
            .set_org_perm("u1", "realname", &["user"], &[OrgPermRequest::new("user", ["read"])])
            .unwrap();

        // A directory in place of the snapshot file makes every write fail.
        std::fs::remove_file(&storage_path).unwrap();
        std::fs::create_dir(&storage_path).unwrap();

        let result = authz.set_org_perm(
            "u1",
            "realname",
            &["department"],
            &[OrgPermRequest::new("department", ["read"])],
        );
        assert!(matches!(result, Err(crate::error::Error::Storage(StoreError::Io(_)))));
        assert!(!authz.check_org_perm("u1", "realname", "department", "read").unwrap());

        assert!(authz.delete_org_perm("u1", "realname", &["user"]).is_err());
        assert!(authz.check_org_perm("u1", "realname", "user", "read").unwrap());

        let _ = std::fs::remove_dir(&storage_path);
    }

    #[test]
    fn test_generated_directory_entries_and_clear() {
        let storage = MemoryStorage::new();
        let first = DirectoryUser::generated("Ada");
        let second = DirectoryUser::generated("Ada");
        assert_ne!(first.id, second.id);
        assert!(Uuid::parse_str(&first.id).is_ok());

        let department = DirectoryDepartment::generated("Ops");
        assert_ne!(department.id, DirectoryDepartment::generated("Ops").id);

        let subject = Subject::realname(first.id.clone());
        storage.add_user(first.in_department(department.id.clone()));
        storage.add_user(second);
        storage.set_managed_departments("mgr", [department.id.clone()]);
        storage.add_department(department);
        storage.assign_role(Role::OrgManager, "mgr");
        storage
            .set_org_perms(&subject, vec![OrgPerm::new(&subject, OrgType::User, PermissionValue::READ)])
            .unwrap();

        let visitor = Subject::realname("mgr");
        assert_eq!(
            storage
                .search_users(&query(&visitor, Role::OrgManager, "ada"))
                .unwrap()
                .total_count,
            1
        );

        storage.clear();
        assert_eq!(storage.subject_count(), 0);
        assert!(storage.members_of_roles(&[Role::OrgManager]).unwrap().is_empty());
        assert!(storage.users.is_empty());
        assert!(storage.departments.is_empty());
        assert!(storage.managed_departments.is_empty());
    }
}
