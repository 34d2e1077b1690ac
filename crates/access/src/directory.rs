//! External collaborator seams: group membership and super-admin lookups.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use workshelf_core::{Group, Result};

/// Membership and ownership lookups against the group store.
///
/// Implementations are expected to be read-only views over whatever row
/// store holds the groups; all methods may be called concurrently.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Member user ids of a group. Empty if the group does not exist.
    async fn members_of(&self, group_id: &str) -> Result<BTreeSet<String>>;

    /// Owning user id of a group, if the group exists.
    async fn owner_of(&self, group_id: &str) -> Result<Option<String>>;

    /// Ids of groups owned by a user.
    async fn groups_owned_by(&self, user_id: &str) -> Result<BTreeSet<String>>;

    /// Ids of groups that list a user as a member.
    async fn groups_containing_member(&self, user_id: &str) -> Result<BTreeSet<String>>;
}

/// Super-admin recognition.
///
/// Super admins get read access to every `Public`/`Custom` resource, so the
/// registry must also be able to enumerate them for cache invalidation.
#[async_trait]
pub trait SuperAdminRegistry: Send + Sync {
    async fn is_super_admin(&self, user_id: &str) -> Result<bool>;

    /// All recognized super-admin user ids.
    async fn super_admin_ids(&self) -> Result<BTreeSet<String>>;
}

/// In-memory group directory.
///
/// Backs unit tests and single-node embeddings where the group store is
/// small enough to mirror in process.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    groups: RwLock<BTreeMap<String, Group>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_group(&self, group: Group) {
        self.groups.write().insert(group.id.clone(), group);
    }

    pub fn remove_group(&self, group_id: &str) {
        self.groups.write().remove(group_id);
    }
}

#[async_trait]
impl GroupDirectory for InMemoryDirectory {
    async fn members_of(&self, group_id: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .groups
            .read()
            .get(group_id)
            .map(|g| g.member_ids.clone())
            .unwrap_or_default())
    }

    async fn owner_of(&self, group_id: &str) -> Result<Option<String>> {
        Ok(self
            .groups
            .read()
            .get(group_id)
            .map(|g| g.owner_id.clone()))
    }

    async fn groups_owned_by(&self, user_id: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .groups
            .read()
            .values()
            .filter(|g| g.owner_id == user_id)
            .map(|g| g.id.clone())
            .collect())
    }

    async fn groups_containing_member(&self, user_id: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .groups
            .read()
            .values()
            .filter(|g| g.member_ids.contains(user_id))
            .map(|g| g.id.clone())
            .collect())
    }
}

/// Super-admin registry backed by a fixed id set supplied from
/// configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticSuperAdmins {
    ids: BTreeSet<String>,
}

impl StaticSuperAdmins {
    pub fn new(ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }
}

#[async_trait]
impl SuperAdminRegistry for StaticSuperAdmins {
    async fn is_super_admin(&self, user_id: &str) -> Result<bool> {
        Ok(self.ids.contains(user_id))
    }

    async fn super_admin_ids(&self) -> Result<BTreeSet<String>> {
        Ok(self.ids.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str, owner: &str, members: &[&str]) -> Group {
        Group {
            id: id.to_string(),
            owner_id: owner.to_string(),
            member_ids: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn in_memory_directory_lookups() {
        let dir = InMemoryDirectory::new();
        dir.insert_group(group("g1", "owner", &["m1", "m2"]));
        dir.insert_group(group("g2", "m1", &[]));

        assert_eq!(
            dir.members_of("g1").await.unwrap(),
            BTreeSet::from(["m1".to_string(), "m2".to_string()])
        );
        assert_eq!(dir.owner_of("g1").await.unwrap(), Some("owner".to_string()));
        assert_eq!(dir.owner_of("missing").await.unwrap(), None);
        assert_eq!(
            dir.groups_owned_by("m1").await.unwrap(),
            BTreeSet::from(["g2".to_string()])
        );
        assert_eq!(
            dir.groups_containing_member("m2").await.unwrap(),
            BTreeSet::from(["g1".to_string()])
        );
    }

    #[tokio::test]
    async fn static_super_admins() {
        let admins = StaticSuperAdmins::new(["root".to_string()]);
        assert!(admins.is_super_admin("root").await.unwrap());
        assert!(!admins.is_super_admin("user").await.unwrap());
        assert_eq!(
            admins.super_admin_ids().await.unwrap(),
            BTreeSet::from(["root".to_string()])
        );
    }
}
