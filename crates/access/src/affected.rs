//! Computes which users' cached views a resource mutation may invalidate.

use crate::directory::{GroupDirectory, SuperAdminRegistry};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;
use workshelf_core::{AccessPolicy, Invalidation, Resource};

/// Invalidation set computer.
///
/// Over-approximating is fine (an unnecessarily invalidated user pays one
/// cheap recompute); under-approximating is a correctness bug. Any lookup
/// failure therefore escalates to a full-cache clear instead of guessing.
pub struct AffectedUsers {
    directory: Arc<dyn GroupDirectory>,
    admins: Arc<dyn SuperAdminRegistry>,
}

impl AffectedUsers {
    pub fn new(directory: Arc<dyn GroupDirectory>, admins: Arc<dyn SuperAdminRegistry>) -> Self {
        Self { directory, admins }
    }

    /// Users whose cached view may include `resource`.
    ///
    /// Always contains the owner; for custom policies it adds every listed
    /// user plus the owner and members of every referenced group; super
    /// admins are always included since they see all non-private resources.
    pub async fn for_resource(&self, resource: &Resource) -> Invalidation {
        let mut users = BTreeSet::from([resource.owner_id.clone()]);

        if let AccessPolicy::Custom { .. } = &resource.policy {
            users.extend(
                resource
                    .policy
                    .listed_user_ids()
                    .into_iter()
                    .map(str::to_string),
            );

            for group_id in resource.policy.referenced_group_ids() {
                match self.directory.owner_of(group_id).await {
                    Ok(Some(owner)) => {
                        users.insert(owner);
                    }
                    // Group deleted since the policy was written; nobody
                    // holds access through it anymore.
                    Ok(None) => {}
                    Err(error) => {
                        warn!(group_id, %error, "group owner lookup failed; escalating to full clear");
                        return Invalidation::All;
                    }
                }
                match self.directory.members_of(group_id).await {
                    Ok(members) => users.extend(members),
                    Err(error) => {
                        warn!(group_id, %error, "group member lookup failed; escalating to full clear");
                        return Invalidation::All;
                    }
                }
            }
        }

        match self.admins.super_admin_ids().await {
            Ok(admin_ids) => users.extend(admin_ids),
            Err(error) => {
                warn!(%error, "super-admin enumeration failed; escalating to full clear");
                return Invalidation::All;
            }
        }

        Invalidation::Users(users)
    }
}

impl std::fmt::Debug for AffectedUsers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffectedUsers").finish_non_exhaustive()
    }
}
