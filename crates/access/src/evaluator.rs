//! Policy evaluation: may this principal read or write this resource?

use crate::directory::{GroupDirectory, SuperAdminRegistry};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;
use workshelf_core::{AccessPolicy, AccessRule, Permission, Resource};

/// Pure access decision over a resource's policy.
///
/// Checks run cheapest-first: owner short-circuit, then the policy variant,
/// then direct user-id matches, then group lookups, and the super-admin
/// override last since it needs an external registry hit and rarely
/// matters. Directory or registry failures fail closed.
pub struct AccessEvaluator {
    directory: Arc<dyn GroupDirectory>,
    admins: Arc<dyn SuperAdminRegistry>,
}

impl AccessEvaluator {
    pub fn new(directory: Arc<dyn GroupDirectory>, admins: Arc<dyn SuperAdminRegistry>) -> Self {
        Self { directory, admins }
    }

    /// Whether `user_id` holds `permission` on `resource`.
    ///
    /// Never errors: lookup outages deny instead of granting.
    pub async fn can_access(
        &self,
        user_id: &str,
        resource: &Resource,
        permission: Permission,
    ) -> bool {
        // The owner always has full access, whatever the policy says.
        if user_id == resource.owner_id {
            return true;
        }

        match &resource.policy {
            // Private is absolute: no other principal, super admins included.
            AccessPolicy::Private => false,
            AccessPolicy::Public => permission == Permission::Read,
            AccessPolicy::Custom { read, write } => {
                // Write implies read, so a read check also accepts the
                // write rule. Write requires the write rule specifically.
                let mut rules: Vec<&AccessRule> = vec![write];
                if permission == Permission::Read {
                    rules.push(read);
                }

                if rules.iter().any(|rule| rule.user_ids.contains(user_id)) {
                    return true;
                }

                let wanted: BTreeSet<&str> = rules
                    .iter()
                    .flat_map(|rule| rule.group_ids.iter().map(String::as_str))
                    .collect();
                if !wanted.is_empty() && self.in_any_group(user_id, &wanted).await {
                    return true;
                }

                permission == Permission::Read && self.is_super_admin(user_id).await
            }
        }
    }

    /// Whether the user is a member or the owner of any of the wanted
    /// groups. Lookup failures count as "no group access".
    async fn in_any_group(&self, user_id: &str, wanted: &BTreeSet<&str>) -> bool {
        let member_of = match self.directory.groups_containing_member(user_id).await {
            Ok(ids) => ids,
            Err(error) => {
                warn!(user_id, %error, "group membership lookup failed; denying group access");
                BTreeSet::new()
            }
        };
        if member_of.iter().any(|id| wanted.contains(id.as_str())) {
            return true;
        }

        let owned = match self.directory.groups_owned_by(user_id).await {
            Ok(ids) => ids,
            Err(error) => {
                warn!(user_id, %error, "group ownership lookup failed; denying group access");
                BTreeSet::new()
            }
        };
        owned.iter().any(|id| wanted.contains(id.as_str()))
    }

    async fn is_super_admin(&self, user_id: &str) -> bool {
        match self.admins.is_super_admin(user_id).await {
            Ok(is_admin) => is_admin,
            Err(error) => {
                warn!(user_id, %error, "super-admin lookup failed; denying override");
                false
            }
        }
    }
}

impl std::fmt::Debug for AccessEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessEvaluator").finish_non_exhaustive()
    }
}
