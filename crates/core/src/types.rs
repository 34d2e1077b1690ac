//! Domain types for the access-filtered resource catalog.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::SystemTime;

/// Kind tag carried by catalog resources.
///
/// Informational only: access evaluation is kind-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Model,
    Tool,
    Prompt,
    Knowledge,
}

/// Requested permission when evaluating a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Read,
    Write,
}

/// One half of a [`AccessPolicy::Custom`] policy: the users and groups the
/// rule grants to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    #[serde(default)]
    pub user_ids: BTreeSet<String>,
    #[serde(default)]
    pub group_ids: BTreeSet<String>,
}

impl AccessRule {
    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty() && self.group_ids.is_empty()
    }
}

/// Permission structure attached to a resource.
///
/// An explicit tagged type: there is no "falsy dict" middle ground, every
/// resource is exactly one of these three shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessPolicy {
    /// Everyone may read; only the owner may write.
    Public,
    /// Only the owner has any access, super admins included.
    Private,
    /// Explicit read and write rules. Write implies read.
    Custom { read: AccessRule, write: AccessRule },
}

impl AccessPolicy {
    /// Group ids referenced by either rule of a custom policy.
    pub fn referenced_group_ids(&self) -> BTreeSet<&str> {
        match self {
            Self::Custom { read, write } => read
                .group_ids
                .iter()
                .chain(write.group_ids.iter())
                .map(String::as_str)
                .collect(),
            _ => BTreeSet::new(),
        }
    }

    /// User ids listed directly in either rule of a custom policy.
    pub fn listed_user_ids(&self) -> BTreeSet<&str> {
        match self {
            Self::Custom { read, write } => read
                .user_ids
                .iter()
                .chain(write.user_ids.iter())
                .map(String::as_str)
                .collect(),
            _ => BTreeSet::new(),
        }
    }
}

/// A user group. The owner has implicit access to everything the group can
/// access, even when not listed as a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub owner_id: String,
    #[serde(default)]
    pub member_ids: BTreeSet<String>,
}

/// A catalog resource as seen by the authorization and caching layers.
///
/// Persistence of the full resource row is external; these are the fields
/// authorization needs plus whatever snapshot data the catalog assembler
/// chooses to cache alongside them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub owner_id: String,
    pub kind: ResourceKind,
    pub policy: AccessPolicy,
}

/// A user's access-filtered snapshot of the catalog, keyed by resource id.
///
/// The logical TTL is carried by the cache store, not the entry; the
/// timestamp here records when the view was last recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub resources: BTreeMap<String, Resource>,
    pub refreshed_at: SystemTime,
}

impl UserView {
    pub fn new(resources: BTreeMap<String, Resource>) -> Self {
        Self {
            resources,
            refreshed_at: SystemTime::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }
}

/// Wire payload meaning "clear entire cache for all users".
const INVALIDATE_ALL: &str = "all";

/// Scope of a cache invalidation, carried across replicas over pub/sub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// Drop every cached view everywhere.
    All,
    /// Drop only these users' cached views.
    Users(BTreeSet<String>),
}

impl Invalidation {
    /// Invalidation scoped to a single user.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::Users(BTreeSet::from([user_id.into()]))
    }

    /// Encode for the invalidation channel: the literal `"all"` or a JSON
    /// array of user ids.
    pub fn to_payload(&self) -> String {
        match self {
            Self::All => INVALIDATE_ALL.to_string(),
            // BTreeSet<String> serialization cannot fail
            Self::Users(users) => {
                serde_json::to_string(users).unwrap_or_else(|_| INVALIDATE_ALL.to_string())
            }
        }
    }

    /// Decode a channel payload. Anything malformed decodes to [`Self::All`]:
    /// over-invalidating costs a recompute, under-invalidating is a
    /// correctness bug.
    pub fn from_payload(raw: &str) -> Self {
        if raw == INVALIDATE_ALL {
            return Self::All;
        }
        match serde_json::from_str::<BTreeSet<String>>(raw) {
            Ok(users) => Self::Users(users),
            Err(_) => Self::All,
        }
    }
}
