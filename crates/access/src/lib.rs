//! Access policy evaluation for the workshelf catalog.
//!
//! Decides, given a resource's [`AccessPolicy`](workshelf_core::AccessPolicy)
//! and a principal's group memberships, whether that principal may read or
//! write the resource, and computes which users' cached views a resource
//! mutation may invalidate.
//!
//! Group membership and super-admin status live outside this crate and are
//! reached through the [`GroupDirectory`] and [`SuperAdminRegistry`] seams.
//! Every lookup failure fails closed: an outage can slow a request or
//! over-invalidate a cache, never grant unintended access.

pub mod affected;
pub mod directory;
pub mod evaluator;

pub use affected::AffectedUsers;
pub use directory::{GroupDirectory, InMemoryDirectory, StaticSuperAdmins, SuperAdminRegistry};
pub use evaluator::AccessEvaluator;
