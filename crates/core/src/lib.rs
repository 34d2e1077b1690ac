//! Core domain types and errors for the workshelf catalog cache.
//!
//! This crate establishes the foundational data structures shared by the
//! access and cache crates:
//!
//! - **`errors`**: the primary `Error` enum and `Result` type alias,
//!   centralizing all failure modes for predictable error handling.
//! - **`types`**: the permission model (`AccessPolicy`, `AccessRule`,
//!   `Permission`), catalog entities (`Resource`, `Group`), the cached
//!   per-user view (`UserView`), and the cross-replica `Invalidation`
//!   message.

pub mod errors;
pub mod types;

pub use self::{
    errors::{Error, Result},
    types::*,
};
