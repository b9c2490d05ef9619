//! Core types and errors for regroup.
//!
//! This crate holds the domain model shared by every other regroup crate:
//!
//! - **Member references**: opaque canonical references to remote compute
//!   instances, collected into [`MemberSet`]s with set semantics
//! - **Group records**: the desired-state [`GroupSpec`] and the last-observed
//!   [`GroupState`]
//! - **Named ports**: versioned service-port mappings guarded by a
//!   [`Fingerprint`]
//! - **Applied record**: the [`AppliedMembers`] set threaded through update
//!   cycles by the caller's persistence layer

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod types;

// Re-export main types
pub use error::{Error, Result};
pub use types::{
    AppliedMembers, Fingerprint, GroupIdentity, GroupSpec, GroupState, MemberRef, MemberSet,
    NamedPort, OpKind,
};
