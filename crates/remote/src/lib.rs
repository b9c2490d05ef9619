//! Remote API seam for regroup.
//!
//! Everything that touches the remote provider lives here, behind traits so
//! the reconciliation logic stays transport-free:
//!
//! - **[`GroupApi`]**: the asynchronous remote API contract. Every mutating
//!   call returns an [`OperationHandle`] that must be polled to completion.
//! - **[`await_completion`]**: the bounded, cancellable poll loop driving a
//!   handle to its terminal state.
//! - **[`MemberResolver`]**: maps caller identifiers to canonical member
//!   references via a black-box [`ResolverBackend`].
//! - **[`MembershipGateway`]**: lists live members, treating "group absent"
//!   as "no members" on the read path.
//! - **[`MutationExecutor`]**: issues mutations and drives each to
//!   completion before returning.
//! - **[`InMemoryGroupApi`]**: a full in-memory fake with failure injection,
//!   for tests in this crate and above it.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod api;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod memory;
pub mod operation;
pub mod resolver;

// Re-export main types
pub use api::{GroupApi, GroupInfo, OperationError, OperationHandle, OperationStatus};
pub use error::{Error, ResolveError, Result};
pub use executor::MutationExecutor;
pub use gateway::MembershipGateway;
pub use memory::InMemoryGroupApi;
pub use operation::{await_completion, CancelHandle, CancelSignal, PollOpts};
pub use resolver::{MemberResolver, ResolverBackend, StaticResolverBackend};
