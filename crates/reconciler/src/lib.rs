//! Desired-state reconciliation for remote managed groups.
//!
//! This crate converges a remote group resource to a declared
//! [`GroupSpec`](regroup_core::GroupSpec) while tolerating out-of-band drift
//! and the asynchrony of the remote provider:
//!
//! - **Three-way diff**: [`member_diff`] compares the previously-applied
//!   set, the desired set and the live set, never re-adding a member the
//!   remote already has
//! - **Lifecycle**: [`GroupReconciler`] owns the create/read/update/delete
//!   ordering and its partial-progress bookkeeping
//! - **Drift**: declared members missing from the live group are surfaced in
//!   [`GroupObservation::drift`] and re-added on the next update
//!
//! One reconciliation per group identity runs to completion before the next;
//! the calling lifecycle framework is expected to serialize invocations per
//! resource instance. Distinct identities reconcile concurrently because the
//! applied record is a threaded parameter, not process state.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use regroup_core::{AppliedMembers, GroupSpec};
//! use regroup_remote::{CancelSignal, InMemoryGroupApi, StaticResolverBackend};
//! use regroup_reconciler::{GroupReconciler, ReconcilerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let api = Arc::new(InMemoryGroupApi::new());
//!     let backend = Arc::new(
//!         StaticResolverBackend::new().with_instance("node-1", "zones/z/instances/node-1"),
//!     );
//!     let reconciler = GroupReconciler::new(api, backend, ReconcilerConfig::default());
//!
//!     let spec = GroupSpec::new("workers", "z").with_instances(["node-1"]);
//!     let (_handle, cancel) = CancelSignal::new();
//!
//!     let observed = reconciler.create(&spec, &cancel).await.unwrap();
//!     let (observed, applied) = reconciler
//!         .update(&spec, &AppliedMembers::from(observed.state.members), &cancel)
//!         .await
//!         .unwrap();
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod diff;
pub mod error;
pub mod reconciler;

// Re-export main types
pub use diff::{member_diff, MemberDiff};
pub use error::{Error, Result};
pub use reconciler::{
    GroupObservation, GroupReconciler, GroupReconcilerBuilder, ReconcilerConfig,
};
