//! Remote group API contract.
//!
//! The provider's wire format and authentication are out of scope; this
//! trait is the full surface the rest of regroup needs from it. Every
//! mutating call is asynchronous on the remote side and returns an
//! [`OperationHandle`] to be driven by [`crate::await_completion`].

use async_trait::async_trait;

use regroup_core::{Fingerprint, GroupIdentity, MemberRef, NamedPort};

use crate::error::Result;

/// Handle to an in-flight remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    /// Remote operation name.
    pub name: String,
    /// Zone the operation runs in.
    pub zone: String,
}

/// Structured cause of a remote-reported operation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    /// Remote error code.
    pub code: String,
    /// Human-readable detail.
    pub message: String,
}

/// Observed status of an in-flight operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    /// Queued, not started.
    Pending,
    /// Started, not terminal.
    Running,
    /// Terminal; `None` means success.
    Done(Option<OperationError>),
}

/// Live group attributes returned by a read, without membership.
///
/// Membership is listed separately; see [`crate::MembershipGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    /// Version token for named-port mutations.
    pub fingerprint: Fingerprint,
    /// Network the group is attached to.
    pub network: String,
    /// Member count as reported by the remote system.
    pub size: u64,
    /// Canonical self link.
    pub self_link: String,
    /// Current named ports.
    pub named_ports: Vec<NamedPort>,
}

/// The remote group API.
///
/// Implementations must distinguish not-found, conflict and generic failure
/// as separate [`crate::Error`] kinds; callers depend on that to decide
/// between "no members", "re-read and retry" and "propagate".
#[async_trait]
pub trait GroupApi: Send + Sync {
    /// Create a group with its immutable fields and initial named ports.
    async fn insert_group(
        &self,
        identity: &GroupIdentity,
        description: &str,
        named_ports: &[NamedPort],
    ) -> Result<OperationHandle>;

    /// Read live group attributes.
    async fn get_group(&self, identity: &GroupIdentity) -> Result<GroupInfo>;

    /// Delete a group. Remaining members are implicitly detached remotely.
    async fn delete_group(&self, identity: &GroupIdentity) -> Result<OperationHandle>;

    /// List current live members.
    async fn list_members(&self, identity: &GroupIdentity) -> Result<Vec<MemberRef>>;

    /// Add members to a group. Adding an already-present member is a remote
    /// error.
    async fn add_members(
        &self,
        identity: &GroupIdentity,
        members: &[MemberRef],
    ) -> Result<OperationHandle>;

    /// Remove members from a group. Removing an absent member is a remote
    /// no-op.
    async fn remove_members(
        &self,
        identity: &GroupIdentity,
        members: &[MemberRef],
    ) -> Result<OperationHandle>;

    /// Replace the named ports, guarded by the latest fingerprint.
    async fn set_named_ports(
        &self,
        identity: &GroupIdentity,
        fingerprint: &Fingerprint,
        named_ports: &[NamedPort],
    ) -> Result<OperationHandle>;

    /// Observe the status of an in-flight operation.
    async fn operation_status(&self, handle: &OperationHandle) -> Result<OperationStatus>;
}
