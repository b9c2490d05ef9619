//! Mutation execution.
//!
//! Each mutation is issued, then driven to its terminal state through the
//! operation poll loop before the executor returns. Nothing here retries:
//! failure reporting and retry policy belong to the caller.

use std::sync::Arc;

use tracing::{debug, info};

use regroup_core::{Fingerprint, GroupIdentity, MemberRef, MemberSet, NamedPort, OpKind};

use crate::api::GroupApi;
use crate::error::Result;
use crate::operation::{await_completion, CancelSignal, PollOpts};

/// Issues remote mutations and awaits their completion.
#[derive(Clone)]
pub struct MutationExecutor {
    api: Arc<dyn GroupApi>,
    poll: PollOpts,
}

impl MutationExecutor {
    /// Create an executor over a remote API.
    pub fn new(api: Arc<dyn GroupApi>, poll: PollOpts) -> Self {
        Self { api, poll }
    }

    /// Create a group and await completion.
    ///
    /// # Errors
    ///
    /// Submit failures and terminal operation failures surface verbatim.
    pub async fn insert_group(
        &self,
        identity: &GroupIdentity,
        description: &str,
        named_ports: &[NamedPort],
        cancel: &CancelSignal,
    ) -> Result<()> {
        info!(group = %identity, ports = named_ports.len(), "creating group");
        let handle = self
            .api
            .insert_group(identity, description, named_ports)
            .await?;
        await_completion(self.api.as_ref(), OpKind::Insert, &handle, &self.poll, cancel).await
    }

    /// Delete a group and await completion.
    ///
    /// # Errors
    ///
    /// Submit failures and terminal operation failures surface verbatim.
    pub async fn delete_group(&self, identity: &GroupIdentity, cancel: &CancelSignal) -> Result<()> {
        info!(group = %identity, "deleting group");
        let handle = self.api.delete_group(identity).await?;
        await_completion(self.api.as_ref(), OpKind::Delete, &handle, &self.poll, cancel).await
    }

    /// Add members and await completion.
    ///
    /// An empty batch is a no-op; callers should not send one, but the
    /// executor does not rely on that.
    ///
    /// # Errors
    ///
    /// Adding an already-present member is a hard remote error and surfaces
    /// as [`crate::Error::OperationFailed`].
    pub async fn add_members(
        &self,
        identity: &GroupIdentity,
        members: &MemberSet,
        cancel: &CancelSignal,
    ) -> Result<()> {
        if members.is_empty() {
            debug!(group = %identity, "empty add batch, nothing to do");
            return Ok(());
        }
        info!(group = %identity, count = members.len(), "adding members");
        let batch: Vec<MemberRef> = members.iter().cloned().collect();
        let handle = self.api.add_members(identity, &batch).await?;
        await_completion(self.api.as_ref(), OpKind::AddMembers, &handle, &self.poll, cancel).await
    }

    /// Remove members and await completion.
    ///
    /// Removal of an already-absent member is a remote no-op; the batch is
    /// not pre-filtered here. An empty batch is a local no-op.
    ///
    /// # Errors
    ///
    /// Submit failures and terminal operation failures surface verbatim.
    pub async fn remove_members(
        &self,
        identity: &GroupIdentity,
        members: &MemberSet,
        cancel: &CancelSignal,
    ) -> Result<()> {
        if members.is_empty() {
            debug!(group = %identity, "empty remove batch, nothing to do");
            return Ok(());
        }
        info!(group = %identity, count = members.len(), "removing members");
        let batch: Vec<MemberRef> = members.iter().cloned().collect();
        let handle = self.api.remove_members(identity, &batch).await?;
        await_completion(
            self.api.as_ref(),
            OpKind::RemoveMembers,
            &handle,
            &self.poll,
            cancel,
        )
        .await
    }

    /// Replace the named ports under the given fingerprint and await
    /// completion.
    ///
    /// The fingerprint must come from a read taken immediately before this
    /// call; the remote rejects stale ones.
    ///
    /// # Errors
    ///
    /// A stale fingerprint surfaces as [`crate::Error::Conflict`], untouched,
    /// so the caller can decide to re-read and retry.
    pub async fn set_named_ports(
        &self,
        identity: &GroupIdentity,
        fingerprint: &Fingerprint,
        named_ports: &[NamedPort],
        cancel: &CancelSignal,
    ) -> Result<()> {
        info!(group = %identity, ports = named_ports.len(), "setting named ports");
        let handle = self
            .api
            .set_named_ports(identity, fingerprint, named_ports)
            .await?;
        await_completion(
            self.api.as_ref(),
            OpKind::SetNamedPorts,
            &handle,
            &self.poll,
            cancel,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::error::Error;
    use crate::memory::InMemoryGroupApi;

    fn identity() -> GroupIdentity {
        GroupIdentity::new("workers", "us-central1-a")
    }

    fn set(refs: &[&str]) -> MemberSet {
        refs.iter().copied().map(MemberRef::from).collect()
    }

    fn executor(api: &Arc<InMemoryGroupApi>) -> MutationExecutor {
        MutationExecutor::new(api.clone(), PollOpts::for_testing())
    }

    #[tokio::test]
    async fn empty_batches_issue_no_remote_calls() {
        let api = Arc::new(InMemoryGroupApi::new());
        api.seed_group(&identity(), "", &[]).await;
        let exec = executor(&api);
        let (_h, cancel) = CancelSignal::new();

        exec.add_members(&identity(), &MemberSet::new(), &cancel)
            .await
            .unwrap();
        exec.remove_members(&identity(), &MemberSet::new(), &cancel)
            .await
            .unwrap();

        assert!(api.submitted().await.is_empty());
    }

    #[tokio::test]
    async fn add_and_remove_converge_membership() {
        let api = Arc::new(InMemoryGroupApi::new());
        api.seed_group(&identity(), "", &[]).await;
        let exec = executor(&api);
        let (_h, cancel) = CancelSignal::new();

        exec.add_members(&identity(), &set(&["a", "b"]), &cancel)
            .await
            .unwrap();
        exec.remove_members(&identity(), &set(&["a"]), &cancel)
            .await
            .unwrap();

        assert_eq!(api.members_of(&identity()).await.unwrap(), set(&["b"]));
    }

    #[tokio::test]
    async fn adding_a_present_member_is_a_hard_error() {
        let api = Arc::new(InMemoryGroupApi::new());
        api.seed_group(&identity(), "", &[]).await;
        let exec = executor(&api);
        let (_h, cancel) = CancelSignal::new();

        exec.add_members(&identity(), &set(&["a"]), &cancel)
            .await
            .unwrap();
        let err = exec
            .add_members(&identity(), &set(&["a"]), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OperationFailed { .. }));
    }

    #[tokio::test]
    async fn removing_an_absent_member_is_a_no_op() {
        let api = Arc::new(InMemoryGroupApi::new());
        api.seed_group(&identity(), "", &[]).await;
        let exec = executor(&api);
        let (_h, cancel) = CancelSignal::new();

        exec.remove_members(&identity(), &set(&["ghost"]), &cancel)
            .await
            .unwrap();
        assert!(api.members_of(&identity()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_fingerprint_surfaces_as_conflict() {
        let api = Arc::new(InMemoryGroupApi::new());
        api.seed_group(&identity(), "", &[]).await;
        let exec = executor(&api);
        let (_h, cancel) = CancelSignal::new();

        let stale = Fingerprint::new("stale-token");
        let ports = vec![NamedPort::new("http", 8080).unwrap()];
        let err = exec
            .set_named_ports(&identity(), &stale, &ports, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn fresh_fingerprint_replaces_ports_and_bumps_token() {
        let api = Arc::new(InMemoryGroupApi::new());
        api.seed_group(&identity(), "", &[]).await;
        let exec = executor(&api);
        let (_h, cancel) = CancelSignal::new();

        let before = api.get_group(&identity()).await.unwrap();
        let ports = vec![NamedPort::new("http", 8080).unwrap()];
        exec.set_named_ports(&identity(), &before.fingerprint, &ports, &cancel)
            .await
            .unwrap();

        let after = api.get_group(&identity()).await.unwrap();
        assert_eq!(after.named_ports, ports);
        assert_ne!(after.fingerprint, before.fingerprint);
    }
}
