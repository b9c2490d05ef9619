//! Group lifecycle reconciliation.

use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, info, warn};

use regroup_core::{
    AppliedMembers, GroupIdentity, GroupSpec, GroupState, MemberSet, OpKind,
};
use regroup_remote::{
    CancelSignal, GroupApi, MemberResolver, MembershipGateway, MutationExecutor, PollOpts,
    ResolverBackend,
};

use crate::diff::member_diff;
use crate::error::{Error, Result};

/// Configuration for the reconciler.
#[derive(Debug, Clone, Default)]
pub struct ReconcilerConfig {
    /// Operation polling behavior.
    pub poll: PollOpts,
}

impl ReconcilerConfig {
    /// Short polling intervals for tests.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            poll: PollOpts::for_testing(),
        }
    }
}

/// Result of observing a group: caller-visible state plus detected drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupObservation {
    /// Last-observed live state. `members` holds declared members observed
    /// live; members never declared are not surfaced even when live.
    pub state: GroupState,
    /// Declared members missing from the live group (removed out-of-band).
    /// They are re-added by the next update.
    pub drift: MemberSet,
}

/// Converges a remote group to its declared spec.
///
/// One reconciliation per group identity must run to completion before the
/// next; the calling lifecycle framework serializes invocations per
/// resource. Sub-steps within one reconciliation are strictly sequential and
/// each is awaited before the next begins.
pub struct GroupReconciler {
    api: Arc<dyn GroupApi>,
    resolver: MemberResolver,
    gateway: MembershipGateway,
    executor: MutationExecutor,
}

impl std::fmt::Debug for GroupReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupReconciler").finish_non_exhaustive()
    }
}

impl GroupReconciler {
    /// Create a reconciler over a remote API and a resolver backend.
    pub fn new(
        api: Arc<dyn GroupApi>,
        backend: Arc<dyn ResolverBackend>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            resolver: MemberResolver::new(backend),
            gateway: MembershipGateway::new(api.clone()),
            executor: MutationExecutor::new(api.clone(), config.poll),
            api,
        }
    }

    /// Create a group from its spec and populate initial membership.
    ///
    /// The first reconciliation has no applied baseline, so the full
    /// resolved set is added outright rather than diffed. A failure after
    /// the group exists but before members are populated surfaces with the
    /// group identity attached; a subsequent update with an empty applied
    /// record completes membership population.
    ///
    /// # Errors
    ///
    /// Resolution failures surface before any remote call is made.
    pub async fn create(
        &self,
        spec: &GroupSpec,
        cancel: &CancelSignal,
    ) -> Result<GroupObservation> {
        let identity = spec.identity();
        let desired = self.resolver.resolve(&spec.instances).await?;

        info!(group = %identity, members = desired.len(), "creating group");
        self.executor
            .insert_group(&identity, &spec.description, &spec.named_ports, cancel)
            .await
            .map_err(|e| Error::operation(OpKind::Insert, &identity, e))?;

        if !desired.is_empty() {
            self.executor
                .add_members(&identity, &desired, cancel)
                .await
                .map_err(|e| Error::operation(OpKind::AddMembers, &identity, e))?;
        }

        self.require_observation(spec, &identity).await
    }

    /// Observe a group's live state.
    ///
    /// Returns `Ok(None)` when the group no longer exists, so the caller can
    /// clear its record. The caller-visible member set is the declared set
    /// cross-referenced against live membership: declared members missing
    /// from live are reported as drift, live members never declared are not
    /// surfaced.
    ///
    /// # Errors
    ///
    /// Transport failures other than not-found propagate, annotated with the
    /// operation kind and identity.
    pub async fn read(&self, spec: &GroupSpec) -> Result<Option<GroupObservation>> {
        let identity = spec.identity();

        let info = match self.api.get_group(&identity).await {
            Ok(info) => info,
            Err(e) if e.is_not_found() => {
                debug!(group = %identity, "group absent on read");
                return Ok(None);
            }
            Err(e) => return Err(Error::operation(OpKind::Get, &identity, e)),
        };

        let live = self
            .gateway
            .list_members(&identity)
            .await
            .map_err(|e| Error::operation(OpKind::ListMembers, &identity, e))?;

        let (members, drift) = if spec.instances.is_empty() {
            (MemberSet::new(), MemberSet::new())
        } else {
            let declared = self.resolver.resolve(&spec.instances).await?;
            let drift = declared.difference(&live);
            if !drift.is_empty() {
                warn!(
                    group = %identity,
                    missing = %drift.iter().join(", "),
                    "declared members missing from live group"
                );
            }
            (declared.intersection(&live), drift)
        };

        Ok(Some(GroupObservation {
            state: GroupState {
                fingerprint: info.fingerprint,
                network: info.network,
                size: info.size,
                self_link: info.self_link,
                members,
                named_ports: info.named_ports,
            },
            drift,
        }))
    }

    /// Converge the group to its spec.
    ///
    /// Refreshes the live baseline first, then applies removals before
    /// additions (avoids transient over-capacity and a remove racing an add
    /// of the same reference), then replaces named ports under a
    /// freshly-read fingerprint. Each sub-step completes before the next
    /// begins; partial completion is observable by the next cycle, never
    /// rolled back.
    ///
    /// Returns the refreshed observation and the new applied record for the
    /// caller's persistence layer.
    ///
    /// # Errors
    ///
    /// A named-port conflict is retried exactly once after a fingerprint
    /// re-read; every other failure surfaces on first occurrence.
    pub async fn update(
        &self,
        spec: &GroupSpec,
        applied: &AppliedMembers,
        cancel: &CancelSignal,
    ) -> Result<(GroupObservation, AppliedMembers)> {
        let identity = spec.identity();
        let desired = self.resolver.resolve(&spec.instances).await?;

        // Refresh the live baseline; drift since the last cycle must feed
        // the diff, not the stale applied record alone.
        let live = self
            .gateway
            .list_members(&identity)
            .await
            .map_err(|e| Error::operation(OpKind::ListMembers, &identity, e))?;

        let diff = member_diff(applied.as_set(), &desired, &live);
        info!(
            group = %identity,
            add = diff.to_add.len(),
            remove = diff.to_remove.len(),
            "reconciling membership"
        );

        if !diff.to_remove.is_empty() {
            self.executor
                .remove_members(&identity, &diff.to_remove, cancel)
                .await
                .map_err(|e| Error::operation(OpKind::RemoveMembers, &identity, e))?;
        }

        if !diff.to_add.is_empty() {
            self.executor
                .add_members(&identity, &diff.to_add, cancel)
                .await
                .map_err(|e| Error::operation(OpKind::AddMembers, &identity, e))?;
        }

        self.converge_named_ports(spec, &identity, cancel).await?;

        let observation = self.require_observation(spec, &identity).await?;
        Ok((observation, AppliedMembers::from(desired)))
    }

    /// Delete the group.
    ///
    /// Unconditional on membership: remaining members are implicitly
    /// detached by the remote system. An already-absent group is success, so
    /// retries are idempotent.
    ///
    /// # Errors
    ///
    /// Transport failures and terminal operation failures propagate,
    /// annotated with the identity.
    pub async fn delete(&self, identity: &GroupIdentity, cancel: &CancelSignal) -> Result<()> {
        match self.executor.delete_group(identity, cancel).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(group = %identity, "group already absent on delete");
                Ok(())
            }
            Err(e) => Err(Error::operation(OpKind::Delete, identity, e)),
        }
    }

    /// Replace named ports when the live set differs from the spec.
    ///
    /// The fingerprint is read immediately before the mutation; a conflict
    /// (concurrent remote mutation) triggers one re-read and a single retry.
    async fn converge_named_ports(
        &self,
        spec: &GroupSpec,
        identity: &GroupIdentity,
        cancel: &CancelSignal,
    ) -> Result<()> {
        let info = self
            .api
            .get_group(identity)
            .await
            .map_err(|e| Error::operation(OpKind::Get, identity, e))?;

        if info.named_ports == spec.named_ports {
            return Ok(());
        }

        match self
            .executor
            .set_named_ports(identity, &info.fingerprint, &spec.named_ports, cancel)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_conflict() => {
                warn!(group = %identity, "fingerprint conflict, re-reading and retrying once");
                let fresh = self
                    .api
                    .get_group(identity)
                    .await
                    .map_err(|e| Error::operation(OpKind::Get, identity, e))?;
                self.executor
                    .set_named_ports(identity, &fresh.fingerprint, &spec.named_ports, cancel)
                    .await
                    .map_err(|e| Error::operation(OpKind::SetNamedPorts, identity, e))
            }
            Err(e) => Err(Error::operation(OpKind::SetNamedPorts, identity, e)),
        }
    }

    /// Read after a mutation; the group is expected to exist.
    async fn require_observation(
        &self,
        spec: &GroupSpec,
        identity: &GroupIdentity,
    ) -> Result<GroupObservation> {
        self.read(spec).await?.ok_or_else(|| {
            Error::operation(
                OpKind::Get,
                identity,
                regroup_remote::Error::not_found(format!("group '{identity}'")),
            )
        })
    }
}

/// Builder for [`GroupReconciler`].
pub struct GroupReconcilerBuilder {
    api: Option<Arc<dyn GroupApi>>,
    backend: Option<Arc<dyn ResolverBackend>>,
    config: ReconcilerConfig,
}

impl GroupReconcilerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            api: None,
            backend: None,
            config: ReconcilerConfig::default(),
        }
    }

    /// Set the remote API.
    #[must_use]
    pub fn with_api(mut self, api: Arc<dyn GroupApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Set the resolver backend.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn ResolverBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the reconciler.
    ///
    /// # Errors
    ///
    /// Fails when the API or resolver backend is missing.
    pub fn build(self) -> Result<GroupReconciler> {
        let api = self
            .api
            .ok_or_else(|| Error::invalid_config("remote API is required"))?;
        let backend = self
            .backend
            .ok_or_else(|| Error::invalid_config("resolver backend is required"))?;
        Ok(GroupReconciler::new(api, backend, self.config))
    }
}

impl Default for GroupReconcilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
