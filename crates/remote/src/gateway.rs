//! Live membership reads.
//!
//! On the read path "the group has no members" and "the group is gone" are
//! deliberately uniform: both diff against the empty set. Existence checks
//! go through [`MembershipGateway::group_exists`] instead, where absence is
//! absence.

use std::sync::Arc;

use tracing::debug;

use regroup_core::{GroupIdentity, MemberSet};

use crate::api::GroupApi;
use crate::error::{Error, Result};

/// Read-side gateway over the remote membership listing.
#[derive(Clone)]
pub struct MembershipGateway {
    api: Arc<dyn GroupApi>,
}

impl MembershipGateway {
    /// Create a gateway over a remote API.
    pub fn new(api: Arc<dyn GroupApi>) -> Self {
        Self { api }
    }

    /// List the current live members of a group.
    ///
    /// A missing group yields an empty set, not an error, so callers can
    /// treat "never had members" and "deleted" uniformly for diff purposes.
    ///
    /// # Errors
    ///
    /// Any transport failure other than not-found propagates.
    pub async fn list_members(&self, identity: &GroupIdentity) -> Result<MemberSet> {
        match self.api.list_members(identity).await {
            Ok(refs) => Ok(refs.into_iter().collect()),
            Err(Error::NotFound { .. }) => {
                debug!(group = %identity, "group absent, treating as empty membership");
                Ok(MemberSet::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Whether the group exists at all.
    ///
    /// # Errors
    ///
    /// Any transport failure other than not-found propagates.
    pub async fn group_exists(&self, identity: &GroupIdentity) -> Result<bool> {
        match self.api.get_group(identity).await {
            Ok(_) => Ok(true),
            Err(Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::memory::InMemoryGroupApi;
    use regroup_core::{MemberRef, OpKind};

    fn identity() -> GroupIdentity {
        GroupIdentity::new("workers", "us-central1-a")
    }

    #[tokio::test]
    async fn absent_group_reads_as_empty_membership() {
        let api = Arc::new(InMemoryGroupApi::new());
        let gateway = MembershipGateway::new(api);

        let members = gateway.list_members(&identity()).await.unwrap();
        assert!(members.is_empty());
    }

    #[tokio::test]
    async fn absent_group_is_still_absent_for_existence_checks() {
        let api = Arc::new(InMemoryGroupApi::new());
        let gateway = MembershipGateway::new(api.clone());

        assert!(!gateway.group_exists(&identity()).await.unwrap());

        api.seed_group(&identity(), "", &[]).await;
        assert!(gateway.group_exists(&identity()).await.unwrap());
    }

    #[tokio::test]
    async fn live_members_come_back_as_a_set() {
        let api = Arc::new(InMemoryGroupApi::new());
        api.seed_group(&identity(), "", &[]).await;
        api.set_members(
            &identity(),
            ["a", "b"].into_iter().map(MemberRef::from).collect(),
        )
        .await;

        let gateway = MembershipGateway::new(api);
        let members = gateway.list_members(&identity()).await.unwrap();
        assert_eq!(members.len(), 2);
        assert!(members.contains(&MemberRef::from("a")));
    }

    #[tokio::test]
    async fn transport_failures_propagate() {
        let api = Arc::new(InMemoryGroupApi::new());
        api.seed_group(&identity(), "", &[]).await;
        api.fail_next_submit(OpKind::ListMembers, Error::transport("connection reset"))
            .await;

        let gateway = MembershipGateway::new(api);
        let err = gateway.list_members(&identity()).await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }
}
