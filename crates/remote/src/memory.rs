//! In-memory remote API for testing.
//!
//! A full [`GroupApi`] over in-process state, mirroring the remote
//! semantics this crate is written against: asynchronous operations that
//! complete after a configurable number of status polls, fingerprints that
//! rotate on every named-port write, hard errors on double-add and silent
//! no-ops on absent-remove. Failure injection covers both the submit path
//! and terminal operation outcomes, and a backdoor mutates membership to
//! simulate out-of-band drift.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use regroup_core::{Fingerprint, GroupIdentity, MemberRef, MemberSet, NamedPort, OpKind};

use crate::api::{GroupApi, GroupInfo, OperationError, OperationHandle, OperationStatus};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct GroupRecord {
    description: String,
    network: String,
    self_link: String,
    fingerprint: Fingerprint,
    named_ports: Vec<NamedPort>,
    members: MemberSet,
}

#[derive(Debug)]
struct PendingOp {
    remaining_polls: u32,
    outcome: Option<OperationError>,
}

#[derive(Debug, Default)]
struct Inner {
    groups: HashMap<GroupIdentity, GroupRecord>,
    operations: HashMap<String, PendingOp>,
    submitted: Vec<OpKind>,
    fail_submit: HashMap<OpKind, VecDeque<Error>>,
    fail_operation: HashMap<OpKind, VecDeque<OperationError>>,
    polls_until_done: u32,
    never_complete: bool,
    op_seq: u64,
    fp_seq: u64,
}

impl Inner {
    fn next_fingerprint(&mut self) -> Fingerprint {
        self.fp_seq += 1;
        Fingerprint::new(format!("fp-{}", self.fp_seq))
    }

    fn take_submit_failure(&mut self, kind: OpKind) -> Option<Error> {
        self.fail_submit.get_mut(&kind).and_then(VecDeque::pop_front)
    }

    fn take_operation_failure(&mut self, kind: OpKind) -> Option<OperationError> {
        self.fail_operation
            .get_mut(&kind)
            .and_then(VecDeque::pop_front)
    }

    fn begin_op(&mut self, zone: &str, outcome: Option<OperationError>) -> OperationHandle {
        self.op_seq += 1;
        let name = format!("op-{}", self.op_seq);
        self.operations.insert(
            name.clone(),
            PendingOp {
                remaining_polls: self.polls_until_done,
                outcome,
            },
        );
        OperationHandle {
            name,
            zone: zone.to_string(),
        }
    }

    fn record(&self, identity: &GroupIdentity) -> Result<&GroupRecord> {
        self.groups
            .get(identity)
            .ok_or_else(|| Error::not_found(format!("group '{identity}'")))
    }
}

/// In-memory [`GroupApi`] implementation.
#[derive(Clone, Default)]
pub struct InMemoryGroupApi {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryGroupApi {
    /// Create an empty fake with operations completing on the second poll.
    pub fn new() -> Self {
        let inner = Inner {
            polls_until_done: 1,
            ..Inner::default()
        };
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Number of status polls an operation stays non-terminal.
    pub async fn set_polls_until_done(&self, polls: u32) {
        self.inner.write().await.polls_until_done = polls;
    }

    /// When set, operations never reach a terminal state.
    pub async fn set_never_complete(&self, never: bool) {
        self.inner.write().await.never_complete = never;
    }

    /// Queue a submit-time failure for the next call of the given kind.
    pub async fn fail_next_submit(&self, kind: OpKind, error: Error) {
        self.inner
            .write()
            .await
            .fail_submit
            .entry(kind)
            .or_default()
            .push_back(error);
    }

    /// Queue a terminal operation failure for the next call of the given
    /// kind. The call's effect is not applied.
    pub async fn fail_next_operation(&self, kind: OpKind, cause: OperationError) {
        self.inner
            .write()
            .await
            .fail_operation
            .entry(kind)
            .or_default()
            .push_back(cause);
    }

    /// Create a group directly, bypassing the operation machinery.
    pub async fn seed_group(
        &self,
        identity: &GroupIdentity,
        description: &str,
        named_ports: &[NamedPort],
    ) {
        let mut inner = self.inner.write().await;
        let fingerprint = inner.next_fingerprint();
        inner.groups.insert(
            identity.clone(),
            GroupRecord {
                description: description.to_string(),
                network: "default".to_string(),
                self_link: self_link_for(identity),
                fingerprint,
                named_ports: named_ports.to_vec(),
                members: MemberSet::new(),
            },
        );
    }

    /// Replace a group's membership directly, simulating out-of-band drift.
    pub async fn set_members(&self, identity: &GroupIdentity, members: MemberSet) {
        if let Some(record) = self.inner.write().await.groups.get_mut(identity) {
            record.members = members;
        }
    }

    /// Current live membership, if the group exists.
    pub async fn members_of(&self, identity: &GroupIdentity) -> Option<MemberSet> {
        self.inner
            .read()
            .await
            .groups
            .get(identity)
            .map(|r| r.members.clone())
    }

    /// Whether the group exists.
    pub async fn contains_group(&self, identity: &GroupIdentity) -> bool {
        self.inner.read().await.groups.contains_key(identity)
    }

    /// Kinds of every API call submitted so far, in order.
    pub async fn submitted(&self) -> Vec<OpKind> {
        self.inner.read().await.submitted.clone()
    }
}

fn self_link_for(identity: &GroupIdentity) -> String {
    format!(
        "https://compute.example/zones/{}/instanceGroups/{}",
        identity.zone, identity.name
    )
}

#[async_trait]
impl GroupApi for InMemoryGroupApi {
    async fn insert_group(
        &self,
        identity: &GroupIdentity,
        description: &str,
        named_ports: &[NamedPort],
    ) -> Result<OperationHandle> {
        let mut inner = self.inner.write().await;
        inner.submitted.push(OpKind::Insert);
        if let Some(err) = inner.take_submit_failure(OpKind::Insert) {
            return Err(err);
        }
        if inner.groups.contains_key(identity) {
            return Err(Error::conflict(format!("group '{identity}' already exists")));
        }
        if let Some(cause) = inner.take_operation_failure(OpKind::Insert) {
            return Ok(inner.begin_op(&identity.zone, Some(cause)));
        }

        let fingerprint = inner.next_fingerprint();
        inner.groups.insert(
            identity.clone(),
            GroupRecord {
                description: description.to_string(),
                network: "default".to_string(),
                self_link: self_link_for(identity),
                fingerprint,
                named_ports: named_ports.to_vec(),
                members: MemberSet::new(),
            },
        );
        Ok(inner.begin_op(&identity.zone, None))
    }

    async fn get_group(&self, identity: &GroupIdentity) -> Result<GroupInfo> {
        let mut inner = self.inner.write().await;
        inner.submitted.push(OpKind::Get);
        if let Some(err) = inner.take_submit_failure(OpKind::Get) {
            return Err(err);
        }
        let record = inner.record(identity)?;
        Ok(GroupInfo {
            fingerprint: record.fingerprint.clone(),
            network: record.network.clone(),
            size: record.members.len() as u64,
            self_link: record.self_link.clone(),
            named_ports: record.named_ports.clone(),
        })
    }

    async fn delete_group(&self, identity: &GroupIdentity) -> Result<OperationHandle> {
        let mut inner = self.inner.write().await;
        inner.submitted.push(OpKind::Delete);
        if let Some(err) = inner.take_submit_failure(OpKind::Delete) {
            return Err(err);
        }
        inner.record(identity)?;
        if let Some(cause) = inner.take_operation_failure(OpKind::Delete) {
            return Ok(inner.begin_op(&identity.zone, Some(cause)));
        }
        inner.groups.remove(identity);
        Ok(inner.begin_op(&identity.zone, None))
    }

    async fn list_members(&self, identity: &GroupIdentity) -> Result<Vec<MemberRef>> {
        let mut inner = self.inner.write().await;
        inner.submitted.push(OpKind::ListMembers);
        if let Some(err) = inner.take_submit_failure(OpKind::ListMembers) {
            return Err(err);
        }
        let record = inner.record(identity)?;
        Ok(record.members.iter().cloned().collect())
    }

    async fn add_members(
        &self,
        identity: &GroupIdentity,
        members: &[MemberRef],
    ) -> Result<OperationHandle> {
        let mut inner = self.inner.write().await;
        inner.submitted.push(OpKind::AddMembers);
        if let Some(err) = inner.take_submit_failure(OpKind::AddMembers) {
            return Err(err);
        }
        inner.record(identity)?;
        if let Some(cause) = inner.take_operation_failure(OpKind::AddMembers) {
            return Ok(inner.begin_op(&identity.zone, Some(cause)));
        }

        let duplicate = inner
            .record(identity)?
            .members
            .iter()
            .find(|m| members.contains(*m))
            .cloned();
        if let Some(member) = duplicate {
            let cause = OperationError {
                code: "MEMBER_ALREADY_EXISTS".to_string(),
                message: format!("member '{member}' already present"),
            };
            return Ok(inner.begin_op(&identity.zone, Some(cause)));
        }

        if let Some(record) = inner.groups.get_mut(identity) {
            record.members.extend(members.iter().cloned());
        }
        Ok(inner.begin_op(&identity.zone, None))
    }

    async fn remove_members(
        &self,
        identity: &GroupIdentity,
        members: &[MemberRef],
    ) -> Result<OperationHandle> {
        let mut inner = self.inner.write().await;
        inner.submitted.push(OpKind::RemoveMembers);
        if let Some(err) = inner.take_submit_failure(OpKind::RemoveMembers) {
            return Err(err);
        }
        inner.record(identity)?;
        if let Some(cause) = inner.take_operation_failure(OpKind::RemoveMembers) {
            return Ok(inner.begin_op(&identity.zone, Some(cause)));
        }

        if let Some(record) = inner.groups.get_mut(identity) {
            // Absent members are silently ignored, as the remote does.
            for member in members {
                record.members.remove(member);
            }
        }
        Ok(inner.begin_op(&identity.zone, None))
    }

    async fn set_named_ports(
        &self,
        identity: &GroupIdentity,
        fingerprint: &Fingerprint,
        named_ports: &[NamedPort],
    ) -> Result<OperationHandle> {
        let mut inner = self.inner.write().await;
        inner.submitted.push(OpKind::SetNamedPorts);
        if let Some(err) = inner.take_submit_failure(OpKind::SetNamedPorts) {
            return Err(err);
        }
        let record = inner.record(identity)?;
        if record.fingerprint != *fingerprint {
            return Err(Error::conflict(format!(
                "stale fingerprint for group '{identity}'"
            )));
        }
        if let Some(cause) = inner.take_operation_failure(OpKind::SetNamedPorts) {
            return Ok(inner.begin_op(&identity.zone, Some(cause)));
        }

        let next = inner.next_fingerprint();
        if let Some(record) = inner.groups.get_mut(identity) {
            record.named_ports = named_ports.to_vec();
            record.fingerprint = next;
        }
        Ok(inner.begin_op(&identity.zone, None))
    }

    async fn operation_status(&self, handle: &OperationHandle) -> Result<OperationStatus> {
        let mut inner = self.inner.write().await;
        if inner.never_complete {
            return Ok(OperationStatus::Running);
        }
        let op = inner
            .operations
            .get_mut(&handle.name)
            .ok_or_else(|| Error::not_found(format!("operation '{}'", handle.name)))?;
        if op.remaining_polls > 0 {
            op.remaining_polls -= 1;
            return Ok(OperationStatus::Running);
        }
        Ok(OperationStatus::Done(op.outcome.clone()))
    }
}
