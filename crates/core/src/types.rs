//! Domain types for group membership reconciliation.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Opaque canonical reference to a remote compute instance.
///
/// References arrive in URL or self-link form; no internal structure is
/// interpreted beyond string equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberRef(String);

impl MemberRef {
    /// Create a member reference from its canonical string form.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MemberRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An unordered collection of member references.
///
/// Transported as an ordered list on the wire, but order carries no meaning;
/// equality and membership are pure set semantics. Iteration order is
/// deterministic (lexicographic) so logs and tests are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberSet(BTreeSet<MemberRef>);

impl MemberSet {
    /// Create an empty member set.
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the set contains the given reference.
    pub fn contains(&self, member: &MemberRef) -> bool {
        self.0.contains(member)
    }

    /// Insert a reference; duplicates collapse.
    pub fn insert(&mut self, member: MemberRef) -> bool {
        self.0.insert(member)
    }

    /// Remove a reference if present.
    pub fn remove(&mut self, member: &MemberRef) -> bool {
        self.0.remove(member)
    }

    /// Iterate members in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &MemberRef> {
        self.0.iter()
    }

    /// Members in `self` but not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    /// Members in both `self` and `other`.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    /// Members in either `self` or `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).cloned().collect())
    }
}

impl FromIterator<MemberRef> for MemberSet {
    fn from_iter<I: IntoIterator<Item = MemberRef>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for MemberSet {
    type Item = MemberRef;
    type IntoIter = std::collections::btree_set::IntoIter<MemberRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MemberSet {
    type Item = &'a MemberRef;
    type IntoIter = std::collections::btree_set::Iter<'a, MemberRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Extend<MemberRef> for MemberSet {
    fn extend<I: IntoIterator<Item = MemberRef>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

/// A named service-port mapping attached to a group.
///
/// Name uniqueness within a list is not enforced by the remote system;
/// duplicate names are a caller error and not detected locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedPort {
    /// Service name, e.g. "http".
    pub name: String,
    /// Port number, 1..=65535.
    pub port: u16,
}

impl NamedPort {
    /// Create a named port, validating the port range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPort`] for port 0 and [`Error::EmptyPortName`]
    /// for an empty name.
    pub fn new(name: impl Into<String>, port: u16) -> Result<Self> {
        let name = name.into();
        if port == 0 {
            return Err(Error::invalid_port(name, port));
        }
        if name.is_empty() {
            return Err(Error::empty_port_name(port));
        }
        Ok(Self { name, port })
    }
}

impl fmt::Display for NamedPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.port)
    }
}

/// Write-once identity of a group: name scoped by zone.
///
/// Changing either field means full resource replacement, never an in-place
/// update; this crate never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupIdentity {
    /// Group name, unique within the zone.
    pub name: String,
    /// Zone the group lives in.
    pub zone: String,
}

impl GroupIdentity {
    /// Create a group identity.
    pub fn new(name: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zone: zone.into(),
        }
    }
}

impl fmt::Display for GroupIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.zone, self.name)
    }
}

/// Desired state of a managed group.
///
/// `name`, `zone` and `description` are immutable once created; only the
/// instance list and the named ports may change between reconciliations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    /// Group name (immutable identity).
    pub name: String,
    /// Free-form description (immutable).
    pub description: String,
    /// Zone (immutable, identity-scoping).
    pub zone: String,
    /// Caller-supplied member identifiers: bare instance names or already
    /// canonical references, resolved before use.
    pub instances: Vec<String>,
    /// Desired named ports, in declared order.
    pub named_ports: Vec<NamedPort>,
}

impl GroupSpec {
    /// Create a spec with empty members and ports.
    pub fn new(name: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            zone: zone.into(),
            instances: Vec::new(),
            named_ports: Vec::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the desired member identifiers.
    #[must_use]
    pub fn with_instances<I, S>(mut self, instances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instances = instances.into_iter().map(Into::into).collect();
        self
    }

    /// Set the desired named ports.
    #[must_use]
    pub fn with_named_ports(mut self, ports: Vec<NamedPort>) -> Self {
        self.named_ports = ports;
        self
    }

    /// The write-once identity pair for this spec.
    pub fn identity(&self) -> GroupIdentity {
        GroupIdentity::new(self.name.clone(), self.zone.clone())
    }
}

/// Opaque version token guarding named-port mutations.
///
/// Must be refreshed from a live read immediately before every named-port
/// mutation; the remote system rejects stale tokens with a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a fingerprint token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Last-observed live state of a group.
///
/// Created by the first successful remote creation, refreshed on every read,
/// discarded on delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupState {
    /// Version token for named-port mutations.
    pub fingerprint: Fingerprint,
    /// Network the group is attached to.
    pub network: String,
    /// Live member count as reported by the remote system.
    pub size: u64,
    /// Canonical self link of the group resource.
    pub self_link: String,
    /// Caller-visible members (declared members observed live).
    pub members: MemberSet,
    /// Live named ports.
    pub named_ports: Vec<NamedPort>,
}

/// The previously-applied member set, tracked across update cycles.
///
/// This is the "from" side of the three-way diff. Persistence is the
/// caller's responsibility; this crate only requires that it be supplied at
/// the start of an update and records the refreshed value at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppliedMembers(MemberSet);

impl AppliedMembers {
    /// An empty record, used on first reconciliation.
    pub const fn empty() -> Self {
        Self(MemberSet::new())
    }

    /// The applied set.
    pub const fn as_set(&self) -> &MemberSet {
        &self.0
    }

    /// Consume into the applied set.
    pub fn into_set(self) -> MemberSet {
        self.0
    }
}

impl From<MemberSet> for AppliedMembers {
    fn from(set: MemberSet) -> Self {
        Self(set)
    }
}

/// Kind of remote operation, used to annotate errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Group creation.
    Insert,
    /// Group read.
    Get,
    /// Live membership listing.
    ListMembers,
    /// Member addition.
    AddMembers,
    /// Member removal.
    RemoveMembers,
    /// Named-port replacement.
    SetNamedPorts,
    /// Group deletion.
    Delete,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Insert => "insert",
            Self::Get => "get",
            Self::ListMembers => "list-members",
            Self::AddMembers => "add-members",
            Self::RemoveMembers => "remove-members",
            Self::SetNamedPorts => "set-named-ports",
            Self::Delete => "delete",
        };
        f.write_str(s)
    }
}
