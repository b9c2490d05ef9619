//! Identifier-to-reference resolution.
//!
//! Callers declare members as bare instance names or already-canonical
//! references. Resolution maps every identifier to its canonical
//! [`MemberRef`], collapsing duplicates, with no side effects. It fails fast
//! on the first unresolvable identifier, reporting which one and why.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use regroup_core::{MemberRef, MemberSet};

use crate::error::ResolveError;

/// Black-box canonicalization service.
///
/// May itself make network calls. Returns every known reference matching a
/// bare name; the resolver decides how to treat zero or multiple matches.
#[async_trait]
pub trait ResolverBackend: Send + Sync {
    /// Look up canonical references for a bare instance name.
    async fn lookup(&self, name: &str) -> std::result::Result<Vec<MemberRef>, ResolveError>;
}

/// Resolves caller identifiers into a canonical member set.
#[derive(Clone)]
pub struct MemberResolver {
    backend: Arc<dyn ResolverBackend>,
}

impl MemberResolver {
    /// Create a resolver over a canonicalization backend.
    pub fn new(backend: Arc<dyn ResolverBackend>) -> Self {
        Self { backend }
    }

    /// Resolve identifiers into a member set.
    ///
    /// Identifiers already in canonical form (containing `/`) pass through
    /// unchanged; bare names go to the backend. Duplicates collapse.
    ///
    /// # Errors
    ///
    /// Fails on the first identifier with zero matches
    /// ([`ResolveError::NotFound`]) or more than one
    /// ([`ResolveError::Ambiguous`]), or when the backend itself fails.
    pub async fn resolve(
        &self,
        identifiers: &[String],
    ) -> std::result::Result<MemberSet, ResolveError> {
        let mut members = MemberSet::new();
        for identifier in identifiers {
            if identifier.contains('/') {
                members.insert(MemberRef::new(identifier.clone()));
                continue;
            }

            let mut matches = self.backend.lookup(identifier).await?;
            match matches.len() {
                0 => return Err(ResolveError::not_found(identifier)),
                1 => {
                    members.insert(matches.remove(0));
                }
                n => return Err(ResolveError::ambiguous(identifier, n)),
            }
        }
        debug!(
            identifiers = identifiers.len(),
            resolved = members.len(),
            "resolved member identifiers"
        );
        Ok(members)
    }
}

/// In-memory backend for tests: a fixed name-to-references table.
#[derive(Debug, Clone, Default)]
pub struct StaticResolverBackend {
    entries: HashMap<String, Vec<MemberRef>>,
}

impl StaticResolverBackend {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a bare name to a single canonical reference.
    #[must_use]
    pub fn with_instance(mut self, name: impl Into<String>, reference: impl Into<String>) -> Self {
        self.entries
            .entry(name.into())
            .or_default()
            .push(MemberRef::new(reference.into()));
        self
    }
}

#[async_trait]
impl ResolverBackend for StaticResolverBackend {
    async fn lookup(&self, name: &str) -> std::result::Result<Vec<MemberRef>, ResolveError> {
        Ok(self.entries.get(name).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn resolver() -> MemberResolver {
        let backend = StaticResolverBackend::new()
            .with_instance("node-1", "zones/z/instances/node-1")
            .with_instance("node-2", "zones/z/instances/node-2")
            .with_instance("dup", "zones/a/instances/dup")
            .with_instance("dup", "zones/b/instances/dup");
        MemberResolver::new(Arc::new(backend))
    }

    #[tokio::test]
    async fn canonical_identifiers_pass_through() {
        let set = resolver()
            .resolve(&["zones/z/instances/raw".to_string()])
            .await
            .unwrap();
        assert!(set.contains(&MemberRef::from("zones/z/instances/raw")));
    }

    #[tokio::test]
    async fn bare_names_resolve_via_backend() {
        let set = resolver()
            .resolve(&["node-1".to_string(), "node-2".to_string()])
            .await
            .unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&MemberRef::from("zones/z/instances/node-1")));
    }

    #[tokio::test]
    async fn duplicates_collapse() {
        let set = resolver()
            .resolve(&["node-1".to_string(), "zones/z/instances/node-1".to_string()])
            .await
            .unwrap();
        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn unknown_name_fails_fast_with_the_identifier() {
        let err = resolver()
            .resolve(&["node-1".to_string(), "ghost".to_string(), "node-2".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::not_found("ghost"));
    }

    #[tokio::test]
    async fn multiple_matches_are_ambiguous() {
        let err = resolver().resolve(&["dup".to_string()]).await.unwrap_err();
        assert_eq!(err, ResolveError::ambiguous("dup", 2));
    }
}
