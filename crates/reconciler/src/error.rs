//! Error types for the reconciler crate.

use thiserror::Error;

use regroup_core::{GroupIdentity, OpKind};
use regroup_remote::ResolveError;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciliation errors.
///
/// Every remote failure is annotated with the operation kind and the target
/// group identity before it reaches the caller; nothing is logged and
/// swallowed.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied identifier could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolveError),

    /// A remote operation failed.
    #[error("{kind} failed for group '{group}': {source}")]
    Operation {
        kind: OpKind,
        group: GroupIdentity,
        #[source]
        source: regroup_remote::Error,
    },

    /// Builder misuse.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    /// Annotate a remote error with its operation kind and target group.
    pub fn operation(kind: OpKind, group: &GroupIdentity, source: regroup_remote::Error) -> Self {
        Self::Operation {
            kind,
            group: group.clone(),
            source,
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Whether the underlying remote failure is a conflict.
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Operation {
                source: regroup_remote::Error::Conflict { .. },
                ..
            }
        )
    }

    /// Whether the underlying remote failure is a timeout.
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Operation {
                source: regroup_remote::Error::Timeout { .. },
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn operation_errors_name_kind_and_group() {
        let group = GroupIdentity::new("workers", "us-central1-a");
        let err = Error::operation(
            OpKind::RemoveMembers,
            &group,
            regroup_remote::Error::transport("connection reset"),
        );
        let text = err.to_string();
        assert!(text.contains("remove-members"));
        assert!(text.contains("us-central1-a/workers"));
    }

    #[test]
    fn conflict_predicate_sees_through_the_annotation() {
        let group = GroupIdentity::new("workers", "us-central1-a");
        let err = Error::operation(
            OpKind::SetNamedPorts,
            &group,
            regroup_remote::Error::conflict("stale fingerprint"),
        );
        assert!(err.is_conflict());
        assert!(!err.is_timeout());
    }
}
