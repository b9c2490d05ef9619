//! Error types for the remote seam.

use std::time::Duration;

use thiserror::Error;

use regroup_core::OpKind;

use crate::api::OperationError;

/// Result type alias for remote operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Remote transport and operation errors.
///
/// Variants are distinguished so callers can decide per kind: `NotFound` is
/// success-with-empty on read paths, `Conflict` prompts a fingerprint
/// re-read, `Timeout` means the remote effect is indeterminate and must be
/// re-verified by a read, never blindly retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The target resource is absent.
    #[error("remote resource '{what}' not found")]
    NotFound { what: String },

    /// Stale fingerprint or concurrent remote mutation.
    #[error("conflict: {reason}")]
    Conflict { reason: String },

    /// The operation did not reach a terminal state within the deadline.
    #[error("{kind} operation did not complete within {timeout:?}")]
    Timeout { kind: OpKind, timeout: Duration },

    /// The remote system reported the operation as failed.
    #[error("{kind} operation failed: [{code}] {message}")]
    OperationFailed {
        kind: OpKind,
        code: String,
        message: String,
    },

    /// Generic network/auth/remote failure.
    #[error("transport failure: {reason}")]
    Transport { reason: String },

    /// The caller's cancellation signal fired mid-poll.
    #[error("{kind} operation cancelled by caller")]
    Cancelled { kind: OpKind },
}

impl Error {
    /// Create a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a conflict error.
    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
        }
    }

    /// Create a timeout error.
    pub const fn timeout(kind: OpKind, timeout: Duration) -> Self {
        Self::Timeout { kind, timeout }
    }

    /// Create an operation-failed error from the remote's structured cause.
    pub fn operation_failed(kind: OpKind, cause: OperationError) -> Self {
        Self::OperationFailed {
            kind,
            code: cause.code,
            message: cause.message,
        }
    }

    /// Create a transport error.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Create a cancelled error.
    pub const fn cancelled(kind: OpKind) -> Self {
        Self::Cancelled { kind }
    }

    /// Whether this is the not-found kind.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is the conflict kind.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Whether this is the timeout kind.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Identifier resolution errors.
///
/// Resolution fails fast on the first unresolvable identifier and reports
/// which identifier and why.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No instance matches the identifier.
    #[error("no instance found for identifier '{identifier}'")]
    NotFound { identifier: String },

    /// More than one instance matches the identifier.
    #[error("identifier '{identifier}' is ambiguous ({matches} matches)")]
    Ambiguous { identifier: String, matches: usize },

    /// The canonicalization backend itself failed.
    #[error("resolver backend failed for '{identifier}': {reason}")]
    Backend { identifier: String, reason: String },
}

impl ResolveError {
    /// Create a not-found resolution error.
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }

    /// Create an ambiguous resolution error.
    pub fn ambiguous(identifier: impl Into<String>, matches: usize) -> Self {
        Self::Ambiguous {
            identifier: identifier.into(),
            matches,
        }
    }

    /// Create a backend resolution error.
    pub fn backend(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Backend {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn error_display_carries_operation_kind() {
        let err = Error::timeout(OpKind::AddMembers, Duration::from_secs(30));
        assert!(err.to_string().contains("add-members"));

        let err = Error::operation_failed(
            OpKind::SetNamedPorts,
            OperationError {
                code: "CONDITION_NOT_MET".to_string(),
                message: "fingerprint mismatch".to_string(),
            },
        );
        assert!(err.to_string().contains("set-named-ports"));
        assert!(err.to_string().contains("CONDITION_NOT_MET"));
    }

    #[test]
    fn kind_predicates() {
        assert!(Error::not_found("g").is_not_found());
        assert!(Error::conflict("stale").is_conflict());
        assert!(Error::timeout(OpKind::Insert, Duration::from_secs(1)).is_timeout());
        assert!(!Error::transport("boom").is_conflict());
    }
}
