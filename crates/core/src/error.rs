//! Error types for the core crate.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Named port outside the valid range.
    #[error("invalid port {port} for named port '{name}': must be in 1..=65535")]
    InvalidPort { name: String, port: u16 },

    /// Named port with an empty name.
    #[error("named port with port {port} has an empty name")]
    EmptyPortName { port: u16 },
}

impl Error {
    /// Create an invalid port error.
    pub fn invalid_port(name: impl Into<String>, port: u16) -> Self {
        Self::InvalidPort {
            name: name.into(),
            port,
        }
    }

    /// Create an empty port name error.
    pub const fn empty_port_name(port: u16) -> Self {
        Self::EmptyPortName { port }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn error_display_names_the_port() {
        let err = Error::invalid_port("http", 0);
        assert!(err.to_string().contains("http"));
        assert!(err.to_string().contains('0'));
    }
}
