//! # Discovery Errors
//!
//! Only configuration, parsing, and whole-method resource failures are ever
//! returned to the caller of a discovery. Per-address failures are absorbed
//! by the probers and never show up here, except through the single-address
//! [`DiscoveryError::Unreachable`] case.

use std::net::Ipv4Addr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A target or prefix string could not be parsed.
    #[error("invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("interface name cannot be empty")]
    EmptyInterface,

    #[error("interface {0} not found")]
    InterfaceNotFound(String),

    #[error("interface {0} has no usable IPv4 address")]
    NoIpv4Address(String),

    #[error("interface {0} has no hardware address")]
    NoMacAddress(String),

    /// The `lan` keyword was used but no scanning interface is configured.
    #[error("no local network available to resolve the 'lan' target")]
    NoLocalNetwork,

    #[error("failed to open link-layer socket on {interface}: {source}")]
    LinkLayerSocket {
        interface: String,
        #[source]
        source: std::io::Error,
    },

    #[error("non-ethernet channel for {0}")]
    UnsupportedChannel(String),

    #[error("{0} did not answer address resolution")]
    Unreachable(Ipv4Addr),

    #[error("{label} worker panicked: {reason}")]
    WorkerPanicked { label: &'static str, reason: String },
}

impl DiscoveryError {
    pub fn invalid_target(target: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidTarget {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error stems from a malformed input or configuration rather
    /// than from the environment the scan runs in.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidTarget { .. }
                | Self::EmptyInterface
                | Self::InterfaceNotFound(_)
                | Self::NoLocalNetwork
        )
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_target_message_names_input() {
        let err = DiscoveryError::invalid_target("10.0.0.0/33", "prefix exceeds 32");
        assert_eq!(
            err.to_string(),
            "invalid target '10.0.0.0/33': prefix exceeds 32"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn socket_errors_are_not_configuration() {
        let err = DiscoveryError::LinkLayerSocket {
            interface: "eth0".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("eth0"));
    }
}
