//! Transport status vocabulary.
//!
//! The engine never manages the transport (a VPN tunnel or any other
//! intermittent network path) itself; it only consumes a stream of status
//! values describing whether the transport can carry a request right now.
//! Producers are expected to replay the latest status to new subscribers,
//! which a `tokio::sync::watch` channel gives for free.

/// Observed availability of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportStatus {
    /// The transport is established and can carry requests.
    Ready,
    /// The transport is being established.
    Connecting,
    /// The transport exists but is not currently usable.
    NotReady,
    /// No transport handle exists at all (e.g. the tunnel provider has been
    /// released).
    NoHandle,
}

impl TransportStatus {
    /// Whether a request may be issued against the transport right now.
    pub fn is_ready(self) -> bool {
        matches!(self, TransportStatus::Ready)
    }
}

/// Why a request cannot currently be issued against the transport.
///
/// These conditions are always retriable and never count against a retry
/// budget: the transport is structurally unusable, not failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportError {
    /// A transport handle exists but the transport is not in a ready state.
    NotReady,
    /// No transport handle is available.
    NoHandle,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::NotReady => write!(f, "transport is not ready"),
            TransportError::NoHandle => write!(f, "no transport handle available"),
        }
    }
}

impl std::error::Error for TransportError {}

#[cfg(test)]
mod transport_tests {
    use super::*;

    #[test]
    fn test_only_ready_is_ready() {
        assert!(TransportStatus::Ready.is_ready());
        assert!(!TransportStatus::Connecting.is_ready());
        assert!(!TransportStatus::NotReady.is_ready());
        assert!(!TransportStatus::NoHandle.is_ready());
    }

    #[test]
    fn test_error_display() {
        assert!(format!("{}", TransportError::NoHandle).contains("handle"));
        assert!(format!("{}", TransportError::NotReady).contains("not ready"));
    }
}
