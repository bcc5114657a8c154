use thiserror::Error;

/// Top-level error type for the `mercury-api` crate.
///
/// Covers every failure mode a vendor connector may surface:
/// authentication, transport, and malformed device responses.
/// `mercury-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The switch rejected the supplied credentials.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// The switch could not be reached (refused, unreachable, reset).
    #[error("Cannot connect to switch at {host}: {reason}")]
    Connection { host: String, reason: String },

    /// A request did not complete in time.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data ────────────────────────────────────────────────────────
    /// The switch answered, but the response could not be understood.
    #[error("Unexpected response from switch: {message}")]
    Protocol { message: String },

    /// The detected model does not support the requested operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl Error {
    /// Returns `true` if the switch rejected the credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transport error worth retrying later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => Self::Timeout { timeout_secs: 0 },
            _ => Self::Connection {
                host: String::new(),
                reason: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_transient() {
        let err = Error::Connection {
            host: "192.168.1.100".into(),
            reason: "connection refused".into(),
        };
        assert!(err.is_transient());
        assert!(Error::Timeout { timeout_secs: 15 }.is_transient());
    }

    #[test]
    fn auth_failure_is_not_transient() {
        let err = Error::Authentication {
            message: "bad password".into(),
        };
        assert!(err.is_auth_failure());
        assert!(!err.is_transient());
    }

    #[test]
    fn io_timeout_maps_to_timeout() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert!(matches!(Error::from(io), Error::Timeout { .. }));
    }

    #[test]
    fn io_refused_maps_to_connection() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(Error::from(io), Error::Connection { .. }));
    }
}
