// ── Core error types ──
//
// User-facing errors from mercury-core. Consumers never see vendor
// client failures directly: the `From<mercury_api::Error>` impl folds
// them into the integration's taxonomy (auth / transport / data).

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to switch at {host}: {reason}")]
    ConnectionFailed { host: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Switch connection timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Setup errors ─────────────────────────────────────────────────
    #[error("Config entry {entry_id} has no unique id")]
    MissingUniqueId { entry_id: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Switch API error: {message}")]
    Api { message: String },

    // ── Persistence / configuration ──────────────────────────────────
    #[error("Failed to persist entity state: {message}")]
    Persistence { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` for transport failures that a later retry may fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::Timeout { .. })
    }

    /// Form-field error code shown by the config flow.
    pub fn form_error_code(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed { .. } => "invalid_auth",
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => "cannot_connect",
            _ => "unknown",
        }
    }
}

// ── Conversion from vendor-client errors ─────────────────────────────

impl From<mercury_api::Error> for CoreError {
    fn from(err: mercury_api::Error) -> Self {
        match err {
            mercury_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            mercury_api::Error::Connection { host, reason } => {
                CoreError::ConnectionFailed { host, reason }
            }
            mercury_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            mercury_api::Error::Protocol { message } => CoreError::Api { message },
            mercury_api::Error::Unsupported(op) => CoreError::Api {
                message: format!("unsupported operation: {op}"),
            },
        }
    }
}

impl From<tokio::task::JoinError> for CoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        CoreError::Internal(format!("blocking switch call aborted: {err}"))
    }
}

/// Outcome of a failed setup, as seen by the host.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Transient failure; the host should retry setup later.
    #[error("Switch not ready: {0}")]
    NotReady(#[source] CoreError),

    /// Terminal failure; retrying will not help without user action.
    #[error("Setup failed: {0}")]
    Failed(#[source] CoreError),
}

impl SetupError {
    pub fn inner(&self) -> &CoreError {
        match self {
            Self::NotReady(e) | Self::Failed(e) => e,
        }
    }
}

impl From<CoreError> for SetupError {
    fn from(err: CoreError) -> Self {
        if err.is_retryable() {
            Self::NotReady(err)
        } else {
            Self::Failed(err)
        }
    }
}
