//! Error types for transport calls and session operations.

use std::fmt;

use thiserror::Error;

// ============================================================================
// Transport Error
// ============================================================================

/// Broad category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The server answered with a non-success status.
    Status,
    /// The request never completed (DNS, connect, TLS, reset).
    Network,
    /// The request exceeded the transport's timeout.
    Timeout,
    /// The body could not be decoded as the expected kind.
    Decode,
    /// The URL could not be parsed.
    InvalidUrl,
    /// The URL's host is not in the allowlist.
    DomainNotAllowed,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Status => "status",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Decode => "decode",
            Self::InvalidUrl => "invalid url",
            Self::DomainNotAllowed => "domain not allowed",
        };
        f.write_str(name)
    }
}

/// A failure reported by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    status: Option<u16>,
    message: String,
}

impl TransportError {
    /// Creates an error of the given kind.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    /// A non-success HTTP status.
    pub fn status(status: u16, reason: impl AsRef<str>) -> Self {
        let reason = reason.as_ref();
        let message = if reason.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status} {reason}")
        };
        Self {
            kind: TransportErrorKind::Status,
            status: Some(status),
            message,
        }
    }

    /// A network-level failure without a status.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    /// The body could not be parsed as structured data.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Decode, message)
    }

    /// The failure category.
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// The HTTP status, when the server answered.
    pub fn status_code(&self) -> Option<u16> {
        self.status
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if the response body could not be parsed as data.
    ///
    /// The backend answers an expired session with its HTML login page, so
    /// this signature is what the session controller treats as expiry.
    pub fn is_parse_failure(&self) -> bool {
        if self.kind == TransportErrorKind::Decode {
            return true;
        }
        let message = self.message.to_lowercase();
        message.contains("parse error") || message.contains("unexpected end of input")
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::new(TransportErrorKind::Timeout, err.to_string());
        }
        if err.is_decode() {
            return Self::decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::status(status.as_u16(), status.canonical_reason().unwrap_or_default());
        }
        Self::network(err.to_string())
    }
}

// ============================================================================
// GMA Error
// ============================================================================

/// Error type for every session and resource operation.
#[derive(Debug, Error)]
pub enum GmaError {
    /// The identity provider rejected the username/password.
    #[error("{message}")]
    CredentialsRejected {
        /// User-facing message.
        message: String,
        /// Login step that failed.
        origin: String,
    },

    /// The identity provider could not be reached or the path was wrong.
    #[error("{message}")]
    ServerUnreachable {
        /// User-facing message.
        message: String,
        /// Login step that failed.
        origin: String,
    },

    /// The backend rejected the service ticket.
    #[error("{message}")]
    AuthenticationFailed {
        /// User-facing message.
        message: String,
        /// Login step that failed.
        origin: String,
    },

    /// The session expired and could not be renewed.
    #[error("Login session timed out")]
    SessionExpired {
        /// Request that hit the expired session.
        origin: String,
    },

    /// The backend answered with `success: false`.
    #[error("{message}")]
    Application {
        /// Server-supplied message.
        message: String,
        /// Request that produced the error (`METHOD path`).
        origin: String,
    },

    /// A transport failure, annotated with the request or login step.
    #[error("{origin}: {source}")]
    Transport {
        /// Request or login step that failed.
        origin: String,
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },

    /// A well-formed response with an unexpected shape.
    #[error("Invalid response from {origin}: {message}")]
    InvalidResponse {
        /// Request or login step that failed.
        origin: String,
        /// What was wrong.
        message: String,
    },

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GmaError {
    /// Wraps a transport error with its origin.
    pub fn transport(origin: impl Into<String>, source: TransportError) -> Self {
        Self::Transport {
            origin: origin.into(),
            source,
        }
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Creates a credentials-rejected error.
    pub fn credentials_rejected(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CredentialsRejected {
            message: message.into(),
            origin: origin.into(),
        }
    }

    /// Creates a server-unreachable error.
    pub fn server_unreachable(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ServerUnreachable {
            message: message.into(),
            origin: origin.into(),
        }
    }

    /// Creates an authentication-failed error.
    pub fn authentication_failed(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            message: message.into(),
            origin: origin.into(),
        }
    }

    /// Creates a session-expired error.
    pub fn session_expired(origin: impl Into<String>) -> Self {
        Self::SessionExpired {
            origin: origin.into(),
        }
    }

    /// Creates an application error.
    pub fn application(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Application {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Returns the request or login step the error came from.
    ///
    /// Only configuration errors have none.
    pub fn origin(&self) -> Option<&str> {
        match self {
            Self::CredentialsRejected { origin, .. }
            | Self::ServerUnreachable { origin, .. }
            | Self::AuthenticationFailed { origin, .. }
            | Self::SessionExpired { origin }
            | Self::Application { origin, .. }
            | Self::Transport { origin, .. }
            | Self::InvalidResponse { origin, .. } => Some(origin),
            Self::InvalidConfig(_) => None,
        }
    }

    /// Returns true for an expired session.
    ///
    /// Callers must drop any authenticated view state and return to login.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }

    /// Returns the underlying transport error, if any.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}
