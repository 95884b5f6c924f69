use thiserror::Error;

/// Coarse failure category attached to every expected rejection.
///
/// Mirrors the protocol's three-way split between "the server said no",
/// "we gave up waiting", and "the session is gone". Parse and contract
/// defects carry no reason — they are not rejections (see [`Error::is_defect`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Generic failure (transport or protocol).
    Error,
    /// The configured request timeout fired.
    Timeout,
    /// HTTP 401 — the session token is missing, invalid, or expired.
    Unauthorized,
}

/// Top-level error type for the `gmp-api` crate.
///
/// Two families live here. *Rejections* are expected outcomes of talking to
/// a real server: transport failures, timeouts, expired sessions, and
/// well-formed error envelopes. *Defects* are contract violations: XML that
/// does not parse, an envelope missing the substructure a command declared,
/// structurally invalid model input. Callers route on [`Error::is_defect`].
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out. The duration is absent when the timeout came
    /// from a caller-supplied client rather than a [`TransportConfig`].
    ///
    /// [`TransportConfig`]: crate::transport::TransportConfig
    #[error("Request timed out{}", timeout_secs.map_or_else(String::new, |secs| format!(" after {secs}s")))]
    Timeout { timeout_secs: Option<u64> },

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// HTTP 401 — session expired or token rejected.
    #[error("Unauthorized -- session token rejected")]
    Unauthorized,

    // ── Protocol ────────────────────────────────────────────────────
    /// The server returned a well-formed error envelope
    /// (`action_result` or `gsad_response` message).
    #[error("GMP error: {message}")]
    Response {
        message: String,
        /// HTTP status, when the rejection arrived on a non-2xx response.
        status: Option<u16>,
    },

    /// A composite command succeeded partially: the primary command created
    /// or updated the entity, but a secondary command failed. The entity id
    /// from the primary step is preserved so callers can report or repair.
    #[error("Partial success for {id}: {message}")]
    PartialSuccess { id: String, message: String },

    // ── Defects ─────────────────────────────────────────────────────
    /// The response body was not a parseable GMP envelope.
    #[error("Malformed GMP response: {message}")]
    MalformedResponse { message: String },

    /// A command's locate function found no element where the protocol
    /// contract requires one.
    #[error("Response is missing expected element: {context}")]
    MissingElement { context: String },

    /// A model parser hit structurally invalid input (never raised for
    /// merely absent optional fields).
    #[error("Invalid element: {message}")]
    InvalidElement { message: String },
}

impl Error {
    /// The rejection reason, for expected failures.
    ///
    /// Defects return [`RejectReason::Error`] as well; use [`Self::is_defect`]
    /// first when the distinction matters.
    pub fn reason(&self) -> RejectReason {
        match self {
            Self::Timeout { .. } => RejectReason::Timeout,
            Self::Unauthorized => RejectReason::Unauthorized,
            _ => RejectReason::Error,
        }
    }

    /// Returns `true` for contract violations that indicate a bug in this
    /// client or the server rather than an operational failure. Callers
    /// should not catch these in normal control flow.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            Self::MalformedResponse { .. }
                | Self::MissingElement { .. }
                | Self::InvalidElement { .. }
        )
    }

    /// Returns `true` if re-authentication might resolve this error.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// The server-provided message, when one was extracted from the envelope.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Response { message, .. } | Self::PartialSuccess { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }
}
