use thiserror::Error;

/// CVP's error code for "Entity does not exist".
pub const ENTITY_DOES_NOT_EXIST: &str = "132801";

/// CVP's error code returned by the connectivity test for an unreachable IP.
pub const IP_UNREACHABLE: &str = "122605";

/// Top-level error type for the `cvpkit-api` crate.
///
/// Covers every failure mode across the three API surfaces:
/// the portal REST API, the Analytics Engine, and EOS eAPI.
/// `cvpkit-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed or the session cookie was rejected.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-2xx response that carried no CVP error envelope.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── CVP ─────────────────────────────────────────────────────────
    /// Error reported inside a response body as `{"errorCode", "errorMessage"}`.
    #[error("CVP API error {code}: {message}")]
    Api { code: String, message: String },

    /// JSON-RPC error returned by eAPI.
    #[error("eAPI error {code}: {message}")]
    Eapi { code: i64, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the session is no longer valid.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if CVP reported the requested entity as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Http { status: 404, .. } => true,
            Self::Api { code, message } => {
                code == ENTITY_DOES_NOT_EXIST || message.contains("Entity does not exist")
            }
            _ => false,
        }
    }

    /// Extract the CVP error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}
