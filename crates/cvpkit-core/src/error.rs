// ── Core error types ──
//
// User-facing errors from cvpkit-core. Consumers never see raw HTTP
// status codes or JSON parse failures; the `From<cvpkit_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to CVP at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("CVP request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// CVP's `errorCode`, when the failure came from the error envelope.
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    /// A change-control check ran to completion and did not pass.
    #[error("Check failed: {message}")]
    CheckFailed { message: String },

    #[error("Template error: {message}")]
    Template { message: String },

    #[error("SSH error on {host}: {message}")]
    Ssh { host: String, message: String },

    #[error("Notification failed ({sink}): {message}")]
    Notify { sink: &'static str, message: String },

    #[error("Git error: {message}")]
    Git { message: String },

    #[error("Cannot extract export: {message}")]
    ExtractFile { message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<cvpkit_api::Error> for CoreError {
    fn from(err: cvpkit_api::Error) -> Self {
        if err.is_not_found() {
            let identifier = match &err {
                cvpkit_api::Error::Api { message, .. } => message.clone(),
                other => other.to_string(),
            };
            return CoreError::NotFound {
                entity_type: "Entity".into(),
                identifier,
            };
        }

        match err {
            cvpkit_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            cvpkit_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            cvpkit_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            cvpkit_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            cvpkit_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            cvpkit_api::Error::Http { status, body } => CoreError::Api {
                message: body,
                code: None,
                status: Some(status),
            },
            cvpkit_api::Error::Api { code, message } => CoreError::Api {
                message,
                code: Some(code),
                status: None,
            },
            cvpkit_api::Error::Eapi { code, message } => CoreError::Api {
                message,
                code: Some(code.to_string()),
                status: None,
            },
            cvpkit_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

impl From<tera::Error> for CoreError {
    fn from(err: tera::Error) -> Self {
        // tera nests the useful part (undefined variable, parse position)
        // in the source chain.
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        CoreError::Template { message }
    }
}
