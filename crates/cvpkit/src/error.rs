//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use cvpkit_config::ConfigError;
use cvpkit_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    /// A change-control check ran and did not pass.
    pub const CHECK_FAILED: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to CVP at {url}")]
    #[diagnostic(
        code(cvpkit::connection_failed),
        help(
            "{reason}\n\
             Check that CVP is running and reachable, and that the API prefix \
             (api_prefix = \"web\" before 2018.1) matches the release."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(cvpkit::auth_failed),
        help(
            "Verify the username and password for this profile.\n\
             Run: cvpkit config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for {scope}")]
    #[diagnostic(
        code(cvpkit::no_credentials),
        help(
            "Configure credentials with: cvpkit config init\n\
             Or set CVP_USERNAME and CVP_PASSWORD."
        )
    )]
    NoCredentials { scope: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(cvpkit::not_found),
        help("CVP matches names exactly, including case.")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(cvpkit::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(cvpkit::validation))]
    Validation { field: String, reason: String },

    // ── Operations ───────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(
        code(cvpkit::check_failed),
        help("The check ran to completion; see the audit lines above.")
    )]
    CheckFailed { message: String },

    #[error("SSH to {host} failed: {message}")]
    #[diagnostic(
        code(cvpkit::ssh),
        help("Device logins come from the action file, the [ssh] config section, or --username/--password.")
    )]
    Remote { host: String, message: String },

    #[error("Template error: {message}")]
    #[diagnostic(code(cvpkit::template))]
    Template { message: String },

    #[error("Could not deliver the report ({sink}): {message}")]
    #[diagnostic(code(cvpkit::notify))]
    Notify { sink: String, message: String },

    #[error("Git error: {message}")]
    #[diagnostic(
        code(cvpkit::git),
        help("The git executable must be on PATH and able to reach the repository.")
    )]
    Git { message: String },

    #[error("Cannot read export: {message}")]
    #[diagnostic(
        code(cvpkit::export),
        help("Export the configlet builders from CVP and pass the downloaded zip unchanged.")
    )]
    Export { message: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(cvpkit::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: cvpkit config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(cvpkit::no_config),
        help(
            "Create one with: cvpkit config init\n\
             Expected at: {path}\n\
             Or pass --server, --username and --password."
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(cvpkit::config))]
    Config { message: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(cvpkit::timeout),
        help("Increase timeout with --timeout or check CVP responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO ───────────────────────────────────────────────────────────

    #[error("I/O error on {path}")]
    #[diagnostic(code(cvpkit::io))]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Remote { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            Self::CheckFailed { .. } => exit_code::CHECK_FAILED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                resource_type: entity_type,
                identifier,
            },
            CoreError::Api {
                message,
                code,
                status,
            } => Self::ApiError {
                code: code
                    .or_else(|| status.map(|s| s.to_string()))
                    .unwrap_or_else(|| "unknown".into()),
                message,
            },
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::CheckFailed { message } => Self::CheckFailed { message },
            CoreError::Template { message } => Self::Template { message },
            CoreError::Ssh { host, message } => Self::Remote { host, message },
            CoreError::Notify { sink, message } => Self::Notify {
                sink: sink.into(),
                message,
            },
            CoreError::Git { message } => Self::Git { message },
            CoreError::ExtractFile { message } => Self::Export { message },
            CoreError::Io { path, source } => Self::FileIo { path, source },
            CoreError::Config { message } => Self::Config { message },
            CoreError::Internal(message) => Self::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { scope } => Self::NoCredentials { scope },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
