// ── Runtime connection configuration ──
//
// These types describe *how* to reach a CVP cluster. They carry
// credential data and connection tuning, but never touch disk.
// The CLI constructs a `ConnectionConfig` and hands it in.

use std::time::Duration;

use cvpkit_api::ApiPrefix;
use cvpkit_api::transport::{TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

/// Username and password for the portal login.
#[derive(Debug, Clone)]
pub struct AuthCredentials {
    pub username: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification. CVP installs ship with a self-signed certificate.
    #[default]
    DangerAcceptInvalid,
}

/// Which REST prefix to use, or probe for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrefixSelection {
    #[default]
    Auto,
    Fixed(ApiPrefix),
}

/// How long to keep retrying while CVP is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between attempts.
    pub delay: Duration,
    /// Give up after this many failed attempts. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(60),
            max_attempts: None,
        }
    }
}

/// Configuration for connecting to a single CVP cluster.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// CVP URL (e.g., `https://cvp.example.com`).
    pub url: Url,
    pub auth: AuthCredentials,
    pub prefix: PrefixSelection,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(url: Url, auth: AuthCredentials) -> Self {
        Self {
            url,
            auth,
            prefix: PrefixSelection::default(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Transport settings shared by every client built from this config.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: tls_to_transport(&self.tls),
            timeout: self.timeout,
            cookie_jar: None, // PortalClient::new adds one automatically
        }
    }

    /// The host part of the URL, for log and notification text.
    pub fn server_name(&self) -> String {
        self.url
            .host_str()
            .map_or_else(|| self.url.to_string(), String::from)
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
