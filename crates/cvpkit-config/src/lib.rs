//! Shared configuration for cvpkit.
//!
//! TOML profiles plus `[mail]`, `[syslog]`, `[ssh]` and `[sync]`
//! sections, credential resolution (env + keyring + plaintext), and
//! translation to `cvpkit_core` connection and notification settings.
//! The CLI layers flag overrides on top.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use cvpkit_api::ApiPrefix;
use cvpkit_core::{
    AuthCredentials, ConnectionConfig, MailSettings, PrefixSelection, SyslogTarget,
    TlsVerification,
};
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Keyring service every secret is stored under.
pub const KEYRING_SERVICE: &str = "cvpkit";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for {scope}")]
    NoCredentials { scope: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named CVP clusters.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<MailConfig>,

    #[serde(default)]
    pub syslog: SyslogConfig,

    #[serde(default)]
    pub ssh: SshConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
            mail: None,
            syslog: SyslogConfig::default(),
            ssh: SshConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named CVP cluster.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// CVP base URL (e.g., "https://cvp.example.com").
    pub server: String,

    pub username: Option<String>,

    /// Plaintext password; prefer the keyring or `CVP_PASSWORD`.
    pub password: Option<String>,

    /// "auto", "web" (before 2018.1) or "cvpservice".
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// `true` skips certificate checks, `false` uses the system store.
    /// Unset accepts CVP's self-signed certificate.
    pub insecure: Option<bool>,

    pub timeout: Option<u64>,
}

fn default_api_prefix() -> String {
    "auto".into()
}

/// SMTP relay for reports.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MailConfig {
    pub server: String,
    pub port: Option<u16>,
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Defaults to on when a username is set.
    pub starttls: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SyslogConfig {
    /// Socket path or `host:port`. Defaults to `/dev/log`.
    pub address: Option<String>,
}

/// Device login for change-control checks.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SshConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Defaults for `configlets sync`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    pub repo: Option<String>,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Configlet directory inside the repository.
    #[serde(default)]
    pub path: PathBuf,
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            repo: None,
            branch: default_branch(),
            path: PathBuf::new(),
            ignore: default_ignore(),
        }
    }
}

fn default_branch() -> String {
    "master".into()
}
fn default_ignore() -> Vec<String> {
    cvpkit_core::sync::DEFAULT_IGNORE
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "cvpkit", "cvpkit").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("cvpkit");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn figment(base: Figment) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(base)
        .merge(Env::prefixed("CVP_").split("__"))
}

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let config: Config = figment(Figment::from(Toml::file(config_path()))).extract()?;
    Ok(config)
}

/// Parse a TOML document the same way [`load_config`] reads the file.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let config: Config = figment(Figment::from(Toml::string(toml))).extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Keyring account for a secret, e.g. `lab/password` or `mail/password`.
pub fn keyring_account(scope: &str) -> String {
    format!("{scope}/password")
}

fn keyring_get(scope: &str) -> Option<SecretString> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(scope)).ok()?;
    entry.get_password().ok().map(SecretString::from)
}

/// Store a secret in the system keyring.
pub fn keyring_set(scope: &str, secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_account(scope))?.set_password(secret)?;
    Ok(())
}

/// `env` variable, then the keyring entry for `scope`, then plaintext.
fn resolve_secret(env: &str, scope: &str, plaintext: Option<&String>) -> Option<SecretString> {
    if let Ok(pw) = std::env::var(env) {
        return Some(SecretString::from(pw));
    }
    if let Some(pw) = keyring_get(scope) {
        return Some(pw);
    }
    plaintext.map(|pw| SecretString::from(pw.clone()))
}

/// Portal password for a profile: `CVP_PASSWORD`, keyring, plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    resolve_secret("CVP_PASSWORD", profile_name, profile.password.as_ref())
}

/// Resolve the portal login for a profile without CLI flags.
pub fn resolve_credentials(profile: &Profile, profile_name: &str) -> Result<AuthCredentials, ConfigError> {
    let no_creds = || ConfigError::NoCredentials {
        scope: format!("profile '{profile_name}'"),
    };

    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var("CVP_USERNAME").ok())
        .ok_or_else(no_creds)?;
    let password = resolve_password(profile, profile_name).ok_or_else(no_creds)?;

    Ok(AuthCredentials { username, password })
}

/// Parse `auto`, `web` or `cvpservice`.
pub fn parse_api_prefix(value: &str) -> Result<PrefixSelection, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "auto" => Ok(PrefixSelection::Auto),
        "web" => Ok(PrefixSelection::Fixed(ApiPrefix::Web)),
        "cvpservice" => Ok(PrefixSelection::Fixed(ApiPrefix::CvpService)),
        other => Err(ConfigError::Validation {
            field: "api_prefix".into(),
            reason: format!("expected 'auto', 'web', or 'cvpservice', got '{other}'"),
        }),
    }
}

/// TLS mode for a profile: explicit `insecure` wins, then a CA file;
/// with neither, CVP's self-signed certificate is accepted.
pub fn tls_for(insecure: Option<bool>, ca_cert: Option<&PathBuf>) -> TlsVerification {
    match (insecure, ca_cert) {
        (Some(true), _) | (None, None) => TlsVerification::DangerAcceptInvalid,
        (_, Some(ca)) => TlsVerification::CustomCa(ca.clone()),
        (Some(false), None) => TlsVerification::SystemDefaults,
    }
}

/// Normalize a server given as a bare host into an HTTPS URL.
pub fn parse_server(server: &str) -> Result<url::Url, ConfigError> {
    let with_scheme = if server.contains("://") {
        server.to_owned()
    } else {
        format!("https://{server}")
    };
    with_scheme.parse().map_err(|_| ConfigError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {server}"),
    })
}

/// Build a `ConnectionConfig` from a profile, no CLI flag overrides.
pub fn profile_to_connection_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ConnectionConfig, ConfigError> {
    let url = parse_server(&profile.server)?;
    let auth = resolve_credentials(profile, profile_name)?;

    let mut config = ConnectionConfig::new(url, auth);
    config.prefix = parse_api_prefix(&profile.api_prefix)?;
    config.tls = tls_for(profile.insecure, profile.ca_cert.as_ref());
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout));
    Ok(config)
}

impl MailConfig {
    /// Resolve into relay settings. STARTTLS follows the presence of a
    /// username unless set; the port follows STARTTLS (587, else 25).
    pub fn to_settings(&self) -> Result<MailSettings, ConfigError> {
        if self.server.is_empty() || self.from.is_empty() || self.to.is_empty() {
            return Err(ConfigError::Validation {
                field: "mail".into(),
                reason: "server, from and to are required".into(),
            });
        }

        let credentials = match &self.username {
            Some(user) => {
                let password = resolve_secret("CVP_MAIL_PASSWORD", "mail", self.password.as_ref())
                    .ok_or_else(|| ConfigError::NoCredentials {
                        scope: "mail".into(),
                    })?;
                Some((user.clone(), password))
            }
            None => None,
        };
        let starttls = self.starttls.unwrap_or(credentials.is_some());
        let port = self.port.unwrap_or(if starttls { 587 } else { 25 });

        Ok(MailSettings {
            server: self.server.clone(),
            port,
            from: self.from.clone(),
            to: self.to.clone(),
            credentials,
            starttls,
        })
    }
}

impl SyslogConfig {
    pub fn target(&self) -> SyslogTarget {
        self.address
            .as_deref()
            .map_or_else(SyslogTarget::default, SyslogTarget::parse)
    }
}

impl SshConfig {
    /// Username and password for device SSH, if both are known.
    pub fn credentials(&self) -> Option<(String, SecretString)> {
        let username = self.username.clone()?;
        let password = resolve_secret("CVP_SSH_PASSWORD", "ssh", self.password.as_ref())?;
        Some((username, password))
    }
}
