//! CLI configuration: a thin wrapper around `cvpkit_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--server, --username, etc.).

use std::time::Duration;

use secrecy::SecretString;

use cvpkit_core::{
    AuthCredentials, ConnectionConfig, Notifier, PrefixSelection, RetryPolicy, Sink,
    TlsVerification,
};

use crate::cli::{GlobalOpts, RetryArgs, SinkArgs};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use cvpkit_config::{
    Config, Defaults, Profile, config_path, keyring_set, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Build the connection for a CVP-bound command: profile values with CLI
/// flag overrides, or flags alone when no profile exists.
pub fn connection_config(global: &GlobalOpts, cfg: &Config) -> Result<ConnectionConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let Some(profile) = cfg.profiles.get(&profile_name) else {
        if global.profile.is_some() {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(cfg),
            });
        }
        return from_flags(global, cfg, &profile_name);
    };

    // 1. Server (flag > env > profile)
    let server = global.server.as_deref().unwrap_or(&profile.server);
    let url = cvpkit_config::parse_server(server)?;

    // 2. Credentials (flag > env > keyring > plaintext)
    let no_creds = || CliError::NoCredentials {
        scope: format!("profile '{profile_name}'"),
    };
    let username = global
        .username
        .clone()
        .or_else(|| profile.username.clone())
        .ok_or_else(no_creds)?;
    let password = match &global.password {
        Some(pw) => SecretString::from(pw.clone()),
        None => cvpkit_config::resolve_password(profile, &profile_name).ok_or_else(no_creds)?,
    };

    // 3. TLS verification
    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        cvpkit_config::tls_for(profile.insecure, profile.ca_cert.as_ref())
    };

    let mut config = ConnectionConfig::new(url, AuthCredentials { username, password });
    config.prefix = cvpkit_config::parse_api_prefix(&profile.api_prefix)?;
    config.tls = tls;
    config.timeout = Duration::from_secs(
        global
            .timeout
            .or(profile.timeout)
            .unwrap_or(cfg.defaults.timeout),
    );
    Ok(config)
}

fn from_flags(global: &GlobalOpts, cfg: &Config, profile_name: &str) -> Result<ConnectionConfig, CliError> {
    let server = global.server.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let url = cvpkit_config::parse_server(server)?;

    let (Some(username), Some(password)) = (&global.username, &global.password) else {
        return Err(CliError::NoCredentials {
            scope: format!("profile '{profile_name}'"),
        });
    };

    let mut config = ConnectionConfig::new(
        url,
        AuthCredentials {
            username: username.clone(),
            password: SecretString::from(password.clone()),
        },
    );
    config.prefix = PrefixSelection::Auto;
    config.tls = cvpkit_config::tls_for(global.insecure.then_some(true), None);
    config.timeout = Duration::from_secs(global.timeout.unwrap_or(cfg.defaults.timeout));
    Ok(config)
}

/// Sinks selected on the command line. With none selected, reports
/// are printed.
pub fn notifier(sinks: &SinkArgs, cfg: &Config) -> Result<Notifier, CliError> {
    let mut selected = Vec::new();
    if sinks.print || !(sinks.mail || sinks.syslog) {
        selected.push(Sink::Print);
    }
    if sinks.mail {
        let mail = cfg.mail.as_ref().ok_or_else(|| CliError::Validation {
            field: "mail".into(),
            reason: format!(
                "--mail needs a [mail] section in {}",
                config_path().display()
            ),
        })?;
        selected.push(Sink::Mail(mail.to_settings()?));
    }
    if sinks.syslog {
        selected.push(Sink::Syslog(cfg.syslog.target()));
    }
    Ok(Notifier::new(selected))
}

pub fn retry_policy(args: &RetryArgs) -> RetryPolicy {
    RetryPolicy {
        delay: Duration::from_secs(args.retry_delay),
        max_attempts: args.max_attempts,
    }
}

/// Device login for checks: the action file's values, then the `[ssh]`
/// section, then the CVP login flags.
pub fn device_login(
    from_action: (Option<String>, Option<String>),
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(String, SecretString), CliError> {
    let (ssh_user, ssh_password) = cfg
        .ssh
        .credentials()
        .map_or((None, None), |(u, p)| (Some(u), Some(p)));

    let username = from_action
        .0
        .or(ssh_user)
        .or_else(|| global.username.clone());
    let password = from_action
        .1
        .map(SecretString::from)
        .or(ssh_password)
        .or_else(|| global.password.clone().map(SecretString::from));

    match (username, password) {
        (Some(u), Some(p)) => Ok((u, p)),
        _ => Err(CliError::NoCredentials {
            scope: "device login".into(),
        }),
    }
}
