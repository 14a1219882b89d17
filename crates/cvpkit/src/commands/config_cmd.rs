//! Config subcommand handlers.

use std::collections::HashMap;
use std::fmt::Write as _;

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, SecretScope};
use crate::config::{self, Config, Defaults, Profile};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of the config with every stored secret masked.
fn redacted(cfg: &Config) -> Config {
    let mask = |s: &mut Option<String>| {
        if s.is_some() {
            *s = Some(MASK.into());
        }
    };
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        mask(&mut profile.password);
    }
    if let Some(mail) = cfg.mail.as_mut() {
        mask(&mut mail.password);
    }
    mask(&mut cfg.ssh.password);
    cfg
}

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    let cfg = redacted(cfg);
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "server = \"{}\"", p.server);
        let _ = writeln!(out, "api_prefix = \"{}\"", p.api_prefix);
        if let Some(ref u) = p.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if let Some(ref pw) = p.password {
            let _ = writeln!(out, "password = \"{pw}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    if let Some(ref mail) = cfg.mail {
        let _ = writeln!(out);
        let _ = writeln!(out, "[mail]");
        let _ = writeln!(out, "server = \"{}\"", mail.server);
        if let Some(port) = mail.port {
            let _ = writeln!(out, "port = {port}");
        }
        let _ = writeln!(out, "from = \"{}\"", mail.from);
        let _ = writeln!(out, "to = {:?}", mail.to);
        if let Some(ref u) = mail.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if let Some(ref pw) = mail.password {
            let _ = writeln!(out, "password = \"{pw}\"");
        }
    }

    if let Some(ref address) = cfg.syslog.address {
        let _ = writeln!(out);
        let _ = writeln!(out, "[syslog]");
        let _ = writeln!(out, "address = \"{address}\"");
    }

    if cfg.ssh.username.is_some() || cfg.ssh.password.is_some() {
        let _ = writeln!(out);
        let _ = writeln!(out, "[ssh]");
        if let Some(ref u) = cfg.ssh.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if let Some(ref pw) = cfg.ssh.password {
            let _ = writeln!(out, "password = \"{pw}\"");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "[sync]");
    if let Some(ref repo) = cfg.sync.repo {
        let _ = writeln!(out, "repo = \"{repo}\"");
    }
    let _ = writeln!(out, "branch = \"{}\"", cfg.sync.branch);
    let _ = writeln!(out, "path = \"{}\"", cfg.sync.path.display());
    let _ = writeln!(out, "ignore = {:?}", cfg.sync.ignore);

    out
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_secret(prompt: &str) -> Result<String, CliError> {
    let secret = rpassword::prompt_password(prompt).map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "value cannot be empty".into(),
        });
    }
    Ok(secret)
}

/// Offer the keyring or the config file for a secret.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(secret: &str, scope: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        config::keyring_set(scope, secret)?;
        eprintln!("   ✓ Password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret.to_owned()))
    }
}

fn set_profile_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "server" => {
            cvpkit_config::parse_server(&value)?;
            profile.server = value;
        }
        "username" => profile.username = Some(value),
        "api_prefix" | "api-prefix" => {
            cvpkit_config::parse_api_prefix(&value)?;
            profile.api_prefix = value;
        }
        "insecure" => {
            profile.insecure = Some(value.parse().map_err(|_| CliError::Validation {
                field: "insecure".into(),
                reason: "must be 'true' or 'false'".into(),
            })?);
        }
        "timeout" => {
            profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                field: "timeout".into(),
                reason: "must be a number (seconds)".into(),
            })?);
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: server, username, api_prefix, \
                     insecure, timeout, ca_cert"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("cvpkit configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let server: String = Input::new()
                .with_prompt("CVP server (host or URL)")
                .interact_text()
                .map_err(prompt_err)?;
            cvpkit_config::parse_server(&server)?;

            let username: String = Input::new()
                .with_prompt("Username")
                .default("cvpadmin".into())
                .interact_text()
                .map_err(prompt_err)?;
            let secret = prompt_secret("Password: ")?;
            let password = prompt_keyring_storage(&secret, &profile_name)?;

            let prefixes = &["auto", "cvpservice", "web"];
            let prefix = Select::new()
                .with_prompt("API prefix (auto probes the server)")
                .items(prefixes)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let profile = Profile {
                server,
                username: Some(username),
                password,
                api_prefix: prefixes[prefix].into(),
                ..Profile::default()
            };

            // Keep the other sections of an existing file.
            let mut cfg = config::load_config_or_default();
            cfg.default_profile = Some(profile_name.clone());
            cfg.defaults = Defaults::default();
            cfg.profiles = HashMap::from([(profile_name.clone(), profile)]);

            save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: cvpkit devices list");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = if output::is_human(&global.output) {
                output::render_single(&global.output, &cfg, format_config_redacted, format_config_redacted)
            } else {
                output::render_single(&global.output, &redacted(&cfg), |_| String::new(), |_| String::new())
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg.profiles.entry(profile_name.clone()).or_insert_with(|| Profile {
                api_prefix: "auto".into(),
                ..Profile::default()
            });
            set_profile_key(profile, &key, value)?;

            save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: cvpkit config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    name,
                    available: config::available_profiles(&cfg),
                });
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { scope } => {
            let cfg = config::load_config_or_default();
            let keyring_scope = match scope {
                SecretScope::Profile => {
                    let name = config::active_profile_name(global, &cfg);
                    if !cfg.profiles.contains_key(&name) {
                        return Err(CliError::ProfileNotFound {
                            name,
                            available: config::available_profiles(&cfg),
                        });
                    }
                    name
                }
                SecretScope::Mail => "mail".into(),
                SecretScope::Ssh => "ssh".into(),
            };

            let secret = prompt_secret("Password: ")?;
            config::keyring_set(&keyring_scope, &secret)?;
            eprintln!("✓ Password stored in system keyring for '{keyring_scope}'");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use cvpkit_config::parse_config;

    use super::*;

    const CONFIG: &str = r#"
default_profile = "lab"

[profiles.lab]
server = "cvp.lab.example.com"
username = "cvpadmin"
password = "hunter2"

[mail]
server = "smtp.example.com"
from = "cvp@example.com"
to = ["noc@example.com"]
username = "relay"
password = "relaypw"

[ssh]
username = "ops"
password = "sshpw"
"#;

    #[test]
    fn show_masks_every_secret() {
        let cfg = parse_config(CONFIG).unwrap();
        let text = format_config_redacted(&cfg);
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("relaypw"));
        assert!(!text.contains("sshpw"));
        assert!(text.contains("[profiles.lab]"));
        assert!(text.contains("username = \"ops\""));
        assert_eq!(text.matches(MASK).count(), 3);
    }

    #[test]
    fn structured_show_is_redacted_too() {
        let cfg = parse_config(CONFIG).unwrap();
        let json = serde_json::to_string(&redacted(&cfg)).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("cvp.lab.example.com"));
    }

    #[test]
    fn set_validates_values() {
        let mut profile = Profile::default();
        set_profile_key(&mut profile, "api_prefix", "cvpservice".into()).unwrap();
        assert_eq!(profile.api_prefix, "cvpservice");
        set_profile_key(&mut profile, "timeout", "90".into()).unwrap();
        assert_eq!(profile.timeout, Some(90));

        assert!(set_profile_key(&mut profile, "api_prefix", "v2".into()).is_err());
        assert!(set_profile_key(&mut profile, "insecure", "maybe".into()).is_err());
        assert!(matches!(
            set_profile_key(&mut profile, "site", "default".into()),
            Err(CliError::Validation { .. })
        ));
    }
}
