//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use cvpkit_core::Cvp;

use crate::cli::GlobalOpts;
use crate::config::{self, Config};
use crate::error::CliError;

/// Log in to the active profile's CVP.
pub async fn connect(cfg: &Config, global: &GlobalOpts) -> Result<Cvp, CliError> {
    let connection = config::connection_config(global, cfg)?;
    let spinner = spinner(&format!("Connecting to {}", connection.server_name()), global.quiet);
    let result = Cvp::connect(connection).await;
    spinner.finish_and_clear();
    Ok(result?)
}

/// Spinner on stderr for slow calls; hidden when quiet or not a terminal.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Seconds (`3600`) or a humantime duration (`1h`, `30m`). Must be at
/// least one second.
pub fn parse_interval(value: &str) -> Result<Duration, CliError> {
    let interval = match value.trim().parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => humantime::parse_duration(value.trim()).map_err(|e| CliError::Validation {
            field: "interval".into(),
            reason: format!("{value:?}: {e}"),
        })?,
    };
    if interval < Duration::from_secs(1) {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: format!("{value:?} is shorter than one second"),
        });
    }
    Ok(interval)
}
