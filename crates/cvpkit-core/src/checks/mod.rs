//! Change-control checks.
//!
//! Each check runs against a list of devices, writes one audit line per
//! step, and passes or fails as a whole. A failed check surfaces as
//! [`CoreError::CheckFailed`] so a change-control runner sees a non-zero
//! exit.
//!
//! Arguments come from CLI flags or from a change-control action file:
//!
//! ```yaml
//! name: device_ping
//! args:
//!   deviceList: "10.83.30.110,10.83.30.111"
//!   targetList: [192.168.50.10, 192.168.51.10]
//!   passmark: 100
//!   failCount: 1
//! ```

mod page;
mod ping;
mod ssh;
mod switch_type;

use std::path::Path;

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CoreError;

pub use page::{PageArgs, page_check};
pub use ping::{PingArgs, PingStats, device_ping, parse_ping_summary};
pub use ssh::{CommandOutput, RemoteExec, SshExec};
pub use switch_type::{SwitchTypeArgs, check_switch_type};

// ── Audit trail ──

/// Collects audit lines, logging each and optionally echoing to stdout.
#[derive(Debug, Default)]
pub struct Audit {
    echo: bool,
    lines: Vec<String>,
}

impl Audit {
    /// Keep lines in memory only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also print every line as it is logged.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            lines: Vec::new(),
        }
    }

    pub fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!(target: "cvpkit::audit", "{line}");
        if self.echo {
            println!("{line}");
        }
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Outcome of one check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub check: &'static str,
    pub passed: u32,
    pub failed: u32,
    pub success: bool,
}

impl CheckReport {
    /// Pass when fewer than `fail_count` tests failed.
    pub(crate) fn tally(check: &'static str, passed: u32, failed: u32, fail_count: u32) -> Self {
        Self {
            check,
            passed,
            failed,
            success: failed < fail_count,
        }
    }

    pub fn into_result(self) -> Result<Self, CoreError> {
        if self.success {
            Ok(self)
        } else {
            Err(CoreError::CheckFailed {
                message: format!("{}: Failed", self.check),
            })
        }
    }
}

/// SSH login for checks that run commands on the devices. Either may be
/// left out of an action file and supplied from configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceLogin {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

// ── Action files ──

#[derive(Deserialize)]
struct ActionFile {
    name: String,
    #[serde(default)]
    args: serde_yaml::Mapping,
}

/// Load the `args` of a change-control action file. A file naming a
/// different script is accepted with a warning.
pub fn load_action<T: DeserializeOwned>(path: &Path, expected_name: &str) -> Result<T, CoreError> {
    let text = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
    parse_action(&text, expected_name).map_err(|e| match e {
        CoreError::ValidationFailed { message } => CoreError::ValidationFailed {
            message: format!("{}: {message}", path.display()),
        },
        other => other,
    })
}

pub(crate) fn parse_action<T: DeserializeOwned>(text: &str, expected_name: &str) -> Result<T, CoreError> {
    let action: ActionFile =
        serde_yaml::from_str(text).map_err(|e| CoreError::validation(e.to_string()))?;
    if action.name != expected_name {
        warn!(found = %action.name, expected = expected_name, "action file names another script");
    }
    serde_yaml::from_value(serde_yaml::Value::Mapping(action.args))
        .map_err(|e| CoreError::validation(e.to_string()))
}

// ── Lenient argument types ──

/// A list given either as `"a,b,c"` or as a YAML sequence.
pub(crate) fn list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Csv(String),
        Seq(Vec<serde_yaml::Value>),
    }

    Ok(match Raw::deserialize(d)? {
        Raw::Csv(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
        Raw::Seq(items) => items
            .into_iter()
            .filter_map(|v| match v {
                serde_yaml::Value::String(s) => Some(s),
                serde_yaml::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
    })
}

/// A count given either as a number or as a quoted number.
pub(crate) fn number<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u32),
        Str(String),
    }

    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
