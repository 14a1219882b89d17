// ── device_ping ──

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Deserialize;

use super::{Audit, CheckReport, DeviceLogin, RemoteExec, list, number};

const CHECK: &str = "device_ping";

static FIRST_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").unwrap_or_else(|e| unreachable!("static regex: {e}")));

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingArgs {
    /// Devices the pings are sent from.
    #[serde(deserialize_with = "list")]
    pub device_list: Vec<String>,
    #[serde(deserialize_with = "list")]
    pub target_list: Vec<String>,
    /// Percentage of replies a single test needs to pass.
    #[serde(deserialize_with = "number")]
    pub passmark: u32,
    /// Failed tests tolerated, exclusive.
    #[serde(deserialize_with = "number")]
    pub fail_count: u32,
    #[serde(default = "default_count", deserialize_with = "number")]
    pub ping_count: u32,
    /// Seconds, passed to `ping -w`.
    #[serde(default = "default_timeout", deserialize_with = "number")]
    pub timeout: u32,
    #[serde(flatten)]
    pub login: DeviceLogin,
}

fn default_count() -> u32 {
    5
}

fn default_timeout() -> u32 {
    5
}

/// The summary line of Linux `ping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingStats {
    pub transmitted: u32,
    pub received: u32,
    pub loss_percent: u32,
}

/// Parse `5 packets transmitted, 5 received, 0% packet loss, time 4005ms`.
/// Lines with an extra `+N errors` part are handled.
pub fn parse_ping_summary(output: &str) -> Option<PingStats> {
    let line = output
        .lines()
        .rev()
        .find(|l| l.contains("packets transmitted"))?;
    let parts: Vec<&str> = line.split(',').collect();
    let first_int = |s: &str| -> Option<u32> { FIRST_INT.find(s)?.as_str().parse().ok() };

    Some(PingStats {
        transmitted: first_int(parts.first().copied()?)?,
        received: first_int(parts.get(1).copied()?)?,
        loss_percent: first_int(parts.iter().copied().find(|p| p.contains('%'))?)?,
    })
}

/// Ping every target from every device over SSH.
pub async fn device_ping<E: RemoteExec>(exec: &E, args: &PingArgs, audit: &mut Audit) -> CheckReport {
    let mut passed = 0;
    let mut failed = 0;
    audit.log(format!("{CHECK} - checking endpoint connectivity"));

    let commands: Vec<String> = args
        .target_list
        .iter()
        .map(|t| format!("ping -c {} -w {} {t}", args.ping_count, args.timeout))
        .collect();

    for device in &args.device_list {
        audit.log(format!("{CHECK}: Connecting to {device}"));
        let outputs = match exec.run(device, &commands).await {
            Ok(outputs) => outputs,
            Err(e) => {
                audit.log(format!("{CHECK}: {e}"));
                failed += u32::try_from(args.target_list.len()).unwrap_or(u32::MAX);
                continue;
            }
        };

        for (target, output) in args.target_list.iter().zip(&outputs) {
            let ok = parse_ping_summary(&output.stdout)
                .is_some_and(|s| 100_u32.saturating_sub(s.loss_percent) >= args.passmark);
            if ok {
                audit.log(format!("{CHECK}: Ping from {device} to {target} - Pass"));
                passed += 1;
            } else {
                audit.log(format!("{CHECK}: Ping from {device} to {target} - Failed"));
                failed += 1;
            }
        }
    }

    let report = CheckReport::tally(CHECK, passed, failed, args.fail_count);
    if report.success {
        audit.log(format!(
            "{CHECK}: Passed - Number of failures must be less than {}. {passed} device(s) received the required number of pings",
            args.fail_count
        ));
    } else {
        audit.log(format!(
            "{CHECK}: Failed - Number of failures must be less than {}. {failed} device(s) did not receive the required number of pings",
            args.fail_count
        ));
    }
    report
}
