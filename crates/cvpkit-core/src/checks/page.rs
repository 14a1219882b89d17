// ── page_check ──

use serde::Deserialize;

use super::{Audit, CheckReport, CommandOutput, DeviceLogin, RemoteExec, list, number};

const CHECK: &str = "page_check";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageArgs {
    #[serde(rename = "pageURL")]
    pub page_url: String,
    #[serde(deserialize_with = "list")]
    pub device_list: Vec<String>,
    #[serde(deserialize_with = "number")]
    pub fail_count: u32,
    /// Seconds, passed to `curl -m`.
    #[serde(default = "default_timeout", deserialize_with = "number")]
    pub timeout: u32,
    #[serde(flatten)]
    pub login: DeviceLogin,
}

fn default_timeout() -> u32 {
    1
}

enum Verdict {
    Pass,
    /// curl itself reported an error.
    CurlError(String),
    /// The server answered with something other than 200.
    BadStatus(String),
}

fn judge(output: &CommandOutput) -> Verdict {
    if let Some(last) = output.stderr.lines().rev().find(|l| !l.trim().is_empty()) {
        if last.contains("Failed") || last.contains("Error") {
            return Verdict::CurlError(last.trim().to_owned());
        }
    }
    let status_line = output.stdout.lines().next().unwrap_or_default().trim();
    if status_code(status_line) == Some(200) {
        Verdict::Pass
    } else {
        Verdict::BadStatus(status_line.to_owned())
    }
}

/// `HTTP/1.1 200 OK` and `HTTP/2 200` both yield 200.
fn status_code(line: &str) -> Option<u16> {
    let mut parts = line.split_whitespace();
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

/// Fetch the page headers from each device with curl.
pub async fn page_check<E: RemoteExec>(exec: &E, args: &PageArgs, audit: &mut Audit) -> CheckReport {
    let mut passed = 0;
    let mut failed = 0;
    let url = &args.page_url;
    audit.log(format!("{CHECK} - check Web Page connectivity"));

    let command = vec![format!("curl --insecure -I -m {} {url}", args.timeout)];

    for device in &args.device_list {
        audit.log(format!("{CHECK}: Connecting to {device}"));
        let output = match exec.run(device, &command).await {
            Ok(mut outputs) if !outputs.is_empty() => outputs.swap_remove(0),
            Ok(_) => CommandOutput::default(),
            Err(e) => {
                audit.log(format!("{CHECK}: {e}"));
                failed += 1;
                continue;
            }
        };

        match judge(&output) {
            Verdict::Pass => {
                audit.log(format!("{CHECK}: Access from {device} to {url}: Pass"));
                passed += 1;
            }
            Verdict::CurlError(detail) => {
                audit.log(format!("{CHECK}: Access from {device} to {url}: Failed (1)"));
                audit.log(format!("{CHECK}: {detail}"));
                failed += 1;
            }
            Verdict::BadStatus(detail) => {
                audit.log(format!("{CHECK}: Access from {device} to {url}: Failed (2)"));
                audit.log(format!("{CHECK}: {detail}"));
                failed += 1;
            }
        }
    }

    let report = CheckReport::tally(CHECK, passed, failed, args.fail_count);
    if report.success {
        audit.log(format!(
            "{CHECK}: Passed - Number of failures must be less than {}. {passed} devices can access {url}",
            args.fail_count
        ));
    } else {
        audit.log(format!(
            "{CHECK}: Failed - Number of failures must be less than {}. {failed} devices were not able to access {url}",
            args.fail_count
        ));
    }
    report
}
