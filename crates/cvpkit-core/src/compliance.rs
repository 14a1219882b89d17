// ── Compliance checking ──
//
// Two flavors: a one-shot report of every non-compliant device, and a
// foreground watcher that re-checks on an interval and only reports
// devices whose status changed since the last cycle.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Local};
use cvpkit_api::PortalClient;
use cvpkit_api::error::IP_UNREACHABLE;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::error::CoreError;
use crate::model::{ComplianceCode, Switch, SwitchStatus};
use crate::notify::{Notifier, Report};
use crate::session::Cvp;

/// Intervals at or below this many seconds get a warning.
pub const MIN_INTERVAL_SECS: u64 = 60;
/// Default time between watcher cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3600);

const REPORT_SUBJECT: &str = "Device compliance report";

// ── One-shot report ──────────────────────────────────────────────────

/// A device whose compliance check returned a non-zero code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NonCompliant {
    pub device: String,
    pub code: ComplianceCode,
}

impl NonCompliant {
    pub fn line(&self) -> String {
        format!(
            "Device {} is non-compliant due to: {}",
            self.device,
            self.code.message()
        )
    }
}

/// Check every inventory device and return the ones out of compliance.
pub async fn non_compliant_devices(portal: &PortalClient) -> Result<Vec<NonCompliant>, CoreError> {
    let devices: Vec<Switch> = portal
        .list_devices()
        .await?
        .into_iter()
        .map(Switch::from)
        .collect();
    info!(count = devices.len(), "checking device compliance");

    let mut found = Vec::new();
    for device in devices {
        let result = portal.check_compliance(&device.mac_address).await?;
        let code = parse_code(&result.compliance_code)?;
        debug!(device = device.display_name(), %code, "compliance checked");
        if !code.is_compliant() {
            found.push(NonCompliant {
                device: device.fqdn.clone(),
                code,
            });
        }
    }
    Ok(found)
}

/// The mail/print report for a set of non-compliant devices, or `None`
/// when there is nothing to say.
pub fn compliance_report(devices: &[NonCompliant]) -> Option<Report> {
    if devices.is_empty() {
        return None;
    }
    Some(Report::new(
        REPORT_SUBJECT,
        devices.iter().map(NonCompliant::line).collect(),
    ))
}

fn parse_code(raw: &str) -> Result<ComplianceCode, CoreError> {
    raw.parse().map_err(|_| CoreError::Api {
        message: format!("unexpected compliance code {raw:?}"),
        code: None,
        status: None,
    })
}

// ── Watcher ──────────────────────────────────────────────────────────

/// Last reported status per switch IP. A switch is reported again only
/// when its status changes; the first sighting counts as a change.
#[derive(Debug, Default)]
pub struct StatusTracker {
    last: HashMap<String, SwitchStatus>,
}

impl StatusTracker {
    /// Record `status` for `ip` and return whether it differs from the
    /// previous one.
    pub fn observe(&mut self, ip: &str, status: SwitchStatus) -> bool {
        self.last.insert(ip.to_owned(), status) != Some(status)
    }

    pub fn get(&self, ip: &str) -> Option<SwitchStatus> {
        self.last.get(ip).copied()
    }
}

/// Switches whose status changed to a reportable state in one cycle.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    pub unreachable: Vec<String>,
    pub out_of_compliance: Vec<String>,
}

impl CycleOutcome {
    /// One report per non-empty set, stamped with `now` the way the
    /// checker has always formatted it.
    pub fn reports(&self, now: DateTime<Local>) -> Vec<Report> {
        let stamp = now.format("%a %b %e %H:%M:%S %Y");
        [
            (SwitchStatus::Unreachable, &self.unreachable),
            (SwitchStatus::OutOfCompliance, &self.out_of_compliance),
        ]
        .into_iter()
        .filter(|(_, switches)| !switches.is_empty())
        .map(|(status, switches)| {
            Report::new(
                format!("{stamp} CVP_Compliance_Checker: {status}: "),
                switches.clone(),
            )
        })
        .collect()
    }
}

/// Whether CVP can reach `ip`. API errors count as unreachable; only the
/// documented "not reachable" code is expected, anything else is logged.
async fn reachable(portal: &PortalClient, ip: &str) -> Result<bool, CoreError> {
    match portal.ip_connectivity_test(ip).await {
        Ok(ok) => Ok(ok),
        Err(e) => match e.api_error_code() {
            Some(IP_UNREACHABLE) => Ok(false),
            Some(_) => {
                warn!(ip, error = %e, "connectivity test failed");
                Ok(false)
            }
            None => Err(e.into()),
        },
    }
}

/// Run one check cycle against `portal`.
pub async fn check_cycle(
    portal: &PortalClient,
    tracker: &mut StatusTracker,
) -> Result<CycleOutcome, CoreError> {
    let devices: IndexMap<String, String> = portal
        .list_devices()
        .await?
        .into_iter()
        .map(|d| (d.system_mac_address, d.ip_address))
        .collect();

    let mut outcome = CycleOutcome::default();
    for (mac, ip) in &devices {
        let is_reachable = reachable(portal, ip).await?;
        let compliant = if is_reachable {
            let result = portal.check_compliance(mac).await?;
            parse_code(&result.compliance_code)?.is_compliant()
        } else {
            false
        };

        let status = SwitchStatus::derive(is_reachable, compliant);
        if !tracker.observe(ip, status) {
            continue;
        }
        debug!(ip, %status, "status changed");
        match status {
            SwitchStatus::Unreachable => outcome.unreachable.push(ip.clone()),
            SwitchStatus::OutOfCompliance => outcome.out_of_compliance.push(ip.clone()),
            SwitchStatus::Compliant => {}
        }
    }
    Ok(outcome)
}

/// Periodic compliance watcher. Runs in the foreground until Ctrl-C.
pub struct Watcher {
    config: ConnectionConfig,
    notifier: Notifier,
    interval: Duration,
    retry_delay: Duration,
    once: bool,
}

impl Watcher {
    pub fn new(config: ConnectionConfig, notifier: Notifier) -> Self {
        Self {
            config,
            notifier,
            interval: DEFAULT_INTERVAL,
            retry_delay: Duration::from_secs(60),
            once: false,
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        if interval.as_secs() <= MIN_INTERVAL_SECS {
            warn!(
                "polling interval of {}s is below the recommended minimum of {MIN_INTERVAL_SECS}s",
                interval.as_secs()
            );
        }
        self.interval = interval;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Run a single cycle. A failed cycle is returned instead of retried.
    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    pub async fn run(self) -> Result<(), CoreError> {
        let server = self.config.server_name();
        self.announce(&format!(
            "CVP Compliance Checker started.  Executing every {} seconds against",
            self.interval.as_secs()
        ))
        .await;

        let mut tracker = StatusTracker::default();
        loop {
            let pause = match self.cycle(&mut tracker).await {
                Ok(()) if self.once => break,
                Ok(()) => self.interval,
                Err(e @ CoreError::AuthenticationFailed { .. }) => return Err(e),
                Err(e) if self.once => {
                    self.announce("Compliance Checker Stopping against").await;
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        "error reaching CVP server {server}, trying again in {}s",
                        self.retry_delay.as_secs()
                    );
                    self.retry_delay
                }
            };

            tokio::select! {
                () = tokio::time::sleep(pause) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted");
                    break;
                }
            }
        }

        self.announce("Compliance Checker Stopping against").await;
        Ok(())
    }

    async fn cycle(&self, tracker: &mut StatusTracker) -> Result<(), CoreError> {
        let cvp = Cvp::connect(self.config.clone()).await?;
        let outcome = check_cycle(cvp.portal(), tracker).await;
        cvp.disconnect().await;
        let outcome = outcome?;

        for report in outcome.reports(Local::now()) {
            self.notifier.send(&report).await?;
        }
        info!("executed compliance check @ {}", Local::now().format("%a %b %e %H:%M:%S %Y"));
        Ok(())
    }

    async fn announce(&self, text: &str) {
        let report = Report::new(text, vec![self.config.server_name()]);
        info!("{} {}", report.subject, self.config.server_name());
        if let Err(e) = self.notifier.send_syslog(&report).await {
            warn!(error = %e, "could not announce to syslog");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::TimeZone;
    use cvpkit_api::{ApiPrefix, TransportConfig};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::AuthCredentials;

    fn portal(server: &MockServer) -> PortalClient {
        PortalClient::new(
            Url::parse(&server.uri()).unwrap(),
            ApiPrefix::Web,
            &TransportConfig::default(),
        )
        .unwrap()
    }

    async fn mount_inventory(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/web/inventory/getInventory.do"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "netElementList": [
                    { "fqdn": "leaf1.lab", "ipAddress": "10.0.0.11", "systemMacAddress": "mac1" },
                    { "fqdn": "leaf2.lab", "ipAddress": "10.0.0.12", "systemMacAddress": "mac2" },
                    { "fqdn": "leaf3.lab", "ipAddress": "10.0.0.13", "systemMacAddress": "mac3" }
                ]
            })))
            .mount(server)
            .await;
    }

    async fn mount_compliance(server: &MockServer, mac: &str, code: &str) {
        Mock::given(method("POST"))
            .and(path("/web/provisioning/checkCompliance.do"))
            .and(body_json(json!({ "nodeId": mac, "nodeType": "netelement" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "complianceCode": code,
                "complianceIndication": ""
            })))
            .mount(server)
            .await;
    }

    async fn mount_ping(server: &MockServer, ip: &str, reachable: bool) {
        let body = if reachable {
            json!({ "data": "success" })
        } else {
            json!({ "errorCode": "122605", "errorMessage": "Ip not reachable" })
        };
        Mock::given(method("POST"))
            .and(path("/web/provisioning/ipConnectivityTest.do"))
            .and(body_json(json!({ "ipAddress": ip })))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn tracker_reports_first_sighting_and_changes_only() {
        let mut tracker = StatusTracker::default();
        assert!(tracker.observe("10.0.0.1", SwitchStatus::Unreachable));
        assert!(!tracker.observe("10.0.0.1", SwitchStatus::Unreachable));
        assert!(tracker.observe("10.0.0.1", SwitchStatus::Compliant));
        assert!(tracker.observe("10.0.0.1", SwitchStatus::Unreachable));
        assert_eq!(tracker.get("10.0.0.1"), Some(SwitchStatus::Unreachable));
    }

    #[test]
    fn report_lines_name_device_and_reason() {
        let devices = vec![NonCompliant {
            device: "leaf1.lab".into(),
            code: ComplianceCode::ConfigOutOfSync,
        }];
        let report = compliance_report(&devices).unwrap();
        assert_eq!(report.subject, "Device compliance report");
        assert_eq!(
            report.lines,
            vec!["Device leaf1.lab is non-compliant due to: Config out of sync"]
        );
        assert!(compliance_report(&[]).is_none());
    }

    #[test]
    fn cycle_reports_use_asctime_stamp() {
        let outcome = CycleOutcome {
            unreachable: vec!["10.0.0.11".into()],
            out_of_compliance: vec![],
        };
        let now = Local.with_ymd_and_hms(2017, 10, 3, 9, 5, 7).unwrap();
        let reports = outcome.reports(now);
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].subject,
            "Tue Oct  3 09:05:07 2017 CVP_Compliance_Checker: UNREACHABLE: "
        );
    }

    #[tokio::test]
    async fn non_compliant_devices_skips_code_zero() {
        let server = MockServer::start().await;
        mount_inventory(&server).await;
        mount_compliance(&server, "mac1", "0000").await;
        mount_compliance(&server, "mac2", "0002").await;
        mount_compliance(&server, "mac3", "0000").await;

        let found = non_compliant_devices(&portal(&server)).await.unwrap();
        assert_eq!(
            found,
            vec![NonCompliant {
                device: "leaf2.lab".into(),
                code: ComplianceCode::ImageOutOfSync,
            }]
        );
    }

    #[tokio::test]
    async fn cycle_classifies_and_suppresses_repeats() {
        let server = MockServer::start().await;
        mount_inventory(&server).await;
        mount_ping(&server, "10.0.0.11", false).await;
        mount_ping(&server, "10.0.0.12", true).await;
        mount_ping(&server, "10.0.0.13", true).await;
        mount_compliance(&server, "mac2", "0001").await;
        mount_compliance(&server, "mac3", "0000").await;

        let portal = portal(&server);
        let mut tracker = StatusTracker::default();

        let first = check_cycle(&portal, &mut tracker).await.unwrap();
        assert_eq!(
            first,
            CycleOutcome {
                unreachable: vec!["10.0.0.11".into()],
                out_of_compliance: vec!["10.0.0.12".into()],
            }
        );
        assert_eq!(tracker.get("10.0.0.13"), Some(SwitchStatus::Compliant));

        let second = check_cycle(&portal, &mut tracker).await.unwrap();
        assert_eq!(second, CycleOutcome::default());
    }

    #[tokio::test]
    async fn other_api_errors_count_as_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/web/provisioning/ipConnectivityTest.do"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errorCode": "999999",
                "errorMessage": "something else"
            })))
            .mount(&server)
            .await;

        assert!(!reachable(&portal(&server), "10.0.0.50").await.unwrap());
    }

    #[tokio::test]
    async fn single_run_returns_cycle_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = ConnectionConfig::new(
            Url::parse(&server.uri()).unwrap(),
            AuthCredentials {
                username: "cvpadmin".into(),
                password: "secret".to_string().into(),
            },
        );
        let watcher = Watcher::new(config, Notifier::default())
            .retry_delay(Duration::from_secs(3600))
            .once(true);

        let result = tokio::time::timeout(Duration::from_secs(10), watcher.run()).await;
        assert!(matches!(result, Ok(Err(_))), "watcher kept retrying: {result:?}");
    }
}
