// ── Device domain types ──

use cvpkit_api::NetElement;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::compliance::ComplianceCode;

/// A provisioned switch as the portal inventory reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Switch {
    pub fqdn: String,
    pub hostname: String,
    pub ip_address: String,
    pub mac_address: String,
    pub serial_number: String,
    pub model_name: String,
    pub version: String,
    /// `None` when the inventory carries no code or an unparsable one.
    pub compliance: Option<ComplianceCode>,
}

impl Switch {
    /// The best human-facing name: fqdn, then hostname, then IP.
    pub fn display_name(&self) -> &str {
        [&self.fqdn, &self.hostname, &self.ip_address]
            .into_iter()
            .find(|s| !s.is_empty())
            .map_or("", String::as_str)
    }
}

impl From<NetElement> for Switch {
    fn from(e: NetElement) -> Self {
        Self {
            compliance: e.compliance_code.parse().ok(),
            fqdn: e.fqdn,
            hostname: e.hostname,
            ip_address: e.ip_address,
            mac_address: e.system_mac_address,
            serial_number: e.serial_number,
            model_name: e.model_name,
            version: e.version,
        }
    }
}

/// Health of a switch as the compliance watcher sees it.
///
/// Ordered worst first; the numeric values are the ones the watcher has
/// always logged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwitchStatus {
    Unreachable = 0,
    OutOfCompliance = 1,
    Compliant = 2,
}

impl SwitchStatus {
    /// Derive a status from reachability and, for reachable switches,
    /// the compliance check result.
    pub fn derive(reachable: bool, compliant: bool) -> Self {
        match (reachable, compliant) {
            (false, _) => Self::Unreachable,
            (true, true) => Self::Compliant,
            (true, false) => Self::OutOfCompliance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_prefers_unreachable() {
        assert_eq!(SwitchStatus::derive(false, true), SwitchStatus::Unreachable);
        assert_eq!(SwitchStatus::derive(true, false), SwitchStatus::OutOfCompliance);
        assert_eq!(SwitchStatus::derive(true, true), SwitchStatus::Compliant);
    }

    #[test]
    fn status_display_matches_report_labels() {
        assert_eq!(SwitchStatus::Unreachable.to_string(), "UNREACHABLE");
        assert_eq!(SwitchStatus::OutOfCompliance.to_string(), "OUT_OF_COMPLIANCE");
    }

    #[test]
    fn switch_from_net_element_parses_code() {
        let sw = Switch::from(NetElement {
            fqdn: "leaf1.lab".into(),
            ip_address: "10.0.0.11".into(),
            compliance_code: "0001".into(),
            ..NetElement::default()
        });
        assert_eq!(sw.compliance, Some(ComplianceCode::ConfigOutOfSync));
        assert_eq!(sw.display_name(), "leaf1.lab");
    }

    #[test]
    fn display_name_falls_back_to_ip() {
        let sw = Switch::from(NetElement {
            ip_address: "10.0.0.12".into(),
            ..NetElement::default()
        });
        assert_eq!(sw.display_name(), "10.0.0.12");
    }
}
