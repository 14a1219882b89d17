// ── Port inventory ──
//
// Walks the Analytics Engine state of every switch and joins interface
// config, status, VLAN membership and neighbor data into one row per
// port. Sysdb links records with `_ptr` paths, so most lookups here are
// one GET to find a pointer and another to follow it.

use std::collections::HashMap;

use cvpkit_api::aeris::paths;
use cvpkit_api::{AerisClient, Updates};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::interface::sort_interfaces;
use crate::model::{LinkStatus, PortRow, RemoteEntry, format_packed_mac};

const UNKNOWN: &str = "UNKNOWN";

type RemoteTable = HashMap<String, Vec<RemoteEntry>>;

/// Read the `_value._ptr` link of an update entry.
fn ptr(entry: &Value) -> Option<&str> {
    entry.pointer("/_value/_ptr").and_then(Value::as_str)
}

fn str_at<'a>(entry: &'a Value, pointer: &str) -> &'a str {
    entry.pointer(pointer).and_then(Value::as_str).unwrap_or_default()
}

/// Port inventory collector bound to one Analytics Engine client.
pub struct PortInventory<'a> {
    aeris: &'a AerisClient,
    with_ip: bool,
}

impl<'a> PortInventory<'a> {
    pub fn new(aeris: &'a AerisClient) -> Self {
        Self {
            aeris,
            with_ip: false,
        }
    }

    /// Also look up each port's IP address (one extra request per port).
    pub fn with_ip(mut self, with_ip: bool) -> Self {
        self.with_ip = with_ip;
        self
    }

    /// Collect rows for every switch the Analytics Engine knows.
    pub async fn collect(&self) -> Result<Vec<PortRow>, CoreError> {
        let switches = self.aeris.list_switches().await?;
        info!(count = switches.len(), "collecting port inventory");

        let mut rows = Vec::new();
        for serial in &switches {
            rows.extend(self.collect_switch(serial).await?);
        }
        Ok(rows)
    }

    /// Collect rows for the switch with serial number `serial`.
    pub async fn collect_switch(&self, serial: &str) -> Result<Vec<PortRow>, CoreError> {
        let hostname = self.hostname(serial).await?;
        debug!(serial, %hostname, "walking switch");

        let vlans = self.vlan_membership(serial).await?;
        let mut interfaces: Vec<String> = self
            .aeris
            .get_updates(serial, paths::INTF_CONFIG)
            .await?
            .keys()
            .cloned()
            .collect();
        sort_interfaces(&mut interfaces);

        let lldp = self.lldp_neighbors(serial).await?;
        let arp = self.arp_entries(serial).await?;
        let macs = self.mac_entries(serial).await?;

        let mut rows = Vec::with_capacity(interfaces.len());
        for interface in interfaces {
            let config = self
                .aeris
                .get_updates(serial, &format!("{}/{interface}", paths::INTF_CONFIG))
                .await?;
            let status = self
                .aeris
                .get_updates(serial, &format!("{}/{interface}", paths::INTF_STATUS))
                .await?;
            let ip_address = if self.with_ip {
                Some(self.ip_address(serial, &interface).await?)
            } else {
                None
            };

            let status = Value::Object(status);
            let config = Value::Object(config);
            rows.push(PortRow {
                switch: hostname.clone(),
                port: str_at(&status, "/deviceName/_value").to_owned(),
                status: LinkStatus::from_sysdb(str_at(&status, "/linkStatus/_value/Name")),
                speed: str_at(&status, "/speed/_value/Name").to_owned(),
                duplex: str_at(&status, "/duplex/_value/Name").to_owned(),
                remote: remote_info(&lldp, &arp, &macs, &interface),
                vlans: vlans.get(&interface).cloned().unwrap_or_default(),
                description: str_at(&config, "/description/_value").to_owned(),
                ip_address,
            });
        }
        Ok(rows)
    }

    async fn hostname(&self, serial: &str) -> Result<String, CoreError> {
        let updates = self.aeris.get_updates(serial, paths::HOSTNAME_CONFIG).await?;
        Ok(updates
            .get("hostname")
            .and_then(|h| h.get("_value"))
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN)
            .to_owned())
    }

    /// Interface name to the VLANs it carries, VLAN 1 excluded, in
    /// ascending VLAN order.
    async fn vlan_membership(&self, serial: &str) -> Result<HashMap<String, Vec<String>>, CoreError> {
        let vlans = self.aeris.get_updates(serial, paths::VLANS).await?;

        let mut by_intf: HashMap<String, Vec<String>> = HashMap::new();
        for (vlan, entry) in &vlans {
            if vlan == "1" {
                continue;
            }
            let Some(vlan_ptr) = ptr(entry) else {
                continue;
            };
            let vlan_cfg = self.aeris.get_updates(serial, vlan_ptr).await?;
            let Some(intf_ptr) = vlan_cfg.get("intf").and_then(ptr) else {
                debug!(vlan, "vlan has no interface list");
                continue;
            };
            let members = match self.aeris.get_updates(serial, intf_ptr).await {
                Ok(members) => members,
                Err(e) => {
                    debug!(vlan, error = %e, "skipping vlan without readable members");
                    continue;
                }
            };
            for intf in members.keys() {
                by_intf.entry(intf.clone()).or_default().push(vlan.clone());
            }
        }

        for list in by_intf.values_mut() {
            list.sort_by_key(|v| (v.parse::<u32>().unwrap_or(u32::MAX), v.clone()));
        }
        Ok(by_intf)
    }

    async fn lldp_neighbors(&self, serial: &str) -> Result<RemoteTable, CoreError> {
        let ports = self.aeris.get_updates(serial, paths::LLDP).await?;

        let mut table = RemoteTable::new();
        for (interface, entry) in &ports {
            let Some(port_ptr) = ptr(entry) else {
                continue;
            };
            let port = self.aeris.get_updates(serial, port_ptr).await?;
            let Some(msap_ptr) = port.get("remoteSystemByMsap").and_then(ptr) else {
                continue;
            };
            let remotes = self.aeris.get_updates(serial, msap_ptr).await?;

            for remote in remotes.values() {
                let mut port_id = str_at(remote, "/_key/portIdentifier/portId/value").to_owned();
                if str_at(remote, "/_key/portIdentifier/portIdSubtype/Name") == "pidMacAddress" {
                    port_id = format_packed_mac(&port_id);
                }
                let dev_id = match ptr(remote) {
                    Some(p) => self.lldp_sys_name(serial, p).await?,
                    None => UNKNOWN.to_owned(),
                };
                table
                    .entry(interface.clone())
                    .or_default()
                    .push(RemoteEntry { dev_id, port_id });
            }
        }
        Ok(table)
    }

    /// Neighbor system name; older releases keep it one level further
    /// down, under `remoteSystem/1`.
    async fn lldp_sys_name(&self, serial: &str, remote_ptr: &str) -> Result<String, CoreError> {
        let mut data = self.aeris.get_updates(serial, remote_ptr).await?;
        if !data.contains_key("sysName") {
            let Some(system_ptr) = data.get("remoteSystem").and_then(ptr) else {
                return Ok(UNKNOWN.to_owned());
            };
            data = self
                .aeris
                .get_updates(serial, &format!("{system_ptr}/1"))
                .await?;
        }
        Ok(data
            .get("sysName")
            .and_then(|v| v.pointer("/_value/value"))
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN)
            .to_owned())
    }

    async fn arp_entries(&self, serial: &str) -> Result<RemoteTable, CoreError> {
        let entries = self.aeris.get_updates(serial, paths::ARP).await?;
        Ok(arp_table(&entries))
    }

    async fn mac_entries(&self, serial: &str) -> Result<RemoteTable, CoreError> {
        let entries = self.aeris.get_updates(serial, paths::MAC).await?;
        Ok(mac_table(&entries))
    }

    async fn ip_address(&self, serial: &str, interface: &str) -> Result<String, CoreError> {
        let data = self
            .aeris
            .get_updates(serial, &format!("{}/{interface}", paths::INTF_IPADDR))
            .await?;
        Ok(Value::Object(data)
            .pointer("/addrWithMask/_value/address/value")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned())
    }
}

fn arp_table(entries: &Updates) -> RemoteTable {
    let mut table = RemoteTable::new();
    for entry in entries.values() {
        let interface = str_at(entry, "/_key/intfId");
        table.entry(interface.to_owned()).or_default().push(RemoteEntry {
            dev_id: str_at(entry, "/_key/addr").to_owned(),
            port_id: str_at(entry, "/_value/ethAddr").to_owned(),
        });
    }
    table
}

fn mac_table(entries: &Updates) -> RemoteTable {
    let mut table = RemoteTable::new();
    for entry in entries.values() {
        if str_at(entry, "/_value/entryType/Name") != "learnedDynamicMac" {
            continue;
        }
        let interface = str_at(entry, "/_value/intf");
        table.entry(interface.to_owned()).or_default().push(RemoteEntry {
            dev_id: String::new(),
            port_id: str_at(entry, "/_key/addr").to_owned(),
        });
    }
    table
}

/// LLDP wins over ARP, ARP over the MAC table.
fn remote_info(
    lldp: &RemoteTable,
    arp: &RemoteTable,
    macs: &RemoteTable,
    interface: &str,
) -> Vec<RemoteEntry> {
    [lldp, arp, macs]
        .into_iter()
        .find_map(|table| table.get(interface).filter(|v| !v.is_empty()))
        .cloned()
        .unwrap_or_else(|| vec![RemoteEntry::default()])
}

/// Render a row the way the inventory script always printed it: fields
/// joined with ` ^ `, extra neighbors on `Remote Continuation:` lines.
pub fn plain_lines(row: &PortRow) -> Vec<String> {
    const DELIM: &str = " ^ ";

    let first = row.first_remote();
    let mut fields = vec![
        row.switch.clone(),
        row.port.clone(),
        row.status.to_string(),
        row.speed.clone(),
        row.duplex.clone(),
        first.dev_id,
        first.port_id,
        row.vlans.join(","),
        row.description.clone(),
    ];
    if let Some(ip) = &row.ip_address {
        fields.push(ip.clone());
    }

    let mut lines = vec![fields.join(DELIM)];
    for extra in row.continuations() {
        lines.push(format!(
            "Remote Continuation: {}{DELIM}{}",
            extra.dev_id, extra.port_id
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn updates(value: &Value) -> Value {
        json!({ "startState": { "updates": value } })
    }

    async fn mount(server: &MockServer, p: &str, body: &Value) {
        Mock::given(method("GET"))
            .and(path(format!("/aeris/v1/rest/{p}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(updates(body)))
            .mount(server)
            .await;
    }

    #[test]
    fn remote_info_prefers_lldp_then_arp_then_mac() {
        let entry = |d: &str| RemoteEntry {
            dev_id: d.into(),
            port_id: String::new(),
        };
        let lldp = RemoteTable::from([("Ethernet1".into(), vec![entry("spine1")])]);
        let arp = RemoteTable::from([
            ("Ethernet1".into(), vec![entry("10.0.0.1")]),
            ("Ethernet2".into(), vec![entry("10.0.0.2")]),
        ]);
        let macs = RemoteTable::from([("Ethernet3".into(), vec![entry("")])]);

        assert_eq!(remote_info(&lldp, &arp, &macs, "Ethernet1")[0].dev_id, "spine1");
        assert_eq!(remote_info(&lldp, &arp, &macs, "Ethernet2")[0].dev_id, "10.0.0.2");
        assert_eq!(remote_info(&lldp, &arp, &macs, "Ethernet3").len(), 1);
        assert_eq!(remote_info(&lldp, &arp, &macs, "Ethernet4"), vec![RemoteEntry::default()]);
    }

    #[test]
    fn mac_table_keeps_only_dynamic_entries() {
        let entries = json!({
            "a": { "_key": { "addr": "00:1c:73:aa:bb:01" },
                   "_value": { "intf": "Ethernet5", "entryType": { "Name": "learnedDynamicMac" } } },
            "b": { "_key": { "addr": "00:1c:73:aa:bb:02" },
                   "_value": { "intf": "Ethernet5", "entryType": { "Name": "configuredStaticMac" } } }
        });
        let table = mac_table(entries.as_object().unwrap());
        assert_eq!(table["Ethernet5"].len(), 1);
        assert_eq!(table["Ethernet5"][0].port_id, "00:1c:73:aa:bb:01");
    }

    #[test]
    fn arp_dev_id_is_the_ip() {
        let entries = json!({
            "x": { "_key": { "addr": "10.1.1.1", "intfId": "Vlan10" },
                   "_value": { "ethAddr": "00:1c:73:00:00:09" } }
        });
        let table = arp_table(entries.as_object().unwrap());
        assert_eq!(table["Vlan10"][0].dev_id, "10.1.1.1");
    }

    #[test]
    fn plain_lines_adds_continuations() {
        let row = PortRow {
            switch: "leaf1".into(),
            port: "Ethernet1".into(),
            status: LinkStatus::Connected,
            speed: "speed10Gbps".into(),
            duplex: "duplexFull".into(),
            remote: vec![
                RemoteEntry {
                    dev_id: "spine1".into(),
                    port_id: "Ethernet1".into(),
                },
                RemoteEntry {
                    dev_id: "spine2".into(),
                    port_id: "Ethernet1".into(),
                },
            ],
            vlans: vec!["10".into(), "20".into()],
            description: "uplink".into(),
            ip_address: None,
        };
        assert_eq!(
            plain_lines(&row),
            vec![
                "leaf1 ^ Ethernet1 ^ connected ^ speed10Gbps ^ duplexFull ^ spine1 ^ Ethernet1 ^ 10,20 ^ uplink",
                "Remote Continuation: spine2 ^ Ethernet1",
            ]
        );
    }

    #[tokio::test]
    async fn collect_switch_joins_every_source() {
        let server = MockServer::start().await;
        let sn = "SN1";

        mount(&server, &format!("{sn}/Sysdb/sys/net/config"), &json!({ "hostname": { "_value": "leaf1" } })).await;
        mount(
            &server,
            &format!("{sn}/Sysdb/bridging/config/vlanConfig"),
            &json!({
                "1": { "_value": { "_ptr": "Sysdb/bridging/config/vlanConfig/1" } },
                "20": { "_value": { "_ptr": "Sysdb/bridging/config/vlanConfig/20" } },
                "10": { "_value": { "_ptr": "Sysdb/bridging/config/vlanConfig/10" } }
            }),
        )
        .await;
        for vlan in ["10", "20"] {
            mount(
                &server,
                &format!("{sn}/Sysdb/bridging/config/vlanConfig/{vlan}"),
                &json!({ "intf": { "_value": { "_ptr": format!("vlan{vlan}/intf") } } }),
            )
            .await;
            mount(&server, &format!("{sn}/vlan{vlan}/intf"), &json!({ "Ethernet2": {} })).await;
        }
        mount(
            &server,
            &format!("{sn}/Sysdb/interface/config/eth/phy/slice/1/intfConfig"),
            &json!({ "Ethernet2": {}, "Ethernet10": {} }),
        )
        .await;
        for intf in ["Ethernet2", "Ethernet10"] {
            mount(
                &server,
                &format!("{sn}/Sysdb/interface/config/eth/phy/slice/1/intfConfig/{intf}"),
                &json!({ "description": { "_value": format!("to {intf}") } }),
            )
            .await;
            mount(
                &server,
                &format!("{sn}/Sysdb/interface/status/eth/phy/slice/1/intfStatus/{intf}"),
                &json!({
                    "deviceName": { "_value": intf },
                    "linkStatus": { "_value": { "Name": "linkUp" } },
                    "speed": { "_value": { "Name": "speed10Gbps" } },
                    "duplex": { "_value": { "Name": "duplexFull" } }
                }),
            )
            .await;
        }
        mount(&server, &format!("{sn}/Sysdb/l2discovery/lldp/status/all/portStatus"), &json!({})).await;
        mount(
            &server,
            &format!("{sn}/Smash/arp/status/arpEntry"),
            &json!({ "e": { "_key": { "addr": "10.0.0.9", "intfId": "Ethernet10" },
                            "_value": { "ethAddr": "00:1c:73:00:00:09" } } }),
        )
        .await;
        mount(&server, &format!("{sn}/Smash/bridging/status/smashFdbStatus"), &json!({})).await;

        let aeris = AerisClient::new(
            Url::parse(&server.uri()).unwrap(),
            &cvpkit_api::TransportConfig::default(),
        )
        .unwrap();
        let rows = PortInventory::new(&aeris).collect_switch(sn).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].port, "Ethernet2");
        assert_eq!(rows[0].vlans, vec!["10", "20"]);
        assert_eq!(rows[0].remote, vec![RemoteEntry::default()]);
        assert_eq!(rows[1].port, "Ethernet10");
        assert_eq!(rows[1].switch, "leaf1");
        assert_eq!(rows[1].description, "to Ethernet10");
        assert_eq!(rows[1].remote[0].dev_id, "10.0.0.9");
        assert!(rows[1].vlans.is_empty());
    }
}
