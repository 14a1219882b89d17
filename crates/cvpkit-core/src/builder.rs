// ── CSV + template configlet builder ──
//
// Renders a per-device configlet from three CSV tables and a template
// picked by hostname prefix:
//
//   mgmt_applicator.csv   serial,hostname
//   bgpfile.csv           hostname,...   (every row for the host)
//   loopback.csv          hostname,loopback0,loopback60

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cvpkit_api::PortalClient;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

use crate::error::CoreError;

pub const MGMT_FILE: &str = "mgmt_applicator.csv";
pub const BGP_FILE: &str = "bgpfile.csv";
pub const LOOPBACK_FILE: &str = "loopback.csv";

/// How the device was identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceId {
    Serial(String),
    /// System MAC, resolved to a serial through the inventory.
    Mac(String),
}

/// Hostname prefixes with a template of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRole {
    /// `sw*`, rendered with `sw_template.j2`.
    Switch,
    /// `as*`, rendered with `as_template.j2`.
    Access,
}

impl HostRole {
    pub fn of(hostname: &str) -> Option<Self> {
        if hostname.starts_with("sw") {
            Some(Self::Switch)
        } else if hostname.starts_with("as") {
            Some(Self::Access)
        } else {
            None
        }
    }

    pub fn template_file(self) -> &'static str {
        match self {
            Self::Switch => "sw_template.j2",
            Self::Access => "as_template.j2",
        }
    }
}

type Rows = Vec<Vec<String>>;

/// Everything the template sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuilderData {
    pub hostname: String,
    /// `{hostname: [row, ...]}`, rows as read from the BGP table.
    pub bgpdata: BTreeMap<String, Rows>,
    pub loopback0: String,
    pub loopback60: String,
}

pub async fn resolve_serial(portal: &PortalClient, id: &DeviceId) -> Result<String, CoreError> {
    match id {
        DeviceId::Serial(serial) => Ok(serial.clone()),
        DeviceId::Mac(mac) => {
            let element = portal.get_net_element(mac).await?;
            if element.serial_number.is_empty() {
                return Err(CoreError::NotFound {
                    entity_type: "device serial".into(),
                    identifier: mac.clone(),
                });
            }
            debug!(%mac, serial = %element.serial_number, "resolved serial");
            Ok(element.serial_number)
        }
    }
}

pub fn read_csv(path: &Path) -> Result<Rows, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_err(path, &e))?;

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_owned).collect())
                .map_err(|e| csv_err(path, &e))
        })
        .collect()
}

fn csv_err(path: &Path, e: &csv::Error) -> CoreError {
    CoreError::Config {
        message: format!("{}: {e}", path.display()),
    }
}

fn not_found(entity_type: &str, identifier: &str) -> CoreError {
    CoreError::NotFound {
        entity_type: entity_type.into(),
        identifier: identifier.into(),
    }
}

/// Hostname registered for `serial`. Only `as`/`sw` hosts count; a later
/// row wins over an earlier one.
pub fn hostname_for(serial: &str, mgmt: &[Vec<String>]) -> Result<String, CoreError> {
    mgmt.iter()
        .filter(|row| row.first().is_some_and(|s| s == serial))
        .filter_map(|row| row.get(1))
        .filter(|host| HostRole::of(host).is_some())
        .next_back()
        .cloned()
        .ok_or_else(|| not_found("hostname for serial", serial))
}

/// Assemble the template context for `hostname` from the BGP and
/// loopback tables.
pub fn collect_data(hostname: &str, bgp: &[Vec<String>], loopbacks: &[Vec<String>]) -> Result<BuilderData, CoreError> {
    let rows: Rows = bgp
        .iter()
        .filter(|row| row.first().is_some_and(|h| h == hostname))
        .cloned()
        .collect();
    let mut bgpdata = BTreeMap::new();
    if !rows.is_empty() {
        bgpdata.insert(hostname.to_owned(), rows);
    }

    let (loopback0, loopback60) = loopbacks
        .iter()
        .filter(|row| row.first().is_some_and(|h| h == hostname))
        .filter_map(|row| Some((row.get(1)?.clone(), row.get(2)?.clone())))
        .next_back()
        .ok_or_else(|| not_found("loopbacks for host", hostname))?;

    Ok(BuilderData {
        hostname: hostname.to_owned(),
        bgpdata,
        loopback0,
        loopback60,
    })
}

/// Render `template` (Jinja-style syntax) against `data`.
pub fn render(template_name: &str, template: &str, data: &BuilderData) -> Result<String, CoreError> {
    let mut tera = Tera::default();
    tera.add_raw_template(template_name, template)?;
    let context = Context::from_serialize(data)?;
    Ok(tera.render(template_name, &context)?)
}

/// Where the tables and templates live.
#[derive(Debug, Clone)]
pub struct BuilderPaths {
    pub data_dir: PathBuf,
    pub template_dir: PathBuf,
}

/// Full pipeline for one device.
pub async fn build_configlet(
    portal: &PortalClient,
    id: &DeviceId,
    paths: &BuilderPaths,
) -> Result<String, CoreError> {
    let serial = resolve_serial(portal, id).await?;

    let mgmt = read_csv(&paths.data_dir.join(MGMT_FILE))?;
    let hostname = hostname_for(&serial, &mgmt)?;
    let bgp = read_csv(&paths.data_dir.join(BGP_FILE))?;
    let loopbacks = read_csv(&paths.data_dir.join(LOOPBACK_FILE))?;
    let data = collect_data(&hostname, &bgp, &loopbacks)?;

    let role = HostRole::of(&hostname).ok_or_else(|| not_found("template for host", &hostname))?;
    let template_path = paths.template_dir.join(role.template_file());
    let template = tokio::fs::read_to_string(&template_path)
        .await
        .map_err(|e| CoreError::io(&template_path, e))?;
    debug!(%hostname, template = %template_path.display(), "rendering configlet");

    render(role.template_file(), &template, &data)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    fn rows(text: &str) -> Rows {
        text.lines()
            .map(|l| l.split(',').map(str::to_owned).collect())
            .collect()
    }

    #[test]
    fn hostname_skips_other_prefixes() {
        let mgmt = rows("SSJ111,core1\nSSJ111,sw-pod1-a\nSSJ222,as-pod1-b");
        assert_eq!(hostname_for("SSJ111", &mgmt).unwrap(), "sw-pod1-a");
        assert_eq!(hostname_for("SSJ222", &mgmt).unwrap(), "as-pod1-b");
        assert!(matches!(hostname_for("SSJ333", &mgmt), Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn data_collects_only_this_host() {
        let bgp = rows("sw1,65001,10.1.1.1\nsw2,65002,10.1.1.2\nsw1,65001,10.1.1.3");
        let lo = rows("sw1,1.1.1.1,6.6.6.1\nsw2,1.1.1.2,6.6.6.2");

        let data = collect_data("sw1", &bgp, &lo).unwrap();
        assert_eq!(data.bgpdata["sw1"].len(), 2);
        assert!(!data.bgpdata.contains_key("sw2"));
        assert_eq!(data.loopback0, "1.1.1.1");
        assert_eq!(data.loopback60, "6.6.6.1");
    }

    #[test]
    fn renders_rows_in_template() {
        let bgp = rows("sw1,65001,10.1.1.1\nsw1,65001,10.1.1.3");
        let lo = rows("sw1,1.1.1.1,6.6.6.1");
        let data = collect_data("sw1", &bgp, &lo).unwrap();

        let template = "hostname {{ hostname }}\n\
            interface Loopback0\n   ip address {{ loopback0 }}/32\n\
            {% for row in bgpdata[hostname] %}neighbor {{ row[2] }} remote-as {{ row[1] }}\n{% endfor %}";
        let out = render("sw_template.j2", template, &data).unwrap();

        assert_eq!(
            out,
            "hostname sw1\ninterface Loopback0\n   ip address 1.1.1.1/32\n\
             neighbor 10.1.1.1 remote-as 65001\nneighbor 10.1.1.3 remote-as 65001\n"
        );
    }

    #[test]
    fn template_syntax_error_is_template_error() {
        let data = collect_data("sw1", &[], &rows("sw1,1.1.1.1,6.6.6.1")).unwrap();
        let err = render("bad", "{% for %}", &data).unwrap_err();
        assert!(matches!(err, CoreError::Template { .. }));
    }

    #[test]
    fn reads_headerless_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOOPBACK_FILE);
        std::fs::write(&path, "sw1,1.1.1.1,6.6.6.1\nsw2,1.1.1.2,6.6.6.2\n").unwrap();

        let table = read_csv(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[1], vec!["sw2", "1.1.1.2", "6.6.6.2"]);
    }

    #[test]
    fn role_picks_template() {
        assert_eq!(HostRole::of("sw1").unwrap().template_file(), "sw_template.j2");
        assert_eq!(HostRole::of("as1").unwrap().template_file(), "as_template.j2");
        assert!(HostRole::of("core1").is_none());
    }
}
