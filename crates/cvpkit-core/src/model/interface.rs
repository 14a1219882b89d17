// ── Port inventory rows ──

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Operational link state, named the way `show interfaces status` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Connected,
    Notconnect,
    Unknown,
}

impl LinkStatus {
    /// Map the Sysdb `linkStatus` name.
    pub fn from_sysdb(name: &str) -> Self {
        match name {
            "linkUp" => Self::Connected,
            "linkDown" => Self::Notconnect,
            _ => Self::Unknown,
        }
    }
}

/// What sits on the far end of a port: an LLDP neighbor, an ARP entry,
/// or a learned MAC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub dev_id: String,
    pub port_id: String,
}

/// One port of one switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRow {
    pub switch: String,
    pub port: String,
    pub status: LinkStatus,
    pub speed: String,
    pub duplex: String,
    /// Never empty; a port with no known neighbor carries one blank entry.
    pub remote: Vec<RemoteEntry>,
    pub vlans: Vec<String>,
    pub description: String,
    pub ip_address: Option<String>,
}

impl PortRow {
    pub fn first_remote(&self) -> RemoteEntry {
        self.remote.first().cloned().unwrap_or_default()
    }

    /// Remote entries after the first, printed as continuation lines.
    pub fn continuations(&self) -> &[RemoteEntry] {
        self.remote.get(1..).unwrap_or_default()
    }
}

static INTF_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^0-9/]+)(?:(\d+)/?)?(?:(\d+)/?)?(?:(\d+))?(?:\.(\d+))?$")
        .unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

/// Sort key for interface names: `(base, stack, module, port, sub)` with
/// missing numbers as 0, so `Ethernet2` sorts before `Ethernet10`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceName {
    Parsed {
        base: String,
        stack: u32,
        module: u32,
        port: u32,
        sub: u32,
    },
    /// Names the pattern does not match; they sort after every parsed
    /// name, by raw text.
    Raw(String),
}

impl InterfaceName {
    pub fn parse(name: &str) -> Self {
        let Some(caps) = INTF_NAME_RE.captures(name) else {
            return Self::Raw(name.to_owned());
        };
        let num = |i: usize| -> Option<u32> {
            caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
        };
        match (num(2), num(3), num(4), num(5)) {
            (Some(stack), Some(module), Some(port), Some(sub)) => Self::Parsed {
                base: caps[1].to_owned(),
                stack,
                module,
                port,
                sub,
            },
            _ => Self::Raw(name.to_owned()),
        }
    }
}

impl Ord for InterfaceName {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (
                Self::Parsed {
                    base,
                    stack,
                    module,
                    port,
                    sub,
                },
                Self::Parsed {
                    base: b2,
                    stack: s2,
                    module: m2,
                    port: p2,
                    sub: u2,
                },
            ) => (base, stack, module, port, sub).cmp(&(b2, s2, m2, p2, u2)),
            (Self::Parsed { .. }, Self::Raw(_)) => Ordering::Less,
            (Self::Raw(_), Self::Parsed { .. }) => Ordering::Greater,
            (Self::Raw(a), Self::Raw(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for InterfaceName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort interface names in switch order.
pub fn sort_interfaces(names: &mut [String]) {
    names.sort_by_cached_key(|n| InterfaceName::parse(n));
}
