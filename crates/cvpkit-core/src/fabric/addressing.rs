// ── Fabric addressing ──
//
// Every address in the fabric is a host number appended to a /24
// prefix. Counters run across switch roles in a fixed order so the same
// inputs always yield the same plan.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::Serialize;

use super::{Deployment, FabricOptions};
use crate::error::CoreError;

/// Base AS number of the fabric; spines use it, leafs count up from it.
pub const SPINE_ASN: u32 = 65000;

/// The first three octets of an IPv4 address, written `10.0.0.` or `10.0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Prefix([u8; 3]);

impl Ipv4Prefix {
    /// The address with host part `host`. Hosts above 255 do not fit the
    /// prefix and are rejected.
    pub fn host(self, host: u32) -> Result<Ipv4Addr, CoreError> {
        let last = u8::try_from(host).map_err(|_| {
            CoreError::validation(format!(
                "address {self}{host} is out of range; the fabric needs more than a /24 here"
            ))
        })?;
        let [a, b, c] = self.0;
        Ok(Ipv4Addr::new(a, b, c, last))
    }
}

impl fmt::Display for Ipv4Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a}.{b}.{c}.")
    }
}

impl FromStr for Ipv4Prefix {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::validation(format!("{s:?} is not a three-octet prefix like 10.0.0."));
        let octets: Vec<u8> = s
            .trim()
            .trim_end_matches('.')
            .split('.')
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;
        let octets: [u8; 3] = octets.try_into().map_err(|_| invalid())?;
        Ok(Self(octets))
    }
}

/// One spine-to-leaf /31.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkPlan {
    pub leaf: String,
    /// Spine side, `Ethernet{leaf index}`.
    pub local_interface: String,
    /// Leaf side, `Ethernet{spine index}`.
    pub leaf_interface: String,
    pub spine_ip: Ipv4Addr,
    pub leaf_ip: Ipv4Addr,
    /// Leaf AS number (EVPN only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpinePlan {
    pub name: String,
    pub loopback: Ipv4Addr,
    pub mgmt: Ipv4Addr,
    pub links: Vec<LinkPlan>,
}

/// MLAG peer-link addressing of one leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MlagPeering {
    pub local: Ipv4Addr,
    pub peer: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafPlan {
    pub name: String,
    pub loopback: Ipv4Addr,
    /// VXLAN tunnel source. MLAG pairs share one.
    pub vtep: Ipv4Addr,
    pub mgmt: Ipv4Addr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mlag: Option<MlagPeering>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn: Option<u32>,
}

/// Every address and AS number of a fabric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FabricPlan {
    pub spines: Vec<SpinePlan>,
    pub leafs: Vec<LeafPlan>,
    /// Unique VTEPs in leaf order, for head-end replication.
    pub flood_list: Vec<Ipv4Addr>,
}

impl FabricPlan {
    /// Links that terminate on `leaf`, with the spine at the other end.
    pub fn uplinks<'a>(&'a self, leaf: &'a str) -> impl Iterator<Item = (&'a SpinePlan, &'a LinkPlan)> {
        self.spines.iter().flat_map(move |spine| {
            spine
                .links
                .iter()
                .filter(move |link| link.leaf == leaf)
                .map(move |link| (spine, link))
        })
    }
}

/// Leaf AS number for EVPN. MLAG pairs share the odd number of the pair.
fn leaf_asn(index: u32, mlag: bool) -> u32 {
    let asn = SPINE_ASN + index;
    if mlag && asn % 2 == 0 { asn - 1 } else { asn }
}

/// Compute the address plan for `opts`.
pub fn plan(opts: &FabricOptions) -> Result<FabricPlan, CoreError> {
    opts.validate()?;

    let evpn = opts.deployment == Deployment::Evpn;
    let mlag = opts.mlag.as_ref();
    let mut loopback_counter: u32 = 0;
    let mut mgmt_counter: u32 = 1;
    let mut link_counter: u32 = 0;

    let leaf_name = |j: u32| format!("{}leaf{j}", opts.name);
    let asn_of = |j: u32| evpn.then(|| leaf_asn(j, mlag.is_some()));

    let mut spines = Vec::new();
    for i in 1..=opts.spines {
        let loopback = opts.loopback_network.host(loopback_counter)?;
        loopback_counter += 1;
        let mgmt = opts.mgmt_network.host(mgmt_counter)?;
        mgmt_counter += 1;

        let mut links = Vec::new();
        for j in 1..=opts.leafs {
            links.push(LinkPlan {
                leaf: leaf_name(j),
                local_interface: format!("Ethernet{j}"),
                leaf_interface: format!("Ethernet{i}"),
                spine_ip: opts.link_network.host(link_counter)?,
                leaf_ip: opts.link_network.host(link_counter + 1)?,
                asn: asn_of(j),
            });
            link_counter += 2;
        }

        spines.push(SpinePlan {
            name: format!("{}spine{i}", opts.name),
            loopback,
            mgmt,
            links,
        });
    }

    let mut leafs = Vec::new();
    for j in 1..=opts.leafs {
        let index = j - 1;
        let loopback = opts.loopback_network.host(loopback_counter)?;
        loopback_counter += 1;

        let (vtep_host, peering) = match mlag {
            Some(m) if index % 2 == 1 => (
                index - 1,
                Some(MlagPeering {
                    local: m.network.host(0)?,
                    peer: m.network.host(1)?,
                }),
            ),
            Some(m) => (
                index,
                Some(MlagPeering {
                    local: m.network.host(1)?,
                    peer: m.network.host(0)?,
                }),
            ),
            None => (index, None),
        };

        let mgmt = opts.mgmt_network.host(mgmt_counter)?;
        mgmt_counter += 1;

        leafs.push(LeafPlan {
            name: leaf_name(j),
            loopback,
            vtep: opts.vtep_network.host(vtep_host)?,
            mgmt,
            mlag: peering,
            asn: asn_of(j),
        });
    }

    let mut flood_list: Vec<Ipv4Addr> = Vec::new();
    for leaf in &leafs {
        if !flood_list.contains(&leaf.vtep) {
            flood_list.push(leaf.vtep);
        }
    }

    Ok(FabricPlan {
        spines,
        leafs,
        flood_list,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fabric::tests::options;

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    #[test]
    fn prefix_accepts_trailing_dot_or_not() {
        let a: Ipv4Prefix = "10.0.0.".parse().unwrap();
        let b: Ipv4Prefix = "10.0.0".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "10.0.0.");
        assert_eq!(a.host(7).unwrap(), ip("10.0.0.7"));
    }

    #[test]
    fn prefix_rejects_garbage() {
        assert!("10.0".parse::<Ipv4Prefix>().is_err());
        assert!("10.0.0.1.".parse::<Ipv4Prefix>().is_err());
        assert!("10.0.300.".parse::<Ipv4Prefix>().is_err());
    }

    #[test]
    fn host_above_255_is_rejected() {
        let p: Ipv4Prefix = "10.0.0.".parse().unwrap();
        assert!(matches!(p.host(256), Err(CoreError::ValidationFailed { .. })));
    }

    #[test]
    fn counters_run_spines_then_leafs() {
        let plan = plan(&options(Deployment::Her, false)).unwrap();

        assert_eq!(plan.spines[0].name, "dc1spine1");
        assert_eq!(plan.spines[0].loopback, ip("10.0.250.0"));
        assert_eq!(plan.spines[0].mgmt, ip("192.168.0.1"));
        assert_eq!(plan.spines[1].loopback, ip("10.0.250.1"));
        assert_eq!(plan.leafs[0].name, "dc1leaf1");
        assert_eq!(plan.leafs[0].loopback, ip("10.0.250.2"));
        assert_eq!(plan.leafs[0].mgmt, ip("192.168.0.3"));
        assert_eq!(plan.leafs[3].mgmt, ip("192.168.0.6"));
    }

    #[test]
    fn links_advance_by_two_per_pair() {
        let plan = plan(&options(Deployment::Her, false)).unwrap();

        let second_spine = &plan.spines[1];
        assert_eq!(second_spine.links[0].spine_ip, ip("10.0.1.8"));
        assert_eq!(second_spine.links[0].leaf_ip, ip("10.0.1.9"));
        assert_eq!(second_spine.links[2].local_interface, "Ethernet3");
        assert_eq!(second_spine.links[2].leaf_interface, "Ethernet2");

        let uplinks: Vec<_> = plan.uplinks("dc1leaf2").map(|(s, l)| (s.name.as_str(), l.leaf_ip)).collect();
        assert_eq!(uplinks, vec![("dc1spine1", ip("10.0.1.3")), ("dc1spine2", ip("10.0.1.11"))]);
    }

    #[test]
    fn mlag_pairs_share_vtep_and_alternate_peer_addresses() {
        let plan = plan(&options(Deployment::Her, true)).unwrap();

        let l = &plan.leafs;
        assert_eq!(l[0].vtep, l[1].vtep);
        assert_eq!(l[2].vtep, l[3].vtep);
        assert_ne!(l[1].vtep, l[2].vtep);
        assert_eq!(l[0].mlag.unwrap().local, ip("10.255.255.1"));
        assert_eq!(l[0].mlag.unwrap().peer, ip("10.255.255.0"));
        assert_eq!(l[1].mlag.unwrap().local, ip("10.255.255.0"));
        assert_eq!(l[1].mlag.unwrap().peer, ip("10.255.255.1"));
        assert_eq!(plan.flood_list, vec![ip("10.0.200.0"), ip("10.0.200.2")]);
    }

    #[test]
    fn evpn_asns() {
        let plain = plan(&options(Deployment::Evpn, false)).unwrap();
        let asns: Vec<_> = plain.leafs.iter().map(|l| l.asn.unwrap()).collect();
        assert_eq!(asns, vec![65001, 65002, 65003, 65004]);

        let paired = plan(&options(Deployment::Evpn, true)).unwrap();
        let asns: Vec<_> = paired.leafs.iter().map(|l| l.asn.unwrap()).collect();
        assert_eq!(asns, vec![65001, 65001, 65003, 65003]);
        assert_eq!(paired.spines[0].links[1].asn, Some(65001));
    }

    #[test]
    fn her_has_no_asns() {
        let plan = plan(&options(Deployment::Her, false)).unwrap();
        assert!(plan.leafs.iter().all(|l| l.asn.is_none()));
        assert!(plan.spines[0].links.iter().all(|l| l.asn.is_none()));
    }

    #[test]
    fn oversized_fabric_is_rejected() {
        let mut opts = options(Deployment::Her, false);
        opts.spines = 4;
        opts.leafs = 40;
        assert!(matches!(plan(&opts), Err(CoreError::ValidationFailed { .. })));
    }
}
