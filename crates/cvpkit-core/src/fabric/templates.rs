// ── Configlet rendering ──
//
// EOS configuration text for each switch role. Sections are separated by
// `!` the way `show running-config` prints them.

use std::net::Ipv4Addr;

use super::addressing::{FabricPlan, LeafPlan, SPINE_ASN, SpinePlan};
use super::{Deployment, FabricOptions, GeneratedConfiglet};

/// Leaf AS for head-end replication and CVX deployments.
const LEAF_ASN: u32 = SPINE_ASN + 1;
const MLAG_VLAN: u16 = 4094;
const MLAG_PORT_CHANNEL: u16 = 2000;

#[derive(Default)]
struct Config(String);

impl Config {
    fn line(&mut self, line: impl AsRef<str>) -> &mut Self {
        self.0.push_str(line.as_ref());
        self.0.push('\n');
        self
    }

    fn bang(&mut self) -> &mut Self {
        self.line("!")
    }

    fn finish(self) -> String {
        self.0
    }
}

/// Every configlet of the fabric: per spine its base and BGP configlets,
/// then the same per leaf, then the data center base configlet.
pub fn render(plan: &FabricPlan, opts: &FabricOptions) -> Vec<GeneratedConfiglet> {
    let mut out = Vec::with_capacity(2 * (plan.spines.len() + plan.leafs.len()) + 1);

    for spine in &plan.spines {
        out.push(GeneratedConfiglet {
            name: format!("{} configuration", spine.name),
            config: spine_base(spine, opts),
        });
        out.push(GeneratedConfiglet {
            name: format!("{} BGP configuration", spine.name),
            config: spine_bgp(spine, opts),
        });
    }

    for leaf in &plan.leafs {
        out.push(GeneratedConfiglet {
            name: format!("{} configuration", leaf.name),
            config: leaf_base(leaf, plan, opts),
        });
        out.push(GeneratedConfiglet {
            name: format!("{} bgp configuration", leaf.name),
            config: leaf_bgp(leaf, plan, opts),
        });
    }

    out.push(GeneratedConfiglet {
        name: base_configlet_name(&opts.name),
        config: dc_base(opts.default_gateway),
    });
    out
}

pub(crate) fn base_configlet_name(dc: &str) -> String {
    format!("{dc} Base config")
}

// ── Spines ──

fn spine_base(spine: &SpinePlan, opts: &FabricOptions) -> String {
    let mut c = Config::default();
    c.bang()
        .line(format!("hostname {}", spine.name))
        .bang()
        .line("interface Loopback0")
        .line(format!("   ip address {}/32", spine.loopback))
        .bang()
        .line("interface Management1")
        .line(format!("   ip address {}/{}", spine.mgmt, opts.mgmt_mask))
        .bang();

    for link in &spine.links {
        c.line(format!("interface {}", link.local_interface))
            .line(format!("   description {}", link.leaf))
            .line("   no switchport")
            .line(format!("   ip address {}/31", link.spine_ip))
            .bang();
    }
    c.finish()
}

fn spine_bgp(spine: &SpinePlan, opts: &FabricOptions) -> String {
    let mut c = Config::default();
    c.line(format!("router bgp {SPINE_ASN}"))
        .line(format!("   router-id {}", spine.loopback))
        .line("   maximum-paths 4");

    if opts.deployment == Deployment::Evpn {
        c.line("   neighbor leafs peer-group")
            .line("   neighbor leafs fall-over bfd")
            .line("   neighbor leafs maximum-routes 12000")
            .line("   redistribute connected");
        for link in &spine.links {
            c.line(format!("   neighbor {} peer-group leafs", link.leaf_ip));
            if let Some(asn) = link.asn {
                c.line(format!("   neighbor {} remote-as {asn}", link.leaf_ip));
            }
        }
    } else {
        c.line(format!(
            "   bgp listen range {}0/24 peer-group leafs remote-as {LEAF_ASN}",
            opts.link_network
        ))
        .line("   neighbor leafs peer-group")
        .line("   neighbor leafs allowas-in 3")
        .line("   neighbor leafs fall-over bfd")
        .line("   neighbor leafs maximum-routes 12000")
        .line("   redistribute connected");
    }
    c.finish()
}

// ── Leafs ──

fn leaf_base(leaf: &LeafPlan, plan: &FabricPlan, opts: &FabricOptions) -> String {
    let mut c = Config::default();
    c.bang().line(format!("hostname {}", leaf.name)).bang();

    if opts.deployment == Deployment::Evpn {
        c.line("service routing protocols model multi-agent").bang();
    }

    c.line("interface Loopback0")
        .line(format!("   ip address {}/32", leaf.loopback))
        .bang();
    if opts.deployment != Deployment::Evpn {
        c.line("interface Loopback1")
            .line(format!("   ip address {}/32", leaf.vtep))
            .bang();
    }
    c.line("interface Management1")
        .line(format!("   ip address {}/{}", leaf.mgmt, opts.mgmt_mask))
        .bang();

    if opts.deployment == Deployment::Cvx {
        if let Some(server) = &opts.cvx_server {
            c.line("management cvx")
                .line("   no shutdown")
                .line(format!("   server host {server}"))
                .bang();
        }
    }

    if let (Some(peering), Some(mlag)) = (leaf.mlag, &opts.mlag) {
        c.line(format!("vlan {MLAG_VLAN}"))
            .line("   name MLAGPEER")
            .line("   trunk group mlagpeer")
            .bang()
            .line(format!("no spanning-tree vlan {MLAG_VLAN}"))
            .bang()
            .line(format!("interface port-channel {MLAG_PORT_CHANNEL}"))
            .line("   switchport trunk group mlagpeer")
            .line("   switchport mode trunk")
            .bang();
        for trunk in &mlag.trunk_interfaces {
            c.line(format!("interface {trunk}"))
                .line(format!("   channel-group {MLAG_PORT_CHANNEL} mode active"))
                .bang();
        }
        c.line(format!("interface Vlan{MLAG_VLAN}"))
            .line(format!("   ip address {}/31", peering.local))
            .bang()
            .line("mlag")
            .line(format!("   local-interface vlan {MLAG_VLAN}"))
            .line(format!("   peer-address {}", peering.peer))
            .line(format!("   peer-link port-channel {MLAG_PORT_CHANNEL}"))
            .line("   domain-id MLAG")
            .bang();
    }

    c.line("interface Vxlan1");
    match opts.deployment {
        Deployment::Her => {
            c.line("   vxlan source-interface Loopback1")
                .line("   vxlan udp-port 4789")
                .line(format!("   vxlan flood vtep {}", join(&plan.flood_list)));
        }
        Deployment::Cvx => {
            c.line("   vxlan source-interface Loopback1")
                .line("   vxlan udp-port 4789")
                .line("   vxlan controller-client");
        }
        Deployment::Evpn => {
            c.line("   vxlan source-interface Loopback0")
                .line("   vxlan udp-port 4789");
        }
    }
    c.bang();

    for (spine, link) in plan.uplinks(&leaf.name) {
        c.line(format!("interface {}", link.leaf_interface))
            .line(format!("   description {}", spine.name))
            .line("   no switchport")
            .line(format!("   ip address {}/31", link.leaf_ip))
            .bang();
    }
    c.finish()
}

fn leaf_bgp(leaf: &LeafPlan, plan: &FabricPlan, opts: &FabricOptions) -> String {
    let mut c = Config::default();

    if opts.deployment == Deployment::Evpn {
        let asn = leaf.asn.unwrap_or(LEAF_ASN);
        c.line(format!("router bgp {asn}"))
            .line(format!("   router-id {}", leaf.loopback))
            .line("   maximum-paths 4")
            .line("   neighbor EVPN peer-group")
            .line("   neighbor EVPN update-source Loopback0")
            .line("   neighbor EVPN ebgp-multihop")
            .line("   neighbor EVPN send-community extended")
            .line("   neighbor EVPN maximum-routes 12000");
        mlag_neighbor(&mut c, leaf, asn);
        c.line("   neighbor spines peer-group")
            .line(format!("   neighbor spines remote-as {SPINE_ASN}"))
            .line("   neighbor spines fall-over bfd")
            .line("   neighbor spines ebgp-multihop 4")
            .line("   neighbor spines maximum-routes 12000");
        for (_, link) in plan.uplinks(&leaf.name) {
            c.line(format!("   neighbor {} peer-group spines", link.spine_ip));
        }

        let overlay_peers: Vec<&LeafPlan> =
            plan.leafs.iter().filter(|l| l.name != leaf.name).collect();
        for peer in &overlay_peers {
            c.line(format!("   neighbor {} peer-group EVPN", peer.loopback));
            if let Some(peer_asn) = peer.asn {
                c.line(format!("   neighbor {} remote-as {peer_asn}", peer.loopback));
            }
        }
        c.line("   address-family evpn");
        for peer in &overlay_peers {
            c.line(format!("      neighbor {} activate", peer.loopback));
        }
        c.line("   address-family ipv4");
        for peer in &overlay_peers {
            c.line(format!("      no neighbor {} activate", peer.loopback));
        }
        c.line("      redistribute connected");
    } else {
        c.line(format!("router bgp {LEAF_ASN}"))
            .line(format!("   router-id {}", leaf.loopback))
            .line("   maximum-paths 4")
            .line("   neighbor spines peer-group")
            .line(format!("   neighbor spines remote-as {SPINE_ASN}"))
            .line("   neighbor spines allowas-in 3")
            .line("   neighbor spines ebgp-multihop 4")
            .line("   neighbor spines maximum-routes 12000");
        mlag_neighbor(&mut c, leaf, LEAF_ASN);
        c.line("   redistribute connected");
        for (_, link) in plan.uplinks(&leaf.name) {
            c.line(format!("   neighbor {} peer-group spines", link.spine_ip));
        }
    }
    c.finish()
}

fn mlag_neighbor(c: &mut Config, leaf: &LeafPlan, asn: u32) {
    if let Some(peering) = leaf.mlag {
        c.line("   neighbor mlag-neighbor peer-group")
            .line(format!("   neighbor mlag-neighbor remote-as {asn}"))
            .line(format!("   neighbor mlag-neighbor update-source vlan{MLAG_VLAN}"))
            .line(format!("   neighbor {} peer-group mlag-neighbor", peering.peer));
    }
}

// ── Data center ──

fn dc_base(gateway: Ipv4Addr) -> String {
    let mut c = Config::default();
    c.line("transceiver qsfp default-mode 4x10G")
        .bang()
        .line("snmp-server community private rw")
        .line("snmp-server community public ro")
        .bang()
        .line("spanning-tree mode mstp")
        .bang()
        .line("no aaa root")
        .bang()
        .line("ip virtual-router mac-address 00:11:22:33:44:55")
        .bang()
        .line(format!("ip route 0.0.0.0/0 {gateway}"))
        .bang()
        .line("ip routing")
        .bang()
        .line("management api http-commands")
        .line("   protocol http")
        .line("   cors allowed-origin all")
        .line("   no shutdown")
        .bang();
    c.finish()
}

fn join(addrs: &[Ipv4Addr]) -> String {
    addrs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fabric::plan;
    use crate::fabric::tests::options;

    fn configlet<'a>(all: &'a [GeneratedConfiglet], name: &str) -> &'a str {
        &all.iter().find(|c| c.name == name).unwrap().config
    }

    #[test]
    fn spine_base_lists_every_leaf_link() {
        let opts = options(Deployment::Her, false);
        let plan = plan(&opts).unwrap();
        let all = render(&plan, &opts);

        assert_eq!(
            configlet(&all, "dc1spine1 configuration"),
            "!\nhostname dc1spine1\n!\ninterface Loopback0\n   ip address 10.0.250.0/32\n!\n\
             interface Management1\n   ip address 192.168.0.1/24\n!\n\
             interface Ethernet1\n   description dc1leaf1\n   no switchport\n   ip address 10.0.1.0/31\n!\n\
             interface Ethernet2\n   description dc1leaf2\n   no switchport\n   ip address 10.0.1.2/31\n!\n\
             interface Ethernet3\n   description dc1leaf3\n   no switchport\n   ip address 10.0.1.4/31\n!\n\
             interface Ethernet4\n   description dc1leaf4\n   no switchport\n   ip address 10.0.1.6/31\n!\n"
        );
    }

    #[test]
    fn her_spine_listens_on_link_range() {
        let opts = options(Deployment::Her, false);
        let plan = plan(&opts).unwrap();
        let all = render(&plan, &opts);
        let bgp = configlet(&all, "dc1spine2 BGP configuration");

        assert!(bgp.starts_with("router bgp 65000\n   router-id 10.0.250.1\n"));
        assert!(bgp.contains("   bgp listen range 10.0.1.0/24 peer-group leafs remote-as 65001\n"));
        assert!(!bgp.contains("remote-as 65002"));
    }

    #[test]
    fn evpn_spine_names_each_leaf() {
        let opts = options(Deployment::Evpn, false);
        let plan = plan(&opts).unwrap();
        let all = render(&plan, &opts);
        let bgp = configlet(&all, "dc1spine1 BGP configuration");

        assert!(!bgp.contains("listen range"));
        assert!(bgp.contains("   neighbor 10.0.1.7 peer-group leafs\n   neighbor 10.0.1.7 remote-as 65004\n"));
    }

    #[test]
    fn her_leaf_floods_to_every_vtep() {
        let opts = options(Deployment::Her, false);
        let plan = plan(&opts).unwrap();
        let all = render(&plan, &opts);
        let base = configlet(&all, "dc1leaf3 configuration");

        assert!(base.contains("interface Loopback1\n   ip address 10.0.200.2/32\n"));
        assert!(base.contains(
            "   vxlan flood vtep 10.0.200.0 10.0.200.1 10.0.200.2 10.0.200.3\n"
        ));
        assert!(base.ends_with(
            "interface Ethernet1\n   description dc1spine1\n   no switchport\n   ip address 10.0.1.5/31\n!\n\
             interface Ethernet2\n   description dc1spine2\n   no switchport\n   ip address 10.0.1.13/31\n!\n"
        ));
        assert!(!base.contains("mlag"));
    }

    #[test]
    fn cvx_leaf_points_at_controller() {
        let opts = options(Deployment::Cvx, false);
        let plan = plan(&opts).unwrap();
        let all = render(&plan, &opts);
        let base = configlet(&all, "dc1leaf1 configuration");

        assert!(base.contains("management cvx\n   no shutdown\n   server host 192.168.0.100\n"));
        assert!(base.contains(
            "   vxlan source-interface Loopback1\n   vxlan udp-port 4789\n   vxlan controller-client\n"
        ));
        assert!(!base.contains("flood vtep"));
    }

    #[test]
    fn mlag_leaf_bundles_named_trunks() {
        let opts = options(Deployment::Her, true);
        let plan = plan(&opts).unwrap();
        let all = render(&plan, &opts);
        let base = configlet(&all, "dc1leaf2 configuration");

        assert!(base.contains("interface Ethernet47\n   channel-group 2000 mode active\n"));
        assert!(base.contains("interface Ethernet48\n   channel-group 2000 mode active\n"));
        assert!(base.contains("interface Vlan4094\n   ip address 10.255.255.0/31\n"));
        assert!(base.contains("   peer-address 10.255.255.1\n   peer-link port-channel 2000\n"));

        let bgp = configlet(&all, "dc1leaf2 bgp configuration");
        assert!(bgp.contains("   neighbor 10.255.255.1 peer-group mlag-neighbor\n   redistribute connected\n"));
    }

    #[test]
    fn evpn_leaf_peers_with_other_leaf_loopbacks() {
        let opts = options(Deployment::Evpn, true);
        let plan = plan(&opts).unwrap();
        let all = render(&plan, &opts);
        let bgp = configlet(&all, "dc1leaf1 bgp configuration");

        assert!(bgp.starts_with("router bgp 65001\n"));
        assert!(bgp.contains("   neighbor mlag-neighbor remote-as 65001\n"));
        assert!(bgp.contains("   neighbor 10.0.1.0 peer-group spines\n   neighbor 10.0.1.8 peer-group spines\n"));
        assert!(bgp.contains("   neighbor 10.0.250.5 peer-group EVPN\n   neighbor 10.0.250.5 remote-as 65003\n"));
        assert!(!bgp.contains("neighbor 10.0.250.2 "));
        assert!(bgp.ends_with(
            "   address-family ipv4\n      no neighbor 10.0.250.3 activate\n      \
             no neighbor 10.0.250.4 activate\n      no neighbor 10.0.250.5 activate\n      \
             redistribute connected\n"
        ));

        let base = configlet(&all, "dc1leaf1 configuration");
        assert!(base.contains("service routing protocols model multi-agent\n"));
        assert!(base.contains("   vxlan source-interface Loopback0\n"));
        assert!(!base.contains("Loopback1"));
    }

    #[test]
    fn dc_base_sets_default_route() {
        let opts = options(Deployment::Her, false);
        let plan = plan(&opts).unwrap();
        let all = render(&plan, &opts);
        let base = configlet(&all, "dc1 Base config");

        assert!(base.starts_with("transceiver qsfp default-mode 4x10G\n"));
        assert!(base.contains("ip route 0.0.0.0/0 192.168.0.254\n"));
    }
}
