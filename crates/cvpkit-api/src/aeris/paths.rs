//! Sysdb and Smash paths read by the port inventory.

/// Base path of the Analytics Engine REST API.
pub const AERIS: &str = "/aeris/v1/rest";

/// ARP table.
pub const ARP: &str = "Smash/arp/status/arpEntry";
/// Layer-2 MAC table.
pub const MAC: &str = "Smash/bridging/status/smashFdbStatus";
/// Switch hostname.
pub const HOSTNAME_CONFIG: &str = "Sysdb/sys/net/config";
/// Ethernet interface status.
pub const INTF_STATUS: &str = "Sysdb/interface/status/eth/phy/slice/1/intfStatus";
/// Ethernet interface configuration.
pub const INTF_CONFIG: &str = "Sysdb/interface/config/eth/phy/slice/1/intfConfig";
/// Interface IP configuration.
pub const INTF_IPADDR: &str = "Sysdb/ip/config/ipIntfConfig";
/// LLDP port status.
pub const LLDP: &str = "Sysdb/l2discovery/lldp/status/all/portStatus";
/// VLAN configuration.
pub const VLANS: &str = "Sysdb/bridging/config/vlanConfig";
