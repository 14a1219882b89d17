//! Leaf/spine fabric generation.
//!
//! [`plan`] lays out addresses and AS numbers, [`render`] turns the plan
//! into configlets, [`push`] uploads them and builds the container tree.

mod addressing;
mod push;
mod templates;

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;

pub use addressing::{
    FabricPlan, Ipv4Prefix, LeafPlan, LinkPlan, MlagPeering, SpinePlan, SPINE_ASN, plan,
};
pub use push::{PushSummary, TENANT_CONTAINER, push};
pub use templates::render;

/// Overlay flavour of the generated fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Deployment {
    /// Head-end replication with a static flood list.
    Her,
    /// VXLAN control plane on a CVX server.
    Cvx,
    /// BGP EVPN, one AS per leaf (or MLAG pair).
    Evpn,
}

#[derive(Debug, Clone)]
pub struct MlagOptions {
    /// Prefix of the peer-link /31; the pair uses hosts 0 and 1.
    pub network: Ipv4Prefix,
    /// The two leaf ports bundled into the peer-link.
    pub trunk_interfaces: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FabricOptions {
    /// Data center name; prefixes every hostname and container.
    pub name: String,
    pub spines: u32,
    pub leafs: u32,
    pub mlag: Option<MlagOptions>,
    pub default_gateway: Ipv4Addr,
    pub mgmt_network: Ipv4Prefix,
    pub mgmt_mask: u8,
    pub vtep_network: Ipv4Prefix,
    pub loopback_network: Ipv4Prefix,
    pub link_network: Ipv4Prefix,
    pub deployment: Deployment,
    pub cvx_server: Option<String>,
}

impl FabricOptions {
    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("fabric name must not be empty"));
        }
        if self.spines == 0 || self.leafs == 0 {
            return Err(CoreError::validation(
                "a fabric needs at least one spine and one leaf",
            ));
        }
        if self.mgmt_mask > 32 {
            return Err(CoreError::validation(format!(
                "management mask /{} is not a valid prefix length",
                self.mgmt_mask
            )));
        }
        if self.deployment == Deployment::Cvx
            && self.cvx_server.as_deref().is_none_or(|s| s.trim().is_empty())
        {
            return Err(CoreError::validation(
                "CVX deployments need the CVX server address",
            ));
        }
        if let Some(mlag) = &self.mlag {
            if mlag.trunk_interfaces.len() != 2 {
                return Err(CoreError::validation(format!(
                    "MLAG needs exactly two peer-link interfaces, got {}",
                    mlag.trunk_interfaces.len()
                )));
            }
            if self.leafs % 2 != 0 {
                return Err(CoreError::validation(format!(
                    "MLAG pairs leafs, but {} leafs were requested",
                    self.leafs
                )));
            }
        }
        Ok(())
    }
}

/// A named block of EOS configuration, ready to upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedConfiglet {
    pub name: String,
    pub config: String,
}

/// The plan and its configlets, as shown by a dry run.
#[derive(Debug, Clone, Serialize)]
pub struct FabricBuild {
    pub plan: FabricPlan,
    pub configlets: Vec<GeneratedConfiglet>,
}

/// Plan and render in one step.
pub fn build(opts: &FabricOptions) -> Result<FabricBuild, CoreError> {
    let plan = plan(opts)?;
    let configlets = render(&plan, opts);
    Ok(FabricBuild { plan, configlets })
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    pub(crate) fn options(deployment: Deployment, mlag: bool) -> FabricOptions {
        FabricOptions {
            name: "dc1".into(),
            spines: 2,
            leafs: 4,
            mlag: mlag.then(|| MlagOptions {
                network: "10.255.255.".parse().unwrap(),
                trunk_interfaces: vec!["Ethernet47".into(), "Ethernet48".into()],
            }),
            default_gateway: "192.168.0.254".parse().unwrap(),
            mgmt_network: "192.168.0.".parse().unwrap(),
            mgmt_mask: 24,
            vtep_network: "10.0.200.".parse().unwrap(),
            loopback_network: "10.0.250.".parse().unwrap(),
            link_network: "10.0.1.".parse().unwrap(),
            deployment,
            cvx_server: (deployment == Deployment::Cvx).then(|| "192.168.0.100".into()),
        }
    }

    #[test]
    fn deployment_parses_case_insensitively() {
        assert_eq!("EVPN".parse::<Deployment>().unwrap(), Deployment::Evpn);
        assert_eq!(Deployment::Her.to_string(), "her");
    }

    #[test]
    fn cvx_without_server_is_rejected() {
        let mut opts = options(Deployment::Cvx, false);
        opts.cvx_server = None;
        assert!(matches!(opts.validate(), Err(CoreError::ValidationFailed { .. })));
    }

    #[test]
    fn mlag_needs_two_trunks_and_even_leafs() {
        let mut opts = options(Deployment::Her, true);
        if let Some(m) = opts.mlag.as_mut() {
            m.trunk_interfaces.pop();
        }
        assert!(opts.validate().is_err());

        let mut opts = options(Deployment::Her, true);
        opts.leafs = 3;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn build_produces_two_configlets_per_switch_plus_base() {
        let build = build(&options(Deployment::Evpn, true)).unwrap();
        assert_eq!(build.configlets.len(), 2 * 2 + 2 * 4 + 1);
        assert_eq!(build.configlets.last().unwrap().name, "dc1 Base config");
    }
}
