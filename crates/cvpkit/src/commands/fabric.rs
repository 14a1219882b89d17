//! Fabric command handlers.

use std::fmt::Write;
use std::net::Ipv4Addr;
use std::str::FromStr;

use cvpkit_core::fabric::{self, Deployment, FabricBuild, FabricOptions, Ipv4Prefix, MlagOptions};

use crate::cli::{DeploymentArg, FabricArgs, FabricBuildArgs, FabricCommand, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;
use crate::output;

use super::util;

fn prefix(field: &str, value: &str) -> Result<Ipv4Prefix, CliError> {
    Ipv4Prefix::from_str(value).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: e.to_string(),
    })
}

fn options(args: &FabricBuildArgs) -> Result<FabricOptions, CliError> {
    let default_gateway = Ipv4Addr::from_str(&args.gateway).map_err(|e| CliError::Validation {
        field: "gateway".into(),
        reason: format!("{:?}: {e}", args.gateway),
    })?;

    let mlag = if args.mlag {
        Some(MlagOptions {
            network: prefix("mlag-network", &args.mlag_network)?,
            trunk_interfaces: args.mlag_trunk.clone(),
        })
    } else {
        None
    };

    Ok(FabricOptions {
        name: args.name.clone(),
        spines: args.spines,
        leafs: args.leafs,
        mlag,
        default_gateway,
        mgmt_network: prefix("mgmt-network", &args.mgmt_network)?,
        mgmt_mask: args.mgmt_mask,
        vtep_network: prefix("vtep-network", &args.vtep_network)?,
        loopback_network: prefix("loopback-network", &args.loopback_network)?,
        link_network: prefix("link-network", &args.link_network)?,
        deployment: match args.deployment {
            DeploymentArg::Her => Deployment::Her,
            DeploymentArg::Cvx => Deployment::Cvx,
            DeploymentArg::Evpn => Deployment::Evpn,
        },
        cvx_server: args.cvx_server.clone(),
    })
}

/// The plan as JSON, then every configlet under its name.
fn dry_run_text(build: &FabricBuild) -> String {
    let mut out = serde_json::to_string_pretty(&build.plan)
        .unwrap_or_else(|e| format!("plan could not be serialized: {e}"));
    for configlet in &build.configlets {
        let _ = write!(out, "\n\n# {}\n{}", configlet.name, configlet.config);
    }
    out
}

pub async fn handle(args: FabricArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        FabricCommand::Build(args) => {
            let opts = options(&args)?;
            let build = fabric::build(&opts)?;

            if args.dry_run {
                let out = output::render_single(&global.output, &build, dry_run_text, dry_run_text);
                output::print_output(&out, global.quiet);
                return Ok(());
            }

            let prompt = format!(
                "Upload {} configlets and create the {} containers?",
                build.configlets.len(),
                opts.name
            );
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }

            let cvp = util::connect(cfg, global).await?;
            let summary = fabric::push(cvp.portal(), &opts, &build.configlets).await;
            cvp.disconnect().await;
            let summary = summary?;

            let out = output::render_single(
                &global.output,
                &summary,
                |s| {
                    let mut lines: Vec<String> = s
                        .configlets
                        .iter()
                        .map(|(name, key)| format!("configlet  {name}  ({key})"))
                        .collect();
                    lines.extend(s.containers.iter().map(|c| format!("container  {c}")));
                    lines.join("\n")
                },
                |s| s.containers.join("\n"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn args() -> FabricBuildArgs {
        FabricBuildArgs {
            name: "dc1".into(),
            spines: 2,
            leafs: 4,
            mlag: true,
            mlag_network: "10.255.255.".into(),
            mlag_trunk: vec!["Ethernet47".into(), "Ethernet48".into()],
            gateway: "192.168.0.254".into(),
            mgmt_network: "192.168.0.".into(),
            mgmt_mask: 24,
            vtep_network: "10.0.200.".into(),
            loopback_network: "10.0.250.".into(),
            link_network: "10.0.1.".into(),
            deployment: DeploymentArg::Evpn,
            cvx_server: None,
            dry_run: true,
        }
    }

    #[test]
    fn flags_become_options() {
        let opts = options(&args()).unwrap();
        assert_eq!(opts.deployment, Deployment::Evpn);
        assert_eq!(opts.mgmt_network.to_string(), "192.168.0.");
        assert!(opts.mlag.is_some());
    }

    #[test]
    fn bad_prefix_names_the_flag() {
        let mut a = args();
        a.vtep_network = "10.0".into();
        match options(&a) {
            Err(CliError::Validation { field, .. }) => assert_eq!(field, "vtep-network"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn dry_run_lists_every_configlet() {
        let build = fabric::build(&options(&args()).unwrap()).unwrap();
        let text = dry_run_text(&build);
        assert!(text.starts_with('{'));
        assert!(text.contains("# dc1spine1 configuration"));
        assert!(text.contains("# dc1 Base config"));
    }
}
