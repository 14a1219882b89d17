//! Change-control check handlers.
//!
//! Each check prints its audit trail as it goes (table/plain output) and
//! exits non-zero when it fails.

use std::time::Duration;

use cvpkit_api::{EapiClient, TransportConfig};
use cvpkit_core::CoreError;
use cvpkit_core::checks::{
    Audit, CheckReport, DeviceLogin, PageArgs, PingArgs, SshExec, SwitchTypeArgs, check_switch_type,
    device_ping, load_action, page_check,
};

use crate::cli::{
    ChecksArgs, ChecksCommand, GlobalOpts, PageCheckArgs, PingCheckArgs, SwitchTypeCheckArgs,
};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Argument sources ────────────────────────────────────────────────

fn ping_args(args: PingCheckArgs) -> Result<PingArgs, CliError> {
    if let Some(path) = &args.args_file {
        return Ok(load_action(path, "device_ping")?);
    }
    Ok(PingArgs {
        device_list: args.devices,
        target_list: args.targets,
        passmark: args.passmark,
        fail_count: args.fail_count,
        ping_count: args.count,
        timeout: args.ping_timeout,
        login: DeviceLogin::default(),
    })
}

fn page_args(args: PageCheckArgs) -> Result<PageArgs, CliError> {
    if let Some(path) = &args.args_file {
        return Ok(load_action(path, "page_check")?);
    }
    let page_url = args.url.ok_or_else(|| CliError::Validation {
        field: "url".into(),
        reason: "pass --url or --args-file".into(),
    })?;
    Ok(PageArgs {
        page_url,
        device_list: args.devices,
        fail_count: args.fail_count,
        timeout: args.page_timeout,
        login: DeviceLogin::default(),
    })
}

fn switch_type_args(args: SwitchTypeCheckArgs) -> Result<SwitchTypeArgs, CliError> {
    let mut loaded = match &args.args_file {
        Some(path) => load_action(path, "check_switchType")?,
        None => SwitchTypeArgs {
            switch_type: args.switch_type.clone().ok_or_else(|| CliError::Validation {
                field: "switch-type".into(),
                reason: "pass --switch-type or --args-file".into(),
            })?,
            device: None,
            login: DeviceLogin::default(),
        },
    };
    // --device names the switch even when the rest comes from a file.
    if args.device.is_some() {
        loaded.device = args.device;
    }
    Ok(loaded)
}

fn login(login: &DeviceLogin, global: &GlobalOpts, cfg: &Config) -> Result<(String, secrecy::SecretString), CliError> {
    config::device_login((login.username.clone(), login.password.clone()), global, cfg)
}

fn audit(global: &GlobalOpts) -> Audit {
    if output::is_human(&global.output) && !global.quiet {
        Audit::echoing()
    } else {
        Audit::new()
    }
}

/// Structured formats get the report on stdout; a failed check becomes
/// the exit status either way.
fn finish(report: CheckReport, global: &GlobalOpts) -> Result<(), CliError> {
    if !output::is_human(&global.output) {
        let out = output::render_single(&global.output, &report, |_| String::new(), |_| String::new());
        output::print_output(&out, global.quiet);
    }
    report.into_result()?;
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(args: ChecksArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ChecksCommand::Ping(args) => {
            let args = ping_args(args)?;
            let (user, password) = login(&args.login, global, cfg)?;
            let exec = SshExec::new(user, password);
            let mut audit = audit(global);
            let report = device_ping(&exec, &args, &mut audit).await;
            finish(report, global)
        }

        ChecksCommand::Page(args) => {
            let args = page_args(args)?;
            let (user, password) = login(&args.login, global, cfg)?;
            let exec = SshExec::new(user, password);
            let mut audit = audit(global);
            let report = page_check(&exec, &args, &mut audit).await;
            finish(report, global)
        }

        ChecksCommand::SwitchType(args) => {
            let args = switch_type_args(args)?;
            let (user, password) = login(&args.login, global, cfg)?;
            let host = args.device.as_deref().unwrap_or("localhost");
            let transport = TransportConfig {
                timeout: Duration::from_secs(global.timeout.unwrap_or(cfg.defaults.timeout)),
                ..TransportConfig::default()
            };
            let client = EapiClient::for_host(host, &user, password, &transport)
                .map_err(CoreError::from)?;

            let mut audit = audit(global);
            let report = check_switch_type(&client, &args, &mut audit).await?;
            finish(report, global)
        }
    }
}
