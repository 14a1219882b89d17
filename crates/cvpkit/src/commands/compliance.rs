//! Compliance command handlers.

use std::time::Duration;

use tabled::Tabled;
use tracing::info;

use cvpkit_core::Watcher;
use cvpkit_core::compliance::{NonCompliant, compliance_report, non_compliant_devices};

use crate::cli::{ComplianceArgs, ComplianceCommand, GlobalOpts, SinkArgs};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct NonCompliantRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Code")]
    code: u16,
    #[tabled(rename = "Reason")]
    reason: String,
}

impl From<&NonCompliant> for NonCompliantRow {
    fn from(n: &NonCompliant) -> Self {
        Self {
            device: n.device.clone(),
            code: n.code.code(),
            reason: n.code.message(),
        }
    }
}

fn any_sink(sinks: &SinkArgs) -> bool {
    sinks.print || sinks.mail || sinks.syslog
}

async fn report(sinks: &SinkArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    // Validate sinks before the slow part.
    let notifier = config::notifier(sinks, cfg)?;

    let cvp = util::connect(cfg, global).await?;
    let spinner = util::spinner("Checking device compliance", global.quiet);
    let found = non_compliant_devices(cvp.portal()).await;
    spinner.finish_and_clear();
    cvp.disconnect().await;
    let found = found?;

    // Structured output without explicit sinks goes to stdout as data.
    if !output::is_human(&global.output) && !any_sink(sinks) {
        let out = output::render_list(&global.output, &found, |n| NonCompliantRow::from(n), NonCompliant::line);
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    match compliance_report(&found) {
        Some(report) => notifier.send(&report).await?,
        None => info!("all devices are compliant"),
    }
    Ok(())
}

pub async fn handle(args: ComplianceArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ComplianceCommand::Report { sinks } => report(&sinks, cfg, global).await,

        ComplianceCommand::Watch {
            sinks,
            interval,
            retry_delay,
            once,
        } => {
            let interval = util::parse_interval(&interval)?;
            let notifier = config::notifier(&sinks, cfg)?;
            let connection = config::connection_config(global, cfg)?;

            Watcher::new(connection, notifier)
                .interval(interval)
                .retry_delay(Duration::from_secs(retry_delay))
                .once(once)
                .run()
                .await?;
            Ok(())
        }
    }
}
