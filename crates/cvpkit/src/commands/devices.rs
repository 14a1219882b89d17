//! Device command handlers.

use tabled::Tabled;

use cvpkit_core::Switch;
use cvpkit_core::devices::{list_switches, with_compliance};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;
use crate::output::{self, Tone};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Compliance")]
    compliance: String,
}

impl DeviceRow {
    fn new(s: &Switch, color: bool) -> Self {
        let compliance = match s.compliance {
            Some(code) if code.is_compliant() => output::paint(&code.message(), Tone::Good, color),
            Some(code) => output::paint(&code.message(), Tone::Warn, color),
            None => "-".into(),
        };
        Self {
            hostname: s.hostname.clone(),
            ip: s.ip_address.clone(),
            mac: s.mac_address.clone(),
            serial: s.serial_number.clone(),
            model: s.model_name.clone(),
            version: s.version.clone(),
            compliance,
        }
    }
}

pub async fn handle(args: DevicesArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List { compliance } => {
            let cvp = util::connect(cfg, global).await?;
            let result = async {
                let mut switches = list_switches(cvp.portal()).await?;
                if compliance {
                    let spinner = util::spinner("Checking compliance", global.quiet);
                    with_compliance(cvp.portal(), &mut switches).await?;
                    spinner.finish_and_clear();
                }
                Ok::<_, cvpkit_core::CoreError>(switches)
            }
            .await;
            cvp.disconnect().await;

            let switches = result?;
            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &switches,
                |s| DeviceRow::new(s, color),
                |s| s.display_name().to_owned(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
