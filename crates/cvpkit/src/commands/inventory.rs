//! Inventory command handlers.

use cvpkit_core::inventory::plain_lines;
use cvpkit_core::{LinkStatus, PortInventory, PortRow};

use crate::cli::{GlobalOpts, InventoryArgs, InventoryCommand, OutputFormat};
use crate::config::Config;
use crate::error::CliError;
use crate::output::{self, Tone};

use super::util;

fn status_tone(status: LinkStatus) -> Tone {
    match status {
        LinkStatus::Connected => Tone::Good,
        LinkStatus::Notconnect => Tone::Bad,
        LinkStatus::Unknown => Tone::Neutral,
    }
}

/// One table record per remote entry; continuations leave the port
/// columns blank.
fn records(rows: &[PortRow], with_ip: bool, color: bool) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    for row in rows {
        let first = row.first_remote();
        let mut record = vec![
            row.switch.clone(),
            row.port.clone(),
            output::paint(&row.status.to_string(), status_tone(row.status), color),
            row.speed.clone(),
            row.duplex.clone(),
            first.dev_id,
            first.port_id,
            row.vlans.join(","),
            row.description.clone(),
        ];
        if with_ip {
            record.push(row.ip_address.clone().unwrap_or_default());
        }
        out.push(record);

        for extra in row.continuations() {
            let mut record = vec![String::new(); 5];
            record.extend([extra.dev_id.clone(), extra.port_id.clone()]);
            record.resize(if with_ip { 10 } else { 9 }, String::new());
            out.push(record);
        }
    }
    out
}

fn render(rows: &[PortRow], with_ip: bool, global: &GlobalOpts) -> String {
    const HEADER: [&str; 10] = [
        "Switch", "Port", "Status", "Speed", "Duplex", "Remote Device", "Remote Port", "VLANs",
        "Description", "IP",
    ];

    match global.output {
        OutputFormat::Table => {
            let header = if with_ip { &HEADER[..] } else { &HEADER[..9] };
            let color = output::should_color(&global.color);
            output::render_records(header, records(rows, with_ip, color))
        }
        OutputFormat::Plain => rows
            .iter()
            .flat_map(plain_lines)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => output::render_single(&global.output, rows, |_| String::new(), |_| String::new()),
    }
}

pub async fn handle(args: InventoryArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        InventoryCommand::Ports { ip, switch } => {
            let cvp = util::connect(cfg, global).await?;
            let result = async {
                let aeris = cvp.aeris()?;
                let inventory = PortInventory::new(&aeris).with_ip(ip);
                let spinner = util::spinner("Walking Analytics Engine state", global.quiet);
                let rows = match &switch {
                    Some(serial) => inventory.collect_switch(serial).await,
                    None => inventory.collect().await,
                };
                spinner.finish_and_clear();
                rows
            }
            .await;
            cvp.disconnect().await;

            let rows = result?;
            output::print_output(&render(&rows, ip, global), global.quiet);
            Ok(())
        }
    }
}
