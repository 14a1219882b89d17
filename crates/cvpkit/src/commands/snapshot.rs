//! Snapshot command handlers.

use cvpkit_core::snapshot;

use crate::cli::{GlobalOpts, SnapshotArgs, SnapshotCommand};
use crate::config::Config;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(args: SnapshotArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SnapshotCommand::Capture {
            container,
            template,
        } => {
            let cvp = util::connect(cfg, global).await?;
            let spinner = util::spinner(&format!("Capturing snapshot of {container}"), global.quiet);
            let result = snapshot::capture(cvp.portal(), &container, &template).await;
            spinner.finish_and_clear();
            cvp.disconnect().await;

            let result = result?;
            let out = output::render_single(&global.output, &result, Clone::clone, Clone::clone);
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
