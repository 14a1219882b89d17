//! Command dispatch: bridges CLI args -> core operations -> output.
//!
//! Each handler resolves what it needs from config itself; commands that
//! never touch CVP (dry runs, export parsing, checks) don't need a profile.

pub mod checks;
pub mod compliance;
pub mod config_cmd;
pub mod configlets;
pub mod devices;
pub mod fabric;
pub mod inventory;
pub mod snapshot;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;

/// Dispatch a command to the appropriate handler.
pub async fn dispatch(cmd: Command, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Inventory(args) => inventory::handle(args, cfg, global).await,
        Command::Devices(args) => devices::handle(args, cfg, global).await,
        Command::Compliance(args) => compliance::handle(args, cfg, global).await,
        Command::Fabric(args) => fabric::handle(args, cfg, global).await,
        Command::Configlets(args) => configlets::handle(args, cfg, global).await,
        Command::Snapshot(args) => snapshot::handle(args, cfg, global).await,
        Command::Checks(args) => checks::handle(args, cfg, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
