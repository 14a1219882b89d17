//! CloudVision automation operations on top of `cvpkit-api`.
//!
//! Everything a command needs beyond raw HTTP lives here:
//!
//! - **[`Cvp`]**: login lifecycle with optional wait-for-CVP retry.
//! - **[`inventory`]**: per-port inventory assembled from Analytics Engine
//!   Sysdb state (LLDP, ARP, MAC tables, VLANs).
//! - **[`compliance`]**: one-shot compliance reports and the periodic
//!   [`Watcher`] that reports status changes through [`notify`] sinks.
//! - **[`fabric`]**: spine/leaf address planning, configlet rendering, and
//!   container tree creation.
//! - **[`sync`]**, **[`export`]**, **[`builder`]**: configlet sources
//!   (a Git repository, a configlet-builder export, CSV tables + templates).
//! - **[`snapshot`]** and **[`checks`]**: change-control helpers.

pub mod builder;
pub mod checks;
pub mod compliance;
pub mod config;
pub mod devices;
pub mod error;
pub mod export;
pub mod fabric;
pub mod inventory;
pub mod model;
pub mod notify;
pub mod session;
pub mod snapshot;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use compliance::Watcher;
pub use config::{AuthCredentials, ConnectionConfig, PrefixSelection, RetryPolicy, TlsVerification};
pub use error::CoreError;
pub use inventory::PortInventory;
pub use notify::{MailSettings, Notifier, Report, Sink, SyslogTarget};
pub use session::Cvp;

pub use model::{
    ComplianceCode, InterfaceName, LinkStatus, PortRow, RemoteEntry, Switch, SwitchStatus,
    format_packed_mac,
};
