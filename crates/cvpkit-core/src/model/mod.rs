// ── Domain model ──
//
// Flat records built from CVP responses. Nothing here outlives the
// command that fetched it.

pub mod compliance;
pub mod device;
pub mod interface;
pub mod mac;

// ── Re-exports ──────────────────────────────────────────────────────

pub use compliance::ComplianceCode;
pub use device::{Switch, SwitchStatus};
pub use interface::{InterfaceName, LinkStatus, PortRow, RemoteEntry};
pub use mac::format_packed_mac;
