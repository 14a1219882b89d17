// CloudVision Analytics Engine REST API
//
// Read-only access to the state streamed from each switch, addressed by
// device serial number and Sysdb/Smash path.

pub mod client;
pub mod paths;

pub use client::{AerisClient, Updates};
