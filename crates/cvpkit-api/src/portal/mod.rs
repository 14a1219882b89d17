// CloudVision Portal REST API
//
// Session-cookie client for the provisioning, inventory, configlet,
// and snapshot endpoints under `/web` or `/cvpservice`.

pub mod client;
pub mod models;

mod configlets;
mod containers;
mod info;
mod inventory;
mod session;
mod snapshots;

pub use client::PortalClient;
