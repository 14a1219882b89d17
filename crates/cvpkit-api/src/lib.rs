// cvpkit-api: Async Rust clients for CloudVision Portal (portal REST, Analytics Engine, eAPI)

pub mod aeris;
pub mod auth;
pub mod eapi;
pub mod error;
pub mod portal;
pub mod transport;

pub use aeris::{AerisClient, Updates};
pub use auth::ApiPrefix;
pub use eapi::EapiClient;
pub use error::Error;
pub use portal::PortalClient;
pub use portal::models::{
    CaptureRequest, ComplianceResult, Configlet, Container, CvpInfo, NetElement, SnapshotTemplate,
};
pub use transport::{TlsMode, TransportConfig};
