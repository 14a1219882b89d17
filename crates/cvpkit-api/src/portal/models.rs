// Portal API response types
//
// Loosely typed on purpose: CVP releases add and drop fields freely, so
// everything defaults and unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// `{ "data": [...], "total": N }` list envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct DataList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// `{ "data": ... }` single-value envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct DataValue<T> {
    pub data: T,
}

/// Response of `getCvpInfo.do`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvpInfo {
    pub version: String,
}

/// A provisioned device as reported by the inventory endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetElement {
    pub fqdn: String,
    pub hostname: String,
    pub ip_address: String,
    pub system_mac_address: String,
    pub serial_number: String,
    pub model_name: String,
    pub version: String,
    pub compliance_code: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InventoryResponse {
    #[serde(default)]
    pub net_element_list: Vec<NetElement>,
}

/// Response of `checkCompliance.do`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComplianceResult {
    /// Zero-padded numeric code, e.g. `"0001"`.
    pub compliance_code: String,
    pub compliance_indication: String,
}

/// A static configlet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configlet {
    pub key: String,
    pub name: String,
    pub config: String,
    /// Milliseconds since the epoch.
    pub date_time_in_long_format: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A container in the provisioning topology.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Container {
    pub key: String,
    pub name: String,
}

/// A snapshot template (the set of show commands a snapshot captures).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotTemplate {
    pub key: String,
    pub name: String,
}

/// Body of `captureContainerLevelSnapshot.do`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    pub template_id: String,
    pub container_id: String,
}
