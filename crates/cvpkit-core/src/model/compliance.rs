// ── Compliance codes ──

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CVP's device compliance code, as returned zero-padded (`"0001"`) by
/// `checkCompliance.do` and the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplianceCode {
    InCompliance,
    ConfigOutOfSync,
    ImageOutOfSync,
    ImageAndConfigOutOfSync,
    Unused,
    DeviceNotReachable,
    ImageUpgradeRequired,
    ExtensionsOutOfSync,
    ConfigImageAndExtensionsOutOfSync,
    ConfigAndExtensionsOutOfSync,
    ImageAndExtensionsOutOfSync,
    UnauthorizedUser,
    /// A code this release of cvpkit does not know.
    Other(u16),
}

impl ComplianceCode {
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => Self::InCompliance,
            1 => Self::ConfigOutOfSync,
            2 => Self::ImageOutOfSync,
            3 => Self::ImageAndConfigOutOfSync,
            4 => Self::Unused,
            5 => Self::DeviceNotReachable,
            6 => Self::ImageUpgradeRequired,
            7 => Self::ExtensionsOutOfSync,
            8 => Self::ConfigImageAndExtensionsOutOfSync,
            9 => Self::ConfigAndExtensionsOutOfSync,
            10 => Self::ImageAndExtensionsOutOfSync,
            11 => Self::UnauthorizedUser,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::InCompliance => 0,
            Self::ConfigOutOfSync => 1,
            Self::ImageOutOfSync => 2,
            Self::ImageAndConfigOutOfSync => 3,
            Self::Unused => 4,
            Self::DeviceNotReachable => 5,
            Self::ImageUpgradeRequired => 6,
            Self::ExtensionsOutOfSync => 7,
            Self::ConfigImageAndExtensionsOutOfSync => 8,
            Self::ConfigAndExtensionsOutOfSync => 9,
            Self::ImageAndExtensionsOutOfSync => 10,
            Self::UnauthorizedUser => 11,
            Self::Other(code) => code,
        }
    }

    pub fn is_compliant(self) -> bool {
        self == Self::InCompliance
    }

    /// The sentence CVP's UI shows for this code.
    pub fn message(self) -> String {
        let text = match self {
            Self::InCompliance => "In compliance",
            Self::ConfigOutOfSync => "Config out of sync",
            Self::ImageOutOfSync => "Image out of sync",
            Self::ImageAndConfigOutOfSync => "Image and Config out of sync",
            Self::Unused => "Unused",
            Self::DeviceNotReachable => "Device not reachable",
            Self::ImageUpgradeRequired => "Image upgrade required",
            Self::ExtensionsOutOfSync => "Extensions out of sync",
            Self::ConfigImageAndExtensionsOutOfSync => "Config, Image and Extensions out of sync",
            Self::ConfigAndExtensionsOutOfSync => "Config and Extensions out of sync",
            Self::ImageAndExtensionsOutOfSync => "Image and Extensions out of sync",
            Self::UnauthorizedUser => "Unauthorized User",
            Self::Other(code) => return format!("Unknown compliance code {code}"),
        };
        text.to_owned()
    }
}

impl fmt::Display for ComplianceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl FromStr for ComplianceCode {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u16>().map(Self::from_code)
    }
}
