// ABOUTME: Vendor identifiers for the supported distributor integrations
// ABOUTME: Closed set covering Digikey, Mouser, Octopart, and AliExpress

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Supported distributor vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorId {
    Digikey,
    Mouser,
    Octopart,
    AliExpress,
}

#[derive(Error, Debug)]
#[error("Unknown vendor: {0}. Supported: digikey, mouser, octopart, aliexpress")]
pub struct UnknownVendor(String);

impl VendorId {
    /// Get all supported vendors
    pub fn all() -> Vec<Self> {
        vec![Self::Digikey, Self::Mouser, Self::Octopart, Self::AliExpress]
    }

    /// Whether this vendor authenticates with OAuth2 rather than a static API key
    pub fn uses_oauth2(&self) -> bool {
        matches!(self, Self::Digikey)
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digikey => write!(f, "digikey"),
            Self::Mouser => write!(f, "mouser"),
            Self::Octopart => write!(f, "octopart"),
            Self::AliExpress => write!(f, "aliexpress"),
        }
    }
}

impl FromStr for VendorId {
    type Err = UnknownVendor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "digikey" => Ok(Self::Digikey),
            "mouser" => Ok(Self::Mouser),
            "octopart" => Ok(Self::Octopart),
            "aliexpress" => Ok(Self::AliExpress),
            _ => Err(UnknownVendor(s.to_string())),
        }
    }
}

impl TryFrom<&str> for VendorId {
    type Error = UnknownVendor;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}
