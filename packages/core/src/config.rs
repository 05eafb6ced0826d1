// ABOUTME: Per-vendor integration configuration supplied by the host application
// ABOUTME: Immutable after load and shared read-only across all integrations

use serde::{Deserialize, Serialize};

use crate::vendor::VendorId;

/// Configuration for one vendor integration
///
/// Values come from the host application's configuration loader; this core
/// treats them as immutable inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub vendor: VendorId,
    pub api_url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Client-side request ceiling; 0 disables the gate
    #[serde(default)]
    pub rate_limit_per_minute: u32,
    pub credentials: ProviderCredentials,
}

fn default_enabled() -> bool {
    true
}

impl ProviderConfig {
    /// The static API key, for vendors that use one
    pub fn api_key(&self) -> Option<&str> {
        match &self.credentials {
            ProviderCredentials::ApiKey { key } => Some(key),
            ProviderCredentials::OAuth2(_) => None,
        }
    }

    /// The OAuth2 client settings, for vendors that require a bearer token
    pub fn oauth2(&self) -> Option<&OAuth2Credentials> {
        match &self.credentials {
            ProviderCredentials::OAuth2(creds) => Some(creds),
            ProviderCredentials::ApiKey { .. } => None,
        }
    }
}

/// How a vendor authenticates outbound requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "auth")]
pub enum ProviderCredentials {
    #[serde(rename = "api_key")]
    ApiKey { key: String },
    #[serde(rename = "oauth2")]
    OAuth2(OAuth2Credentials),
}

/// OAuth2 client settings for vendors using the authorization-code flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Credentials {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub token_url: String,
    pub redirect_uri: Option<String>,
}
