// ABOUTME: Vendor integration trait and adapter factory
// ABOUTME: One adapter per distributor, assembled from provider configuration

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use partsbin_auth::CredentialRefreshCoordinator;
use partsbin_core::{PartRecord, PartSearchQuery, ProviderConfig, VendorId};

use crate::error::ProviderResult;

pub mod aliexpress;
pub mod digikey;
pub mod mouser;
pub mod octopart;

pub use aliexpress::AliExpressApi;
pub use digikey::DigikeyApi;
pub use mouser::MouserApi;
pub use octopart::OctopartApi;

const VENDOR_TIMEOUT_SECS: u64 = 10;
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Common capability set every distributor integration implements
#[async_trait]
pub trait IntegrationApi: Send + Sync {
    /// The vendor this integration talks to
    fn vendor(&self) -> VendorId;

    /// Keyword or part-number search, normalized to PartRecords
    async fn search(&self, query: &PartSearchQuery) -> ProviderResult<Vec<PartRecord>>;

    /// Exact part-number lookup
    async fn get_part(
        &self,
        part_number: &str,
        user_id: &str,
    ) -> ProviderResult<Option<PartRecord>>;

    /// Datasheet URL for a part, when the vendor carries one
    async fn get_datasheet(
        &self,
        part_number: &str,
        user_id: &str,
    ) -> ProviderResult<Option<String>> {
        let part = self.get_part(part_number, user_id).await?;
        Ok(part.and_then(|p| p.datasheet_url))
    }
}

/// Create the HTTP client used for vendor calls
pub(crate) fn vendor_http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(VENDOR_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()
        .expect("Failed to build HTTP client")
}

/// Parse a vendor price string such as "$0.95" or "US $1.20" into a unit price
pub(crate) fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().ok()
}

/// Assemble one adapter per enabled provider, the way the host application
/// wires its integrations at startup
pub fn build_integrations(
    configs: &[ProviderConfig],
    coordinator: Arc<CredentialRefreshCoordinator>,
) -> Vec<Arc<dyn IntegrationApi>> {
    let mut integrations: Vec<Arc<dyn IntegrationApi>> = Vec::new();
    for config in configs.iter().filter(|c| c.enabled) {
        info!("Registering {} integration", config.vendor);
        let config = Arc::new(config.clone());
        let api: Arc<dyn IntegrationApi> = match config.vendor {
            VendorId::Digikey => Arc::new(DigikeyApi::new(config, coordinator.clone())),
            VendorId::Mouser => Arc::new(MouserApi::new(config)),
            VendorId::Octopart => Arc::new(OctopartApi::new(config)),
            VendorId::AliExpress => Arc::new(AliExpressApi::new(config)),
        };
        integrations.push(api);
    }
    integrations
}
