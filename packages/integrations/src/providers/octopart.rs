// ABOUTME: Octopart integration authenticated with a static API key
// ABOUTME: Flattens each seller offer into its own normalized part listing

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use partsbin_core::{PartRecord, PartSearchQuery, ProviderConfig, VendorId};

use crate::error::{ProviderError, ProviderResult};
use crate::providers::{parse_price, vendor_http_client, IntegrationApi};
use crate::ratelimit::RateGate;

pub struct OctopartApi {
    config: Arc<ProviderConfig>,
    http: Client,
    gate: RateGate,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    item: OctopartItem,
}

#[derive(Debug, Deserialize)]
struct OctopartItem {
    mpn: Option<String>,
    short_description: Option<String>,
    #[serde(default)]
    offers: Vec<OctopartOffer>,
    #[serde(default)]
    datasheets: Vec<OctopartDatasheet>,
}

#[derive(Debug, Deserialize)]
struct OctopartOffer {
    sku: Option<String>,
    in_stock_quantity: Option<i64>,
    packaging: Option<String>,
    /// Currency code to (quantity, price) breaks; BTreeMap keeps currency
    /// selection deterministic
    #[serde(default)]
    prices: BTreeMap<String, Vec<(i64, String)>>,
}

#[derive(Debug, Deserialize)]
struct OctopartDatasheet {
    url: Option<String>,
}

impl OctopartApi {
    pub fn new(config: Arc<ProviderConfig>) -> Self {
        let gate = RateGate::per_minute(config.rate_limit_per_minute);
        Self {
            config,
            http: vendor_http_client(),
            gate,
        }
    }

    fn api_key(&self) -> &str {
        self.config.api_key().unwrap_or_default()
    }

    async fn send_search(&self, term: &str, limit: usize) -> ProviderResult<Vec<PartRecord>> {
        let url = format!("{}/parts/search", self.config.api_url);
        let limit = limit.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[("apikey", self.api_key()), ("q", term), ("limit", &limit)])
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Network(format!(
                "Octopart returned {}",
                status
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        debug!("Octopart returned {} items", body.results.len());

        let mut records = Vec::new();
        for result in body.results {
            records.extend(flatten_item(result.item));
        }
        Ok(records)
    }
}

/// One PartRecord per seller offer; the item's datasheet applies to all of them
fn flatten_item(item: OctopartItem) -> Vec<PartRecord> {
    let mpn = item.mpn.unwrap_or_default();
    let description = item.short_description.unwrap_or_default();
    let datasheet_url = item.datasheets.into_iter().find_map(|d| d.url);

    item.offers
        .into_iter()
        .map(|offer| {
            let (unit_price, currency) = best_price(&offer.prices);
            PartRecord {
                vendor: VendorId::Octopart,
                vendor_part_number: offer.sku.unwrap_or_else(|| mpn.clone()),
                manufacturer_part_number: mpn.clone(),
                description: description.clone(),
                datasheet_url: datasheet_url.clone(),
                unit_price,
                currency,
                quantity_available: offer.in_stock_quantity.unwrap_or(0),
                package_type: offer.packaging,
            }
        })
        .collect()
}

/// Lowest-quantity break in USD when offered, otherwise the first currency
fn best_price(prices: &BTreeMap<String, Vec<(i64, String)>>) -> (f64, String) {
    let entry = prices
        .get_key_value("USD")
        .or_else(|| prices.iter().next());
    let Some((currency, breaks)) = entry else {
        return (0.0, "USD".to_string());
    };
    let unit_price = breaks
        .iter()
        .min_by_key(|(quantity, _)| *quantity)
        .and_then(|(_, price)| parse_price(price))
        .unwrap_or(0.0);
    (unit_price, currency.clone())
}

#[async_trait]
impl IntegrationApi for OctopartApi {
    fn vendor(&self) -> VendorId {
        VendorId::Octopart
    }

    async fn search(&self, query: &PartSearchQuery) -> ProviderResult<Vec<PartRecord>> {
        self.gate.check().await?;
        self.send_search(query.term.text(), query.result_limit).await
    }

    async fn get_part(
        &self,
        part_number: &str,
        _user_id: &str,
    ) -> ProviderResult<Option<PartRecord>> {
        self.gate.check().await?;
        let records = self.send_search(part_number, 5).await?;
        Ok(records
            .into_iter()
            .find(|r| r.manufacturer_part_number.eq_ignore_ascii_case(part_number)))
    }
}
