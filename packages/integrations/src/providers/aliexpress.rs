// ABOUTME: AliExpress integration authenticated with a static API key
// ABOUTME: Listings carry no manufacturer part numbers, so each groups alone

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use partsbin_core::{PartRecord, PartSearchQuery, ProviderConfig, VendorId};

use crate::error::{ProviderError, ProviderResult};
use crate::providers::{parse_price, vendor_http_client, IntegrationApi};
use crate::ratelimit::RateGate;

pub struct AliExpressApi {
    config: Arc<ProviderConfig>,
    http: Client,
    gate: RateGate,
}

#[derive(Debug, Deserialize)]
struct ProductSearchResponse {
    #[serde(default)]
    products: Vec<AliExpressProduct>,
}

#[derive(Debug, Deserialize)]
struct AliExpressProduct {
    product_id: Option<u64>,
    product_title: Option<String>,
    sale_price: Option<String>,
    sale_price_currency: Option<String>,
    lot_num: Option<i64>,
}

impl AliExpressApi {
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

    async fn send_search(&self, keywords: &str, limit: usize) -> ProviderResult<Vec<PartRecord>> {
        let url = format!("{}/products/search", self.config.api_url);
        let limit = limit.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key()),
                ("keywords", keywords),
                ("page_size", &limit),
            ])
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Network(format!(
                "AliExpress returned {}",
                status
            )));
        }

        let body: ProductSearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        debug!("AliExpress returned {} products", body.products.len());
        Ok(body.products.into_iter().map(map_product).collect())
    }
}

fn map_product(product: AliExpressProduct) -> PartRecord {
    PartRecord {
        vendor: VendorId::AliExpress,
        vendor_part_number: product
            .product_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        // Marketplace listings carry no manufacturer part number
        manufacturer_part_number: String::new(),
        description: product.product_title.unwrap_or_default(),
        datasheet_url: None,
        unit_price: product
            .sale_price
            .as_deref()
            .and_then(parse_price)
            .unwrap_or(0.0),
        currency: product
            .sale_price_currency
            .unwrap_or_else(|| "USD".to_string()),
        quantity_available: product.lot_num.unwrap_or(0),
        package_type: None,
    }
}

#[async_trait]
impl IntegrationApi for AliExpressApi {
    fn vendor(&self) -> VendorId {
        VendorId::AliExpress
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
        let records = self.send_search(part_number, 1).await?;
        Ok(records.into_iter().next())
    }

    async fn get_datasheet(
        &self,
        _part_number: &str,
        _user_id: &str,
    ) -> ProviderResult<Option<String>> {
        // Marketplace listings never carry datasheets
        Ok(None)
    }
}
