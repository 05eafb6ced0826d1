// ABOUTME: Mouser integration authenticated with a static search API key
// ABOUTME: Vendor-level errors arrive inside a 200 response envelope

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use partsbin_core::{PartRecord, PartSearchQuery, ProviderConfig, VendorId};

use crate::error::{ProviderError, ProviderResult};
use crate::providers::{parse_price, vendor_http_client, IntegrationApi};
use crate::ratelimit::RateGate;

pub struct MouserApi {
    config: Arc<ProviderConfig>,
    http: Client,
    gate: RateGate,
}

#[derive(Debug, Serialize)]
struct KeywordSearchEnvelope {
    #[serde(rename = "SearchByKeywordRequest")]
    request: KeywordSearchRequest,
}

#[derive(Debug, Serialize)]
struct KeywordSearchRequest {
    keyword: String,
    records: usize,
    #[serde(rename = "startingRecord")]
    starting_record: usize,
}

#[derive(Debug, Serialize)]
struct PartNumberSearchEnvelope {
    #[serde(rename = "SearchByPartRequest")]
    request: PartNumberSearchRequest,
}

#[derive(Debug, Serialize)]
struct PartNumberSearchRequest {
    #[serde(rename = "mouserPartNumber")]
    mouser_part_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MouserResponse {
    #[serde(default)]
    errors: Vec<MouserError>,
    search_results: Option<MouserSearchResults>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MouserError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MouserSearchResults {
    #[serde(default)]
    parts: Vec<MouserPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MouserPart {
    mouser_part_number: Option<String>,
    manufacturer_part_number: Option<String>,
    description: Option<String>,
    data_sheet_url: Option<String>,
    availability_in_stock: Option<String>,
    #[serde(default)]
    price_breaks: Vec<MouserPriceBreak>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MouserPriceBreak {
    quantity: i64,
    price: Option<String>,
    currency: Option<String>,
}

impl MouserApi {
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

    async fn send_search<T: Serialize>(&self, endpoint: &str, body: &T) -> ProviderResult<Vec<PartRecord>> {
        let url = format!("{}{}", self.config.api_url, endpoint);
        let response = self
            .http
            .post(&url)
            .query(&[("apiKey", self.api_key())])
            .json(body)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Network(format!("Mouser returned {}", status)));
        }

        let body: MouserResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        if !body.errors.is_empty() {
            let messages: Vec<String> = body
                .errors
                .into_iter()
                .filter_map(|e| e.message)
                .collect();
            let joined = messages.join("; ");
            // Mouser reports throttling as an in-band error on a 200 response
            if joined.to_lowercase().contains("too many requests") {
                return Err(ProviderError::RateLimited);
            }
            return Err(ProviderError::Malformed(format!(
                "Mouser error response: {}",
                joined
            )));
        }

        let parts = body
            .search_results
            .map(|results| results.parts)
            .unwrap_or_default();
        debug!("Mouser returned {} parts", parts.len());
        Ok(parts.into_iter().map(map_part).collect())
    }
}

fn map_part(part: MouserPart) -> PartRecord {
    // Lowest-quantity break is the unit price
    let best_break = part
        .price_breaks
        .iter()
        .min_by_key(|b| b.quantity);
    let unit_price = best_break
        .and_then(|b| b.price.as_deref())
        .and_then(parse_price)
        .unwrap_or(0.0);
    let currency = best_break
        .and_then(|b| b.currency.clone())
        .unwrap_or_else(|| "USD".to_string());
    let quantity_available = part
        .availability_in_stock
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    PartRecord {
        vendor: VendorId::Mouser,
        vendor_part_number: part.mouser_part_number.unwrap_or_default(),
        manufacturer_part_number: part.manufacturer_part_number.unwrap_or_default(),
        description: part.description.unwrap_or_default(),
        datasheet_url: part.data_sheet_url,
        unit_price,
        currency,
        quantity_available,
        package_type: None,
    }
}

#[async_trait]
impl IntegrationApi for MouserApi {
    fn vendor(&self) -> VendorId {
        VendorId::Mouser
    }

    async fn search(&self, query: &PartSearchQuery) -> ProviderResult<Vec<PartRecord>> {
        self.gate.check().await?;

        let envelope = KeywordSearchEnvelope {
            request: KeywordSearchRequest {
                keyword: query.term.text().to_string(),
                records: query.result_limit,
                starting_record: 0,
            },
        };
        self.send_search("/api/v1/search/keyword", &envelope).await
    }

    async fn get_part(
        &self,
        part_number: &str,
        _user_id: &str,
    ) -> ProviderResult<Option<PartRecord>> {
        self.gate.check().await?;

        let envelope = PartNumberSearchEnvelope {
            request: PartNumberSearchRequest {
                mouser_part_number: part_number.to_string(),
            },
        };
        let parts = self
            .send_search("/api/v1/search/partnumber", &envelope)
            .await?;
        // Prefer an exact manufacturer part number match over the first hit
        let exact = parts
            .iter()
            .position(|p| p.manufacturer_part_number.eq_ignore_ascii_case(part_number));
        Ok(match exact {
            Some(index) => parts.into_iter().nth(index),
            None => parts.into_iter().next(),
        })
    }
}
