// ABOUTME: Digikey integration using OAuth2 bearer tokens from the refresh coordinator
// ABOUTME: Retries exactly once after a 401 caused by a stale token, then gives up

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use partsbin_auth::CredentialRefreshCoordinator;
use partsbin_core::{PartRecord, PartSearchQuery, ProviderConfig, VendorId};

use crate::error::{ProviderError, ProviderResult};
use crate::providers::{vendor_http_client, IntegrationApi};
use crate::ratelimit::RateGate;

pub struct DigikeyApi {
    config: Arc<ProviderConfig>,
    coordinator: Arc<CredentialRefreshCoordinator>,
    http: Client,
    gate: RateGate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct KeywordSearchRequest {
    keywords: String,
    record_count: usize,
    record_start_position: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeywordSearchResponse {
    #[serde(default)]
    products: Vec<DigikeyProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DigikeyProduct {
    digi_key_part_number: Option<String>,
    manufacturer_part_number: Option<String>,
    product_description: Option<String>,
    primary_datasheet: Option<String>,
    unit_price: Option<f64>,
    quantity_available: Option<i64>,
    packaging: Option<DigikeyValueField>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DigikeyValueField {
    value: Option<String>,
}

impl DigikeyApi {
    pub fn new(config: Arc<ProviderConfig>, coordinator: Arc<CredentialRefreshCoordinator>) -> Self {
        let gate = RateGate::per_minute(config.rate_limit_per_minute);
        Self {
            config,
            coordinator,
            http: vendor_http_client(),
            gate,
        }
    }

    fn client_id(&self) -> &str {
        self.config
            .oauth2()
            .map(|oauth| oauth.client_id.as_str())
            .unwrap_or_default()
    }

    /// Issue a request with a valid bearer token, retrying exactly once after
    /// a 401 caused by a token the vendor no longer accepts
    async fn send_authorized(
        &self,
        user_id: &str,
        build: impl Fn(&str) -> RequestBuilder,
    ) -> ProviderResult<Response> {
        let token = self
            .coordinator
            .get_valid_token(user_id, &self.config)
            .await?;
        let response = build(&token)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!("Digikey rejected token; forcing one refresh and retrying");
        let token = self
            .coordinator
            .refresh_after_rejection(user_id, &self.config, &token)
            .await?;
        let response = build(&token)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::AuthRequired);
        }
        Ok(response)
    }

    fn map_product(&self, product: DigikeyProduct) -> PartRecord {
        PartRecord {
            vendor: VendorId::Digikey,
            vendor_part_number: product.digi_key_part_number.unwrap_or_default(),
            manufacturer_part_number: product.manufacturer_part_number.unwrap_or_default(),
            description: product.product_description.unwrap_or_default(),
            datasheet_url: product.primary_datasheet,
            unit_price: product.unit_price.unwrap_or(0.0),
            currency: "USD".to_string(),
            quantity_available: product.quantity_available.unwrap_or(0),
            package_type: product.packaging.and_then(|p| p.value),
        }
    }
}

#[async_trait]
impl IntegrationApi for DigikeyApi {
    fn vendor(&self) -> VendorId {
        VendorId::Digikey
    }

    async fn search(&self, query: &PartSearchQuery) -> ProviderResult<Vec<PartRecord>> {
        self.gate.check().await?;

        let request = KeywordSearchRequest {
            keywords: query.term.text().to_string(),
            record_count: query.result_limit,
            record_start_position: 0,
        };
        let url = format!("{}/Search/v3/Products/Keyword", self.config.api_url);
        let response = self
            .send_authorized(&query.user_id, |token| {
                self.http
                    .post(&url)
                    .bearer_auth(token)
                    .header("X-DIGIKEY-Client-Id", self.client_id())
                    .json(&request)
            })
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Network(format!(
                "Digikey returned {}",
                status
            )));
        }

        let body: KeywordSearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        debug!("Digikey returned {} products", body.products.len());
        Ok(body
            .products
            .into_iter()
            .map(|p| self.map_product(p))
            .collect())
    }

    async fn get_part(
        &self,
        part_number: &str,
        user_id: &str,
    ) -> ProviderResult<Option<PartRecord>> {
        self.gate.check().await?;

        let url = format!("{}/Search/v3/Products/{}", self.config.api_url, part_number);
        let response = self
            .send_authorized(user_id, |token| {
                self.http
                    .get(&url)
                    .bearer_auth(token)
                    .header("X-DIGIKEY-Client-Id", self.client_id())
            })
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Network(format!(
                "Digikey returned {}",
                status
            )));
        }

        let product: DigikeyProduct = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        Ok(Some(self.map_product(product)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use partsbin_auth::{Credential, CredentialStore, MemoryCredentialStore};
    use partsbin_core::{OAuth2Credentials, ProviderCredentials};
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> Arc<ProviderConfig> {
        Arc::new(ProviderConfig {
            vendor: VendorId::Digikey,
            api_url: server.uri(),
            enabled: true,
            rate_limit_per_minute: 0,
            credentials: ProviderCredentials::OAuth2(OAuth2Credentials {
                client_id: "client-1".to_string(),
                client_secret: None,
                token_url: format!("{}/v1/oauth2/token", server.uri()),
                redirect_uri: None,
            }),
        })
    }

    async fn api_with_token(server: &MockServer, access_token: &str) -> DigikeyApi {
        let store = Arc::new(MemoryCredentialStore::new());
        store
            .put(&Credential {
                id: "cred-1".to_string(),
                user_id: "user-1".to_string(),
                vendor: VendorId::Digikey,
                access_token: access_token.to_string(),
                refresh_token: Some("refresh-1".to_string()),
                expires_at: Utc::now() + Duration::hours(1),
                scope: None,
            })
            .await
            .unwrap();
        let coordinator = Arc::new(CredentialRefreshCoordinator::new(store).unwrap());
        DigikeyApi::new(config(server), coordinator)
    }

    fn product_json() -> serde_json::Value {
        serde_json::json!({
            "Products": [{
                "DigiKeyPartNumber": "296-1411-5-ND",
                "ManufacturerPartNumber": "NE555P",
                "ProductDescription": "IC OSC SINGLE TIMER 100KHZ 8-DIP",
                "PrimaryDatasheet": "https://www.ti.com/lit/ds/symlink/ne555.pdf",
                "UnitPrice": 0.48,
                "QuantityAvailable": 52000,
                "Packaging": { "Value": "Tube" }
            }]
        })
    }

    #[tokio::test]
    async fn test_keyword_search_maps_products() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Search/v3/Products/Keyword"))
            .and(header("authorization", "Bearer valid-token"))
            .and(header("X-DIGIKEY-Client-Id", "client-1"))
            .and(body_string_contains("NE555"))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_json()))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_with_token(&server, "valid-token").await;
        let query = PartSearchQuery::keyword("NE555", 25, "user-1");
        let parts = api.search(&query).await.unwrap();

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].vendor, VendorId::Digikey);
        assert_eq!(parts[0].vendor_part_number, "296-1411-5-ND");
        assert_eq!(parts[0].manufacturer_part_number, "NE555P");
        assert_eq!(parts[0].unit_price, 0.48);
        assert_eq!(parts[0].package_type.as_deref(), Some("Tube"));
    }

    #[tokio::test]
    async fn test_missing_optional_fields_tolerated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Search/v3/Products/Keyword"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Products": [{
                    "DigiKeyPartNumber": "296-1411-5-ND",
                    "ManufacturerPartNumber": "NE555P"
                }]
            })))
            .mount(&server)
            .await;

        let api = api_with_token(&server, "valid-token").await;
        let query = PartSearchQuery::keyword("NE555", 25, "user-1");
        let parts = api.search(&query).await.unwrap();

        assert_eq!(parts.len(), 1);
        assert!(parts[0].datasheet_url.is_none());
        assert_eq!(parts[0].unit_price, 0.0);
        assert_eq!(parts[0].quantity_available, 0);
    }

    #[tokio::test]
    async fn test_stale_token_retried_once_after_refresh() {
        let server = MockServer::start().await;
        // First call with the stale token is rejected
        Mock::given(method("POST"))
            .and(path("/Search/v3/Products/Keyword"))
            .and(header("authorization", "Bearer stale-token"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        // The forced refresh rotates the token
        Mock::given(method("POST"))
            .and(path("/v1/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "rotated-token",
                "refresh_token": "refresh-2",
                "expires_in": 1800,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;
        // The retry with the rotated token succeeds
        Mock::given(method("POST"))
            .and(path("/Search/v3/Products/Keyword"))
            .and(header("authorization", "Bearer rotated-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_json()))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_with_token(&server, "stale-token").await;
        let query = PartSearchQuery::keyword("NE555", 25, "user-1");
        let parts = api.search(&query).await.unwrap();
        assert_eq!(parts.len(), 1);
    }

    #[tokio::test]
    async fn test_persistent_401_gives_up() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Search/v3/Products/Keyword"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "rotated-token",
                "expires_in": 1800,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_with_token(&server, "stale-token").await;
        let query = PartSearchQuery::keyword("NE555", 25, "user-1");
        let err = api.search(&query).await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthRequired));
    }

    #[tokio::test]
    async fn test_throttled_response_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Search/v3/Products/Keyword"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let api = api_with_token(&server, "valid-token").await;
        let query = PartSearchQuery::keyword("NE555", 25, "user-1");
        assert!(matches!(
            api.search(&query).await.unwrap_err(),
            ProviderError::RateLimited
        ));
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Search/v3/Products/Keyword"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let api = api_with_token(&server, "valid-token").await;
        let query = PartSearchQuery::keyword("NE555", 25, "user-1");
        assert!(matches!(
            api.search(&query).await.unwrap_err(),
            ProviderError::Malformed(_)
        ));
    }

    #[tokio::test]
    async fn test_get_part_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Search/v3/Products/NE555P"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let api = api_with_token(&server, "valid-token").await;
        assert!(api.get_part("NE555P", "user-1").await.unwrap().is_none());
    }
}
