// ABOUTME: Stateless HTTP client for OAuth2 token endpoints
// ABOUTME: Pure transport wrapper; retry policy belongs to the caller

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, error, warn};

use partsbin_core::OAuth2Credentials;

use crate::error::{AuthError, AuthResult};
use crate::oauth::types::{
    RefreshTokenRequest, TokenErrorResponse, TokenExchangeRequest, TokenGrant, TokenResponse,
};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Client for a vendor's OAuth2 token endpoint
///
/// Performs single form-encoded POSTs for the authorization-code and
/// refresh-token grants. Stateless besides its HTTP transport.
pub struct OAuth2Client {
    http: Client,
}

impl OAuth2Client {
    pub fn new() -> AuthResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AuthError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    /// Exchange an authorization code for the initial token grant
    pub async fn exchange_code(
        &self,
        credentials: &OAuth2Credentials,
        code: &str,
    ) -> AuthResult<TokenGrant> {
        debug!("Exchanging authorization code at {}", credentials.token_url);
        let request = TokenExchangeRequest {
            grant_type: "authorization_code".to_string(),
            code: code.to_string(),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            redirect_uri: credentials.redirect_uri.clone(),
        };
        self.token_request(&credentials.token_url, &request).await
    }

    /// Exchange a refresh token for a new token grant
    pub async fn refresh(
        &self,
        credentials: &OAuth2Credentials,
        refresh_token: &str,
    ) -> AuthResult<TokenGrant> {
        debug!("Refreshing token at {}", credentials.token_url);
        let request = RefreshTokenRequest {
            grant_type: "refresh_token".to_string(),
            refresh_token: refresh_token.to_string(),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
        };
        self.token_request(&credentials.token_url, &request).await
    }

    async fn token_request<T: Serialize>(&self, token_url: &str, form: &T) -> AuthResult<TokenGrant> {
        let response = self
            .http
            .post(token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                error!("Token endpoint request failed: {}", e);
                AuthError::Transient(format!("Token endpoint unreachable: {}", e))
            })?;

        let status = response.status();
        if status.is_success() {
            let body: TokenResponse = response.json().await.map_err(|e| {
                error!("Failed to parse token response: {}", e);
                AuthError::Transient(format!("Unparseable token response: {}", e))
            })?;
            return Ok(TokenGrant::from(body));
        }

        if status.is_server_error() {
            // Don't leak the response body - only log status
            error!("Token endpoint returned {}", status);
            return Err(AuthError::Transient(format!(
                "Token endpoint returned {}",
                status
            )));
        }

        // 4xx: distinguish a dead grant from client misconfiguration
        let error_body: Option<TokenErrorResponse> = response.json().await.ok();
        match error_body {
            Some(body) if body.error == "invalid_grant" => {
                warn!(
                    "Grant rejected by token endpoint: {}",
                    body.error_description.as_deref().unwrap_or("invalid_grant")
                );
                Err(AuthError::InvalidGrant)
            }
            Some(body) => {
                error!("Token endpoint rejected request: {}", body.error);
                Err(AuthError::Configuration(format!(
                    "Token endpoint rejected request: {}",
                    body.error
                )))
            }
            None if status == StatusCode::UNAUTHORIZED => Err(AuthError::InvalidGrant),
            None => Err(AuthError::Configuration(format!(
                "Token endpoint returned {}",
                status
            ))),
        }
    }
}
