// ABOUTME: Request and response shapes for OAuth2 token endpoints
// ABOUTME: Wire structs are form-encoded; TokenGrant is the parsed domain result

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Authorization-code exchange request body
#[derive(Debug, Serialize)]
pub struct TokenExchangeRequest {
    pub grant_type: String,
    pub code: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

/// Refresh-token exchange request body
#[derive(Debug, Serialize)]
pub struct RefreshTokenRequest {
    pub grant_type: String,
    pub refresh_token: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

/// Successful token endpoint response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Seconds until expiry
    pub expires_in: i64,
    #[allow(dead_code)]
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

/// Error body returned by token endpoints on 4xx responses
#[derive(Debug, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

/// The outcome of a successful grant exchange
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub scope: Option<String>,
}

impl From<TokenResponse> for TokenGrant {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
            scope: response.scope,
        }
    }
}
