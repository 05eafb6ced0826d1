// ABOUTME: Stored OAuth2 credential for one (user, vendor) pair
// ABOUTME: The only entity whose state outlives a single search request

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use partsbin_core::VendorId;

use crate::oauth::TokenGrant;

/// A stored OAuth2 credential
///
/// One live credential exists per (user_id, vendor); `expires_at` always
/// reflects the token actually stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    pub user_id: String,
    pub vendor: VendorId,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub scope: Option<String>,
}

impl Credential {
    /// Create the first credential for a user from a fresh grant
    pub fn from_grant(user_id: &str, vendor: VendorId, grant: TokenGrant) -> Self {
        Self {
            id: nanoid::nanoid!(),
            user_id: user_id.to_string(),
            vendor,
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: grant.expires_at,
            scope: grant.scope,
        }
    }

    /// Whether the access token is still usable given a safety margin
    pub fn is_fresh(&self, margin: Duration) -> bool {
        self.expires_at > Utc::now() + margin
    }
}
