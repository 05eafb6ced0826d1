// ABOUTME: Single-flight credential refresh coordination per (user, vendor) key
// ABOUTME: Concurrent callers share one in-flight refresh instead of racing the vendor

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use partsbin_core::{OAuth2Credentials, ProviderConfig, VendorId};

use crate::credential::Credential;
use crate::error::{AuthError, AuthResult};
use crate::oauth::OAuth2Client;
use crate::store::CredentialStore;

const REFRESH_MARGIN_SECS: i64 = 60;

type FlightKey = (String, VendorId);

/// Coordinates OAuth2 token refreshes across concurrent searches
///
/// For a given (user, vendor) pair at most one refresh call is in flight at
/// any time; late arrivals await the guard, re-read the store, and reuse the
/// committed result rather than issuing a redundant refresh to the vendor.
pub struct CredentialRefreshCoordinator {
    store: Arc<dyn CredentialStore>,
    oauth: OAuth2Client,
    margin: Duration,
    flights: Mutex<HashMap<FlightKey, Arc<Mutex<()>>>>,
}

impl CredentialRefreshCoordinator {
    pub fn new(store: Arc<dyn CredentialStore>) -> AuthResult<Self> {
        Ok(Self {
            store,
            oauth: OAuth2Client::new()?,
            margin: Duration::seconds(REFRESH_MARGIN_SECS),
            flights: Mutex::new(HashMap::new()),
        })
    }

    /// Complete the authorization-code leg and commit the first credential
    pub async fn store_authorized(
        &self,
        user_id: &str,
        config: &ProviderConfig,
        auth_code: &str,
    ) -> AuthResult<Credential> {
        let oauth = oauth2_credentials(config)?;
        info!("Exchanging authorization code for {}", config.vendor);
        let grant = self.oauth.exchange_code(oauth, auth_code).await?;
        let credential = Credential::from_grant(user_id, config.vendor, grant);
        self.store.put(&credential).await?;
        info!("Authorized {} for user {}", config.vendor, user_id);
        Ok(credential)
    }

    /// Get an access token that is valid for at least the safety margin
    ///
    /// Refreshes silently when the stored token is expiring; fails with
    /// `NotAuthorized` when no credential exists or the grant is dead.
    pub async fn get_valid_token(
        &self,
        user_id: &str,
        config: &ProviderConfig,
    ) -> AuthResult<String> {
        let oauth = oauth2_credentials(config)?;

        // Fast path: a fresh credential needs no coordination
        let credential = self
            .store
            .get(user_id, config.vendor)
            .await?
            .ok_or(AuthError::NotAuthorized)?;
        if credential.is_fresh(self.margin) {
            return Ok(credential.access_token);
        }

        let guard = self.flight_guard(user_id, config.vendor).await;
        let _flight = guard.lock().await;

        // Re-read under the guard: another flight may have committed already
        let credential = self
            .store
            .get(user_id, config.vendor)
            .await?
            .ok_or(AuthError::NotAuthorized)?;
        if credential.is_fresh(self.margin) {
            debug!(
                "Reusing token refreshed by a concurrent flight for {}",
                config.vendor
            );
            return Ok(credential.access_token);
        }

        self.refresh_locked(user_id, oauth, config.vendor, credential)
            .await
    }

    /// Forced refresh after a vendor rejected the given token with a 401
    ///
    /// Under the same single-flight guard: if the stored token no longer
    /// matches the rejected one, another flight already rotated it and the
    /// stored token is returned without a vendor call.
    pub async fn refresh_after_rejection(
        &self,
        user_id: &str,
        config: &ProviderConfig,
        rejected_token: &str,
    ) -> AuthResult<String> {
        let oauth = oauth2_credentials(config)?;

        let guard = self.flight_guard(user_id, config.vendor).await;
        let _flight = guard.lock().await;

        let credential = self
            .store
            .get(user_id, config.vendor)
            .await?
            .ok_or(AuthError::NotAuthorized)?;
        if credential.access_token != rejected_token {
            debug!(
                "Token already rotated since rejection for {}",
                config.vendor
            );
            return Ok(credential.access_token);
        }

        self.refresh_locked(user_id, oauth, config.vendor, credential)
            .await
    }

    /// Delete the stored credential when the user disconnects the vendor
    pub async fn disconnect(&self, user_id: &str, vendor: VendorId) -> AuthResult<()> {
        info!("Disconnecting {} for user {}", vendor, user_id);
        self.store.delete(user_id, vendor).await
    }

    async fn refresh_locked(
        &self,
        user_id: &str,
        oauth: &OAuth2Credentials,
        vendor: VendorId,
        credential: Credential,
    ) -> AuthResult<String> {
        let refresh_token = credential
            .refresh_token
            .clone()
            .ok_or(AuthError::NotAuthorized)?;

        info!("Refreshing {} token for user {}", vendor, user_id);
        match self.oauth.refresh(oauth, &refresh_token).await {
            Ok(grant) => {
                let updated = Credential {
                    id: credential.id,
                    user_id: credential.user_id,
                    vendor,
                    access_token: grant.access_token.clone(),
                    // Vendors may omit the refresh token on rotation; keep the old one
                    refresh_token: grant.refresh_token.or(Some(refresh_token)),
                    expires_at: grant.expires_at,
                    scope: grant.scope.or(credential.scope),
                };
                self.store.put(&updated).await?;
                Ok(grant.access_token)
            }
            Err(AuthError::InvalidGrant) => {
                // Dead grant: full re-authorization is required
                warn!("Refresh token for {} is revoked; clearing credential", vendor);
                self.store.delete(user_id, vendor).await?;
                Err(AuthError::NotAuthorized)
            }
            Err(AuthError::Transient(reason)) => {
                // Keep the expired credential so a later call can retry
                warn!("Transient refresh failure for {}: {}", vendor, reason);
                Err(AuthError::RefreshFailed(reason))
            }
            Err(e) => Err(e),
        }
    }

    async fn flight_guard(&self, user_id: &str, vendor: VendorId) -> Arc<Mutex<()>> {
        let mut flights = self.flights.lock().await;
        flights
            .entry((user_id.to_string(), vendor))
            .or_default()
            .clone()
    }
}

fn oauth2_credentials(config: &ProviderConfig) -> AuthResult<&OAuth2Credentials> {
    config.oauth2().ok_or_else(|| {
        AuthError::Configuration(format!(
            "Vendor {} is not configured for OAuth2",
            config.vendor
        ))
    })
}
