// ABOUTME: Error types for credential storage and OAuth2 token lifecycle
// ABOUTME: Separates revoked-grant failures from transient ones so callers can pick a retry policy

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    /// No usable credential exists; the user must run the authorization flow again
    #[error("Not authorized; vendor authorization required")]
    NotAuthorized,

    /// The vendor rejected the grant (revoked or expired refresh token)
    #[error("OAuth2 grant is invalid or revoked")]
    InvalidGrant,

    /// A refresh attempt failed for a retryable reason; the stored credential was kept
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// Network failure or vendor 5xx; safe to retry
    #[error("Transient token endpoint failure: {0}")]
    Transient(String),

    #[error("Credential storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}
