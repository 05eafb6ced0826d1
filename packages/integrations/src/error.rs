// ABOUTME: Error types for vendor integrations and search aggregation
// ABOUTME: Adapter errors become per-vendor result entries, never hard failures

use thiserror::Error;

use partsbin_auth::AuthError;
use partsbin_core::{FailureKind, VendorFailure};

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Error, Debug)]
pub enum ProviderError {
    /// The vendor needs (re-)authorization before it can be queried
    #[error("Vendor authorization required")]
    AuthRequired,

    /// The vendor signaled throttling; back off rather than retry immediately
    #[error("Vendor rate limit exceeded")]
    RateLimited,

    /// The vendor did not answer within the request or search budget
    #[error("Vendor request timed out")]
    Timeout,

    /// The vendor answered with a payload we could not parse
    #[error("Unparseable vendor response: {0}")]
    Malformed(String),

    /// Transport-level failure reaching the vendor
    #[error("Network error reaching vendor: {0}")]
    Network(String),
}

impl ProviderError {
    /// The caller-visible failure category
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::AuthRequired => FailureKind::AuthRequired,
            Self::RateLimited => FailureKind::RateLimited,
            Self::Timeout => FailureKind::Timeout,
            Self::Malformed(_) => FailureKind::Malformed,
            Self::Network(_) => FailureKind::Network,
        }
    }

    /// Map a transport error, keeping timeouts distinct from other failures
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(error.to_string())
        }
    }
}

// Coordinator failures surface through the adapter's auth-resolution step
impl From<AuthError> for ProviderError {
    fn from(_: AuthError) -> Self {
        Self::AuthRequired
    }
}

#[derive(Error, Debug)]
pub enum SearchError {
    /// Every vendor failed and none of the failures was vendor-side
    /// backpressure; a systemic client-side fault
    #[error("All vendors failed; no results available")]
    AllProvidersFailed { failures: Vec<VendorFailure> },
}
