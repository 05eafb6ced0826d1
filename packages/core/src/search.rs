// ABOUTME: Aggregate search result types returned to the API surface
// ABOUTME: Carries whatever parts were found plus a visible per-vendor status

use serde::{Deserialize, Serialize};

use crate::part::PartRecord;
use crate::query::PartSearchQuery;
use crate::vendor::VendorId;

/// Category of a per-vendor failure, visible to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Vendor needs (re-)authorization before it can be queried
    AuthRequired,
    /// Vendor signaled throttling; back off rather than retry immediately
    RateLimited,
    /// Vendor did not answer within the search budget
    Timeout,
    /// Vendor answered with an unparseable payload
    Malformed,
    /// Transport-level failure reaching the vendor
    Network,
}

impl FailureKind {
    /// Failures caused by vendor-side pressure rather than a client fault.
    /// These never turn a partial result into a hard aggregate failure.
    pub fn is_backpressure(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Timeout)
    }
}

/// One vendor's failure entry in an aggregate result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorFailure {
    pub vendor: VendorId,
    pub kind: FailureKind,
}

/// The composite outcome of fanning one search out to all enabled vendors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// The search this result answers
    pub query: PartSearchQuery,
    /// Ranked part listings; one entry per vendor listing, never merged
    pub parts: Vec<PartRecord>,
    /// Vendors that could not contribute, and why
    pub failures: Vec<VendorFailure>,
}

impl AggregatedResult {
    pub fn failed_vendors(&self) -> Vec<VendorId> {
        self.failures.iter().map(|f| f.vendor).collect()
    }
}
