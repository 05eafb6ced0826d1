// ABOUTME: Distributor API integrations and search aggregation for Partsbin
// ABOUTME: One adapter per vendor behind a common trait, fanned out by the aggregator

pub mod aggregator;
pub mod error;
pub mod providers;
pub mod ratelimit;

// Re-export main types
pub use aggregator::SearchAggregator;
pub use error::{ProviderError, ProviderResult, SearchError};
pub use providers::{
    build_integrations, AliExpressApi, DigikeyApi, IntegrationApi, MouserApi, OctopartApi,
};
pub use ratelimit::RateGate;
