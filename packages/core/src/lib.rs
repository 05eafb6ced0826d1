// ABOUTME: Core domain types for Partsbin part search and vendor integrations
// ABOUTME: Foundational package shared by the auth and integrations packages

pub mod config;
pub mod part;
pub mod query;
pub mod search;
pub mod vendor;

// Re-export main types
pub use config::{OAuth2Credentials, ProviderConfig, ProviderCredentials};
pub use part::PartRecord;
pub use query::{PartSearchQuery, SearchTerm};
pub use search::{AggregatedResult, FailureKind, VendorFailure};
pub use vendor::VendorId;
