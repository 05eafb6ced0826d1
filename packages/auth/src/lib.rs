// ABOUTME: Partsbin credential library managing OAuth2 tokens for vendor integrations
// ABOUTME: Provides token exchange, pluggable storage, and single-flight refresh coordination

pub mod coordinator;
pub mod credential;
pub mod error;
pub mod oauth;
pub mod store;

// Re-export main types
pub use coordinator::CredentialRefreshCoordinator;
pub use credential::Credential;
pub use error::{AuthError, AuthResult};
pub use oauth::{OAuth2Client, TokenGrant};
pub use store::{CredentialStore, MemoryCredentialStore};
