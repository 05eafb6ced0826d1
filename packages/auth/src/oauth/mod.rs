// ABOUTME: OAuth2 token endpoint client and wire types
// ABOUTME: Implements the standard authorization-code and refresh-token grants

pub mod client;
pub mod types;

pub use client::OAuth2Client;
pub use types::TokenGrant;
