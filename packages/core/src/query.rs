// ABOUTME: Search query types carried through the aggregation pipeline
// ABOUTME: Request-scoped; user identity is threaded explicitly, never ambient

use serde::{Deserialize, Serialize};

/// What the user is searching for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTerm {
    /// Free-text keyword search
    Keyword(String),
    /// Exact part number lookup
    PartNumber(String),
}

impl SearchTerm {
    /// The raw text of the term regardless of kind
    pub fn text(&self) -> &str {
        match self {
            Self::Keyword(s) | Self::PartNumber(s) => s,
        }
    }

    pub fn is_part_number(&self) -> bool {
        matches!(self, Self::PartNumber(_))
    }
}

/// A single incoming part search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSearchQuery {
    pub term: SearchTerm,
    pub result_limit: usize,
    /// Identity of the requesting user, used to resolve per-user vendor credentials
    pub user_id: String,
}

impl PartSearchQuery {
    pub fn keyword(keyword: impl Into<String>, result_limit: usize, user_id: impl Into<String>) -> Self {
        Self {
            term: SearchTerm::Keyword(keyword.into()),
            result_limit,
            user_id: user_id.into(),
        }
    }

    pub fn part_number(part_number: impl Into<String>, result_limit: usize, user_id: impl Into<String>) -> Self {
        Self {
            term: SearchTerm::PartNumber(part_number.into()),
            result_limit,
            user_id: user_id.into(),
        }
    }
}
