//! Upstream request types and validation.

use serde::Serialize;

use super::UpstreamError;

/// Query parameters for the upstream character listing.
///
/// Only non-empty filters are serialized into the query string.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CharacterQuery {
    /// 1-based page number.
    pub page: u32,

    /// Name substring filter.
    #[serde(skip_serializing_if = "is_blank")]
    pub name: Option<String>,

    /// Status filter: alive, dead or unknown.
    #[serde(skip_serializing_if = "is_blank")]
    pub status: Option<String>,

    /// Species filter.
    #[serde(skip_serializing_if = "is_blank")]
    pub species: Option<String>,
}

impl Default for CharacterQuery {
    fn default() -> Self {
        Self { page: 1, name: None, status: None, species: None }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

impl CharacterQuery {
    /// Validate the query parameters.
    pub fn validate(&self) -> Result<(), UpstreamError> {
        if self.page == 0 {
            return Err(UpstreamError::InvalidRequest("page must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// Path segment for a bulk episode lookup: `1,2,3`.
pub fn episode_path(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",")
}
