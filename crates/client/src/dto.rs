//! Externally exposed shapes returned by [`crate::CharacterService`].

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Name/URL pair for an origin or current location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LocationDto {
    pub name: String,
    pub url: String,
}

/// Character summary as returned by listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CharacterDto {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub species: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub gender: String,
    pub image: String,
    pub origin: LocationDto,
    pub location: LocationDto,
}

/// Character with freshly fetched episode details.
///
/// Embeds the summary fields; they are flattened when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CharacterDetailDto {
    #[serde(flatten)]
    pub character: CharacterDto,
    pub episodes: Vec<EpisodeDto>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EpisodeDto {
    pub id: i64,
    pub name: String,
    pub air_date: String,
    /// Episode code, e.g. `S01E01`.
    pub episode: String,
}

/// Page descriptor with page numbers instead of links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PageInfoDto {
    pub count: u64,
    pub pages: u32,
    pub next: Option<u32>,
    pub prev: Option<u32>,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Page<T> {
    pub info: PageInfoDto,
    pub results: Vec<T>,
}
