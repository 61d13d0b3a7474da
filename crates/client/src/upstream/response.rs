//! Upstream response types (the wire shape).

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::UpstreamError;

/// Paginated response envelope from the upstream API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiPage<T> {
    #[serde(default)]
    pub info: PageInfo,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> ApiPage<T> {
    /// Page returned when upstream answers with a non-success status.
    pub fn empty() -> Self {
        Self { info: PageInfo::default(), results: Vec::new() }
    }
}

/// Pagination metadata; `next`/`prev` are full URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageInfo {
    pub count: u64,
    pub pages: u32,
    pub next: Option<String>,
    pub prev: Option<String>,
}

/// Character as returned by upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireCharacter {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub species: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub gender: String,
    pub origin: WireLocation,
    pub location: WireLocation,
    pub image: String,
    /// Episode reference URLs, in upstream order.
    pub episode: Vec<String>,
    pub url: String,
    pub created: DateTime<Utc>,
}

/// Name/URL pair used for both origin and current location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireLocation {
    pub name: String,
    pub url: String,
}

/// Episode as returned by upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireEpisode {
    pub id: i64,
    pub name: String,
    #[serde(alias = "airdate")]
    pub air_date: String,
    /// Episode code, e.g. `S01E01`.
    pub episode: String,
    pub characters: Vec<String>,
    pub url: String,
    pub created: Option<DateTime<Utc>>,
}

/// Decode an episode lookup body.
///
/// Upstream answers a single-id request with a bare object and a multi-id
/// request with an array; both come back as a list.
pub fn decode_episodes(body: &[u8], requested: usize) -> Result<Vec<WireEpisode>, UpstreamError> {
    if requested == 1 {
        let episode: WireEpisode = decode(body)?;
        Ok(vec![episode])
    } else {
        decode(body)
    }
}

/// Decode an upstream body, matching property names case-insensitively.
///
/// Object keys are lowercased before deserializing, so `Name`, `NAME` and
/// `name` all land on the same field.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, UpstreamError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| UpstreamError::Parse(e.to_string()))?;
    serde_json::from_value(lowercase_keys(value)).map_err(|e| UpstreamError::Parse(e.to_string()))
}

fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key.to_lowercase(), lowercase_keys(value)))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}
