//! Conversions between the upstream wire shape, the stored row and the
//! exposed DTOs.
//!
//! Everything here is pure. Absent optional fields become empty strings or
//! empty lists upstream of this module (see the `serde(default)` wire types).

use chrono::{DateTime, Utc};
use citadel_core::{Character, Error};

use crate::dto::{CharacterDto, EpisodeDto, LocationDto, PageInfoDto};
use crate::upstream::{PageInfo, WireCharacter, WireEpisode, WireLocation};

/// Flatten a wire character into a row, serializing its episode list.
pub fn to_row(wire: &WireCharacter, cached_at: DateTime<Utc>) -> Result<Character, Error> {
    let episodes_json = serde_json::to_string(&wire.episode)
        .map_err(|e| Error::CorruptRow(format!("character {}: {e}", wire.id)))?;

    Ok(Character {
        id: wire.id,
        name: wire.name.clone(),
        status: wire.status.clone(),
        species: wire.species.clone(),
        kind: wire.kind.clone(),
        gender: wire.gender.clone(),
        image: wire.image.clone(),
        url: wire.url.clone(),
        origin_name: wire.origin.name.clone(),
        origin_url: wire.origin.url.clone(),
        location_name: wire.location.name.clone(),
        location_url: wire.location.url.clone(),
        created: wire.created,
        episodes_json,
        cached_at,
    })
}

/// Rebuild the wire-equivalent character from a stored row.
///
/// An empty `episodes_json` is read as no episodes; anything else must be a
/// JSON array of strings.
pub fn from_row(row: &Character) -> Result<WireCharacter, Error> {
    let episode = if row.episodes_json.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&row.episodes_json)
            .map_err(|e| Error::CorruptRow(format!("character {}: episode list: {e}", row.id)))?
    };

    Ok(WireCharacter {
        id: row.id,
        name: row.name.clone(),
        status: row.status.clone(),
        species: row.species.clone(),
        kind: row.kind.clone(),
        gender: row.gender.clone(),
        origin: WireLocation { name: row.origin_name.clone(), url: row.origin_url.clone() },
        location: WireLocation { name: row.location_name.clone(), url: row.location_url.clone() },
        image: row.image.clone(),
        episode,
        url: row.url.clone(),
        created: row.created,
    })
}

impl From<&WireLocation> for LocationDto {
    fn from(location: &WireLocation) -> Self {
        Self { name: location.name.clone(), url: location.url.clone() }
    }
}

impl From<&WireCharacter> for CharacterDto {
    fn from(wire: &WireCharacter) -> Self {
        Self {
            id: wire.id,
            name: wire.name.clone(),
            status: wire.status.clone(),
            species: wire.species.clone(),
            kind: wire.kind.clone(),
            gender: wire.gender.clone(),
            image: wire.image.clone(),
            origin: LocationDto::from(&wire.origin),
            location: LocationDto::from(&wire.location),
        }
    }
}

impl From<&Character> for CharacterDto {
    fn from(row: &Character) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            status: row.status.clone(),
            species: row.species.clone(),
            kind: row.kind.clone(),
            gender: row.gender.clone(),
            image: row.image.clone(),
            origin: LocationDto { name: row.origin_name.clone(), url: row.origin_url.clone() },
            location: LocationDto { name: row.location_name.clone(), url: row.location_url.clone() },
        }
    }
}

impl From<WireEpisode> for EpisodeDto {
    fn from(episode: WireEpisode) -> Self {
        Self { id: episode.id, name: episode.name, air_date: episode.air_date, episode: episode.episode }
    }
}

impl From<&PageInfo> for PageInfoDto {
    fn from(info: &PageInfo) -> Self {
        Self {
            count: info.count,
            pages: info.pages,
            next: page_number(info.next.as_deref()),
            prev: page_number(info.prev.as_deref()),
        }
    }
}

/// Extract the `page` query parameter from a pagination link.
///
/// Absent or malformed links, and links without a numeric `page`, give `None`.
pub fn page_number(link: Option<&str>) -> Option<u32> {
    let parsed = url::Url::parse(link?).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

/// Parse the trailing numeric segment of an episode reference URL.
///
/// A single trailing slash is tolerated.
pub fn episode_id(reference: &str) -> Result<i64, Error> {
    reference
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
        .ok_or_else(|| Error::MalformedEpisodeRef(reference.to_string()))
}
