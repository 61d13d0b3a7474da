//! Client code for citadel.
//!
//! This crate provides the upstream API client, the mapping between wire,
//! stored and exposed shapes, and the read-through service that ties them
//! to the character store.

pub mod dto;
pub mod mapping;
pub mod service;
pub mod upstream;

pub use dto::{CharacterDetailDto, CharacterDto, EpisodeDto, LocationDto, Page, PageInfoDto};
pub use service::{CharacterService, CharacterSource};
pub use upstream::{CharacterQuery, UpstreamClient, UpstreamConfig, UpstreamError};
