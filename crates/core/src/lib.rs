//! Core types and shared functionality for citadel.
//!
//! This crate provides:
//! - Character store with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use store::{Character, CharacterDb, CharacterFilter};
