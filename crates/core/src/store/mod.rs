//! SQLite-backed store for characters fetched from upstream.
//!
//! This module provides a persistent character table using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Lookup by upstream identifier
//! - Filtered, paginated scans ordered by identifier
//! - Upsert of single rows and atomic batches
//! - Automatic schema migrations

pub mod characters;
pub mod connection;
pub mod migrations;

pub use crate::Error;

pub use characters::{Character, CharacterFilter};
pub use connection::CharacterDb;
