//! MCP tool implementations.
//!
//! This module contains all tools exposed by the citadel server.

pub mod characters;
