//! Character tools.
//!
//! Thin adapters from tool parameters to [`CharacterService`] calls; results
//! are returned as pretty-printed JSON text.

use citadel_client::{CharacterService, CharacterSource};
use citadel_core::{CharacterFilter, Error};
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for get_characters.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetCharactersParams {
    /// Page number, starting at 1 (default 1).
    #[serde(default = "default_page")]
    pub page: i64,

    /// Filter by name (substring).
    #[serde(default)]
    pub name: Option<String>,

    /// Filter by status: alive, dead or unknown.
    #[serde(default)]
    pub status: Option<String>,

    /// Filter by species.
    #[serde(default)]
    pub species: Option<String>,
}

/// Input parameters for get_character.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetCharacterParams {
    /// Character id (>= 1).
    pub id: i64,
}

/// Input parameters for list_cached_characters.
pub type ListCachedParams = GetCharactersParams;

fn default_page() -> i64 {
    1
}

impl GetCharactersParams {
    fn filter(&self) -> CharacterFilter {
        CharacterFilter { name: self.name.clone(), status: self.status.clone(), species: self.species.clone() }
    }
}

fn to_json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| Error::InvalidInput(format!("failed to serialize response: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the get_characters tool.
pub async fn get_characters_impl<S: CharacterSource>(
    service: &CharacterService<S>, params: GetCharactersParams,
) -> Result<CallToolResult, McpError> {
    let page = service.get_characters(params.page, &params.filter()).await?;
    to_json_result(&page)
}

/// Implementation of the get_character tool.
pub async fn get_character_impl<S: CharacterSource>(
    service: &CharacterService<S>, params: GetCharacterParams,
) -> Result<CallToolResult, McpError> {
    let detail = service
        .get_character(params.id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("character with id {} not found", params.id)))?;
    to_json_result(&detail)
}

/// Implementation of the list_cached_characters tool.
pub async fn list_cached_impl<S: CharacterSource>(
    service: &CharacterService<S>, params: ListCachedParams,
) -> Result<CallToolResult, McpError> {
    let page = service.list_cached(params.page, &params.filter()).await?;
    to_json_result(&page)
}
