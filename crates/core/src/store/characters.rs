//! Character CRUD operations.
//!
//! Provides lookup, filtered listing, counting, and upsert of cached
//! characters. Rows are never deleted.

use super::connection::CharacterDb;
use crate::Error;
use chrono::{DateTime, Utc};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Row, ToSql};

const SELECT_COLUMNS: &str = "id, name, status, species, kind, gender, image, url,
    origin_name, origin_url, location_name, location_url,
    created, episodes_json, cached_at";

const UPSERT_SQL: &str = "INSERT INTO characters (
        id, name, status, species, kind, gender, image, url,
        origin_name, origin_url, location_name, location_url,
        created, episodes_json, cached_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
    ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        status = excluded.status,
        species = excluded.species,
        kind = excluded.kind,
        gender = excluded.gender,
        image = excluded.image,
        url = excluded.url,
        origin_name = excluded.origin_name,
        origin_url = excluded.origin_url,
        location_name = excluded.location_name,
        location_url = excluded.location_url,
        created = excluded.created,
        episodes_json = excluded.episodes_json,
        cached_at = excluded.cached_at";

/// A cached character row.
///
/// Origin and location are flattened into name/url column pairs and the
/// episode reference URLs are kept as a JSON array string.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    /// Upstream identifier; never generated locally.
    pub id: i64,
    pub name: String,
    pub status: String,
    pub species: String,
    /// Upstream `type` (the subtype, often empty).
    pub kind: String,
    pub gender: String,
    pub image: String,
    pub url: String,
    pub origin_name: String,
    pub origin_url: String,
    pub location_name: String,
    pub location_url: String,
    pub created: DateTime<Utc>,
    pub episodes_json: String,
    /// When the row was last written. Informational only.
    pub cached_at: DateTime<Utc>,
}

/// Optional filters for listing and counting characters.
///
/// Empty strings are treated the same as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterFilter {
    /// Substring match on the name.
    pub name: Option<String>,
    /// Exact match on the status.
    pub status: Option<String>,
    /// Exact match on the species.
    pub species: Option<String>,
}

impl CharacterFilter {
    /// Build the WHERE clause and its bound values.
    ///
    /// The name needle has `LIKE` wildcards escaped so it matches literally.
    /// SQLite's `LIKE` is case-insensitive for ASCII.
    fn where_clause(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if let Some(name) = non_empty(&self.name) {
            values.push(format!("%{}%", escape_like(name)));
            clauses.push(format!("name LIKE ?{} ESCAPE '\\'", values.len()));
        }
        if let Some(status) = non_empty(&self.status) {
            values.push(status.to_string());
            clauses.push(format!("status = ?{}", values.len()));
        }
        if let Some(species) = non_empty(&self.species) {
            values.push(species.to_string());
            clauses.push(format!("species = ?{}", values.len()));
        }

        if clauses.is_empty() { (String::new(), values) } else { (format!(" WHERE {}", clauses.join(" AND ")), values) }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

fn character_from_row(row: &Row<'_>) -> rusqlite::Result<Character> {
    Ok(Character {
        id: row.get(0)?,
        name: row.get(1)?,
        status: row.get(2)?,
        species: row.get(3)?,
        kind: row.get(4)?,
        gender: row.get(5)?,
        image: row.get(6)?,
        url: row.get(7)?,
        origin_name: row.get(8)?,
        origin_url: row.get(9)?,
        location_name: row.get(10)?,
        location_url: row.get(11)?,
        created: parse_timestamp(row, 12)?,
        episodes_json: row.get(13)?,
        cached_at: parse_timestamp(row, 14)?,
    })
}

fn upsert_row(conn: &rusqlite::Connection, character: &Character) -> rusqlite::Result<usize> {
    conn.execute(
        UPSERT_SQL,
        params![
            character.id,
            &character.name,
            &character.status,
            &character.species,
            &character.kind,
            &character.gender,
            &character.image,
            &character.url,
            &character.origin_name,
            &character.origin_url,
            &character.location_name,
            &character.location_url,
            character.created.to_rfc3339(),
            &character.episodes_json,
            character.cached_at.to_rfc3339(),
        ],
    )
}

impl CharacterDb {
    /// Get a character by its upstream identifier.
    ///
    /// Returns None if the id is not cached.
    pub async fn get_character(&self, id: i64) -> Result<Option<Character>, Error> {
        self.conn
            .call(move |conn| -> Result<Option<Character>, Error> {
                let mut stmt = conn.prepare(&format!("SELECT {SELECT_COLUMNS} FROM characters WHERE id = ?1"))?;

                match stmt.query_row(params![id], character_from_row) {
                    Ok(c) => Ok(Some(c)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List one page of characters matching the filter, ordered by id.
    ///
    /// `page` is 1-based; callers reject pages below 1 before reaching here.
    pub async fn list_characters(
        &self, page: u32, page_size: u32, filter: &CharacterFilter,
    ) -> Result<Vec<Character>, Error> {
        let (where_sql, values) = filter.where_clause();
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        let limit = i64::from(page_size);

        self.conn
            .call(move |conn| -> Result<Vec<Character>, Error> {
                let sql = format!(
                    "SELECT {SELECT_COLUMNS} FROM characters{where_sql} ORDER BY id ASC LIMIT ?{} OFFSET ?{}",
                    values.len() + 1,
                    values.len() + 2
                );
                let mut stmt = conn.prepare(&sql)?;

                let mut bound: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
                bound.push(&limit);
                bound.push(&offset);

                let rows = stmt.query_map(bound.as_slice(), character_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }

    /// Count characters matching the filter, ignoring pagination.
    pub async fn count_characters(&self, filter: &CharacterFilter) -> Result<u64, Error> {
        let (where_sql, values) = filter.where_clause();

        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let sql = format!("SELECT COUNT(*) FROM characters{where_sql}");
                let bound: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
                let count: i64 = conn.query_row(&sql, bound.as_slice(), |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or update a single character.
    ///
    /// Uses UPSERT semantics: inserts if the id doesn't exist,
    /// overwrites all fields if it does.
    pub async fn upsert_character(&self, character: &Character) -> Result<(), Error> {
        let character = character.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                upsert_row(conn, &character)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or update a batch of characters in one transaction.
    ///
    /// Either every row is written or none is. Returns the number of rows
    /// written.
    pub async fn upsert_characters(&self, characters: &[Character]) -> Result<usize, Error> {
        if characters.is_empty() {
            return Ok(0);
        }

        let characters = characters.to_vec();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                for character in &characters {
                    upsert_row(&tx, character)?;
                }
                tx.commit()?;
                Ok(characters.len())
            })
            .await
            .map_err(Error::from)
    }
}
