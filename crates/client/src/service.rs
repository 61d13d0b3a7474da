//! Read-through orchestration between upstream and the character store.
//!
//! - Listings are write-through: upstream is always queried and every
//!   returned character is upserted before the page is returned.
//! - Detail lookups are read-through: a stored row is served as-is and never
//!   refreshed; a miss is fetched from upstream and stored.
//! - Episodes are never stored; they are fetched for every detail lookup.

use async_trait::async_trait;
use chrono::Utc;
use citadel_core::{CharacterDb, CharacterFilter, Error};

use crate::dto::{CharacterDetailDto, CharacterDto, EpisodeDto, Page, PageInfoDto};
use crate::mapping;
use crate::upstream::{ApiPage, CharacterQuery, UpstreamError, WireCharacter, WireEpisode};

/// Source of upstream character data.
#[async_trait]
pub trait CharacterSource: Send + Sync {
    /// Fetch one page of characters; a failed status yields an empty page.
    async fn list_characters(&self, query: &CharacterQuery) -> Result<ApiPage<WireCharacter>, UpstreamError>;

    /// Fetch one character; a failed status yields `None`.
    async fn get_character(&self, id: i64) -> Result<Option<WireCharacter>, UpstreamError>;

    /// Fetch episodes by id; an empty id list must not hit the network.
    async fn get_episodes(&self, ids: &[i64]) -> Result<Vec<WireEpisode>, UpstreamError>;
}

/// Character lookups backed by an upstream source and the local store.
pub struct CharacterService<S> {
    source: S,
    db: CharacterDb,
    page_size: u32,
}

fn validate_page(page: i64) -> Result<u32, Error> {
    if page < 1 {
        return Err(Error::InvalidInput("page number must be greater than 0".into()));
    }
    u32::try_from(page).map_err(|_| Error::InvalidInput(format!("page number too large: {page}")))
}

impl<S: CharacterSource> CharacterService<S> {
    /// `page_size` only applies to [`Self::list_cached`]; upstream picks its own.
    pub fn new(source: S, db: CharacterDb, page_size: u32) -> Self {
        Self { source, db, page_size: page_size.max(1) }
    }

    /// Fetch a filtered page from upstream and store every character on it.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `page < 1`
    /// - `NotFound` if the page has no results, including when upstream
    ///   answered with a failure status
    /// - `Upstream` / store errors otherwise
    pub async fn get_characters(&self, page: i64, filter: &CharacterFilter) -> Result<Page<CharacterDto>, Error> {
        let page = validate_page(page)?;
        let query = CharacterQuery {
            page,
            name: filter.name.clone(),
            status: filter.status.clone(),
            species: filter.species.clone(),
        };

        let upstream = self.source.list_characters(&query).await.map_err(|e| {
            tracing::error!(error = %e, page, "error getting characters");
            Error::from(e)
        })?;

        let cached_at = Utc::now();
        let rows = upstream
            .results
            .iter()
            .map(|wire| mapping::to_row(wire, cached_at))
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| {
                tracing::error!(error = %e, page, "failed to map upstream character page");
            })?;
        let written = self.db.upsert_characters(&rows).await.inspect_err(|e| {
            tracing::error!(error = %e, page, "failed to store character page");
        })?;
        tracing::debug!(page, written, "stored upstream character page");

        if upstream.results.is_empty() {
            tracing::info!(page, "no characters found");
            return Err(Error::NotFound("no characters found".into()));
        }

        Ok(Page {
            info: PageInfoDto::from(&upstream.info),
            results: upstream.results.iter().map(CharacterDto::from).collect(),
        })
    }

    /// Look up one character with its episodes.
    ///
    /// Returns `Ok(None)` when the id is neither stored nor known upstream.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `id < 1`
    /// - `MalformedEpisodeRef` if any episode reference lacks a numeric id;
    ///   the whole lookup is aborted
    /// - `Upstream` if upstream answers with a different character id
    /// - `Upstream` / store errors otherwise
    pub async fn get_character(&self, id: i64) -> Result<Option<CharacterDetailDto>, Error> {
        if id < 1 {
            return Err(Error::InvalidInput("invalid character id".into()));
        }

        self.resolve_character(id).await.inspect_err(|e| {
            tracing::error!(error = %e, id, "error getting character");
        })
    }

    async fn resolve_character(&self, id: i64) -> Result<Option<CharacterDetailDto>, Error> {
        let character = match self.db.get_character(id).await? {
            Some(row) => {
                tracing::info!(id, "character found in store");
                mapping::from_row(&row)?
            }
            None => {
                tracing::info!(id, "character not in store, fetching from upstream");
                let Some(wire) = self.source.get_character(id).await? else {
                    return Ok(None);
                };
                if wire.id != id {
                    return Err(Error::Upstream(format!("requested character {id}, upstream returned {}", wire.id)));
                }
                self.db.upsert_character(&mapping::to_row(&wire, Utc::now())?).await?;
                wire
            }
        };

        let episode_ids = character
            .episode
            .iter()
            .map(|reference| mapping::episode_id(reference))
            .collect::<Result<Vec<_>, _>>()?;

        let episodes = self.source.get_episodes(&episode_ids).await?;

        Ok(Some(CharacterDetailDto {
            character: CharacterDto::from(&character),
            episodes: episodes.into_iter().map(EpisodeDto::from).collect(),
            created: character.created,
        }))
    }

    /// Serve a filtered page straight from the store without calling upstream.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `page < 1`
    /// - `NotFound` if the page is empty
    pub async fn list_cached(&self, page: i64, filter: &CharacterFilter) -> Result<Page<CharacterDto>, Error> {
        let page = validate_page(page)?;

        let count = self.db.count_characters(filter).await.inspect_err(|e| {
            tracing::error!(error = %e, page, "failed to count cached characters");
        })?;
        let rows = self.db.list_characters(page, self.page_size, filter).await.inspect_err(|e| {
            tracing::error!(error = %e, page, "failed to list cached characters");
        })?;

        if rows.is_empty() {
            tracing::info!(page, count, "no cached characters found");
            return Err(Error::NotFound("no cached characters found".into()));
        }

        let pages = u32::try_from(count.div_ceil(u64::from(self.page_size))).unwrap_or(u32::MAX);
        let info = PageInfoDto {
            count,
            pages,
            next: (page < pages).then(|| page + 1),
            prev: (page > 1).then(|| page - 1),
        };

        Ok(Page { info, results: rows.iter().map(CharacterDto::from).collect() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::PageInfo;
    use crate::upstream::response::fixtures::{EPISODES_JSON, RICK_JSON};
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// In-memory upstream that records every call.
    #[derive(Default)]
    struct FakeSource {
        characters: HashMap<i64, WireCharacter>,
        episodes: Vec<WireEpisode>,
        list_calls: Mutex<Vec<CharacterQuery>>,
        character_calls: Mutex<Vec<i64>>,
        episode_calls: Mutex<Vec<Vec<i64>>>,
        fail_list: bool,
        /// Returned for every single-character lookup when set.
        answer_with: Option<WireCharacter>,
    }

    impl FakeSource {
        fn with(characters: Vec<WireCharacter>) -> Self {
            let episodes = serde_json::from_str(EPISODES_JSON).unwrap();
            Self { characters: characters.into_iter().map(|c| (c.id, c)).collect(), episodes, ..Default::default() }
        }

        fn character_calls(&self) -> Vec<i64> {
            self.character_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CharacterSource for FakeSource {
        async fn list_characters(&self, query: &CharacterQuery) -> Result<ApiPage<WireCharacter>, UpstreamError> {
            self.list_calls.lock().unwrap().push(query.clone());
            if self.fail_list {
                return Ok(ApiPage::empty());
            }

            let mut results: Vec<WireCharacter> = self
                .characters
                .values()
                .filter(|c| query.name.as_deref().is_none_or(|n| c.name.contains(n)))
                .filter(|c| query.status.as_deref().is_none_or(|s| c.status == s))
                .filter(|c| query.species.as_deref().is_none_or(|s| c.species == s))
                .cloned()
                .collect();
            results.sort_by_key(|c| c.id);

            Ok(ApiPage {
                info: PageInfo {
                    count: results.len() as u64,
                    pages: 1,
                    next: None,
                    prev: Some("https://rickandmortyapi.com/api/character?page=1".into()),
                },
                results,
            })
        }

        async fn get_character(&self, id: i64) -> Result<Option<WireCharacter>, UpstreamError> {
            self.character_calls.lock().unwrap().push(id);
            if let Some(stray) = &self.answer_with {
                return Ok(Some(stray.clone()));
            }
            Ok(self.characters.get(&id).cloned())
        }

        async fn get_episodes(&self, ids: &[i64]) -> Result<Vec<WireEpisode>, UpstreamError> {
            self.episode_calls.lock().unwrap().push(ids.to_vec());
            Ok(self.episodes.iter().filter(|e| ids.contains(&e.id)).cloned().collect())
        }
    }

    fn rick() -> WireCharacter {
        serde_json::from_str(RICK_JSON).unwrap()
    }

    fn morty() -> WireCharacter {
        WireCharacter {
            id: 2,
            name: "Morty Smith".into(),
            status: "Alive".into(),
            species: "Human".into(),
            episode: vec!["https://rickandmortyapi.com/api/episode/2".into()],
            ..rick()
        }
    }

    fn birdperson() -> WireCharacter {
        WireCharacter { id: 47, name: "Birdperson".into(), status: "Dead".into(), species: "Bird-Person".into(), ..rick() }
    }

    async fn service(source: FakeSource) -> CharacterService<FakeSource> {
        let db = CharacterDb::open_in_memory().await.unwrap();
        CharacterService::new(source, db, 20)
    }

    #[tokio::test]
    async fn test_detail_miss_fetches_and_stores_once() {
        let svc = service(FakeSource::with(vec![rick()])).await;

        let detail = svc.get_character(1).await.unwrap().unwrap();
        assert_eq!(detail.character.name, "Rick Sanchez");
        assert_eq!(detail.episodes.len(), 2);
        assert_eq!(detail.episodes[0].air_date, "December 2, 2013");
        assert_eq!(svc.source.character_calls(), vec![1]);

        let stored = svc.db.get_character(1).await.unwrap().unwrap();
        assert_eq!(stored.name, "Rick Sanchez");
        assert_eq!(svc.db.count_characters(&CharacterFilter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_detail_hit_skips_upstream_character_call() {
        let svc = service(FakeSource::default()).await;
        svc.db.upsert_character(&mapping::to_row(&rick(), Utc::now()).unwrap()).await.unwrap();

        let detail = svc.get_character(1).await.unwrap().unwrap();
        assert_eq!(detail.character.id, 1);
        assert!(svc.source.character_calls().is_empty());
        assert_eq!(*svc.source.episode_calls.lock().unwrap(), vec![vec![1, 2]]);
    }

    #[tokio::test]
    async fn test_detail_round_trip_matches_upstream() {
        let svc = service(FakeSource::with(vec![rick()])).await;

        let fresh = svc.get_character(1).await.unwrap().unwrap();
        let cached = svc.get_character(1).await.unwrap().unwrap();

        assert_eq!(fresh, cached);
        assert_eq!(cached.character.origin.name, "Earth (C-137)");
        assert_eq!(cached.character.location.name, "Citadel of Ricks");
        assert_eq!(svc.source.character_calls(), vec![1]);
        assert_eq!(svc.source.episode_calls.lock().unwrap().len(), 2);

        let row = svc.db.get_character(1).await.unwrap().unwrap();
        assert_eq!(mapping::from_row(&row).unwrap().episode, rick().episode);
    }

    #[tokio::test]
    async fn test_detail_not_found_upstream_does_not_store() {
        let svc = service(FakeSource::with(vec![rick()])).await;

        let detail = svc.get_character(999_999).await.unwrap();
        assert!(detail.is_none());
        assert_eq!(svc.db.count_characters(&CharacterFilter::default()).await.unwrap(), 0);
        assert!(svc.source.episode_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detail_id_mismatch_is_upstream_error() {
        let zeroed = WireCharacter { id: 0, name: String::new(), ..rick() };
        let source = FakeSource { answer_with: Some(zeroed), ..FakeSource::default() };
        let svc = service(source).await;

        let result = svc.get_character(7).await;
        assert!(matches!(result, Err(Error::Upstream(_))));
        assert_eq!(svc.db.count_characters(&CharacterFilter::default()).await.unwrap(), 0);
        assert!(svc.source.episode_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detail_invalid_id() {
        let svc = service(FakeSource::with(vec![rick()])).await;
        assert!(matches!(svc.get_character(0).await, Err(Error::InvalidInput(_))));
        assert!(matches!(svc.get_character(-5).await, Err(Error::InvalidInput(_))));
        assert!(svc.source.character_calls().is_empty());
    }

    #[tokio::test]
    async fn test_detail_malformed_episode_ref_aborts() {
        let broken = WireCharacter { episode: vec!["https://rickandmortyapi.com/api/episode/oops".into()], ..rick() };
        let svc = service(FakeSource::with(vec![broken])).await;

        let result = svc.get_character(1).await;
        assert!(matches!(result, Err(Error::MalformedEpisodeRef(_))));
        assert!(svc.source.episode_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detail_without_episodes() {
        let lonely = WireCharacter { episode: Vec::new(), ..rick() };
        let svc = service(FakeSource::with(vec![lonely])).await;

        let detail = svc.get_character(1).await.unwrap().unwrap();
        assert!(detail.episodes.is_empty());
    }

    #[tokio::test]
    async fn test_list_always_hits_upstream_and_stores_all() {
        let svc = service(FakeSource::with(vec![rick(), morty(), birdperson()])).await;
        let filter = CharacterFilter::default();

        let page = svc.get_characters(1, &filter).await.unwrap();
        assert_eq!(page.results.len(), 3);
        assert_eq!(page.info.count, 3);
        assert_eq!(page.info.prev, Some(1));
        assert_eq!(page.info.next, None);

        let first_rows = svc.db.list_characters(1, 100, &filter).await.unwrap();
        svc.get_characters(1, &filter).await.unwrap();
        let second_rows = svc.db.list_characters(1, 100, &filter).await.unwrap();

        assert_eq!(svc.source.list_calls.lock().unwrap().len(), 2);
        assert_eq!(second_rows.len(), 3);
        for (a, b) in first_rows.iter().zip(&second_rows) {
            assert_eq!(CharacterDto::from(a), CharacterDto::from(b));
            assert_eq!(a.episodes_json, b.episodes_json);
        }
    }

    #[tokio::test]
    async fn test_list_passes_filters_upstream() {
        let svc = service(FakeSource::with(vec![rick(), morty(), birdperson()])).await;
        let filter = CharacterFilter { status: Some("Dead".into()), ..Default::default() };

        let page = svc.get_characters(2, &filter).await.unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].name, "Birdperson");

        let calls = svc.source.list_calls.lock().unwrap().clone();
        assert_eq!(calls, vec![CharacterQuery { page: 2, status: Some("Dead".into()), ..Default::default() }]);
        assert_eq!(svc.db.count_characters(&CharacterFilter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_then_detail_is_served_from_store() {
        let svc = service(FakeSource::with(vec![rick(), morty()])).await;

        svc.get_characters(1, &CharacterFilter::default()).await.unwrap();
        let detail = svc.get_character(2).await.unwrap().unwrap();

        assert_eq!(detail.character.name, "Morty Smith");
        assert!(svc.source.character_calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_invalid_page() {
        let svc = service(FakeSource::with(vec![rick()])).await;
        let filters = [
            CharacterFilter::default(),
            CharacterFilter { name: Some("rick".into()), ..Default::default() },
            CharacterFilter { name: Some("rick".into()), status: Some("alive".into()), species: Some("Human".into()) },
        ];

        for filter in &filters {
            assert!(matches!(svc.get_characters(0, filter).await, Err(Error::InvalidInput(_))));
        }
        assert!(svc.source.list_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_upstream_failure_degrades_to_not_found() {
        let source = FakeSource { fail_list: true, ..FakeSource::with(vec![rick()]) };
        let svc = service(source).await;

        let result = svc.get_characters(1, &CharacterFilter::default()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(svc.db.count_characters(&CharacterFilter::default()).await.unwrap(), 0);
    }

    /// Log sink shared between the subscriber and the assertions.
    #[derive(Clone, Default)]
    struct LogBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_list_cached_store_failure_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("citadel.db");
        let db = CharacterDb::open(&path).await.unwrap();

        let raw = tokio_rusqlite::Connection::open(&path).await.unwrap();
        raw.call(|conn| conn.execute_batch("DROP TABLE characters")).await.unwrap();

        let logs = LogBuf::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let svc = CharacterService::new(FakeSource::default(), db, 20);
        let result = svc.list_cached(2, &CharacterFilter::default()).await;
        assert!(matches!(result, Err(Error::Database(_))));

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("failed to count cached characters"));
        assert!(output.contains("page=2"));
    }

    #[tokio::test]
    async fn test_list_cached_pages_locally() {
        let svc = CharacterService::new(
            FakeSource::with(vec![rick(), morty(), birdperson()]),
            CharacterDb::open_in_memory().await.unwrap(),
            2,
        );
        svc.get_characters(1, &CharacterFilter::default()).await.unwrap();
        let list_calls_before = svc.source.list_calls.lock().unwrap().len();

        let first = svc.list_cached(1, &CharacterFilter::default()).await.unwrap();
        assert_eq!(first.info, PageInfoDto { count: 3, pages: 2, next: Some(2), prev: None });
        assert_eq!(first.results.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2]);

        let second = svc.list_cached(2, &CharacterFilter::default()).await.unwrap();
        assert_eq!(second.info, PageInfoDto { count: 3, pages: 2, next: None, prev: Some(1) });
        assert_eq!(second.results[0].name, "Birdperson");

        assert!(matches!(svc.list_cached(3, &CharacterFilter::default()).await, Err(Error::NotFound(_))));
        assert!(matches!(svc.list_cached(0, &CharacterFilter::default()).await, Err(Error::InvalidInput(_))));
        assert_eq!(svc.source.list_calls.lock().unwrap().len(), list_calls_before);
    }
}
