//! Schema versioning for the character store.
//!
//! Applied versions are recorded in `_migrations`; only versions above the
//! recorded maximum are run on open.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Ordered (version, SQL batch) pairs.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_characters.sql"))];

/// Bring the store schema up to the latest version.
///
/// Each pending version runs in its own transaction together with its
/// `_migrations` record.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
        )?;

        let current: i64 = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for &(version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > current) {
            let tx = conn.transaction()?;
            tx.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
            tx.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            tracing::info!(version, "applied store migration");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
