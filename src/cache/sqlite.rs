//! SQLite-backed embedding cache that survives restarts.

use super::{fingerprint, CacheStats, VectorCache};
use crate::embedding::TaskType;
use crate::error::{Result, VidlensError};
use crate::store::{bytes_to_embedding, embedding_to_bytes};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cache_entries (
    content_hash TEXT PRIMARY KEY,
    task_type TEXT NOT NULL,
    embedding BLOB NOT NULL,
    created_at TEXT NOT NULL,
    last_accessed TEXT NOT NULL,
    hit_count INTEGER NOT NULL DEFAULT 0,
    recency INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cache_recency ON cache_entries(recency);
CREATE INDEX IF NOT EXISTS idx_cache_last_accessed ON cache_entries(last_accessed);
"#;

struct PersistentState {
    conn: Connection,
    /// Monotonic access counter; the smallest `recency` is least recently used.
    clock: i64,
    hits: u64,
    misses: u64,
}

/// Embedding cache persisted in SQLite.
///
/// Same contract as [`super::EmbeddingCache`]. Storage failures degrade to a
/// miss (or a dropped write) and are logged; the cache never fails a request.
pub struct PersistentEmbeddingCache {
    state: Mutex<PersistentState>,
    capacity: usize,
}

impl PersistentEmbeddingCache {
    /// Open (or create) the cache database at `path`.
    #[instrument(skip_all)]
    pub fn open(path: &Path, capacity: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let cache = Self::with_connection(conn, capacity)?;

        info!("Opened persistent embedding cache at {:?}", path);
        Ok(cache)
    }

    /// In-memory database, for tests.
    pub fn in_memory(capacity: usize) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, capacity)
    }

    fn with_connection(conn: Connection, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(VidlensError::Config(
                "cache capacity must be positive".to_string(),
            ));
        }

        conn.execute_batch(SCHEMA)?;
        let clock: i64 = conn.query_row(
            "SELECT COALESCE(MAX(recency), 0) FROM cache_entries",
            [],
            |row| row.get(0),
        )?;

        Ok(Self {
            state: Mutex::new(PersistentState {
                conn,
                clock,
                hits: 0,
                misses: 0,
            }),
            capacity,
        })
    }

    /// Delete entries not accessed within the last `days` days.
    pub fn sweep_older_than(&self, days: u32) -> Result<usize> {
        self.sweep_older_than_at(days, Utc::now())
    }

    /// [`Self::sweep_older_than`] against an explicit clock.
    pub fn sweep_older_than_at(&self, days: u32, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = timestamp(now - Duration::days(i64::from(days)));
        let state = self.lock();
        let deleted = state.conn.execute(
            "DELETE FROM cache_entries WHERE last_accessed < ?1",
            params![cutoff],
        )?;

        info!("Swept {} cache entries older than {} days", deleted, days);
        Ok(deleted)
    }

    fn lock(&self) -> MutexGuard<'_, PersistentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_get(state: &mut PersistentState, key: &str) -> Result<Option<Vec<f32>>> {
        let bytes: Option<Vec<u8>> = state
            .conn
            .query_row(
                "SELECT embedding FROM cache_entries WHERE content_hash = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        let Some(bytes) = bytes else {
            return Ok(None);
        };

        state.clock += 1;
        state.conn.execute(
            "UPDATE cache_entries
             SET hit_count = hit_count + 1, last_accessed = ?2, recency = ?3
             WHERE content_hash = ?1",
            params![key, timestamp(Utc::now()), state.clock],
        )?;

        Ok(Some(bytes_to_embedding(&bytes)))
    }

    fn try_set(&self, state: &mut PersistentState, key: &str, task: TaskType, vector: &[f32]) -> Result<()> {
        let now = timestamp(Utc::now());
        state.clock += 1;

        let tx = state.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO cache_entries
             (content_hash, task_type, embedding, created_at, last_accessed, hit_count, recency)
             VALUES (?1, ?2, ?3, ?4, ?4, 0, ?5)
             ON CONFLICT(content_hash) DO UPDATE SET
                embedding = excluded.embedding,
                last_accessed = excluded.last_accessed,
                recency = excluded.recency",
            params![key, task.as_str(), embedding_to_bytes(vector), now, state.clock],
        )?;

        let evicted = tx.execute(
            "DELETE FROM cache_entries WHERE content_hash IN (
                SELECT content_hash FROM cache_entries
                ORDER BY recency DESC
                LIMIT -1 OFFSET ?1
             )",
            params![self.capacity as i64],
        )?;
        tx.commit()?;

        if evicted > 0 {
            debug!(evicted, "Evicted least recently used embeddings");
        }
        Ok(())
    }

    fn try_stats(state: &PersistentState) -> Result<usize> {
        let count: i64 = state
            .conn
            .query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl VectorCache for PersistentEmbeddingCache {
    fn get(&self, content: &str, task: TaskType) -> Option<Vec<f32>> {
        let key = fingerprint(content, task);
        let mut state = self.lock();

        match Self::try_get(&mut state, &key) {
            Ok(Some(vector)) => {
                state.hits += 1;
                Some(vector)
            }
            Ok(None) => {
                state.misses += 1;
                None
            }
            Err(e) => {
                warn!("Cache lookup failed, treating as miss: {}", e);
                state.misses += 1;
                None
            }
        }
    }

    fn set(&self, content: &str, task: TaskType, vector: Vec<f32>) {
        let key = fingerprint(content, task);
        let mut state = self.lock();

        if let Err(e) = self.try_set(&mut state, &key, task, &vector) {
            warn!("Failed to write cache entry: {}", e);
        }
    }

    fn stats(&self) -> CacheStats {
        let state = self.lock();
        let size = Self::try_stats(&state).unwrap_or_else(|e| {
            warn!("Failed to count cache entries: {}", e);
            0
        });
        CacheStats::new(size, self.capacity, state.hits, state.misses)
    }

    fn clear(&self) {
        let mut state = self.lock();
        if let Err(e) = state.conn.execute("DELETE FROM cache_entries", []) {
            warn!("Failed to clear cache: {}", e);
        }
        state.hits = 0;
        state.misses = 0;
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
