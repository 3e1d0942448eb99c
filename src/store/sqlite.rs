//! SQLite-based video store.
//!
//! Embeddings are stored as little-endian `f32` blobs and ranked in Rust.

use super::{bytes_to_embedding, embedding_to_bytes, ProcessingMode, VideoRecord, VideoStore, VideoSummary};
use crate::error::{Result, VidlensError};
use crate::transcript::{GeneratedSection, TranscriptEntry};
use crate::unit::{PendingUnit, RetrievalUnit, UnitKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS videos (
    video_id TEXT PRIMARY KEY,
    youtube_url TEXT NOT NULL,
    processing_mode TEXT NOT NULL,
    transcript_json TEXT,
    processed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sections (
    video_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    title TEXT NOT NULL,
    start_time REAL NOT NULL,
    end_time REAL NOT NULL,
    summary TEXT NOT NULL,
    PRIMARY KEY (video_id, position)
);

CREATE TABLE IF NOT EXISTS chunks (
    video_id TEXT NOT NULL,
    chunk_order INTEGER NOT NULL,
    content TEXT NOT NULL,
    start_seconds REAL NOT NULL,
    end_seconds REAL NOT NULL,
    embedding BLOB NOT NULL,
    PRIMARY KEY (video_id, chunk_order)
);

CREATE TABLE IF NOT EXISTS visual_frames (
    video_id TEXT NOT NULL,
    frame_order INTEGER NOT NULL,
    description TEXT NOT NULL,
    timestamp REAL NOT NULL,
    end_timestamp REAL NOT NULL,
    image_base64 TEXT,
    embedding BLOB NOT NULL,
    PRIMARY KEY (video_id, frame_order)
);

CREATE INDEX IF NOT EXISTS idx_videos_processed_at ON videos(processed_at);
"#;

/// SQLite-based video store.
pub struct SqliteVideoStore {
    conn: Mutex<Connection>,
}

impl SqliteVideoStore {
    /// Open (or create) the store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite video store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VidlensError::Store(format!("Failed to acquire lock: {}", e)))
    }

    fn delete_rows(conn: &Connection, video_id: &str) -> Result<usize> {
        let mut deleted = 0;
        for table in ["sections", "chunks", "visual_frames", "videos"] {
            deleted = conn.execute(
                &format!("DELETE FROM {} WHERE video_id = ?1", table),
                params![video_id],
            )?;
        }
        // Rows removed from `videos`, the last table.
        Ok(deleted)
    }

    fn load(conn: &Connection, video_id: &str) -> Result<Option<VideoRecord>> {
        let header = conn
            .query_row(
                "SELECT youtube_url, processing_mode, transcript_json, processed_at
                 FROM videos WHERE video_id = ?1",
                params![video_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((youtube_url, mode, transcript_json, processed_at)) = header else {
            return Ok(None);
        };

        let processing_mode = mode.parse::<ProcessingMode>().map_err(VidlensError::Store)?;
        let transcript: Option<Vec<TranscriptEntry>> = transcript_json
            .map(|json| serde_json::from_str(&json))
            .transpose()?;

        let mut stmt = conn.prepare(
            "SELECT title, start_time, end_time, summary FROM sections
             WHERE video_id = ?1 ORDER BY position",
        )?;
        let sections = stmt
            .query_map(params![video_id], |row| {
                Ok(GeneratedSection {
                    title: row.get(0)?,
                    start_time: row.get(1)?,
                    end_time: row.get(2)?,
                    summary: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            "SELECT chunk_order, content, start_seconds, end_seconds, embedding FROM chunks
             WHERE video_id = ?1 ORDER BY chunk_order",
        )?;
        let chunk_rows = stmt
            .query_map(params![video_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    PendingUnit {
                        kind: UnitKind::Chunk,
                        text: row.get(1)?,
                        start_seconds: row.get(2)?,
                        end_seconds: row.get(3)?,
                        image_base64: None,
                    },
                    row.get::<_, Vec<u8>>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        // Frame images stay on disk. Ranking and answers only read descriptions.
        let mut stmt = conn.prepare(
            "SELECT frame_order, description, timestamp, end_timestamp, embedding
             FROM visual_frames WHERE video_id = ?1 ORDER BY frame_order",
        )?;
        let frame_rows = stmt
            .query_map(params![video_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    PendingUnit {
                        kind: UnitKind::Frame,
                        text: row.get(1)?,
                        start_seconds: row.get(2)?,
                        end_seconds: row.get(3)?,
                        image_base64: None,
                    },
                    row.get::<_, Vec<u8>>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(VideoRecord {
            video_id: video_id.to_string(),
            youtube_url,
            processing_mode,
            transcript,
            sections,
            chunks: restore_units(chunk_rows)?,
            frames: restore_units(frame_rows)?,
            processed_at: parse_time(&processed_at),
        }))
    }
}

fn restore_units(rows: Vec<(i64, PendingUnit, Vec<u8>)>) -> Result<Vec<RetrievalUnit>> {
    rows.into_iter()
        .map(|(order, pending, bytes)| {
            RetrievalUnit::restore(order as usize, pending, bytes_to_embedding(&bytes))
                .map_err(VidlensError::from)
        })
        .collect()
}

fn parse_time(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl VideoStore for SqliteVideoStore {
    #[instrument(skip(self, record), fields(video_id = %record.video_id))]
    async fn publish(&self, record: VideoRecord) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        Self::delete_rows(&tx, &record.video_id)?;

        let transcript_json = record
            .transcript
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        tx.execute(
            "INSERT INTO videos (video_id, youtube_url, processing_mode, transcript_json, processed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.video_id,
                record.youtube_url,
                record.processing_mode.as_str(),
                transcript_json,
                record.processed_at.to_rfc3339(),
            ],
        )?;

        for (position, section) in record.sections.iter().enumerate() {
            tx.execute(
                "INSERT INTO sections (video_id, position, title, start_time, end_time, summary)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.video_id,
                    position as i64,
                    section.title,
                    section.start_time,
                    section.end_time,
                    section.summary,
                ],
            )?;
        }

        for chunk in &record.chunks {
            tx.execute(
                "INSERT INTO chunks (video_id, chunk_order, content, start_seconds, end_seconds, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.video_id,
                    chunk.order() as i64,
                    chunk.text(),
                    chunk.start_seconds(),
                    chunk.end_seconds(),
                    embedding_to_bytes(chunk.embedding()),
                ],
            )?;
        }

        for frame in &record.frames {
            tx.execute(
                "INSERT INTO visual_frames
                 (video_id, frame_order, description, timestamp, end_timestamp, image_base64, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.video_id,
                    frame.order() as i64,
                    frame.text(),
                    frame.start_seconds(),
                    frame.end_seconds(),
                    frame.image_base64(),
                    embedding_to_bytes(frame.embedding()),
                ],
            )?;
        }

        tx.commit()?;
        info!(
            chunks = record.chunks.len(),
            frames = record.frames.len(),
            "Published video record"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, video_id: &str) -> Result<Option<Arc<VideoRecord>>> {
        let conn = self.lock()?;
        let record = Self::load(&conn, video_id)?;
        debug!(found = record.is_some(), "Loaded video record");
        Ok(record.map(Arc::new))
    }

    #[instrument(skip(self))]
    async fn delete(&self, video_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let deleted = Self::delete_rows(&tx, video_id)?;
        tx.commit()?;

        info!("Deleted video {} ({} records)", video_id, deleted);
        Ok(deleted > 0)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<VideoSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT v.video_id, v.youtube_url, v.processing_mode, v.processed_at,
                   (SELECT COUNT(*) FROM sections s WHERE s.video_id = v.video_id),
                   (SELECT COUNT(*) FROM chunks c WHERE c.video_id = v.video_id),
                   (SELECT COUNT(*) FROM visual_frames f WHERE f.video_id = v.video_id)
            FROM videos v
            ORDER BY v.processed_at DESC
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(video_id, youtube_url, mode, processed_at, sections, chunks, frames)| -> Result<VideoSummary> {
                Ok(VideoSummary {
                    video_id,
                    youtube_url,
                    processing_mode: mode.parse::<ProcessingMode>().map_err(VidlensError::Store)?,
                    section_count: sections as usize,
                    chunk_count: chunks as usize,
                    frame_count: frames as usize,
                    processed_at: parse_time(&processed_at),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::record;

    #[tokio::test]
    async fn test_sqlite_video_store() {
        let store = SqliteVideoStore::in_memory().unwrap();
        let original = record("abc");
        store.publish(original.clone()).await.unwrap();

        let loaded = store.get("abc").await.unwrap().unwrap();
        assert_eq!(loaded.youtube_url, original.youtube_url);
        assert_eq!(loaded.processing_mode, ProcessingMode::Transcript);
        assert_eq!(loaded.sections, original.sections);
        assert_eq!(loaded.transcript, original.transcript);
        assert_eq!(loaded.chunks, original.chunks);
        assert_eq!(loaded.frames.len(), 1);
        assert_eq!(loaded.frames[0].text(), original.frames[0].text());
        assert_eq!(loaded.frames[0].embedding(), original.frames[0].embedding());

        let videos = store.list().await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].chunk_count, 2);
        assert_eq!(videos[0].frame_count, 1);

        assert!(store.delete("abc").await.unwrap());
        assert!(store.get("abc").await.unwrap().is_none());
        assert!(!store.delete("abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_frame_images_stored_but_not_loaded() {
        let store = SqliteVideoStore::in_memory().unwrap();
        store.publish(record("abc")).await.unwrap();

        let loaded = store.get("abc").await.unwrap().unwrap();
        assert_eq!(loaded.frames[0].image_base64(), None);

        let conn = store.lock().unwrap();
        let image: Option<String> = conn
            .query_row(
                "SELECT image_base64 FROM visual_frames WHERE video_id = 'abc' AND frame_order = 0",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(image.as_deref(), Some("/9j/AA=="));
    }

    #[tokio::test]
    async fn test_republish_replaces_units() {
        let store = SqliteVideoStore::in_memory().unwrap();
        store.publish(record("abc")).await.unwrap();

        let mut replacement = record("abc");
        replacement.chunks.truncate(1);
        replacement.frames.clear();
        replacement.processing_mode = ProcessingMode::VideoAnalysis;
        replacement.transcript = None;
        store.publish(replacement).await.unwrap();

        let loaded = store.get("abc").await.unwrap().unwrap();
        assert_eq!(loaded.chunks.len(), 1);
        assert!(loaded.frames.is_empty());
        assert_eq!(loaded.processing_mode, ProcessingMode::VideoAnalysis);
        assert_eq!(loaded.transcript, None);
    }

    #[tokio::test]
    async fn test_empty_embedding_row_rejected() {
        let store = SqliteVideoStore::in_memory().unwrap();
        store.publish(record("abc")).await.unwrap();

        {
            let conn = store.lock().unwrap();
            conn.execute(
                "UPDATE chunks SET embedding = X'' WHERE video_id = 'abc' AND chunk_order = 1",
                [],
            )
            .unwrap();
        }

        let err = store.get("abc").await.unwrap_err();
        assert!(matches!(err, VidlensError::Batch(_)));
    }

    #[tokio::test]
    async fn test_on_disk_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("videos.db");

        {
            let store = SqliteVideoStore::new(&path).unwrap();
            store.publish(record("xyz")).await.unwrap();
        }

        let store = SqliteVideoStore::new(&path).unwrap();
        assert!(store.get("xyz").await.unwrap().is_some());
    }
}
