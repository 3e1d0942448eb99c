//! In-memory video store.
//!
//! Useful for testing and short-lived servers.

use super::{VideoRecord, VideoStore, VideoSummary};
use crate::error::{Result, VidlensError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory video store.
///
/// Records are shared as `Arc`s, so a reader holding a record keeps it alive
/// after it is replaced or deleted.
pub struct MemoryVideoStore {
    videos: RwLock<HashMap<String, Arc<VideoRecord>>>,
}

impl MemoryVideoStore {
    pub fn new() -> Self {
        Self {
            videos: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVideoStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> VidlensError {
    VidlensError::Store("Failed to acquire lock".to_string())
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn publish(&self, record: VideoRecord) -> Result<()> {
        let mut videos = self.videos.write().map_err(poisoned)?;
        videos.insert(record.video_id.clone(), Arc::new(record));
        Ok(())
    }

    async fn get(&self, video_id: &str) -> Result<Option<Arc<VideoRecord>>> {
        let videos = self.videos.read().map_err(poisoned)?;
        Ok(videos.get(video_id).cloned())
    }

    async fn delete(&self, video_id: &str) -> Result<bool> {
        let mut videos = self.videos.write().map_err(poisoned)?;
        Ok(videos.remove(video_id).is_some())
    }

    async fn list(&self) -> Result<Vec<VideoSummary>> {
        let videos = self.videos.read().map_err(poisoned)?;
        let mut summaries: Vec<VideoSummary> = videos.values().map(|r| r.summary()).collect();
        summaries.sort_by(|a, b| b.processed_at.cmp(&a.processed_at));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::record;

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryVideoStore::new();
        assert!(store.get("abc").await.unwrap().is_none());

        store.publish(record("abc")).await.unwrap();
        let fetched = store.get("abc").await.unwrap().unwrap();
        assert_eq!(fetched.chunks.len(), 2);

        let videos = store.list().await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].video_id, "abc");

        assert!(store.delete("abc").await.unwrap());
        assert!(!store.delete("abc").await.unwrap());
        assert!(store.list().await.unwrap().is_empty());

        // A reader's handle survives deletion.
        assert_eq!(fetched.video_id, "abc");
    }

    #[tokio::test]
    async fn test_publish_replaces_whole_record() {
        let store = MemoryVideoStore::new();
        store.publish(record("abc")).await.unwrap();

        let mut replacement = record("abc");
        replacement.chunks.truncate(1);
        replacement.frames.clear();
        store.publish(replacement).await.unwrap();

        let fetched = store.get("abc").await.unwrap().unwrap();
        assert_eq!(fetched.chunks.len(), 1);
        assert!(!fetched.has_visual_index());
    }
}
