//! YouTube captions via yt-dlp.

use super::TranscriptEntry;
use crate::error::Result;
use crate::media::{run_tool, stderr_tail};
use crate::validation::watch_url;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Caption languages in order of preference.
const PREFERRED_LANGUAGES: [&str; 3] = ["en", "en-US", "en-GB"];

/// Source of timed captions for a video.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript, or `None` when the video has no usable captions.
    async fn fetch(&self, video_id: &str) -> Result<Option<Vec<TranscriptEntry>>>;
}

/// Downloads captions in yt-dlp's `json3` format.
///
/// Manually authored captions are preferred; automatic captions are used
/// when no manual track exists in a preferred language.
pub struct YtDlpTranscriptSource {
    work_dir: PathBuf,
}

impl YtDlpTranscriptSource {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: Option<u64>,
    #[serde(default)]
    d_duration_ms: Option<u64>,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Convert a `json3` caption document into transcript entries.
///
/// Events without text (window definitions, bare newlines) are dropped.
fn parse_json3(content: &str) -> serde_json::Result<Vec<TranscriptEntry>> {
    let doc: Json3 = serde_json::from_str(content)?;

    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| {
            let start = event.t_start_ms?;
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.replace('\n', " ").trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptEntry {
                text,
                start: start as f64 / 1000.0,
                duration: event.d_duration_ms.map(|d| d as f64 / 1000.0),
            })
        })
        .collect())
}

/// Pick the caption file for the most preferred language.
fn pick_caption_file(dir: &Path, video_id: &str) -> Option<PathBuf> {
    PREFERRED_LANGUAGES
        .iter()
        .map(|lang| dir.join(format!("{}.{}.json3", video_id, lang)))
        .find(|p| p.exists())
        .or_else(|| {
            // Any remaining English variant, e.g. "en-orig".
            std::fs::read_dir(dir).ok()?.flatten().map(|e| e.path()).find(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&format!("{}.en", video_id)) && n.ends_with(".json3"))
            })
        })
}

#[async_trait]
impl TranscriptSource for YtDlpTranscriptSource {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str) -> Result<Option<Vec<TranscriptEntry>>> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        let dir = tempfile::tempdir_in(&self.work_dir)?;
        let template = dir.path().join(format!("{}.%(ext)s", video_id));

        let mut command = Command::new("yt-dlp");
        command
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-langs")
            .arg("en,en-US,en-GB,en.*")
            .arg("--sub-format")
            .arg("json3")
            .arg("--output")
            .arg(&template)
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(watch_url(video_id));

        let output = run_tool("yt-dlp", &mut command).await?;
        if !output.status.success() {
            warn!("Caption download failed: {}", stderr_tail(&output));
            return Ok(None);
        }

        let Some(path) = pick_caption_file(dir.path(), video_id) else {
            info!("No captions available");
            return Ok(None);
        };

        let content = tokio::fs::read_to_string(&path).await?;
        let entries = match parse_json3(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Unreadable caption file {:?}: {}", path, e);
                return Ok(None);
            }
        };

        debug!("Parsed {} caption entries", entries.len());
        Ok((!entries.is_empty()).then_some(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json3() {
        let content = r#"{
            "wireMagic": "pb3",
            "events": [
                {"tStartMs": 0, "dDurationMs": 5000, "id": 1},
                {"tStartMs": 120, "dDurationMs": 2880, "segs": [{"utf8": "Hello "}, {"utf8": "world"}]},
                {"tStartMs": 3000, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 3000, "dDurationMs": 1500, "segs": [{"utf8": "second\nline"}]}
            ]
        }"#;

        let entries = parse_json3(content).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], TranscriptEntry::new("Hello world", 0.12, 2.88));
        assert_eq!(entries[1].text, "second line");
        assert_eq!(entries[1].start, 3.0);
    }

    #[test]
    fn test_parse_json3_missing_duration() {
        let entries = parse_json3(r#"{"events": [{"tStartMs": 1000, "segs": [{"utf8": "x"}]}]}"#).unwrap();
        assert_eq!(entries[0].duration, None);
    }

    #[test]
    fn test_pick_caption_file_prefers_language_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.en-GB.json3"), "{}").unwrap();
        std::fs::write(dir.path().join("abc.en-US.json3"), "{}").unwrap();

        let picked = pick_caption_file(dir.path(), "abc").unwrap();
        assert!(picked.ends_with("abc.en-US.json3"));
    }

    #[test]
    fn test_pick_caption_file_fallback_variant() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.en-orig.json3"), "{}").unwrap();
        assert!(pick_caption_file(dir.path(), "abc").is_some());

        let empty = tempfile::tempdir().unwrap();
        assert!(pick_caption_file(empty.path(), "abc").is_none());
    }
}
