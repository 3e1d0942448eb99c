//! Frame extraction with ffmpeg.

use super::{download_video, run_tool, stderr_tail, FrameCapture, FrameSource};
use crate::error::{Result, VidlensError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Frame sampling parameters.
#[derive(Debug, Clone, Copy)]
pub struct FrameSettings {
    pub interval_seconds: u32,
    pub max_frames: usize,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            interval_seconds: 10,
            max_frames: 60,
        }
    }
}

/// Downloads a video with yt-dlp and samples one JPEG frame per interval.
pub struct FfmpegFrameSource {
    work_dir: PathBuf,
    settings: FrameSettings,
}

impl FfmpegFrameSource {
    pub fn new(work_dir: impl Into<PathBuf>, settings: FrameSettings) -> Result<Self> {
        if settings.interval_seconds == 0 {
            return Err(VidlensError::Config(
                "frame_interval_seconds must be positive".to_string(),
            ));
        }
        Ok(Self {
            work_dir: work_dir.into(),
            settings,
        })
    }

    async fn sample(&self, video: &Path, frames_dir: &Path) -> Result<Vec<PathBuf>> {
        let pattern = frames_dir.join("frame_%04d.jpg");

        let mut command = Command::new("ffmpeg");
        command
            .arg("-i")
            .arg(video)
            .arg("-vf")
            .arg(format!("fps=1/{}", self.settings.interval_seconds))
            .arg("-frames:v")
            .arg(self.settings.max_frames.to_string())
            .arg("-q:v")
            .arg("5")
            .arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg(&pattern);

        let output = run_tool("ffmpeg", &mut command).await?;
        if !output.status.success() {
            return Err(VidlensError::ToolFailed(format!(
                "ffmpeg frame extraction failed: {}",
                stderr_tail(&output)
            )));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(frames_dir)?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "jpg"))
            .collect();
        files.sort();
        Ok(files)
    }
}

/// Timestamps for the `index`th sampled frame.
fn frame_window(index: usize, interval_seconds: u32) -> (f64, f64) {
    let interval = f64::from(interval_seconds);
    let start = index as f64 * interval;
    (start, start + interval)
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    #[instrument(skip(self), fields(interval = self.settings.interval_seconds))]
    async fn extract(&self, video_id: &str) -> Result<Vec<FrameCapture>> {
        let video_dir = self.work_dir.join("videos");
        let video = download_video(video_id, &video_dir).await?;

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let frames_dir = tempfile::tempdir_in(&self.work_dir)?;
        let files = self.sample(&video, frames_dir.path()).await;

        if let Err(e) = tokio::fs::remove_file(&video).await {
            warn!("Failed to remove downloaded video {:?}: {}", video, e);
        }
        let files = files?;

        let mut frames = Vec::with_capacity(files.len());
        for (index, path) in files.iter().enumerate() {
            let bytes = tokio::fs::read(path).await?;
            let (timestamp, end_timestamp) = frame_window(index, self.settings.interval_seconds);
            debug!(timestamp, bytes = bytes.len(), "Captured frame");

            frames.push(FrameCapture {
                timestamp,
                end_timestamp,
                mime_type: "image/jpeg".to_string(),
                image_base64: STANDARD.encode(&bytes),
            });
        }

        info!("Extracted {} frames", frames.len());
        Ok(frames)
    }
}
