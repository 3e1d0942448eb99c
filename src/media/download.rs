//! Video download via yt-dlp.

use super::{run_tool, stderr_tail};
use crate::error::{Result, VidlensError};
use crate::validation::watch_url;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{info, instrument};

/// Download a video as MP4 (at most 720p) into `output_dir`.
///
/// Returns the existing file without re-downloading when present.
#[instrument(skip(output_dir), fields(video_id = %video_id))]
pub async fn download_video(video_id: &str, output_dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;

    let target_path = output_dir.join(format!("{}.mp4", video_id));
    if target_path.exists() {
        info!("Using cached video file");
        return Ok(target_path);
    }

    let url = watch_url(video_id);
    info!("Downloading video from {}", url);

    let mut command = Command::new("yt-dlp");
    command
        .arg("--format")
        .arg("best[height<=720][ext=mp4]/best[height<=720]/best")
        .arg("--merge-output-format")
        .arg("mp4")
        .arg("--output")
        .arg(&target_path)
        .arg("--no-playlist")
        .arg("--quiet")
        .arg("--no-warnings")
        .arg(&url);

    let output = run_tool("yt-dlp", &mut command).await?;
    if !output.status.success() {
        return Err(VidlensError::MediaDownload(format!(
            "yt-dlp failed: {}",
            stderr_tail(&output)
        )));
    }

    if !target_path.exists() {
        return Err(VidlensError::MediaDownload(
            "Video file not found after download".into(),
        ));
    }

    Ok(target_path)
}
