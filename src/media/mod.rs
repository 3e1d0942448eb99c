//! Media acquisition through external tools (yt-dlp, ffmpeg).
//!
//! Frames are captured at a fixed interval from a downloaded copy of the
//! video and carried as base64 JPEG payloads.

mod download;
mod frames;

pub use download::download_video;
pub use frames::{FfmpegFrameSource, FrameSettings};

use crate::error::{Result, VidlensError};
use async_trait::async_trait;
use std::process::{Output, Stdio};
use tokio::process::Command;

/// One captured frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameCapture {
    /// Capture time in seconds.
    pub timestamp: f64,
    /// End of the interval this frame represents.
    pub end_timestamp: f64,
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub image_base64: String,
}

/// Source of video frames for visual indexing.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Capture frames for `video_id`, in timestamp order.
    async fn extract(&self, video_id: &str) -> Result<Vec<FrameCapture>>;
}

/// Run an external tool and collect its output.
///
/// A missing binary maps to [`VidlensError::ToolNotFound`]. The exit status is
/// left for the caller to inspect.
pub(crate) async fn run_tool(tool: &str, command: &mut Command) -> Result<Output> {
    command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VidlensError::ToolNotFound(tool.to_string())
            } else {
                VidlensError::ToolFailed(format!("{} execution failed: {}", tool, e))
            }
        })
}

/// Trimmed stderr of a failed tool run, for error messages.
pub(crate) fn stderr_tail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr.trim().lines().collect();
    lines[lines.len().saturating_sub(5)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_tool() {
        let mut command = Command::new("vidlens-definitely-not-installed");
        let err = run_tool("vidlens-definitely-not-installed", &mut command)
            .await
            .unwrap_err();
        assert!(matches!(err, VidlensError::ToolNotFound(_)));
    }
}
