//! Commands for inspecting and deleting processed videos.

use crate::cli::Output;
use crate::config::Settings;
use crate::store::create_store;
use crate::transcript::format_timestamp;
use crate::validation::validate_video_id;
use anyhow::{bail, Result};

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let store = create_store(&settings)?;
    let videos = store.list().await?;

    if videos.is_empty() {
        Output::info("No videos processed yet. Use 'vidlens process <url>' to add one.");
        return Ok(());
    }

    Output::header(&format!("Processed Videos ({})", videos.len()));
    println!();
    for video in &videos {
        Output::video_summary(video);
    }

    let total_chunks: usize = videos.iter().map(|v| v.chunk_count).sum();
    println!();
    Output::kv("Total videos", &videos.len().to_string());
    Output::kv("Total chunks", &total_chunks.to_string());

    Ok(())
}

/// Run the info command.
pub async fn run_info(video_id: &str, settings: Settings) -> Result<()> {
    validate_video_id(video_id)?;
    let store = create_store(&settings)?;

    let Some(record) = store.get(video_id).await? else {
        bail!("Video not found: {}", video_id);
    };

    Output::header(&record.video_id);
    Output::kv("URL", &record.youtube_url);
    Output::kv("Mode", record.processing_mode.as_str());
    Output::kv("Processed", &record.processed_at.to_rfc3339());
    Output::kv("Caption entries", &record.transcript_length().to_string());
    Output::kv("Chunks", &record.chunks.len().to_string());
    Output::kv("Frames", &record.frames.len().to_string());

    if !record.sections.is_empty() {
        Output::header("Sections");
        for section in &record.sections {
            Output::list_item(&format!(
                "[{}-{}] {}: {}",
                format_timestamp(section.start_time),
                format_timestamp(section.end_time),
                section.title,
                section.summary
            ));
        }
    }

    Ok(())
}

/// Run the delete command.
pub async fn run_delete(video_id: &str, settings: Settings) -> Result<()> {
    validate_video_id(video_id)?;
    let store = create_store(&settings)?;

    if store.delete(video_id).await? {
        Output::success(&format!("Deleted {}", video_id));
        Ok(())
    } else {
        bail!("Video not found: {}", video_id)
    }
}
