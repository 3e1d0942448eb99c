//! Process command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::transcript::format_timestamp;
use anyhow::Result;

/// Run the process command.
pub async fn run_process(url: &str, visual: bool, mut settings: Settings) -> Result<()> {
    if visual {
        settings.visual.enabled = true;
    }

    if let Err(e) = preflight::check(Operation::Process, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Processing video...");
    let result = orchestrator.process_video(url).await;
    spinner.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            Output::error(&format!("Failed to process video: {}", e));
            if e.is_retryable() {
                Output::info("This looks transient. Try again in a moment.");
            }
            return Err(e.into());
        }
    };

    Output::success(&format!("Processed {}", result.video_id));
    Output::kv("Mode", result.processing_mode.as_str());
    Output::kv("Caption entries", &result.transcript_length.to_string());
    Output::kv("Chunks", &result.chunks_created.to_string());
    if result.frames_indexed > 0 {
        Output::kv("Frames", &result.frames_indexed.to_string());
    }

    if !result.sections.is_empty() {
        Output::header("Sections");
        for section in &result.sections {
            Output::list_item(&format!(
                "[{}-{}] {}",
                format_timestamp(section.start_time),
                format_timestamp(section.end_time),
                section.title
            ));
        }
    }

    Ok(())
}
