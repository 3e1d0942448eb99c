//! Visual search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::transcript::format_timestamp;
use crate::validation::watch_url;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    video_id: &str,
    query: &str,
    include_narrative: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Query, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching video...");
    let result = orchestrator
        .visual_search(video_id, query, include_narrative)
        .await;
    spinner.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    };

    if result.matches.is_empty() {
        Output::info("No matching moments found.");
        return Ok(());
    }

    if !result.visual_index {
        Output::warning("No frame index for this video; matched against transcript text.");
    }

    Output::header(&format!("Matches ({})", result.total_matches));
    for m in &result.matches {
        let url = format!("{}&t={}s", watch_url(video_id), m.timestamp as u64);
        Output::moment(
            &format_timestamp(m.timestamp),
            &m.confidence.to_string(),
            m.score,
            &m.description,
            Some(&url),
        );
    }

    if let Some(narrative) = &result.narrative {
        println!("\n{}", narrative);
    }

    Ok(())
}
