//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::transcript::format_timestamp;
use crate::validation::watch_url;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(video_id: &str, question: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Query, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching video...");
    let response = orchestrator.ask(video_id, question).await;
    spinner.finish_and_clear();

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    };

    println!("\n{}\n", response.answer);

    if !response.relevant_timestamps.is_empty() {
        Output::header(&format!("Sources ({})", response.sources_count));
        for source in &response.relevant_timestamps {
            let url = format!("{}&t={}s", watch_url(video_id), source.timestamp as u64);
            Output::citation(&format_timestamp(source.timestamp), &source.text, &url);
        }
    }

    Ok(())
}
