//! Serve command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::server::{self, AppState};
use anyhow::Result;

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let rate_limit = settings.rate_limit.clone();
    let visual = settings.visual.enabled;

    let state = AppState::from_settings(settings)?;

    Output::header("vidlens API Server");
    println!();
    Output::success(&format!("Listening on http://{}:{}", host, port));
    println!();
    println!("Endpoints:");
    Output::kv("Process", "POST /process_video");
    Output::kv("Chat", "POST /chat");
    Output::kv("Visual search", "POST /visual_search");
    Output::kv("Videos", "GET  /videos, GET|DELETE /video/{video_id}");
    Output::kv("Admin", "GET  /cache/stats, POST /cache/clear, GET /rate_limit/{client_id}");
    println!();
    if rate_limit.enabled {
        Output::kv(
            "Rate limit",
            &format!("{}/minute, {}/hour per client", rate_limit.per_minute, rate_limit.per_hour),
        );
    } else {
        Output::warning("Rate limiting is disabled.");
    }
    Output::kv("Visual indexing", if visual { "enabled" } else { "disabled" });
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    server::serve(state, &host, port).await
}
