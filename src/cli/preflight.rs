//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and API keys are available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, VidlensError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Processing needs yt-dlp, provider keys, and ffmpeg for visual indexing.
    Process,
    /// Questions and searches need provider keys.
    Query,
    /// Listing and inspecting stored videos needs nothing external.
    Inspect,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Process => {
            check_provider_keys(settings)?;
            check_tool("yt-dlp")?;
            if settings.visual.enabled {
                check_tool("ffmpeg")?;
            }
        }
        Operation::Query => {
            check_provider_keys(settings)?;
        }
        Operation::Inspect => {}
    }
    Ok(())
}

/// Environment variables accepted for a provider, in lookup order.
fn key_names(provider: &str) -> &'static [&'static str] {
    match provider.to_lowercase().as_str() {
        "openai" => &["OPENAI_API_KEY"],
        _ => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
    }
}

fn check_provider_keys(settings: &Settings) -> Result<()> {
    check_api_key(key_names(&settings.embedding.provider))?;
    check_api_key(key_names(&settings.generation.provider))
}

/// Check that at least one of `names` is set and non-empty.
fn check_api_key(names: &[&str]) -> Result<()> {
    let found = names
        .iter()
        .any(|name| std::env::var(name).is_ok_and(|key| !key.is_empty()));
    if found {
        Ok(())
    } else {
        Err(VidlensError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            names.join(" or "),
            names[0]
        )))
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    // ffmpeg uses -version (single dash), yt-dlp uses --version
    let version_arg = match name {
        "ffmpeg" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(VidlensError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidlensError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(VidlensError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
