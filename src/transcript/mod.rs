//! Transcript and section models, plus helpers for working with model output.

mod youtube;

pub use youtube::{TranscriptSource, YtDlpTranscriptSource};

use crate::error::{Result, VidlensError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// One caption entry as delivered by the transcript source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Caption text.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds. Some sources omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl TranscriptEntry {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration: Some(duration),
        }
    }
}

/// A titled section of a video, produced by the generation provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSection {
    pub title: String,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub end_time: f64,
    #[serde(default)]
    pub summary: String,
}

/// Section breakdown returned by the generation provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionBreakdown {
    #[serde(default)]
    pub sections: Vec<GeneratedSection>,
    /// Free-form description of the video, present when it was analyzed
    /// without a transcript.
    #[serde(default)]
    pub transcript: Option<String>,
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Render a transcript as `[MM:SS] text` lines for a prompt.
pub fn format_transcript(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("[{}] {}", format_timestamp(e.start), e.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render sections as `[MM:SS] title: summary` paragraphs for a prompt.
pub fn format_sections(sections: &[GeneratedSection]) -> String {
    sections
        .iter()
        .map(|s| format!("[{}] {}: {}", format_timestamp(s.start_time), s.title, s.summary))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Extract and parse the JSON object in a model response.
///
/// Accepts a fenced ```json block, a bare object surrounded by prose, or the
/// whole text.
pub fn parse_json_response<T: serde::de::DeserializeOwned>(text: &str) -> Result<T> {
    static FENCED: OnceLock<Regex> = OnceLock::new();
    static OBJECT: OnceLock<Regex> = OnceLock::new();

    let fenced = FENCED.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid regex"));
    let object = OBJECT.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

    let candidate = if let Some(caps) = fenced.captures(text) {
        caps.get(1).map(|m| m.as_str()).unwrap_or(text)
    } else if let Some(m) = object.find(text) {
        m.as_str()
    } else {
        text
    };

    serde_json::from_str(candidate).map_err(|e| {
        let preview: String = text.chars().take(500).collect();
        VidlensError::Generation(format!("Failed to parse JSON response: {}\nResponse: {}", e, preview))
    })
}
