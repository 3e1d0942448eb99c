//! CLI output formatting utilities.

use crate::store::VideoSummary;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a one-line video summary.
    pub fn video_summary(video: &VideoSummary) {
        let frames = if video.frame_count > 0 {
            format!(", {} frames", video.frame_count)
        } else {
            String::new()
        };
        println!(
            "  {} {} ({}, {} chunks{}, {})",
            style("*").cyan(),
            style(&video.video_id).bold(),
            video.processing_mode,
            video.chunk_count,
            frames,
            style(video.processed_at.format("%Y-%m-%d %H:%M")).dim()
        );
    }

    /// Print a ranked moment.
    pub fn moment(timestamp: &str, label: &str, score: f32, content: &str, url: Option<&str>) {
        println!(
            "\n{} {} {} (score: {:.2})",
            style(">>").green(),
            style(timestamp).cyan(),
            style(label).bold(),
            score
        );
        println!("   {}", content_preview(content, 200));
        if let Some(u) = url {
            println!("   {}", style(u).dim());
        }
    }

    /// Print a cited moment of an answer.
    pub fn citation(timestamp: &str, content: &str, url: &str) {
        println!("\n{} {}", style(">>").green(), style(timestamp).cyan());
        println!("   {}", content_preview(content, 200));
        println!("   {}", style(url).dim());
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let head: String = content.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
