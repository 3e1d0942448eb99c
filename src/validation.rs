//! Request input validation.
//!
//! Only YouTube hosts are accepted so user-supplied URLs can never point the
//! downloader at internal addresses.

use crate::error::{Result, VidlensError};
use url::Url;

/// Maximum accepted URL length.
pub const MAX_URL_LEN: usize = 500;
/// Maximum video id length.
pub const MAX_VIDEO_ID_LEN: usize = 64;

const ALLOWED_HOSTS: [&str; 4] = ["youtube.com", "www.youtube.com", "m.youtube.com", "youtu.be"];

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Validate a YouTube URL and extract its video id.
///
/// Supports `watch?v=`, `youtu.be/`, `/embed/`, `/v/` and `/shorts/` forms.
pub fn extract_video_id(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(VidlensError::InvalidInput("YouTube URL is required".into()));
    }
    if input.len() > MAX_URL_LEN {
        return Err(VidlensError::InvalidInput(format!(
            "URL too long (max {} characters)",
            MAX_URL_LEN
        )));
    }

    let url = Url::parse(input)
        .map_err(|e| VidlensError::InvalidInput(format!("Invalid URL: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(VidlensError::InvalidInput(
            "Only http and https URLs are allowed".into(),
        ));
    }

    let host = url.host_str().unwrap_or_default().to_lowercase();
    if !ALLOWED_HOSTS.contains(&host.as_str()) {
        return Err(VidlensError::InvalidInput(format!(
            "Only YouTube URLs are allowed, got host {:?}",
            host
        )));
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    let candidate = if host == "youtu.be" {
        match segments.as_slice() {
            ["shorts", id, ..] => Some(id.to_string()),
            [id, ..] => Some(id.to_string()),
            _ => None,
        }
    } else {
        match segments.as_slice() {
            ["watch"] => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            ["embed" | "v" | "shorts", id, ..] => Some(id.to_string()),
            _ => None,
        }
    };

    let id = candidate.ok_or_else(|| {
        VidlensError::InvalidInput(
            "Invalid YouTube URL format. Supported formats: youtube.com/watch?v=, youtu.be/, \
             youtube.com/shorts/, youtube.com/embed/"
                .into(),
        )
    })?;

    validate_video_id(&id)?;
    Ok(id)
}

/// Check a video id: 1 to 64 characters of `[A-Za-z0-9_-]`.
pub fn validate_video_id(video_id: &str) -> Result<()> {
    if video_id.is_empty() || video_id.len() > MAX_VIDEO_ID_LEN {
        return Err(VidlensError::InvalidInput(format!(
            "Video id must be 1-{} characters",
            MAX_VIDEO_ID_LEN
        )));
    }
    if !video_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(VidlensError::InvalidInput(
            "Video id may only contain letters, digits, '_' and '-'".into(),
        ));
    }
    Ok(())
}

/// Validate a question or search query and return it trimmed.
pub fn validate_question(text: &str, max_chars: usize) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(VidlensError::InvalidInput("Question cannot be empty".into()));
    }
    let count = trimmed.chars().count();
    if count > max_chars {
        return Err(VidlensError::InvalidInput(format!(
            "Question too long ({} characters, max {})",
            count, max_chars
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_supported_formats() {
        let cases = [
            ("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://m.youtube.com/watch?v=dQw4w9WgXcQ&t=42", "dQw4w9WgXcQ"),
            ("https://youtu.be/dQw4w9WgXcQ?si=abc", "dQw4w9WgXcQ"),
            ("https://www.youtube.com/embed/dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://www.youtube.com/v/dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://www.youtube.com/shorts/abc123XYZ_-", "abc123XYZ_-"),
            ("http://youtu.be/shorts/abc123", "abc123"),
        ];

        for (url, expected) in cases {
            assert_eq!(extract_video_id(url).unwrap(), expected, "{}", url);
        }
    }

    #[test]
    fn test_rejects_other_hosts() {
        for url in [
            "https://evil.com/watch?v=dQw4w9WgXcQ",
            "http://169.254.169.254/latest/meta-data",
            "https://youtube.com.evil.com/watch?v=abc",
            "file:///etc/passwd",
            "ftp://youtube.com/watch?v=abc",
            "not a url",
            "",
        ] {
            assert!(
                matches!(extract_video_id(url), Err(VidlensError::InvalidInput(_))),
                "{} was accepted",
                url
            );
        }
    }

    #[test]
    fn test_rejects_long_url() {
        let url = format!("https://www.youtube.com/watch?v=abc&x={}", "a".repeat(500));
        assert!(extract_video_id(&url).is_err());
    }

    #[test]
    fn test_rejects_missing_or_bad_id() {
        assert!(extract_video_id("https://www.youtube.com/watch").is_err());
        assert!(extract_video_id("https://www.youtube.com/channel/xyz").is_err());
        assert!(extract_video_id("https://www.youtube.com/watch?v=bad%20id").is_err());
    }

    #[test]
    fn test_validate_video_id() {
        assert!(validate_video_id("dQw4w9WgXcQ").is_ok());
        assert!(validate_video_id("").is_err());
        assert!(validate_video_id("../etc").is_err());
        assert!(validate_video_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_question() {
        assert_eq!(validate_question("  What happens?  ", 2000).unwrap(), "What happens?");
        assert!(validate_question("   \n\t", 2000).is_err());
        assert!(validate_question(&"x".repeat(2001), 2000).is_err());
        assert!(validate_question(&"é".repeat(2000), 2000).is_ok());
    }
}
