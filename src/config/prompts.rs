//! Prompt templates for vidlens.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub sections: SectionPrompts,
    pub chat: ChatPrompts,
    pub visual: VisualPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for section breakdowns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionPrompts {
    /// Used when a transcript is available.
    pub transcript: String,
    /// Used when the model must watch the video itself.
    pub video_analysis: String,
}

impl Default for SectionPrompts {
    fn default() -> Self {
        Self {
            transcript: r#"Analyze this video transcript and create a section breakdown.
Each section should have a clear title, start time (in seconds), end time (in seconds), and brief summary.

Transcript with timestamps:
{{transcript}}

Return ONLY a valid JSON object (no markdown formatting) in this exact format:
{
    "sections": [
        {
            "title": "Introduction",
            "start_time": 0.0,
            "end_time": 45.0,
            "summary": "Brief summary of what's covered in this section"
        }
    ]
}

Create 3-7 logical sections based on the content. Make timestamps precise and summaries concise (1-2 sentences)."#
                .to_string(),

            video_analysis: r#"Analyze this video and provide a detailed breakdown with timestamps.

Return ONLY a valid JSON object (no markdown formatting) in this exact format:
{
    "sections": [
        {
            "title": "Section Title",
            "start_time": 0.0,
            "end_time": 45.0,
            "summary": "Brief summary of what's covered in this section"
        }
    ],
    "transcript": "Detailed description of the video content with approximate timestamps"
}

Create 3-7 logical sections based on the video content. Make timestamps precise and summaries concise (1-2 sentences)."#
                .to_string(),
        }
    }
}

/// Prompts for answering questions about a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    pub answer: String,
    /// Answer returned without calling the model when a video has no content.
    pub no_content: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            answer: r#"You are a helpful video analysis assistant. Answer the user's question based on the video transcript context provided.

Context from video (with timestamps):
{{context}}

Question: {{question}}

IMPORTANT INSTRUCTIONS:
1. In your answer, include timestamp citations in [MM:SS] format for any specific portions of the video you reference
2. Use timestamps from the context provided above
3. Be specific and cite multiple timestamps when relevant

Examples of good responses:
- "The introduction starts at [00:00] and covers the main topics."
- "The concept is explained at [02:30], with examples shown at [03:45] and [05:15]."

Answer naturally and conversationally, but include timestamp citations for accuracy."#
                .to_string(),

            no_content: "This video has no indexed content to answer from yet.".to_string(),
        }
    }
}

/// Prompts for frame descriptions and visual search summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualPrompts {
    pub frame_description: String,
    pub narrative: String,
}

impl Default for VisualPrompts {
    fn default() -> Self {
        Self {
            frame_description: r#"Describe what is visible in this video frame captured at {{timestamp}}.
Mention people, on-screen text, slides, charts, code, diagrams and notable objects.
Answer in 2-3 factual sentences without speculation."#
                .to_string(),

            narrative: r#"A user searched a video for: "{{query}}"

These moments matched, best first:
{{matches}}

In 2-3 sentences, summarize where the requested visual content appears. Cite moments as [MM:SS]."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let sections_path = custom_path.join("sections.toml");
            if sections_path.exists() {
                let content = std::fs::read_to_string(&sections_path)?;
                prompts.sections = toml::from_str(&content)?;
            }

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
            }

            let visual_path = custom_path.join("visual.toml");
            if visual_path.exists() {
                let content = std::fs::read_to_string(&visual_path)?;
                prompts.visual = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &[(&str, String)]) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.to_string(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.sections.transcript.contains("{{transcript}}"));
        assert!(prompts.chat.answer.contains("{{question}}"));
        assert!(prompts.visual.narrative.contains("{{matches}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("tone".into(), "formal".into());
        prompts.variables.insert("question".into(), "ignored".into());

        let rendered = prompts.render_with_custom(
            "{{tone}}: {{question}}",
            &[("question", "why?".to_string())],
        );
        assert_eq!(rendered, "formal: why?");
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("chat.toml"),
            "answer = \"Q: {{question}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.chat.answer, "Q: {{question}}");
        // Unset fields keep defaults.
        assert!(!prompts.chat.no_content.is_empty());
        assert!(prompts.sections.transcript.contains("3-7"));
    }
}
