//! Configuration settings for vidlens.

use crate::error::{Result, VidlensError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub chunking: ChunkingSettings,
    pub cache: CacheSettings,
    pub rate_limit: RateLimitSettings,
    pub rag: RagSettings,
    pub visual: VisualSettings,
    pub store: StoreSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for downloaded media and extracted frames.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Emit logs as JSON lines.
    pub json_logs: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.vidlens".to_string(),
            temp_dir: "/tmp/vidlens".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (gemini, openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions (openai only).
    pub dimensions: u32,
    /// Maximum texts per provider request.
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "text-embedding-004".to_string(),
            dimensions: 768,
            batch_size: 100,
        }
    }
}

/// Text generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Generation provider (gemini, openai).
    pub provider: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.5-pro".to_string(),
            temperature: 0.3,
        }
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk span in seconds.
    pub max_chunk_seconds: f64,
    /// Duration assumed for caption entries that omit one.
    pub default_entry_duration: f64,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            max_chunk_seconds: 30.0,
            default_entry_duration: crate::chunking::DEFAULT_ENTRY_DURATION,
        }
    }
}

/// Embedding cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum number of cached embeddings.
    pub capacity: usize,
    /// Keep the cache in SQLite so it survives restarts.
    pub persistent: bool,
    /// Path of the persistent cache database.
    pub path: String,
    /// Age after which persistent entries are swept.
    pub max_age_days: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: 1000,
            persistent: false,
            path: "~/.vidlens/cache.db".to_string(),
            max_age_days: 30,
        }
    }
}

/// Request rate limiting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub per_minute: u32,
    pub per_hour: u32,
    /// Evict idle clients once every this many checks. 0 disables.
    pub sweep_every: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            per_minute: 20,
            per_hour: 200,
            sweep_every: 256,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Chunks used as context for an answer.
    pub top_k: usize,
    /// Matches returned by visual search.
    pub visual_top_k: usize,
    /// Maximum question length in characters.
    pub max_question_chars: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            visual_top_k: 5,
            max_question_chars: 2000,
        }
    }
}

/// Visual frame indexing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSettings {
    /// Extract and describe frames while processing a video.
    pub enabled: bool,
    /// Seconds between captured frames.
    pub frame_interval_seconds: u32,
    /// Upper bound on frames per video.
    pub max_frames: usize,
    /// Concurrent frame description requests.
    pub max_concurrent: usize,
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            frame_interval_seconds: 10,
            max_frames: 60,
            max_concurrent: 4,
        }
    }
}

/// Video store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.vidlens/videos.db".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| VidlensError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Set a single value by dotted key, e.g. `rate_limit.per_minute`.
    ///
    /// The value is parsed as a TOML literal when possible, otherwise taken as
    /// a string. The updated settings must still deserialize.
    pub fn set_value(&mut self, key: &str, raw: &str) -> Result<()> {
        let (section, field) = key
            .split_once('.')
            .ok_or_else(|| VidlensError::Config(format!("Expected section.key, got {}", key)))?;

        let value = parse_toml_literal(raw);
        let mut doc = toml::Value::try_from(&*self)
            .map_err(|e| VidlensError::Config(e.to_string()))?;

        let table = doc
            .get_mut(section)
            .and_then(|v| v.as_table_mut())
            .ok_or_else(|| VidlensError::Config(format!("Unknown config section: {}", section)))?;

        if !table.contains_key(field) {
            return Err(VidlensError::Config(format!("Unknown config key: {}", key)));
        }
        table.insert(field.to_string(), value);

        *self = doc
            .try_into()
            .map_err(|e: toml::de::Error| VidlensError::Config(format!("Invalid value for {}: {}", key, e)))?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidlens")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.store.sqlite_path)
    }

    /// Get the expanded persistent cache path.
    pub fn cache_path(&self) -> PathBuf {
        Self::expand_path(&self.cache.path)
    }
}

fn parse_toml_literal(raw: &str) -> toml::Value {
    toml::from_str::<HashMap<String, toml::Value>>(&format!("v = {}", raw))
        .ok()
        .and_then(|mut m| m.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}
