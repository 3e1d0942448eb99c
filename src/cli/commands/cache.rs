//! Cache command implementation.

use crate::cache::{PersistentEmbeddingCache, VectorCache};
use crate::cli::{CacheAction, Output};
use crate::config::Settings;
use crate::orchestrator::create_cache;
use anyhow::Result;

/// Run the cache command.
///
/// Only the persistent cache outlives a process, so the in-memory cache is
/// always empty here.
pub fn run_cache(action: &CacheAction, settings: Settings) -> Result<()> {
    if !settings.cache.persistent {
        Output::warning("cache.persistent is false; the in-memory cache lives only inside `vidlens serve`.");
        Output::info("Use GET /cache/stats and POST /cache/clear on a running server instead.");
        return Ok(());
    }

    match action {
        CacheAction::Stats => {
            let stats = create_cache(&settings)?.stats();
            Output::header("Query Embedding Cache");
            Output::kv("Path", &settings.cache_path().display().to_string());
            Output::kv("Entries", &format!("{}/{}", stats.size, stats.capacity));
        }

        CacheAction::Clear => {
            let cache = create_cache(&settings)?;
            let cleared = cache.stats().size;
            cache.clear();
            Output::success(&format!("Cleared {} cached embeddings", cleared));
        }

        CacheAction::Sweep { days } => {
            let days = days.unwrap_or(settings.cache.max_age_days);
            let cache = PersistentEmbeddingCache::open(&settings.cache_path(), settings.cache.capacity)?;
            let swept = cache.sweep_older_than(days)?;
            Output::success(&format!(
                "Removed {} entries unused for {} days",
                swept, days
            ));
        }
    }

    Ok(())
}
