use crate::config::Settings;
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use crate::rate_limit::{RateLimiter, RateLimits};
use std::sync::Arc;

/// Shared state for all handlers.
pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Absent when rate limiting is disabled.
    pub limiter: Option<RateLimiter>,
}

impl AppState {
    /// Build state with the providers named in `settings`.
    pub fn from_settings(settings: Settings) -> Result<Arc<Self>> {
        let orchestrator = Orchestrator::new(settings)?;
        Self::new(orchestrator)
    }

    /// Wrap an existing orchestrator, creating the limiter from its settings.
    pub fn new(orchestrator: Orchestrator) -> Result<Arc<Self>> {
        let limits = &orchestrator.settings().rate_limit;
        let limiter = if limits.enabled {
            Some(
                RateLimiter::new(RateLimits {
                    per_minute: limits.per_minute,
                    per_hour: limits.per_hour,
                })?
                .with_sweep_every(limits.sweep_every),
            )
        } else {
            None
        };

        Ok(Arc::new(Self {
            orchestrator,
            limiter,
        }))
    }
}
