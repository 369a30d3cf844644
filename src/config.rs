use crate::error::{ConfigError, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment prefix for configuration overrides (`PARAPPLY_BATCH_SIZE=64`)
pub const ENV_PREFIX: &str = "PARAPPLY_";

/// Configuration for a parallel apply run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyConfig {
    /// Number of worker threads in the pool
    pub num_workers: usize,
    /// Number of items handed to a worker at a time
    pub batch_size: usize,
    /// Whether to render live progress rows
    pub show_progress: bool,
    /// Emit a progress step every N items within a batch
    pub update_every: usize,
    /// Progress redraws per second
    pub refresh_rate_hz: u8,
    /// Seconds without progress after which the reporter closes the display
    pub idle_timeout_secs: f64,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            batch_size: 1024,
            show_progress: true,
            update_every: 10,
            refresh_rate_hz: 2,
            idle_timeout_secs: 1.0,
        }
    }
}

impl ApplyConfig {
    /// Load configuration layered as defaults < TOML file < `PARAPPLY_*` environment.
    ///
    /// A missing file is not an error. The merged result is validated before it is returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        tracing::trace!("CONFIG LOAD: Starting (file: {:?})", path);

        let mut figment = Figment::from(Serialized::defaults(ApplyConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let config: ApplyConfig = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;

        tracing::trace!("CONFIG LOAD: Final config = {:?}", config);
        config.validate()?;
        Ok(config)
    }

    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_update_every(mut self, update_every: usize) -> Self {
        self.update_every = update_every;
        self
    }

    pub fn with_refresh_rate(mut self, refresh_rate_hz: u8) -> Self {
        self.refresh_rate_hz = refresh_rate_hz;
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout_secs = idle_timeout.as_secs_f64();
        self
    }

    /// Idle timeout as a `Duration`. Only meaningful on a validated config.
    pub fn idle_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.idle_timeout_secs).unwrap_or(Duration::MAX)
    }

    /// Reject values that would make a run meaningless
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.num_workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.update_every == 0 {
            return Err(ConfigError::ZeroUpdateEvery);
        }
        if self.refresh_rate_hz == 0 {
            return Err(ConfigError::ZeroRefreshRate);
        }
        match Duration::try_from_secs_f64(self.idle_timeout_secs) {
            Ok(timeout) if !timeout.is_zero() => {}
            _ => return Err(ConfigError::InvalidIdleTimeout(self.idle_timeout_secs)),
        }
        Ok(())
    }
}
