use thiserror::Error;

/// Rejected configuration values, reported before any work is dispatched
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("batch_size must be greater than zero")]
    ZeroBatchSize,

    #[error("num_workers must be greater than zero")]
    ZeroWorkers,

    #[error("update_every must be greater than zero")]
    ZeroUpdateEvery,

    #[error("refresh_rate_hz must be greater than zero")]
    ZeroRefreshRate,

    #[error("idle_timeout_secs must be a positive number of seconds that fits in a Duration (got {0})")]
    InvalidIdleTimeout(f64),
}

/// Errors returned by a parallel apply run
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("failed to load configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("{panicked} worker thread(s) panicked during parallel execution")]
    WorkerPanicked { panicked: usize },
}

impl From<figment::Error> for ApplyError {
    fn from(err: figment::Error) -> Self {
        ApplyError::Config(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, ApplyError>;
