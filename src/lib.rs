//! # parapply - batched parallel apply with live progress
//!
//! Apply a fallible function to every item of a large collection on a bounded
//! pool of worker threads, watch per-batch progress rows while it runs, and get
//! the results back in the original input order.
//!
//! ## Quick Start
//!
//! ```rust
//! let words = vec!["a", "bb", "ccc"];
//!
//! let config = parapply::ApplyConfig::default()
//!     .with_batch_size(1)
//!     .with_progress(false);
//! let lengths = parapply::apply_parallel_with(
//!     &words,
//!     |w| {
//!         if *w == "bb" {
//!             anyhow::bail!("skip me");
//!         }
//!         Ok(w.len())
//!     },
//!     &config,
//! )?;
//!
//! // Items the function fails on are dropped
//! assert_eq!(lengths, vec![1, 3]);
//! # Ok::<(), parapply::ApplyError>(())
//! ```
//!
//! ## Behaviour
//!
//! - The input is split into contiguous batches of `batch_size` items; each batch
//!   is one task on the pool.
//! - An item whose function call returns `Err` is skipped. It never aborts its
//!   batch or the run. [`ParallelApplier::run_detailed`] returns the skipped
//!   items alongside the results.
//! - The function may be called concurrently for different items, so it must be
//!   `Sync`. It is never called twice for the same item.
//! - Progress rows are drawn on stderr by a separate reporter thread. The
//!   reporter closes on its own after `idle_timeout_secs` without progress, and
//!   is always stopped once the pool has finished.
//!
//! ## Configuration
//!
//! [`ApplyConfig::load`] layers built-in defaults, an optional TOML file, and
//! `PARAPPLY_*` environment variables.

pub mod config;
pub mod error;
pub mod parallel;
pub mod progress;

pub use config::ApplyConfig;
pub use error::{ApplyError, ConfigError, Result};
pub use parallel::{ApplyOutcome, ItemFailure, ParallelApplier};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Apply `apply_fn` to every item with the default configuration
pub fn apply_parallel<T, R, F>(items: &[T], apply_fn: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send + Sync,
    F: Fn(&T) -> anyhow::Result<R> + Sync,
{
    apply_parallel_with(items, apply_fn, &ApplyConfig::default())
}

/// Apply `apply_fn` to every item with an explicit configuration
pub fn apply_parallel_with<T, R, F>(items: &[T], apply_fn: F, config: &ApplyConfig) -> Result<Vec<R>>
where
    T: Sync,
    R: Send + Sync,
    F: Fn(&T) -> anyhow::Result<R> + Sync,
{
    ParallelApplier::new(config.clone())?.run(items, apply_fn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_parallel_defaults() {
        let items: Vec<i64> = (0..3000).collect();
        let results = apply_parallel(&items, |x| Ok(-x)).unwrap();
        assert_eq!(results.len(), 3000);
        assert_eq!(results[2999], -2999);
    }

    #[test]
    fn test_apply_parallel_with_rejects_bad_config() {
        let config = ApplyConfig::default().with_batch_size(0);
        let err = apply_parallel_with(&[1, 2, 3], |x| Ok(*x), &config).unwrap_err();
        assert!(matches!(err, ApplyError::InvalidConfig(ConfigError::ZeroBatchSize)));
    }
}
