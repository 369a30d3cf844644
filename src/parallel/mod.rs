//! Batched parallel execution engine
//!
//! # Architecture
//!
//! ```text
//! items ──▶ Batcher ──▶ work queue ──▶ worker pool (num_workers threads)
//!                                         │            │
//!                                         │            └──▶ progress channel ──▶ reporter thread
//!                                         ▼
//!                                    ResultStore (batch_index → outcomes)
//!                                         │
//!                                         ▼
//!                              flattened results, input order
//! ```
//!
//! - **Batcher** cuts the input into contiguous, fixed-size slices numbered from 0.
//! - **Workers** each take one batch at a time, apply the function item by item,
//!   and write the whole batch into the store under its index. A failing item is
//!   recorded as a failure in place and never aborts the batch.
//! - **ParallelApplier** owns the pool. It feeds batches through a bounded queue,
//!   starts the progress reporter on its own thread, joins every worker, then
//!   stops the reporter.
//! - **ResultStore** is read back in batch-index order, independent of the order
//!   batches completed in.
//!
//! # Example
//!
//! ```rust
//! use parapply::{ApplyConfig, ParallelApplier};
//!
//! let config = ApplyConfig::default()
//!     .with_workers(4)
//!     .with_batch_size(100)
//!     .with_progress(false);
//! let applier = ParallelApplier::new(config)?;
//!
//! let items: Vec<u32> = (0..1_000).collect();
//! let doubled = applier.run(&items, |x| Ok(x * 2))?;
//! assert_eq!(doubled[999], 1_998);
//! # Ok::<(), parapply::ApplyError>(())
//! ```

pub mod batch;
pub mod core;
pub mod store;
pub mod worker;

pub use batch::{Batch, Batcher};
pub use core::ParallelApplier;
pub use store::{ApplyOutcome, ItemFailure, ItemOutcome, ResultStore};
