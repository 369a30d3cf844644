use super::batch::{Batch, Batcher};
use super::store::{ApplyOutcome, ResultStore};
use super::worker::{WorkerContext, worker_thread};
use crate::config::ApplyConfig;
use crate::error::{ApplyError, Result};
use crate::progress::{IndicatifDisplay, ProgressDisplay, Reporter, channel};
use crossbeam::channel::{Receiver, Sender, bounded};
use std::time::Instant;

/// Pool coordinator: splits the input, runs one task per batch on a bounded
/// set of worker threads, and reassembles the results in input order
#[derive(Debug, Clone)]
pub struct ParallelApplier {
    config: ApplyConfig,
}

impl ParallelApplier {
    /// Fails fast on invalid configuration, before anything is dispatched
    pub fn new(config: ApplyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ApplyConfig {
        &self.config
    }

    /// Apply `apply_fn` to every item and return the successful results in input order.
    ///
    /// Items the function fails on are dropped, so the result may be shorter
    /// than `items`. Use [`ParallelApplier::run_detailed`] to see what was dropped.
    ///
    /// Only returned errors count as item failures. If `apply_fn` panics, the
    /// worker thread running it dies and the whole run fails with
    /// [`ApplyError::WorkerPanicked`]; no partial results are returned.
    pub fn run<T, R, F>(&self, items: &[T], apply_fn: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send + Sync,
        F: Fn(&T) -> anyhow::Result<R> + Sync,
    {
        Ok(self.run_detailed(items, apply_fn)?.results)
    }

    /// Like [`ParallelApplier::run`], but also reports every dropped item
    pub fn run_detailed<T, R, F>(&self, items: &[T], apply_fn: F) -> Result<ApplyOutcome<R>>
    where
        T: Sync,
        R: Send + Sync,
        F: Fn(&T) -> anyhow::Result<R> + Sync,
    {
        if self.config.show_progress {
            let display = IndicatifDisplay::new(self.config.refresh_rate_hz);
            self.execute(items, &apply_fn, Some(display))
        } else {
            self.execute(items, &apply_fn, None::<IndicatifDisplay>)
        }
    }

    /// Run with a caller-supplied progress display, regardless of `show_progress`
    pub fn run_with_display<T, R, F, D>(
        &self,
        items: &[T],
        apply_fn: F,
        display: D,
    ) -> Result<ApplyOutcome<R>>
    where
        T: Sync,
        R: Send + Sync,
        F: Fn(&T) -> anyhow::Result<R> + Sync,
        D: ProgressDisplay + Send,
    {
        self.execute(items, &apply_fn, Some(display))
    }

    fn execute<T, R, F, D>(
        &self,
        items: &[T],
        apply_fn: &F,
        display: Option<D>,
    ) -> Result<ApplyOutcome<R>>
    where
        T: Sync,
        R: Send + Sync,
        F: Fn(&T) -> anyhow::Result<R> + Sync,
        D: ProgressDisplay + Send,
    {
        let start_time = Instant::now();
        let batches = Batcher::new(self.config.batch_size)?.split(items);
        let total_batches = batches.len();

        if total_batches == 0 {
            tracing::debug!("Parallel apply: empty input, nothing to dispatch");
            return Ok(ApplyOutcome {
                results: Vec::new(),
                failures: Vec::new(),
            });
        }

        // Never start more threads than there are batches to hand out
        let workers = std::cmp::min(self.config.num_workers, total_batches);
        tracing::debug!(
            "Parallel apply: {} items in {} batches of up to {} on {} workers",
            items.len(),
            total_batches,
            self.config.batch_size,
            workers
        );

        let task_sizes: Vec<usize> = batches.iter().map(Batch::size).collect();
        let store = ResultStore::new();
        let (work_tx, work_rx): (Sender<Batch<'_, T>>, Receiver<Batch<'_, T>>) =
            bounded(workers * 2);

        let (progress, reporter) = match display {
            Some(display) => {
                let (progress, inbox, shutdown) = channel::open();
                let reporter =
                    Reporter::new(inbox, task_sizes, display, self.config.idle_timeout());
                (Some(progress), Some((reporter, shutdown)))
            }
            None => (None, None),
        };

        let panicked = crossbeam::thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|slot| {
                    let ctx = WorkerContext {
                        slot,
                        work_rx: work_rx.clone(),
                        store: &store,
                        apply_fn,
                        update_every: self.config.update_every,
                        progress: progress.clone(),
                    };
                    s.spawn(move |_| worker_thread(ctx))
                })
                .collect();

            // Workers hold the only receivers and progress senders from here on
            drop(work_rx);
            drop(progress);

            // Producer: feed batches in index order, bounded only by free slots
            let producer = s.spawn(move |_| {
                for batch in batches {
                    if work_tx.send(batch).is_err() {
                        break; // Workers dropped
                    }
                }
            });

            let reporter = reporter.map(|(mut reporter, shutdown)| {
                (s.spawn(move |_| reporter.run()), shutdown)
            });

            let mut panicked = handles
                .into_iter()
                .map(|handle| handle.join())
                .filter(std::result::Result::is_err)
                .count();
            if producer.join().is_err() {
                panicked += 1;
            }

            if let Some((handle, shutdown)) = reporter {
                shutdown.signal();
                match handle.join() {
                    Ok(exit) => tracing::trace!("Progress reporter joined ({:?})", exit),
                    Err(_) => tracing::warn!("Progress reporter panicked"),
                }
            }

            panicked
        })
        .map_err(|_| ApplyError::WorkerPanicked { panicked: 1 })?;

        if panicked > 0 {
            return Err(ApplyError::WorkerPanicked { panicked });
        }

        assert_eq!(
            store.len(),
            total_batches,
            "Not all batches were processed"
        );

        let outcome = store.into_outcome(total_batches);
        tracing::debug!(
            "Parallel apply completed in {:.2}s ({} results, {} dropped, {} workers)",
            start_time.elapsed().as_secs_f64(),
            outcome.results.len(),
            outcome.failures.len(),
            workers
        );
        Ok(outcome)
    }
}
