use super::batch::Batch;
use super::store::{ItemFailure, ItemOutcome, ResultStore};
use crate::progress::WorkerProgress;
use crossbeam::channel::Receiver;

/// Context for a pool thread, to avoid too many function parameters
pub(crate) struct WorkerContext<'env, T, R, F> {
    pub slot: usize,
    pub work_rx: Receiver<Batch<'env, T>>,
    pub store: &'env ResultStore<R>,
    pub apply_fn: &'env F,
    pub update_every: usize,
    pub progress: Option<WorkerProgress>,
}

/// Pull batches off the work queue until the producer closes it
pub(crate) fn worker_thread<T, R, F>(ctx: WorkerContext<'_, T, R, F>)
where
    F: Fn(&T) -> anyhow::Result<R>,
{
    let mut processed = 0usize;
    while let Ok(batch) = ctx.work_rx.recv() {
        process_batch(
            &batch,
            ctx.apply_fn,
            ctx.store,
            ctx.update_every,
            ctx.progress.as_ref(),
        );
        processed += 1;
    }
    tracing::trace!("Worker slot {} exiting after {} batches", ctx.slot, processed);
}

/// Run one batch to completion and publish it.
///
/// The task id reported on the progress channel is the batch index, which is
/// also the order batches are dispatched in. Results are written to the store
/// before `finished` is emitted.
pub fn process_batch<T, R, F>(
    batch: &Batch<'_, T>,
    apply_fn: &F,
    store: &ResultStore<R>,
    update_every: usize,
    progress: Option<&WorkerProgress>,
) where
    F: Fn(&T) -> anyhow::Result<R>,
{
    let task_id = batch.batch_index;
    tracing::trace!(
        "Batch {} started ({} items from offset {})",
        task_id,
        batch.size(),
        batch.offset
    );

    let outcomes = apply_batch(batch, apply_fn, update_every, progress);

    if !store.insert(batch.batch_index, outcomes) {
        tracing::warn!("Batch {} was already recorded, keeping the first result", task_id);
    }
    if let Some(progress) = progress {
        progress.finished(task_id);
    }
    tracing::trace!("Batch {} finished", task_id);
}

/// Apply `apply_fn` to every item of the batch in order.
///
/// A failing item does not stop the batch: its error is captured as an
/// `ItemFailure` in that item's position. A step event is sent for every
/// `update_every`-th local offset whether or not the item succeeded.
pub fn apply_batch<T, R, F>(
    batch: &Batch<'_, T>,
    apply_fn: &F,
    update_every: usize,
    progress: Option<&WorkerProgress>,
) -> Vec<ItemOutcome<R>>
where
    F: Fn(&T) -> anyhow::Result<R>,
{
    let task_id = batch.batch_index;
    if let Some(progress) = progress {
        progress.started(task_id, batch.size());
    }

    let mut outcomes = Vec::with_capacity(batch.size());
    for (local, item) in batch.items.iter().enumerate() {
        let outcome = apply_fn(item).map_err(|err| {
            let index = batch.offset + local;
            tracing::debug!("Dropping item {} in batch {}: {:#}", index, task_id, err);
            ItemFailure {
                index,
                batch_index: task_id,
                message: format!("{err:#}"),
            }
        });
        outcomes.push(outcome);

        if local % update_every == 0
            && let Some(progress) = progress
        {
            progress.step(task_id, local);
        }
    }
    outcomes
}
