use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// An item the caller's function failed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Offset of the item in the full input
    pub index: usize,
    pub batch_index: usize,
    /// Rendered error chain
    pub message: String,
}

/// What one item produced: its result, or the failure standing in its place
pub type ItemOutcome<R> = Result<R, ItemFailure>;

/// Flattened results of a run plus the items that were dropped, both in input order
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome<R> {
    pub results: Vec<R>,
    pub failures: Vec<ItemFailure>,
}

/// Per-batch outcomes keyed by batch index
///
/// Shared by every worker; each batch index is written exactly once, by the
/// worker that processed it, so writers never contend for the same key.
#[derive(Debug)]
pub struct ResultStore<R> {
    batches: DashMap<usize, Vec<ItemOutcome<R>>>,
}

impl<R> ResultStore<R> {
    pub fn new() -> Self {
        Self {
            batches: DashMap::new(),
        }
    }

    /// Record a completed batch. Returns `false`, leaving the stored entry
    /// untouched, if the batch was already written.
    pub fn insert(&self, batch_index: usize, outcomes: Vec<ItemOutcome<R>>) -> bool {
        match self.batches.entry(batch_index) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(outcomes);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn contains(&self, batch_index: usize) -> bool {
        self.batches.contains_key(&batch_index)
    }

    /// Successful results of batches `0..total_batches`, concatenated in batch order.
    ///
    /// Reads without consuming, so repeated calls return the same sequence.
    pub fn flatten(&self, total_batches: usize) -> Vec<R>
    where
        R: Clone,
    {
        let ordered = (0..total_batches)
            .filter_map(|batch_index| self.batches.get(&batch_index).map(|o| o.value().clone()));
        split_in_batch_order(ordered).results
    }

    /// Consume the store, splitting outcomes into results and failures in batch order
    ///
    /// Walks the batches the same way as [`ResultStore::flatten`], so `results`
    /// always equals what `flatten` would have returned.
    pub fn into_outcome(self, total_batches: usize) -> ApplyOutcome<R> {
        let ordered = (0..total_batches)
            .filter_map(|batch_index| self.batches.remove(&batch_index).map(|(_, o)| o));
        split_in_batch_order(ordered)
    }
}

fn split_in_batch_order<R>(batches: impl Iterator<Item = Vec<ItemOutcome<R>>>) -> ApplyOutcome<R> {
    let mut results = Vec::new();
    let mut failures = Vec::new();

    for outcome in batches.flatten() {
        match outcome {
            Ok(result) => results.push(result),
            Err(failure) => failures.push(failure),
        }
    }

    ApplyOutcome { results, failures }
}

impl<R> Default for ResultStore<R> {
    fn default() -> Self {
        Self::new()
    }
}
