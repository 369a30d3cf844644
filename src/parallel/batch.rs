use crate::error::ConfigError;

/// A contiguous slice of the input tagged with its position among all batches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Batch<'a, T> {
    /// 0-based index, increasing with `offset`
    pub batch_index: usize,
    /// Offset of the first item within the full input
    pub offset: usize,
    pub items: &'a [T],
}

impl<T> Batch<'_, T> {
    pub fn size(&self) -> usize {
        self.items.len()
    }
}

/// Splits an ordered input into fixed-size batches
///
/// Batch `i` covers input offsets `[i * batch_size, min((i + 1) * batch_size, len))`;
/// only the last batch may be shorter than `batch_size`.
#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    batch_size: usize,
}

impl Batcher {
    pub fn new(batch_size: usize) -> Result<Self, ConfigError> {
        if batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(Self { batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches `split` would produce for `len` items
    pub fn batch_count(&self, len: usize) -> usize {
        len.div_ceil(self.batch_size)
    }

    pub fn split<'a, T>(&self, items: &'a [T]) -> Vec<Batch<'a, T>> {
        items
            .chunks(self.batch_size)
            .enumerate()
            .map(|(batch_index, chunk)| Batch {
                batch_index,
                offset: batch_index * self.batch_size,
                items: chunk,
            })
            .collect()
    }
}
