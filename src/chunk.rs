//! Fixed-size chunking of fallible row streams

/// Default number of rows per insert batch
pub const DEFAULT_BATCH_SIZE: usize = 1_000_000;

/// Groups the `Ok` items of a fallible iterator into vectors of at most `size`.
///
/// The first error is yielded on its own, after which the iterator is
/// exhausted; rows buffered before the error are discarded because a failed
/// load is never partially written.
pub struct TryChunks<I> {
    inner: I,
    size: usize,
    done: bool,
}

impl<I, T, E> Iterator for TryChunks<I>
where
    I: Iterator<Item = std::result::Result<T, E>>,
{
    type Item = std::result::Result<Vec<T>, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut chunk = Vec::with_capacity(self.size.min(DEFAULT_BATCH_SIZE));
        while chunk.len() < self.size {
            match self.inner.next() {
                Some(Ok(item)) => chunk.push(item),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        if chunk.is_empty() { None } else { Some(Ok(chunk)) }
    }
}

/// Chunk a fallible iterator. `size` is clamped to at least 1.
pub fn try_chunks<I>(inner: I, size: usize) -> TryChunks<I::IntoIter>
where
    I: IntoIterator,
{
    TryChunks {
        inner: inner.into_iter(),
        size: size.max(1),
        done: false,
    }
}
