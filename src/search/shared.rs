use std::sync::{Arc, PoisonError, RwLock};

use super::index::CorpusIndex;

/// A swappable handle to an immutable [`CorpusIndex`].
///
/// Readers take a snapshot and rank against it without holding the lock;
/// a reload replaces the whole index at once, so a query sees either the old
/// or the new `(items, vectors)` pair, never a mix.
pub struct SharedIndex<T> {
    current: RwLock<Arc<CorpusIndex<T>>>,
}

impl<T> SharedIndex<T> {
    pub fn new(index: CorpusIndex<T>) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    pub fn snapshot(&self) -> Arc<CorpusIndex<T>> {
        // The guarded value is only ever replaced wholesale, so a poisoned
        // lock still holds a complete index.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in `index`, returning the one it replaced
    pub fn replace(&self, index: CorpusIndex<T>) -> Arc<CorpusIndex<T>> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(index))
    }
}
