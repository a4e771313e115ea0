//! Deferred destruction.
//!
//! Physics engines forbid removing bodies while contacts are being resolved.
//! Gameplay code therefore only *marks* entities during contact dispatch; the
//! queue is drained once the step has returned and the caller releases the
//! bodies then.

use std::collections::HashSet;
use std::hash::Hash;

/// A set of entities pending removal, drained in mark order.
///
/// Generic over the key so independent queues (bullets, level objects) can
/// use the same contract.
#[derive(Debug, Clone)]
pub struct DeferredDestructionQueue<T> {
    order: Vec<T>,
    pending: HashSet<T>,
}

impl<T> Default for DeferredDestructionQueue<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            pending: HashSet::new(),
        }
    }
}

impl<T: Copy + Eq + Hash> DeferredDestructionQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `item` for destruction.
    ///
    /// Returns `true` if it was newly enqueued, `false` if it was already
    /// pending. Marking the same item many times in one tick is harmless.
    pub fn mark(&mut self, item: T) -> bool {
        if !self.pending.insert(item) {
            return false;
        }
        self.order.push(item);
        true
    }

    pub fn is_pending(&self, item: T) -> bool {
        self.pending.contains(&item)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Take every pending item in the order it was first marked, leaving the
    /// queue empty.
    pub fn drain(&mut self) -> Vec<T> {
        self.pending.clear();
        std::mem::take(&mut self.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_is_idempotent() {
        let mut q = DeferredDestructionQueue::new();
        assert!(q.mark(5u32));
        assert!(!q.mark(5u32));
        assert!(q.mark(6u32));
        assert_eq!(q.len(), 2);
        assert!(q.is_pending(5));
    }

    #[test]
    fn drain_preserves_mark_order_and_clears() {
        let mut q = DeferredDestructionQueue::new();
        for x in [3u32, 1, 3, 2, 1] {
            q.mark(x);
        }
        assert_eq!(q.drain(), vec![3, 1, 2]);
        assert!(q.is_empty());
        assert!(!q.is_pending(3));

        // After a flush the same item may be marked again.
        assert!(q.mark(3));
    }
}
