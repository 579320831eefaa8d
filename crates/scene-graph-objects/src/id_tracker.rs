//! Recyclable integer identifiers for component bookkeeping.

use std::collections::VecDeque;

/// Allocates small integer ids, preferring previously freed values.
///
/// `next()` returns the oldest freed id (FIFO) when any exist, otherwise a
/// fresh monotonically increasing value. `mark_free` only pools ids strictly
/// below the high-water mark, so an id that was never issued by this tracker
/// can never enter circulation; out-of-range frees are silently ignored.
/// The high-water mark never shrinks.
///
/// # Example
///
/// ```
/// use scene_graph_objects::IdTracker;
///
/// let mut ids = IdTracker::new(0);
/// assert_eq!(ids.next(), 0);
/// assert_eq!(ids.next(), 1);
/// ids.mark_free(0);
/// assert_eq!(ids.next(), 0);
/// assert_eq!(ids.next(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct IdTracker {
    next: u64,
    unused: VecDeque<u64>,
}

impl IdTracker {
    /// Tracker issuing fresh ids from `start`.
    #[must_use]
    pub fn new(start: u64) -> Self {
        Self {
            next: start,
            unused: VecDeque::new(),
        }
    }

    /// Next available id: oldest freed value if any, else a fresh one.
    pub fn next(&mut self) -> u64 {
        if let Some(recycled) = self.unused.pop_front() {
            return recycled;
        }
        let fresh = self.next;
        self.next += 1;
        fresh
    }

    /// Return `id` to the pool, if it could have been issued by this tracker.
    pub fn mark_free(&mut self, id: u64) {
        if id < self.next {
            self.unused.push_back(id);
        }
    }
}
