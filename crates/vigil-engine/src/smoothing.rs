//! Majority-vote smoothing over a fixed-size window.
//!
//! Each class owns one window holding its last `buffer_size` raw presence
//! samples. The smoothed decision is true only when strictly more than half
//! of the window is true. Slots not yet filled count as false, so a fresh
//! window needs a true majority of the full size, and an even split
//! resolves to false.

use std::collections::VecDeque;

/// Ring buffer of raw presence samples for one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmoothingWindow {
    samples: VecDeque<bool>,
    capacity: usize,
    true_count: usize,
}

impl SmoothingWindow {
    /// Create an empty window. `capacity` is clamped to at least 1; the
    /// engine only builds windows from validated configuration.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            true_count: 0,
        }
    }

    /// Push a raw sample, evicting the oldest once full, and return the
    /// smoothed decision.
    pub fn push(&mut self, present_raw: bool) -> bool {
        if self.samples.len() == self.capacity {
            if let Some(true) = self.samples.pop_front() {
                self.true_count -= 1;
            }
        }

        self.samples.push_back(present_raw);
        if present_raw {
            self.true_count += 1;
        }

        self.is_present()
    }

    /// Strict majority over the full capacity.
    pub fn is_present(&self) -> bool {
        self.true_count * 2 > self.capacity
    }

    pub fn true_count(&self) -> usize {
        self.true_count
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples oldest first.
    pub fn samples(&self) -> impl Iterator<Item = bool> + '_ {
        self.samples.iter().copied()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.true_count = 0;
    }
}
