//! Traversal - One worklist walk, two error policies
//!
//! The level cascade, the batch recompute and the business-domain
//! reassignment all visit a queue of items one at a time. They differ
//! only in what a failure means: fail-fast stops the walk and leaves the
//! failed item at the head of the queue, best-effort logs it and moves on.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use tracing::warn;

use crate::error::{Result, UseCaseError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Abort on the first failure
    #[default]
    FailFast,
    /// Log the failure and continue with the next item
    BestEffort,
}

/// What a walk got through
#[derive(Debug)]
pub struct WalkReport<K> {
    pub completed: Vec<K>,
    pub failed: Vec<(K, UseCaseError)>,
}

impl<K> Default for WalkReport<K> {
    fn default() -> Self {
        Self {
            completed: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// FIFO queue that admits each item once
///
/// Re-enqueueing an item already seen is ignored, so a walk over corrupt
/// (cyclic) data still terminates.
#[derive(Debug)]
pub struct Worklist<K> {
    queue: VecDeque<K>,
    seen: HashSet<K>,
}

impl<K: Clone + Eq + Hash> Worklist<K> {
    pub fn new(items: impl IntoIterator<Item = K>) -> Self {
        let mut worklist = Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
        };
        for item in items {
            worklist.push(item);
        }
        worklist
    }

    /// Enqueue an item, returning false if it was seen before
    pub fn push(&mut self, item: K) -> bool {
        if !self.seen.insert(item.clone()) {
            return false;
        }
        self.queue.push_back(item);
        true
    }

    /// Items not yet visited, next first
    pub fn pending(&self) -> impl Iterator<Item = &K> {
        self.queue.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Visit every queued item, enqueueing the follow-ups `visit` returns
    ///
    /// Under `FailFast` the first error is returned and the failed item is
    /// put back at the head of the queue, so calling `walk` again resumes
    /// from it.
    pub fn walk<F>(&mut self, policy: ErrorPolicy, mut visit: F) -> Result<WalkReport<K>>
    where
        F: FnMut(&K) -> Result<Vec<K>>,
        K: core::fmt::Debug,
    {
        let mut report = WalkReport::default();
        while let Some(item) = self.queue.pop_front() {
            match visit(&item) {
                Ok(follow_ups) => {
                    for next in follow_ups {
                        self.push(next);
                    }
                    report.completed.push(item);
                }
                Err(error) => match policy {
                    ErrorPolicy::FailFast => {
                        self.queue.push_front(item);
                        return Err(error);
                    }
                    ErrorPolicy::BestEffort => {
                        warn!(item = ?item, error = %error, "Skipping failed item");
                        report.failed.push((item, error));
                    }
                },
            }
        }
        Ok(report)
    }
}
