use crate::coordinator::model::ScoredGroup;
use std::collections::VecDeque;

/// Append-only FIFO of complete scored groups awaiting batching, plus a
/// pointer to the most recently accepted group for introspection.
#[derive(Debug, Default)]
pub struct GroupStore {
    queue: VecDeque<ScoredGroup>,
    latest: Option<ScoredGroup>,
}

impl GroupStore {
    pub fn push(&mut self, group: ScoredGroup) {
        self.latest = Some(group.clone());
        self.queue.push_back(group);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn latest(&self) -> Option<&ScoredGroup> {
        self.latest.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredGroup> {
        self.queue.iter()
    }

    /// Hands the whole queue to the caller (for pure-function batch
    /// assembly) and leaves an empty queue behind. `restore` puts whatever
    /// the caller didn't consume back in place.
    pub fn take(&mut self) -> Vec<ScoredGroup> {
        self.queue.drain(..).collect()
    }

    pub fn restore(&mut self, remainder: Vec<ScoredGroup>) {
        self.queue = remainder.into();
    }

    pub fn reset(&mut self) {
        self.queue.clear();
        self.latest = None;
    }
}
