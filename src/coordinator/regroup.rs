use crate::coordinator::model::EnvId;
use crate::coordinator::model::ScoredGroup;
use std::collections::HashMap;

pub enum RegroupOutcome {
    /// A subset of the buffer summed exactly to the declared group size.
    /// `groups` is already in flush order (highest buffered index first).
    Flushed {
        groups: Vec<ScoredGroup>,
        remaining_buffer_size: usize,
    },
    /// No exact-sum subset exists yet; the submission stays buffered.
    Buffered { buffer_size: usize },
}

/// Per-environment staging area for submissions whose cardinality doesn't
/// match the environment's declared `group_size`. Never splits or merges
/// individual sequences -- only recomposes at group granularity.
#[derive(Debug, Default)]
pub struct RegroupBuffer {
    buffers: HashMap<EnvId, Vec<ScoredGroup>>,
}

impl RegroupBuffer {
    /// Appends `group` to env_id's buffer, then searches for a prefix-greedy
    /// subset (walk in order, skip anything that would overshoot) summing
    /// exactly to `expected`. On a hit, the matching entries are removed
    /// highest-index-first -- which is also their flush order, so the
    /// earliest-buffered entry becomes the last one pushed to GroupStore.
    pub fn submit(&mut self, env_id: EnvId, group: ScoredGroup, expected: u32) -> RegroupOutcome {
        let buffer = self.buffers.entry(env_id).or_default();
        buffer.push(group);

        let target = expected as u64;
        let mut picked = Vec::new();
        let mut sum: u64 = 0;
        for (i, g) in buffer.iter().enumerate() {
            let card = g.cardinality() as u64;
            if sum + card <= target {
                picked.push(i);
                sum += card;
            }
        }

        if sum == target {
            let mut groups = Vec::with_capacity(picked.len());
            for &idx in picked.iter().rev() {
                groups.push(buffer.remove(idx));
            }
            let remaining_buffer_size = buffer.iter().map(ScoredGroup::cardinality).sum();
            RegroupOutcome::Flushed {
                groups,
                remaining_buffer_size,
            }
        } else {
            let buffer_size = buffer.iter().map(ScoredGroup::cardinality).sum();
            RegroupOutcome::Buffered { buffer_size }
        }
    }

    pub fn reset(&mut self) {
        self.buffers.clear();
    }
}
