use crate::world::time::GameTick;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;

/// Armed timer for one key. `ticket` tells re-armed timers apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CronEntry<K> {
    pub key: K,
    pub ticket: u64,
    pub target: GameTick,
}

/// Min-heap by target tick (earliest first)
impl<K: Ord> Ord for CronEntry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior in BinaryHeap (which is max-heap)
        other
            .target
            .cmp(&self.target)
            .then_with(|| other.key.cmp(&self.key))
            .then_with(|| other.ticket.cmp(&self.ticket))
    }
}

impl<K: Ord> PartialOrd for CronEntry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One-shot timers keyed by owner. At most one timer is live per key; heap
/// entries left behind by `stop` or re-arming are discarded when their target
/// tick comes round.
#[derive(Debug)]
pub struct CronSystem<K> {
    heap: BinaryHeap<CronEntry<K>>,
    index: HashMap<K, CronEntry<K>>,
    discarded: usize,
}

impl<K: Copy + Eq + Hash + Ord> Default for CronSystem<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash + Ord> CronSystem<K> {
    pub fn new() -> Self {
        CronSystem {
            heap: BinaryHeap::new(),
            index: HashMap::new(),
            discarded: 0,
        }
    }

    /// Arms (or re-arms) the timer for `key`.
    pub fn set(&mut self, key: K, ticket: u64, delay: u64, now: GameTick) {
        let entry = CronEntry {
            key,
            ticket,
            target: now.after(delay),
        };
        self.index.insert(key, entry);
        self.heap.push(entry);
    }

    /// Pops the earliest live timer whose target has been reached.
    pub fn pop_ready(&mut self, now: GameTick) -> Option<CronEntry<K>> {
        loop {
            let entry = *self.heap.peek()?;
            if entry.target > now {
                return None;
            }
            self.heap.pop();
            if self.index.get(&entry.key) != Some(&entry) {
                self.discarded += 1;
                continue;
            }
            self.index.remove(&entry.key);
            return Some(entry);
        }
    }

    /// Stopped or superseded timers discarded since the last call.
    pub fn take_discarded(&mut self) -> usize {
        std::mem::take(&mut self.discarded)
    }

    /// Disarms the timer for `key` and returns the ticks it had left.
    pub fn stop(&mut self, key: K, now: GameTick) -> Option<u64> {
        let entry = self.index.remove(&key)?;
        Some(entry.target.0.saturating_sub(now.0))
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.index.clear();
        self.discarded = 0;
    }

    /// Number of live timers.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
