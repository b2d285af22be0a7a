//! Per-resource wait queue record

use alloc::vec::Vec;

use super::types::Priority;

/// Waiters in arrival order plus the current holder, both as task slot
/// indices. The aggregate `cached` is the donation this queue passes to its
/// holder; queues that do not transfer priority never become dirty.
#[derive(Debug, Clone)]
pub(crate) struct QueueState {
    pub generation: u32,
    pub live: bool,
    pub transfers: bool,
    pub waiters: Vec<usize>,
    pub holder: Option<usize>,
    pub cached: Priority, // Valid only while !dirty
    pub dirty: bool,
}

impl QueueState {
    pub fn new(transfers: bool, floor: Priority) -> Self {
        Self {
            generation: 0,
            live: true,
            transfers,
            waiters: Vec::new(),
            holder: None,
            cached: floor,
            dirty: false,
        }
    }

    /// Reinitialise a destroyed slot; the generation moves on so stale
    /// handles stop resolving.
    pub fn reset(&mut self, transfers: bool, floor: Priority) {
        self.generation = self.generation.wrapping_add(1);
        self.live = true;
        self.transfers = transfers;
        self.waiters.clear();
        self.holder = None;
        self.cached = floor;
        self.dirty = false;
    }

    #[inline]
    pub fn position_of(&self, task: usize) -> Option<usize> {
        self.waiters.iter().position(|&w| w == task)
    }
}
