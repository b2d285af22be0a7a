//! Per-task scheduling record

use alloc::vec::Vec;

use super::types::{Priority, TaskId};

/// Scheduling record attached to a task on first reference.
///
/// `held` and `awaiting` store queue slot indices. A queue never appears in
/// both lists of the same task.
#[derive(Debug, Clone)]
pub(crate) struct TaskState {
    pub id: TaskId,
    pub base: Priority,
    pub cached: Priority, // Valid only while !dirty
    pub dirty: bool,
    pub held: Vec<usize>,
    pub awaiting: Vec<usize>,
}

impl TaskState {
    pub fn new(id: TaskId, base: Priority) -> Self {
        Self {
            id,
            base,
            cached: base,
            dirty: false,
            held: Vec::new(),
            awaiting: Vec::new(),
        }
    }

    /// Reinitialise a retired slot for a new task.
    pub fn reset(&mut self, id: TaskId, base: Priority) {
        self.id = id;
        self.base = base;
        self.cached = base;
        self.dirty = false;
        self.held.clear();
        self.awaiting.clear();
    }

    #[inline]
    pub fn holds(&self, queue: usize) -> bool {
        self.held.contains(&queue)
    }

    #[inline]
    pub fn awaits(&self, queue: usize) -> bool {
        self.awaiting.contains(&queue)
    }

    pub fn note_acquired(&mut self, queue: usize) {
        if !self.holds(queue) {
            self.held.push(queue);
        }
        self.awaiting.retain(|&q| q != queue);
    }

    pub fn note_released(&mut self, queue: usize) -> bool {
        let before = self.held.len();
        self.held.retain(|&q| q != queue);
        self.held.len() != before
    }

    pub fn note_waiting(&mut self, queue: usize) {
        if !self.awaits(queue) {
            self.awaiting.push(queue);
        }
    }

    pub fn note_dequeued(&mut self, queue: usize) {
        self.awaiting.retain(|&q| q != queue);
    }
}
