//! Task and queue arenas
//!
//! Tasks and queues reference each other (queue -> holder, queue -> waiters,
//! task -> held, task -> awaited). Both sides are slot indices into the two
//! arenas below, and every transition here updates both ends of an edge
//! together.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use super::queue::QueueState;
use super::task::TaskState;
use super::types::{Priority, QueueId, SchedulerStats, TaskId};

#[derive(Debug, Default)]
pub(crate) struct SchedTable {
    pub tasks: Vec<TaskState>,
    pub queues: Vec<QueueState>,
    index: BTreeMap<TaskId, usize>,
    free_tasks: Vec<usize>,
    free_queues: Vec<usize>,
}

impl SchedTable {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn lookup(&self, id: TaskId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Get-or-create the record for `id`.
    pub fn attach(&mut self, id: TaskId, base: Priority) -> usize {
        if let Some(slot) = self.lookup(id) {
            return slot;
        }

        let slot = match self.free_tasks.pop() {
            Some(slot) => {
                self.tasks[slot].reset(id, base);
                slot
            }
            None => {
                self.tasks.push(TaskState::new(id, base));
                self.tasks.len() - 1
            }
        };
        self.index.insert(id, slot);
        crate::ktrace!("Sched: attached {} at slot {} (base {})", id, slot, base);
        slot
    }

    /// Resolve a handle to a live queue slot.
    pub fn resolve(&self, queue: QueueId) -> Option<usize> {
        let slot = queue.slot();
        let state = self.queues.get(slot)?;
        if state.live && state.generation == queue.generation {
            Some(slot)
        } else {
            None
        }
    }

    pub fn queue_handle(&self, slot: usize) -> QueueId {
        QueueId::new(slot, self.queues[slot].generation)
    }

    pub fn task_count(&self) -> usize {
        self.index.len()
    }

    pub fn queue_count(&self) -> usize {
        self.queues.len() - self.free_queues.len()
    }

    pub fn live_tasks(&self) -> impl Iterator<Item = usize> + '_ {
        self.index.values().copied()
    }

    // =========================================================================
    // Queue lifecycle
    // =========================================================================

    pub fn create_queue(&mut self, transfers: bool, floor: Priority) -> QueueId {
        let slot = match self.free_queues.pop() {
            Some(slot) => {
                self.queues[slot].reset(transfers, floor);
                slot
            }
            None => {
                self.queues.push(QueueState::new(transfers, floor));
                self.queues.len() - 1
            }
        };
        self.queue_handle(slot)
    }

    /// Retire an empty queue. The caller has checked there are no waiters.
    pub fn destroy_queue(&mut self, queue: usize, stats: &mut SchedulerStats) {
        self.clear_holder(queue, stats);
        let state = &mut self.queues[queue];
        state.live = false;
        state.dirty = false;
        self.free_queues.push(queue);
    }

    // =========================================================================
    // Edge transitions
    // =========================================================================

    /// Append `task` to the waiter list of `queue`.
    pub fn enqueue(&mut self, queue: usize, task: usize, stats: &mut SchedulerStats) {
        // A holder that starts waiting on its own queue gives it up first.
        if self.queues[queue].holder == Some(task) {
            self.clear_holder(queue, stats);
        }

        self.queues[queue].waiters.push(task);
        self.tasks[task].note_waiting(queue);
        self.invalidate_queue(queue, stats);
    }

    /// Remove the waiter at `position` from `queue`, returning its slot.
    pub fn dequeue_at(&mut self, queue: usize, position: usize, stats: &mut SchedulerStats) -> usize {
        let task = self.queues[queue].waiters.remove(position);
        self.tasks[task].note_dequeued(queue);
        self.invalidate_queue(queue, stats);
        task
    }

    /// Make `task` the holder of `queue`, detaching any previous holder.
    pub fn set_holder(&mut self, queue: usize, task: usize, stats: &mut SchedulerStats) {
        if let Some(position) = self.queues[queue].position_of(task) {
            self.dequeue_at(queue, position, stats);
        }

        if self.queues[queue].holder != Some(task) {
            self.clear_holder(queue, stats);
        }

        self.queues[queue].holder = Some(task);
        self.tasks[task].note_acquired(queue);
        self.invalidate_task(task, stats);
    }

    /// Detach the current holder of `queue`, if any, returning it.
    pub fn clear_holder(&mut self, queue: usize, stats: &mut SchedulerStats) -> Option<usize> {
        let old = self.queues[queue].holder.take()?;
        self.tasks[old].note_released(queue);
        self.invalidate_task(old, stats);
        Some(old)
    }

    /// Change a task's base priority. Returns false when nothing changed.
    pub fn set_base(&mut self, task: usize, priority: Priority, stats: &mut SchedulerStats) -> bool {
        if self.tasks[task].base == priority {
            return false;
        }
        self.tasks[task].base = priority;
        self.invalidate_task(task, stats);
        true
    }

    /// Drop every edge of `task` and free its slot.
    ///
    /// Returns how many queues it held and how many it was waiting on.
    pub fn retire_task(&mut self, task: usize, stats: &mut SchedulerStats) -> (usize, usize) {
        let held = core::mem::take(&mut self.tasks[task].held);
        for &queue in &held {
            if self.queues[queue].holder == Some(task) {
                self.queues[queue].holder = None;
            }
        }

        let awaiting = core::mem::take(&mut self.tasks[task].awaiting);
        for &queue in &awaiting {
            self.queues[queue].waiters.retain(|&w| w != task);
            self.invalidate_queue(queue, stats);
        }

        let state = &mut self.tasks[task];
        state.dirty = false;
        self.index.remove(&state.id);
        self.free_tasks.push(task);

        (held.len(), awaiting.len())
    }
}
