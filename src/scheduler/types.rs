//! Scheduler type definitions
//!
//! This module contains the handle, error and statistics types shared by the
//! scheduler subsystem.

use core::fmt;

/// Scheduling priority. Larger values run first.
pub type Priority = i32;

/// Lowest priority a task may be given
pub const PRIORITY_MIN: Priority = 0;

/// Priority of a task the scheduler has not seen before
pub const PRIORITY_DEFAULT: Priority = 1;

/// Highest priority a task may be given
pub const PRIORITY_MAX: Priority = 7;

/// Opaque task identity supplied by the thread layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Handle to a wait queue issued by [`super::Scheduler::new_wait_queue`].
///
/// Slots are reused after a queue is destroyed; the generation keeps an old
/// handle from resolving to the new occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueueId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl QueueId {
    pub(crate) const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) const fn slot(self) -> usize {
        self.index
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}.{}", self.index, self.generation)
    }
}

/// Contract violations reported by scheduler operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// Requested base priority lies outside the configured bounds.
    InvalidPriority(Priority),
    /// Called outside the atomic section (interrupts still enabled).
    InterruptsEnabled,
    /// Handle does not name a live queue.
    UnknownQueue(QueueId),
    /// Task is not known to the scheduler.
    UnknownTask(TaskId),
    /// Task is already in this queue's waiter list.
    AlreadyWaiting { task: TaskId, queue: QueueId },
    /// Queue still has waiters and cannot be destroyed.
    QueueBusy(QueueId),
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::InvalidPriority(p) => write!(f, "priority {} out of range", p),
            SchedError::InterruptsEnabled => write!(f, "called with interrupts enabled"),
            SchedError::UnknownQueue(q) => write!(f, "no such wait queue {}", q),
            SchedError::UnknownTask(t) => write!(f, "task {} is not tracked", t),
            SchedError::AlreadyWaiting { task, queue } => {
                write!(f, "task {} already waits on {}", task, queue)
            }
            SchedError::QueueBusy(q) => write!(f, "wait queue {} still has waiters", q),
        }
    }
}

/// Scheduler statistics structure
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub invalidations: u64,    // Cached priorities newly marked dirty
    pub task_recomputes: u64,  // Task effective priorities rebuilt from held queues
    pub queue_recomputes: u64, // Queue aggregates rebuilt from waiters
    pub donations: u64,        // Recomputes that lifted a task above its base
    pub handoffs: u64,         // Holder-ship grants made by next_thread
}

impl SchedulerStats {
    pub const fn new() -> Self {
        Self {
            invalidations: 0,
            task_recomputes: 0,
            queue_recomputes: 0,
            donations: 0,
            handoffs: 0,
        }
    }

    /// Total cache rebuilds of either kind.
    pub const fn recomputes(&self) -> u64 {
        self.task_recomputes + self.queue_recomputes
    }
}
