//! Scheduler facade
//!
//! Owns the task and queue arenas and is the only entry point the
//! dispatcher, locks and condition variables use. Every call that touches
//! scheduler state must come from inside the atomic section; the two
//! saturating priority adjustments take the section themselves.

use alloc::vec::Vec;

use crate::interrupts::{InterruptControl, SoftInterrupts};
use crate::{kdebug, kerror, ktrace, kwarn};

use super::config::{ConfigError, SchedConfig};
use super::table::SchedTable;
use super::types::{Priority, QueueId, SchedError, SchedulerStats, TaskId};

pub struct Scheduler<I: InterruptControl = SoftInterrupts> {
    pub(super) config: SchedConfig,
    pub(super) irq: I,
    pub(super) table: SchedTable,
    pub(super) stats: SchedulerStats,
}

impl Scheduler<SoftInterrupts> {
    /// Scheduler with default bounds driven by a software interrupt flag.
    pub fn new() -> Self {
        Self::build(SchedConfig::new(), SoftInterrupts::new())
    }
}

impl Default for Scheduler<SoftInterrupts> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: InterruptControl> Scheduler<I> {
    /// Build a scheduler over `irq`. Bounds that do not satisfy
    /// `min <= default <= max` are refused.
    pub fn with_interrupts(config: SchedConfig, irq: I) -> Result<Self, ConfigError> {
        if let Err(err) = config.validate() {
            kerror!("Sched: rejected configuration: {}", err);
            return Err(err);
        }
        Ok(Self::build(config, irq))
    }

    fn build(config: SchedConfig, irq: I) -> Self {
        Self {
            config,
            irq,
            table: SchedTable::new(),
            stats: SchedulerStats::new(),
        }
    }

    pub fn config(&self) -> &SchedConfig {
        &self.config
    }

    pub fn interrupts(&self) -> &I {
        &self.irq
    }

    // =========================================================================
    // Contract checks
    // =========================================================================

    pub(super) fn ensure_atomic(&self, op: &'static str) -> Result<(), SchedError> {
        if self.irq.disabled() {
            Ok(())
        } else {
            kerror!("Sched: {} called with interrupts enabled", op);
            Err(SchedError::InterruptsEnabled)
        }
    }

    pub(super) fn queue_slot(&self, queue: QueueId) -> Result<usize, SchedError> {
        self.table.resolve(queue).ok_or_else(|| {
            kerror!("Sched: stale or unknown wait queue {}", queue);
            SchedError::UnknownQueue(queue)
        })
    }

    fn attach(&mut self, task: TaskId) -> usize {
        self.table.attach(task, self.config.priority_default)
    }

    fn task_id(&self, slot: usize) -> TaskId {
        self.table.tasks[slot].id
    }

    // =========================================================================
    // Wait queues
    // =========================================================================

    /// Create an empty wait queue. `transfers_priority` is fixed for the
    /// queue's lifetime; join barriers pass `false`.
    pub fn new_wait_queue(&mut self, transfers_priority: bool) -> QueueId {
        let queue = self
            .table
            .create_queue(transfers_priority, self.config.priority_min);
        kdebug!(
            "Sched: new wait queue {} (transfers priority: {})",
            queue,
            transfers_priority
        );
        queue
    }

    /// Retire a queue whose resource is going away. It must have no waiters;
    /// a remaining holder is simply detached.
    pub fn destroy_wait_queue(&mut self, queue: QueueId) -> Result<(), SchedError> {
        self.ensure_atomic("destroy_wait_queue")?;
        let slot = self.queue_slot(queue)?;
        if !self.table.queues[slot].waiters.is_empty() {
            kerror!("Sched: cannot destroy {} while tasks wait on it", queue);
            return Err(SchedError::QueueBusy(queue));
        }
        self.table.destroy_queue(slot, &mut self.stats);
        kdebug!("Sched: destroyed wait queue {}", queue);
        Ok(())
    }

    /// Block `task` on `queue`: append it to the waiters and let its
    /// priority flow to the holder.
    pub fn wait_for_access(&mut self, queue: QueueId, task: TaskId) -> Result<(), SchedError> {
        self.ensure_atomic("wait_for_access")?;
        let q = self.queue_slot(queue)?;
        let t = self.attach(task);

        if self.table.queues[q].position_of(t).is_some() {
            kerror!("Sched: {} is already waiting on {}", task, queue);
            return Err(SchedError::AlreadyWaiting { task, queue });
        }

        self.table.enqueue(q, t, &mut self.stats);
        ktrace!("Sched: {} waits on {}", task, queue);
        Ok(())
    }

    /// Make `task` the holder of `queue`, detaching the previous holder.
    /// Serves both the uncontended fast path and a hand-off after waiting.
    pub fn acquire(&mut self, queue: QueueId, task: TaskId) -> Result<(), SchedError> {
        self.ensure_atomic("acquire")?;
        let q = self.queue_slot(queue)?;
        let t = self.attach(task);

        let previous = self.table.queues[q].holder.map(|slot| self.task_id(slot));
        self.table.set_holder(q, t, &mut self.stats);
        match previous {
            Some(old) if old != task => kdebug!("Sched: {} handed from {} to {}", queue, old, task),
            Some(_) => {}
            None => kdebug!("Sched: {} acquired by {}", queue, task),
        }
        Ok(())
    }

    /// Remove the best waiter from `queue`, make it the holder and return
    /// it. `None` (with no state change) when nobody waits.
    pub fn next_thread(&mut self, queue: QueueId) -> Result<Option<TaskId>, SchedError> {
        self.ensure_atomic("next_thread")?;
        let q = self.queue_slot(queue)?;
        let floor = self.config.priority_min;

        let Some(position) = self.table.pick_next(q, floor, &mut self.stats) else {
            return Ok(None);
        };

        let previous = self.table.queues[q].holder.map(|slot| self.task_id(slot));
        let next = self.table.dequeue_at(q, position, &mut self.stats);
        self.table.set_holder(q, next, &mut self.stats);
        self.stats.handoffs += 1;

        let next_id = self.task_id(next);
        match previous {
            Some(old) => kdebug!("Sched: {} released by {}, granted to {}", queue, old, next_id),
            None => kdebug!("Sched: {} granted to {}", queue, next_id),
        }
        Ok(Some(next_id))
    }

    /// The task `next_thread` would pick, without committing.
    pub fn peek_next(&mut self, queue: QueueId) -> Result<Option<TaskId>, SchedError> {
        self.ensure_atomic("peek_next")?;
        let q = self.queue_slot(queue)?;
        let floor = self.config.priority_min;

        let position = self.table.pick_next(q, floor, &mut self.stats);
        Ok(position.map(|pos| self.task_id(self.table.queues[q].waiters[pos])))
    }

    pub fn holder(&self, queue: QueueId) -> Result<Option<TaskId>, SchedError> {
        self.ensure_atomic("holder")?;
        let q = self.queue_slot(queue)?;
        Ok(self.table.queues[q].holder.map(|slot| self.task_id(slot)))
    }

    /// Waiters in arrival order.
    pub fn waiters(&self, queue: QueueId) -> Result<Vec<TaskId>, SchedError> {
        self.ensure_atomic("waiters")?;
        let q = self.queue_slot(queue)?;
        Ok(self.table.queues[q]
            .waiters
            .iter()
            .map(|&slot| self.task_id(slot))
            .collect())
    }

    /// Priority this queue currently donates to its holder.
    pub fn queue_priority(&mut self, queue: QueueId) -> Result<Priority, SchedError> {
        self.ensure_atomic("queue_priority")?;
        let q = self.queue_slot(queue)?;
        let floor = self.config.priority_min;
        Ok(self.table.queue_effective(q, floor, &mut self.stats))
    }

    // =========================================================================
    // Task priorities
    // =========================================================================

    pub fn priority(&mut self, task: TaskId) -> Result<Priority, SchedError> {
        self.ensure_atomic("priority")?;
        let t = self.attach(task);
        Ok(self.table.tasks[t].base)
    }

    pub fn effective_priority(&mut self, task: TaskId) -> Result<Priority, SchedError> {
        self.ensure_atomic("effective_priority")?;
        let t = self.attach(task);
        let floor = self.config.priority_min;
        Ok(self.table.task_effective(t, floor, &mut self.stats))
    }

    /// Set the base priority of `task`. Out-of-range values are rejected,
    /// never clamped.
    pub fn set_priority(&mut self, task: TaskId, priority: Priority) -> Result<(), SchedError> {
        self.ensure_atomic("set_priority")?;
        if !self.config.contains(priority) {
            kerror!(
                "Sched: priority {} for {} outside [{}, {}]",
                priority,
                task,
                self.config.priority_min,
                self.config.priority_max
            );
            return Err(SchedError::InvalidPriority(priority));
        }

        let t = self.attach(task);
        let old = self.table.tasks[t].base;
        if self.table.set_base(t, priority, &mut self.stats) {
            ktrace!("Sched: {} base priority {} -> {}", task, old, priority);
        }
        Ok(())
    }

    /// Raise `task` by one. Returns false, changing nothing, at the ceiling.
    pub fn increase_priority(&mut self, task: TaskId) -> bool {
        let ceiling = self.config.priority_max;
        self.step_priority(task, 1, |p| p < ceiling)
    }

    /// Lower `task` by one. Returns false, changing nothing, at the floor.
    pub fn decrease_priority(&mut self, task: TaskId) -> bool {
        let floor = self.config.priority_min;
        self.step_priority(task, -1, |p| p > floor)
    }

    fn step_priority(&mut self, task: TaskId, delta: Priority, room: impl Fn(Priority) -> bool) -> bool {
        let were_enabled = self.irq.disable();

        let t = self.attach(task);
        let current = self.table.tasks[t].base;
        let moved = room(current);
        if moved {
            self.table.set_base(t, current + delta, &mut self.stats);
            ktrace!("Sched: {} base priority {} -> {}", task, current, current + delta);
        }

        self.irq.restore(were_enabled);
        moved
    }

    // =========================================================================
    // Task lifecycle
    // =========================================================================

    pub fn is_tracked(&self, task: TaskId) -> bool {
        self.table.lookup(task).is_some()
    }

    /// Forget a terminated task. Queues it held lose their holder; queues it
    /// waited on drop it from their waiters. Returns false if the task was
    /// never tracked.
    pub fn exit_task(&mut self, task: TaskId) -> Result<bool, SchedError> {
        self.ensure_atomic("exit_task")?;
        let Some(t) = self.table.lookup(task) else {
            return Ok(false);
        };

        let (held, awaiting) = self.table.retire_task(t, &mut self.stats);
        if held > 0 || awaiting > 0 {
            kwarn!(
                "Sched: {} exited holding {} queue(s) and waiting on {}",
                task,
                held,
                awaiting
            );
        } else {
            ktrace!("Sched: {} exited", task);
        }
        Ok(true)
    }

    /// Look up the base priority of a task without attaching it.
    pub fn tracked_priority(&self, task: TaskId) -> Result<Priority, SchedError> {
        self.ensure_atomic("tracked_priority")?;
        self.table
            .lookup(task)
            .map(|t| self.table.tasks[t].base)
            .ok_or(SchedError::UnknownTask(task))
    }
}
