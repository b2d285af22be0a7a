//! Scheduler statistics and debugging functions
//!
//! Counters and table dumps for the donation engine. Dumps go through
//! `kinfo!` so they land wherever the log sink points.

use alloc::vec::Vec;

use crate::interrupts::InterruptControl;
use crate::kinfo;

use super::core::Scheduler;
use super::types::{QueueId, SchedError, SchedulerStats};

impl<I: InterruptControl> Scheduler<I> {
    /// Get scheduler statistics
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SchedulerStats::new();
    }

    pub fn task_count(&self) -> usize {
        self.table.task_count()
    }

    pub fn queue_count(&self) -> usize {
        self.table.queue_count()
    }

    /// List all tracked tasks with base and effective priority
    pub fn list_tasks(&mut self) -> Result<(), SchedError> {
        self.ensure_atomic("list_tasks")?;

        let floor = self.config.priority_min;
        let slots: Vec<usize> = self.table.live_tasks().collect();

        kinfo!("=== Donation Task List ===");
        kinfo!(
            "{:<8} {:<5} {:<5} {:<5} {:<8}",
            "Task", "Base", "Eff", "Held", "Awaiting"
        );

        for slot in slots {
            let effective = self.table.task_effective(slot, floor, &mut self.stats);
            let state = &self.table.tasks[slot];
            kinfo!(
                "{:<8} {:<5} {:<5} {:<5} {:<8}",
                state.id,
                state.base,
                effective,
                state.held.len(),
                state.awaiting.len()
            );
        }

        Ok(())
    }

    /// Print one queue: holder, donation, then waiters in arrival order
    pub fn dump_queue(&mut self, queue: QueueId) -> Result<(), SchedError> {
        self.ensure_atomic("dump_queue")?;
        let q = self.queue_slot(queue)?;

        let floor = self.config.priority_min;
        let donation = self.table.queue_effective(q, floor, &mut self.stats);
        let transfers = self.table.queues[q].transfers;
        let holder = self.table.queues[q].holder.map(|slot| self.table.tasks[slot].id);

        match holder {
            Some(holder) => kinfo!(
                "=== {} held by {} (donation {}, transfers {}) ===",
                queue,
                holder,
                donation,
                transfers
            ),
            None => kinfo!(
                "=== {} free (donation {}, transfers {}) ===",
                queue,
                donation,
                transfers
            ),
        }

        let mut i = 0;
        while i < self.table.queues[q].waiters.len() {
            let slot = self.table.queues[q].waiters[i];
            let effective = self.table.task_effective(slot, floor, &mut self.stats);
            kinfo!(
                "  #{:<3} {:<8} eff {}",
                i,
                self.table.tasks[slot].id,
                effective
            );
            i += 1;
        }

        Ok(())
    }
}
