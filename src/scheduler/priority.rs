//! Priority donation core
//!
//! Effective priority is a fixed point over the held/awaited graph:
//!
//! ```text
//! effective(T) = max(base(T), max over q in held(T) of donation(q))
//! donation(q)  = max over w in waiters(q) of effective(w)   if q transfers
//!              = priority_min                                otherwise
//! ```
//!
//! Nothing is recomputed eagerly. A mutation only marks the affected cache
//! dirty and walks forward (task -> queues it awaits -> their holders -> ...),
//! stopping at any node that is already dirty. Queries rebuild only dirty
//! caches, so a repeated query with no mutation in between is O(1). Both
//! walks keep their own stack on the heap; neither recurses.
//!
//! The early stop is sound because a dirty node always has every node
//! downstream of it dirty as well: marking propagates before it stops, and
//! clearing a flag never makes a downstream node stale.

use alloc::vec;

use super::table::SchedTable;
use super::types::{Priority, SchedulerStats};

#[derive(Clone, Copy)]
enum Node {
    Task(usize),
    Queue(usize),
}

/// A node being rebuilt: children folded so far and the running maximum.
struct Frame {
    node: Node,
    next: usize,
    acc: Priority,
}

impl Frame {
    fn new(node: Node, seed: Priority) -> Self {
        Self { node, next: 0, acc: seed }
    }
}

enum Entry {
    Ready(Priority),
    Descend(Frame),
}

impl SchedTable {
    pub fn invalidate_task(&mut self, task: usize, stats: &mut SchedulerStats) {
        self.invalidate(Node::Task(task), stats);
    }

    pub fn invalidate_queue(&mut self, queue: usize, stats: &mut SchedulerStats) {
        self.invalidate(Node::Queue(queue), stats);
    }

    /// Forward invalidation walk. Worklist rather than recursion so a long
    /// donation chain cannot exhaust the kernel stack.
    fn invalidate(&mut self, start: Node, stats: &mut SchedulerStats) {
        let mut pending = vec![start];

        while let Some(node) = pending.pop() {
            match node {
                Node::Task(task) => {
                    let state = &mut self.tasks[task];
                    if state.dirty {
                        continue;
                    }
                    state.dirty = true;
                    stats.invalidations += 1;
                    pending.extend(state.awaiting.iter().map(|&q| Node::Queue(q)));
                }
                Node::Queue(queue) => {
                    let state = &mut self.queues[queue];
                    if state.dirty || !state.transfers {
                        continue;
                    }
                    state.dirty = true;
                    stats.invalidations += 1;
                    if let Some(holder) = state.holder {
                        pending.push(Node::Task(holder));
                    }
                }
            }
        }
    }

    /// Effective priority of `task`, rebuilding its cache if dirty.
    pub fn task_effective(
        &mut self,
        task: usize,
        floor: Priority,
        stats: &mut SchedulerStats,
    ) -> Priority {
        self.effective(Node::Task(task), floor, stats)
    }

    /// Donation carried by `queue`, rebuilding its cache if dirty.
    pub fn queue_effective(
        &mut self,
        queue: usize,
        floor: Priority,
        stats: &mut SchedulerStats,
    ) -> Priority {
        self.effective(Node::Queue(queue), floor, stats)
    }

    /// Post-order rebuild of every dirty cache reachable from `start`,
    /// driven by an explicit stack so chain depth costs heap, not stack.
    fn effective(&mut self, start: Node, floor: Priority, stats: &mut SchedulerStats) -> Priority {
        let mut stack = match self.enter(start, floor, stats) {
            Entry::Ready(value) => return value,
            Entry::Descend(frame) => vec![frame],
        };

        loop {
            let Some(frame) = stack.last_mut() else {
                return floor;
            };

            match self.child(frame) {
                Some(node) => {
                    frame.next += 1;
                    match self.enter(node, floor, stats) {
                        Entry::Ready(value) => frame.acc = frame.acc.max(value),
                        Entry::Descend(child) => stack.push(child),
                    }
                }
                None => {
                    let value = self.finish(frame, stats);
                    stack.pop();
                    match stack.last_mut() {
                        Some(parent) => parent.acc = parent.acc.max(value),
                        None => return value,
                    }
                }
            }
        }
    }

    /// Either a valid cached value for `node`, or a seeded frame to rebuild it.
    ///
    /// Seeding (clearing `dirty`, caching the base or floor) happens before
    /// any child is visited: under a donation cycle the walk comes back to a
    /// seeded node and reads that value instead of descending again.
    fn enter(&mut self, node: Node, floor: Priority, stats: &mut SchedulerStats) -> Entry {
        match node {
            Node::Task(task) => {
                let state = &mut self.tasks[task];
                if state.held.is_empty() {
                    state.cached = state.base;
                    state.dirty = false;
                    return Entry::Ready(state.base);
                }
                if !state.dirty {
                    return Entry::Ready(state.cached);
                }
                state.dirty = false;
                state.cached = state.base;
                stats.task_recomputes += 1;
                Entry::Descend(Frame::new(node, state.base))
            }
            Node::Queue(queue) => {
                let state = &mut self.queues[queue];
                if !state.transfers {
                    return Entry::Ready(floor);
                }
                if !state.dirty {
                    return Entry::Ready(state.cached);
                }
                state.dirty = false;
                state.cached = floor;
                stats.queue_recomputes += 1;
                Entry::Descend(Frame::new(node, floor))
            }
        }
    }

    /// Next node `frame` has not folded in yet: held queues for a task,
    /// waiters in arrival order for a queue.
    fn child(&self, frame: &Frame) -> Option<Node> {
        match frame.node {
            Node::Task(task) => self.tasks[task].held.get(frame.next).map(|&q| Node::Queue(q)),
            Node::Queue(queue) => self.queues[queue]
                .waiters
                .get(frame.next)
                .map(|&t| Node::Task(t)),
        }
    }

    fn finish(&mut self, frame: &Frame, stats: &mut SchedulerStats) -> Priority {
        match frame.node {
            Node::Task(task) => {
                let state = &mut self.tasks[task];
                if frame.acc > state.base {
                    stats.donations += 1;
                }
                state.cached = frame.acc;
            }
            Node::Queue(queue) => self.queues[queue].cached = frame.acc,
        }
        frame.acc
    }

    /// Position of the waiter that should run next: highest effective
    /// priority, earliest arrival among equals.
    pub fn pick_next(
        &mut self,
        queue: usize,
        floor: Priority,
        stats: &mut SchedulerStats,
    ) -> Option<usize> {
        let mut best: Option<(usize, Priority)> = None;

        let mut i = 0;
        while i < self.queues[queue].waiters.len() {
            let waiter = self.queues[queue].waiters[i];
            let priority = self.task_effective(waiter, floor, stats);
            // Strictly greater, so the oldest waiter keeps a tie.
            if best.map_or(true, |(_, top)| priority > top) {
                best = Some((i, priority));
            }
            i += 1;
        }

        best.map(|(position, _)| position)
    }
}
