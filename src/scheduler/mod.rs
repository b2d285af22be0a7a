//! Scheduler subsystem
//!
//! This module provides the priority-donation run-queue discipline used by
//! the cooperative dispatcher, its locks and its condition variables.
//!
//! ## Key Concepts:
//! - **Base priority**: the value explicitly assigned to a task
//! - **Effective priority**: base raised by donations received through every
//!   queue the task currently holds, transitively
//! - **Wait queue**: one per resource; ordered waiters plus the current
//!   holder, optionally donating its waiters' priority to that holder
//!
//! ## Module Organization
//!
//! - `types`: Handles, priority constants, errors, statistics
//! - `config`: Priority bounds and command-line overrides
//! - `task`: Per-task scheduling record
//! - `queue`: Per-resource wait queue record
//! - `table`: Task/queue arenas and edge transitions
//! - `priority`: Lazy invalidation and effective-priority recomputation
//! - `core`: The `Scheduler` facade
//! - `stats`: Statistics and debug dumps

mod config;
mod core;
mod priority;
mod queue;
mod stats;
mod table;
mod task;
mod types;

pub use config::{ConfigError, SchedConfig};
pub use self::core::Scheduler;
pub use types::{Priority, QueueId, SchedError, SchedulerStats, TaskId};
pub use types::{PRIORITY_DEFAULT, PRIORITY_MAX, PRIORITY_MIN};
