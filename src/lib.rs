//! NexaOS priority-donation scheduler core
//!
//! Run-queue discipline for cooperative kernels: every task carries a base
//! priority and an effective priority, and a task blocked on a resource
//! donates its effective priority to whichever task holds that resource.
//! Donation follows chains of "waiting for a lock held by a task that is
//! itself waiting" to any depth.
//!
//! The dispatcher, locks, condition variables and the timer live outside
//! this crate and talk to it through [`scheduler::Scheduler`].

#![no_std]

extern crate alloc;

pub mod interrupts;
pub mod logger;
pub mod scheduler;

pub use interrupts::{without_interrupts, InterruptControl, SoftInterrupts};
pub use scheduler::{
    ConfigError, Priority, QueueId, SchedConfig, SchedError, Scheduler, SchedulerStats, TaskId,
};

#[cfg(all(feature = "hw_irq", target_arch = "x86_64"))]
pub use interrupts::HardwareInterrupts;

#[macro_export]
macro_rules! klog {
    ($level:expr, $($arg:tt)*) => {{
        $crate::logger::log($level, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kfatal {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::FATAL, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::ERROR, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::WARN, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::INFO, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::DEBUG, $($arg)*);
    }};
}

#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::TRACE, $($arg)*);
    }};
}
