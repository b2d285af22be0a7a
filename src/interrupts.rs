//! Atomic-section control
//!
//! Scheduler state has no lock of its own. Callers mutate it only while
//! interrupts are disabled, the single-CPU critical section every
//! dispatcher transition already runs in. This module names that section so
//! the scheduler can assert it is held.

use core::sync::atomic::{AtomicBool, Ordering};

/// Source of truth for "are interrupts disabled on this CPU".
pub trait InterruptControl {
    /// Disable interrupts, returning `true` if they were enabled before.
    fn disable(&self) -> bool;

    /// Re-enable interrupts when `enabled` is true; otherwise leave them off.
    fn restore(&self, enabled: bool);

    fn disabled(&self) -> bool;
}

/// Software interrupt flag for hosted builds and tests. Starts enabled.
#[derive(Debug)]
pub struct SoftInterrupts {
    enabled: AtomicBool,
}

impl SoftInterrupts {
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
        }
    }

    /// A flag that is already inside the atomic section.
    pub const fn disabled_from_start() -> Self {
        Self {
            enabled: AtomicBool::new(false),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }
}

impl Default for SoftInterrupts {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptControl for SoftInterrupts {
    fn disable(&self) -> bool {
        self.enabled.swap(false, Ordering::SeqCst)
    }

    fn restore(&self, enabled: bool) {
        if enabled {
            self.enabled.store(true, Ordering::SeqCst);
        }
    }

    fn disabled(&self) -> bool {
        !self.enabled.load(Ordering::SeqCst)
    }
}

/// The CPU's real IF flag.
#[cfg(all(feature = "hw_irq", target_arch = "x86_64"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct HardwareInterrupts;

#[cfg(all(feature = "hw_irq", target_arch = "x86_64"))]
impl InterruptControl for HardwareInterrupts {
    fn disable(&self) -> bool {
        use x86_64::instructions::interrupts;

        let were_enabled = interrupts::are_enabled();
        interrupts::disable();
        were_enabled
    }

    fn restore(&self, enabled: bool) {
        if enabled {
            x86_64::instructions::interrupts::enable();
        }
    }

    fn disabled(&self) -> bool {
        !x86_64::instructions::interrupts::are_enabled()
    }
}

/// Run `f` inside the atomic section, restoring the previous state after.
pub fn without_interrupts<I, F, R>(irq: &I, f: F) -> R
where
    I: InterruptControl + ?Sized,
    F: FnOnce() -> R,
{
    let were_enabled = irq.disable();
    let result = f();
    irq.restore(were_enabled);
    result
}
