//! Concrete guard strategies.

use super::BaseGuard;

/// No-op strategy: the critical section changes nothing about the context.
///
/// Only for callers that have already disabled whatever could preempt or
/// interrupt them.
#[derive(Debug, Clone, Copy)]
pub struct NoOp;

impl BaseGuard for NoOp {
    type State = ();

    #[inline(always)]
    fn acquire() -> Self::State {}

    #[inline(always)]
    fn release(_state: Self::State) {}
}

impl NoOp {
    /// Create a new no-op guard.
    #[inline(always)]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for NoOp {
    fn default() -> Self {
        Self
    }
}

// Real strategies exist only on bare metal, where a kernel implements
// `KernelCritIf`.
#[cfg(target_os = "none")]
mod kernel {
    use super::BaseGuard;
    use crate::guard::{KernelCritIf, SCHED_LOCK_UNIT};

    /// Marks the context non-preemptible for the critical section.
    #[derive(Debug)]
    pub struct NoPreempt;

    /// Saves and disables local IRQs for the critical section.
    #[derive(Debug)]
    pub struct IrqSave(pub(super) usize);

    /// Disables both preemption and IRQs; IRQ state is restored on exit.
    #[derive(Debug)]
    pub struct NoPreemptIrqSave(pub(super) usize);

    /// Disables both preemption and IRQs; IRQs are *enabled* on exit.
    ///
    /// For early-boot paths that finish interrupt setup under the lock and
    /// want interrupts on afterwards regardless of the state on entry. A
    /// failed acquisition attempt still restores the saved state rather than
    /// enabling.
    #[derive(Debug)]
    pub struct NoPreemptIrqEnable(pub(super) usize);

    impl BaseGuard for NoPreempt {
        type State = ();

        #[inline]
        fn acquire() -> Self::State {
            crate_interface::call_interface!(KernelCritIf::critical_count_add(SCHED_LOCK_UNIT));
        }

        #[inline]
        fn release(_state: Self::State) {
            crate_interface::call_interface!(KernelCritIf::critical_count_sub(SCHED_LOCK_UNIT));
        }
    }

    impl NoPreempt {
        /// Create a new guard, entering the critical section.
        #[inline]
        pub fn new() -> Self {
            <Self as BaseGuard>::acquire();
            Self
        }
    }

    impl Drop for NoPreempt {
        #[inline]
        fn drop(&mut self) {
            <Self as BaseGuard>::release(())
        }
    }

    impl Default for NoPreempt {
        #[inline]
        fn default() -> Self {
            Self::new()
        }
    }

    impl BaseGuard for IrqSave {
        type State = usize;

        #[inline]
        fn acquire() -> Self::State {
            crate_interface::call_interface!(KernelCritIf::ipl_save())
        }

        #[inline]
        fn release(state: Self::State) {
            crate_interface::call_interface!(KernelCritIf::ipl_restore(state));
        }
    }

    impl IrqSave {
        /// Create a new guard, entering the critical section.
        #[inline]
        pub fn new() -> Self {
            Self(<Self as BaseGuard>::acquire())
        }
    }

    impl Drop for IrqSave {
        #[inline]
        fn drop(&mut self) {
            <Self as BaseGuard>::release(self.0)
        }
    }

    impl Default for IrqSave {
        #[inline]
        fn default() -> Self {
            Self::new()
        }
    }

    impl BaseGuard for NoPreemptIrqSave {
        type State = usize;

        #[inline]
        fn acquire() -> Self::State {
            // IRQs off first, then mark non-preemptible.
            let token = crate_interface::call_interface!(KernelCritIf::ipl_save());
            crate_interface::call_interface!(KernelCritIf::critical_count_add(SCHED_LOCK_UNIT));
            token
        }

        #[inline]
        fn release(state: Self::State) {
            // The restore carries the barrier; the counter drops after it.
            crate_interface::call_interface!(KernelCritIf::ipl_restore(state));
            crate_interface::call_interface!(KernelCritIf::critical_count_sub(SCHED_LOCK_UNIT));
        }
    }

    impl NoPreemptIrqSave {
        /// Create a new guard, entering the critical section.
        #[inline]
        pub fn new() -> Self {
            Self(<Self as BaseGuard>::acquire())
        }
    }

    impl Drop for NoPreemptIrqSave {
        #[inline]
        fn drop(&mut self) {
            <Self as BaseGuard>::release(self.0)
        }
    }

    impl Default for NoPreemptIrqSave {
        #[inline]
        fn default() -> Self {
            Self::new()
        }
    }

    impl BaseGuard for NoPreemptIrqEnable {
        type State = usize;

        #[inline]
        fn acquire() -> Self::State {
            let token = crate_interface::call_interface!(KernelCritIf::ipl_save());
            crate_interface::call_interface!(KernelCritIf::critical_count_add(SCHED_LOCK_UNIT));
            token
        }

        #[inline]
        fn release(_state: Self::State) {
            crate_interface::call_interface!(KernelCritIf::ipl_enable());
            crate_interface::call_interface!(KernelCritIf::critical_count_sub(SCHED_LOCK_UNIT));
        }

        #[inline]
        fn rollback(state: Self::State) {
            // The attempt failed, so the section never ran; put interrupts
            // back the way they were instead of forcing them on.
            crate_interface::call_interface!(KernelCritIf::ipl_restore(state));
            crate_interface::call_interface!(KernelCritIf::critical_count_sub(SCHED_LOCK_UNIT));
        }
    }

    impl NoPreemptIrqEnable {
        /// Create a new guard, entering the critical section.
        #[inline]
        pub fn new() -> Self {
            Self(<Self as BaseGuard>::acquire())
        }
    }

    impl Drop for NoPreemptIrqEnable {
        #[inline]
        fn drop(&mut self) {
            <Self as BaseGuard>::release(self.0)
        }
    }

    impl Default for NoPreemptIrqEnable {
        #[inline]
        fn default() -> Self {
            Self::new()
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "none")] {
        pub use kernel::{IrqSave, NoPreempt, NoPreemptIrqEnable, NoPreemptIrqSave};
    } else {
        // Hosted builds (tests) have no kernel to call into; every strategy
        // degenerates to a no-op and tests substitute their own `BaseGuard`
        // implementations instead.
        pub use NoOp as IrqSave;
        pub use NoOp as NoPreempt;
        pub use NoOp as NoPreemptIrqEnable;
        pub use NoOp as NoPreemptIrqSave;
    }
}
