//! Guard strategies for the critical section around a held lock.
//!
//! A guard type decides what the acquiring context gives up while it holds a
//! lock: nothing, its preemptibility, its interrupts, or both. The lock in
//! [`crate::SpinLock`] is parameterized by one of these strategies.

/// Kernel collaborators the guards are built on.
///
/// The kernel provides exactly one implementation of this trait (via
/// `#[crate_interface::impl_interface]`); it is only referenced on bare-metal
/// builds.
#[crate_interface::def_interface]
pub trait KernelCritIf {
    /// Add `n` units to the scheduler's critical-section (preemption-lock)
    /// counter. A non-zero counter marks the current context non-preemptible.
    fn critical_count_add(n: usize);

    /// Subtract `n` units from the critical-section counter. Reaching zero
    /// re-enables preemption.
    fn critical_count_sub(n: usize);

    /// Save the current interrupt mask state and disable local interrupts,
    /// returning an opaque token for [`ipl_restore`](KernelCritIf::ipl_restore).
    fn ipl_save() -> usize;

    /// Restore a previously saved interrupt mask state. Implies a barrier.
    ///
    /// The token must be restored on the same execution path that saved it.
    fn ipl_restore(token: usize);

    /// Unconditionally enable local interrupts. Implies a barrier.
    fn ipl_enable();
}

/// The counter unit this crate contributes per held lock.
///
/// The critical-section counter is additive across subsystems; every
/// successful acquisition under a preemption-disabling guard adds exactly one
/// of these units, and the matching release subtracts it.
pub const SCHED_LOCK_UNIT: usize = 1;

/// A critical-section strategy.
///
/// `acquire` runs before each attempt on the lock word and `release` after
/// the lock word is dropped, so the state a strategy establishes brackets
/// the whole critical section.
pub trait BaseGuard {
    /// State saved on entry and consumed on exit (the IPL token, where one
    /// is taken).
    type State: Clone + Copy;

    /// Enter the critical section, returning saved state.
    fn acquire() -> Self::State;

    /// Exit the critical section after a held lock was released.
    fn release(state: Self::State);

    /// Undo [`acquire`](BaseGuard::acquire) after a *failed* lock attempt.
    ///
    /// Identical to `release` for every strategy except those whose
    /// successful release differs from backing out an attempt (see
    /// [`NoPreemptIrqEnable`]).
    #[inline]
    fn rollback(state: Self::State) {
        Self::release(state);
    }
}

mod types;

pub use types::{IrqSave, NoOp, NoPreempt, NoPreemptIrqEnable, NoPreemptIrqSave};
