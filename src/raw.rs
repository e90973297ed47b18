//! The raw lock word.
//!
//! [`RawSpinLock`] is the bottom two layers of the crate: the atomic
//! acquire/release protocol on the lock word itself, and the contention
//! budget that turns a hopeless spin into a diagnosable failure. It knows
//! nothing about preemption or IRQs; that is the guard types' job.

#[cfg(feature = "deadlock-detect")]
use core::sync::atomic::AtomicI32;
#[cfg(feature = "smp")]
use core::sync::atomic::AtomicBool;
#[cfg(not(feature = "smp"))]
use core::sync::atomic::compiler_fence;
use core::sync::atomic::Ordering;

/// Initial value of the per-lock contention budget.
///
/// A lock that fails this many consecutive acquisition attempts without a
/// single success in between is declared stuck. The constant only bounds how
/// long a surrounding busy-wait may spin before giving up; it has no effect
/// on an uncontended lock.
#[cfg(feature = "deadlock-detect")]
pub const SPIN_CONTENTION_LIMIT: i32 = 0x1000_0000;

/// The raw spinlock word.
///
/// On `smp` builds this is an atomic flag acquired with a single
/// compare-and-swap. On single-core builds the flag is compiled out and
/// acquisition always succeeds: with only one hardware context, exclusion is
/// entirely a matter of the caller's preemption/IRQ state, and only the
/// compiler ordering of the critical section remains to be enforced.
///
/// Acquisition is an acquire barrier and release is a release barrier on
/// every build, so memory effects of the critical section cannot leak across
/// the lock boundaries even where the atomic step itself is skipped.
#[derive(Debug)]
pub struct RawSpinLock {
    #[cfg(feature = "smp")]
    state: AtomicBool,
    #[cfg(feature = "deadlock-detect")]
    contention: AtomicI32,
}

impl RawSpinLock {
    /// Creates a lock in the unlocked state. Usable in statics.
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            #[cfg(feature = "smp")]
            state: AtomicBool::new(false),
            #[cfg(feature = "deadlock-detect")]
            contention: AtomicI32::new(SPIN_CONTENTION_LIMIT),
        }
    }

    /// Creates a lock that starts out held.
    ///
    /// For bootstrap scenarios where the protected resource must stay
    /// inaccessible until some initialization step releases the lock
    /// explicitly.
    #[inline(always)]
    pub const fn new_locked() -> Self {
        Self {
            #[cfg(feature = "smp")]
            state: AtomicBool::new(true),
            #[cfg(feature = "deadlock-detect")]
            contention: AtomicI32::new(SPIN_CONTENTION_LIMIT),
        }
    }

    /// One bare acquisition attempt on the lock word.
    #[inline(always)]
    fn try_acquire_once(&self) -> bool {
        #[cfg(feature = "smp")]
        {
            self.state
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
        }
        #[cfg(not(feature = "smp"))]
        {
            // A single core cannot race on the word; the fence keeps the
            // critical section's reads from being hoisted above this point.
            compiler_fence(Ordering::Acquire);
            true
        }
    }

    /// Attempts to acquire the lock once, without spinning.
    ///
    /// Returns `true` iff the lock transitioned from unlocked to locked in
    /// this call. With `deadlock-detect`, a success rearms the contention
    /// budget and a failure draws it down.
    ///
    /// # Panics
    ///
    /// With `deadlock-detect`, panics when the contention budget is
    /// exhausted: the lock failed [`SPIN_CONTENTION_LIMIT`] consecutive
    /// attempts and is presumed stuck (typically self-deadlock, or a holder
    /// that died without releasing).
    #[inline]
    pub fn try_acquire(&self) -> bool {
        let acquired = self.try_acquire_once();
        #[cfg(feature = "deadlock-detect")]
        {
            if acquired {
                self.contention.store(SPIN_CONTENTION_LIMIT, Ordering::Relaxed);
            } else {
                // Best-effort bookkeeping: relaxed, and the reset above may
                // interleave with concurrent decrements. Only eventual
                // detection of a permanently held lock is guaranteed.
                let left = self.contention.fetch_sub(1, Ordering::Relaxed) - 1;
                if left <= 0 {
                    panic!("spinlock: deadlock suspected, contention budget exhausted");
                }
            }
        }
        acquired
    }

    /// Spins until the lock is acquired.
    ///
    /// Pure busy-wait; callers may already be running with scheduling
    /// disabled, so there is no yield and no sleep.
    #[inline]
    pub fn acquire(&self) {
        while !self.try_acquire() {
            core::hint::spin_loop();
        }
    }

    /// Releases the lock.
    ///
    /// Only the context that acquired the lock may release it; nothing here
    /// verifies that. Writes made inside the critical section are ordered
    /// before the release on every build.
    #[inline]
    pub fn release(&self) {
        #[cfg(feature = "smp")]
        self.state.store(false, Ordering::Release);
        #[cfg(not(feature = "smp"))]
        compiler_fence(Ordering::Release);
    }

    /// Whether the lock is currently held (heuristic only).
    ///
    /// The result may be stale immediately; never use it for
    /// synchronization. Always `false` on single-core builds.
    #[inline(always)]
    pub fn is_locked(&self) -> bool {
        #[cfg(feature = "smp")]
        {
            self.state.load(Ordering::Relaxed)
        }
        #[cfg(not(feature = "smp"))]
        {
            false
        }
    }

    /// Remaining contention budget. Diagnostic only.
    #[cfg(feature = "deadlock-detect")]
    #[inline(always)]
    pub fn contention_budget(&self) -> i32 {
        self.contention.load(Ordering::Relaxed)
    }

    #[cfg(all(test, feature = "deadlock-detect"))]
    pub(crate) fn set_contention_budget(&self, budget: i32) {
        self.contention.store(budget, Ordering::Relaxed);
    }
}

impl Default for RawSpinLock {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}
