//! The guard-parameterized spinlock and its protocol combinators.

use core::{
    cell::UnsafeCell,
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

use crate::guard::BaseGuard;
use crate::raw::RawSpinLock;

/// A spinlock protecting a value of type `T`, with critical-section behavior
/// chosen by the guard strategy `G`.
///
/// Acquisition enters the strategy's critical section *first* (the context
/// optimistically gives up preemption and/or IRQs), then races for the lock
/// word; a failed attempt backs the strategy out again immediately, so a
/// spinning contender re-enables interrupts between attempts instead of
/// sitting on them for the whole wait.
///
/// # Examples
///
/// ```rust,ignore
/// use kspinlock::SpinNoIrq;
///
/// static COUNTER: SpinNoIrq<u32> = SpinNoIrq::new(0);
///
/// fn increment() {
///     let mut count = COUNTER.lock();
///     *count += 1;
/// } // lock released, IRQ state and preemptibility restored
/// ```
pub struct SpinLock<G: BaseGuard, T: ?Sized> {
    _phantom: PhantomData<G>,
    raw: RawSpinLock,
    data: UnsafeCell<T>,
}

/// RAII guard for [`SpinLock`].
///
/// Grants access to the protected data; dropping it releases the lock word
/// and then exits the strategy's critical section, in that order.
pub struct SpinLockGuard<'a, G: BaseGuard, T: ?Sized + 'a> {
    _phantom: PhantomData<G>,
    guard_state: G::State,
    raw: &'a RawSpinLock,
    data: *mut T,
}

// Same unsafe impls as `std::sync::Mutex`
unsafe impl<G: BaseGuard, T: ?Sized + Send> Sync for SpinLock<G, T> {}
unsafe impl<G: BaseGuard, T: ?Sized + Send> Send for SpinLock<G, T> {}

impl<G: BaseGuard, T> SpinLock<G, T> {
    /// Creates a new unlocked spinlock. Usable in statics.
    #[inline(always)]
    pub const fn new(data: T) -> Self {
        Self {
            _phantom: PhantomData,
            raw: RawSpinLock::new(),
            data: UnsafeCell::new(data),
        }
    }

    /// Creates a spinlock that starts out held.
    ///
    /// The data stays inaccessible until some initialization path calls
    /// [`force_unlock`](Self::force_unlock). For bootstrap scenarios only.
    #[inline(always)]
    pub const fn new_locked(data: T) -> Self {
        Self {
            _phantom: PhantomData,
            raw: RawSpinLock::new_locked(),
            data: UnsafeCell::new(data),
        }
    }

    /// Consume the lock and return the inner value.
    #[inline(always)]
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<G: BaseGuard, T: ?Sized> SpinLock<G, T> {
    /// Try to acquire the lock without spinning.
    ///
    /// Enters the critical section, makes one attempt on the lock word, and
    /// backs the critical section out again if the attempt lost. Returns
    /// `Some(guard)` iff the lock was won.
    #[inline(always)]
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, G, T>> {
        let guard_state = G::acquire();

        if self.raw.try_acquire() {
            Some(SpinLockGuard {
                _phantom: PhantomData,
                guard_state,
                raw: &self.raw,
                data: unsafe { &mut *self.data.get() },
            })
        } else {
            G::rollback(guard_state);
            None
        }
    }

    /// Acquire the lock, spinning until it is available.
    ///
    /// Pure busy-wait (callers may be running with scheduling disabled).
    /// Each attempt re-enters and, on failure, re-exits the strategy's
    /// critical section, so an IRQ-saving strategy keeps interrupts disabled
    /// only around the individual attempts.
    ///
    /// # Panics
    ///
    /// With `deadlock-detect`, panics once the lock's contention budget is
    /// exhausted; see [`RawSpinLock::try_acquire`].
    #[inline(always)]
    pub fn lock(&self) -> SpinLockGuard<'_, G, T> {
        loop {
            if let Some(guard) = self.try_lock() {
                return guard;
            }
            core::hint::spin_loop();
        }
    }

    /// Acquire the lock only while `cond` holds on the protected data.
    ///
    /// `cond` is evaluated before taking the lock and, if that attempt is
    /// worth making, confirmed again once the lock is held, since the data
    /// may have changed between the unprotected read and the acquisition.
    /// Returns `Some(guard)` iff the *confirmed* evaluation is true; in
    /// every other case the lock is not left held.
    ///
    /// # Safety
    ///
    /// The pre-lock evaluations hand `cond` a reference to data a concurrent
    /// holder may be mutating through its own guard. The caller must ensure
    /// that `cond` reads nothing a concurrent critical section writes,
    /// unless that state carries its own synchronization (an atomic flag, a
    /// field written only before the lock is first shared). The evaluation
    /// that decides the return value runs with the lock held and needs no
    /// such care.
    ///
    /// ```rust,ignore
    /// // Take the lock only if the producer raised the atomic flag; the
    /// // unlocked peek reads nothing but the atomic.
    /// if let Some(inbox) = unsafe { INBOX.lock_if(|i| i.ready.load(Ordering::Relaxed)) } {
    ///     inbox.ready.store(false, Ordering::Relaxed);
    ///     // drain inbox.buf ...
    /// }
    /// ```
    pub unsafe fn lock_if<F>(&self, cond: F) -> Option<SpinLockGuard<'_, G, T>>
    where
        F: Fn(&T) -> bool,
    {
        loop {
            // Unlocked peek, hint only; confirmed under the lock below.
            // Aliasing a holder's exclusive access here is what the caller
            // vouched for.
            if !cond(unsafe { &*self.data.get() }) {
                return None;
            }
            if let Some(guard) = self.try_lock() {
                // Just been locked; the predicate must still hold.
                if cond(&guard) {
                    return Some(guard);
                }
                return None;
            }
            core::hint::spin_loop();
        }
    }

    /// Run `f` on the protected data with the lock held.
    ///
    /// The lock is released on every exit path out of `f`, including
    /// unwinding. On a `SpinNoIrq`-style lock this also brackets `f` with
    /// the IRQ save/restore.
    #[inline]
    pub fn with_locked<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// Whether the lock is currently held (heuristic only).
    ///
    /// The result may be stale immediately. Do not use for synchronization.
    #[inline(always)]
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    /// Force unlock.
    ///
    /// The release counterpart of [`new_locked`](Self::new_locked): it
    /// releases only the lock word, no critical section is exited.
    ///
    /// # Safety
    ///
    /// Must only be called by the context that holds the lock. Violating
    /// this may cause data races.
    #[inline(always)]
    pub unsafe fn force_unlock(&self) {
        self.raw.release();
    }

    /// Get a mutable reference to the protected data without locking.
    ///
    /// Statically exclusive through `&mut self`, so no locking is needed.
    #[inline(always)]
    pub fn get_mut(&mut self) -> &mut T {
        unsafe { &mut *self.data.get() }
    }
}

impl<G: BaseGuard, T: Default> Default for SpinLock<G, T> {
    #[inline(always)]
    fn default() -> Self {
        Self::new(Default::default())
    }
}

impl<G: BaseGuard, T: ?Sized + fmt::Debug> fmt::Debug for SpinLock<G, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.try_lock() {
            Some(guard) => f.debug_struct("SpinLock").field("data", &&*guard).finish(),
            None => f
                .debug_struct("SpinLock")
                .field("data", &"<locked>")
                .finish(),
        }
    }
}

impl<G: BaseGuard, T: ?Sized> Deref for SpinLockGuard<'_, G, T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        unsafe { &*self.data }
    }
}

impl<G: BaseGuard, T: ?Sized> DerefMut for SpinLockGuard<'_, G, T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.data }
    }
}

impl<G: BaseGuard, T: ?Sized + fmt::Debug> fmt::Debug for SpinLockGuard<'_, G, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<G: BaseGuard, T: ?Sized> Drop for SpinLockGuard<'_, G, T> {
    /// Releases the lock word, then exits the critical section. For an
    /// IRQ-saving strategy the restore is what carries the barrier.
    #[inline(always)]
    fn drop(&mut self) {
        self.raw.release();
        G::release(self.guard_state);
    }
}
