// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![allow(rustdoc::broken_intra_doc_links)]

//! # Architecture
//!
//! The crate is built bottom-up from four layers:
//!
//! - [`RawSpinLock`] (`raw` module): the atomic lock word (a single
//!   compare-and-swap on `smp` builds, a free acquire on single-core
//!   builds), plus the `deadlock-detect` contention budget that turns an
//!   endless spin into a fatal diagnosis.
//! - Guard strategies (`guard` module): what the holder gives up for the
//!   duration of the critical section: [`NoOp`] nothing, [`NoPreempt`] its
//!   preemptibility, [`IrqSave`] its interrupts, [`NoPreemptIrqSave`] both,
//!   [`NoPreemptIrqEnable`] both with interrupts forced on afterwards. The
//!   kernel backs these through the [`KernelCritIf`] interface.
//! - [`SpinLock<G, T>`] (`lock` module): the RAII lock combining the two,
//!   with per-attempt entry/exit of the strategy's critical section while
//!   spinning.
//! - Protocol combinators on [`SpinLock`]: conditional acquisition
//!   ([`SpinLock::lock_if`]) and scoped acquisition with guaranteed release
//!   ([`SpinLock::with_locked`]).

mod guard;
mod lock;
mod raw;


pub use guard::{
    BaseGuard, IrqSave, KernelCritIf, NoOp, NoPreempt, NoPreemptIrqEnable, NoPreemptIrqSave,
    SCHED_LOCK_UNIT,
};
pub use lock::{SpinLock, SpinLockGuard};
#[cfg(feature = "deadlock-detect")]
pub use raw::SPIN_CONTENTION_LIMIT;
pub use raw::RawSpinLock;

/// Raw spinlock with no critical-section strategy.
///
/// **Warning**: Must only be used in contexts where preemption and IRQs
/// are already disabled.
pub type SpinRaw<T> = SpinLock<NoOp, T>;

/// Guard for [`SpinRaw`].
pub type SpinRawGuard<'a, T> = SpinLockGuard<'a, NoOp, T>;

/// Spinlock that disables preemption while held.
///
/// Suitable when IRQ handlers never touch the same data, or when IRQs are
/// already off.
pub type SpinNoPreempt<T> = SpinLock<NoPreempt, T>;

/// Guard for [`SpinNoPreempt`].
pub type SpinNoPreemptGuard<'a, T> = SpinLockGuard<'a, NoPreempt, T>;

/// Spinlock that disables IRQs and preemption while held.
///
/// The safest option; usable from any context including interrupt handlers.
pub type SpinNoIrq<T> = SpinLock<NoPreemptIrqSave, T>;

/// Guard for [`SpinNoIrq`].
pub type SpinNoIrqGuard<'a, T> = SpinLockGuard<'a, NoPreemptIrqSave, T>;
