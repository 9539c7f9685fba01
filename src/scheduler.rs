//! Single-slot deferred work for effect requests.
//!
//! Effect requests arrive from arbitrary contexts (input core, timers,
//! other threads) and must never block on hardware.  They only mark the
//! slot; the worker thread performs the actual drive update.
//!
//! ```text
//!   Idle ──schedule──▶ Pending ──begin──▶ Running ──finish──▶ Idle
//!                         ▲                  │
//!                         │ finish       schedule
//!                         │                  ▼
//!                         └────────── RunningPending
//!
//!   cancel_sync:  Pending → Idle,  RunningPending → Running, then wait
//! ```
//!
//! Any number of `schedule()` calls while a pass is pending collapse into
//! that one pass.  A request that lands while a pass is running earns
//! exactly one more pass, so a value written after the running pass read
//! it is never lost.
//!
//! The slot is guarded by a critical-section mutex and the worker is
//! woken through an `embassy-sync` [`Signal`]; both are safe to touch from
//! interrupt context on the target.  Completion is broadcast through a
//! generation counter and a [`Condvar`], so any number of threads may sit
//! in `cancel_sync` / `wait_idle` at once and all of them observe it.

use core::cell::Cell;
use std::sync::{Condvar, Mutex as StdMutex, PoisonError};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future::block_on;
use log::{debug, info};

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkState {
    /// Nothing queued, nothing running.
    Idle,
    /// One pass queued, worker not yet started on it.
    Pending,
    /// Worker is inside a pass.
    Running,
    /// Worker is inside a pass and another one is queued behind it.
    RunningPending,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    state: WorkState,
    shutdown: bool,
}

/// The coalescing work slot shared by request path, worker and lifecycle.
pub struct EffectScheduler {
    slot: Mutex<CriticalSectionRawMutex, Cell<Slot>>,
    /// Request path → worker.
    wake: Signal<CriticalSectionRawMutex, ()>,
    /// Completed passes (plus worker exit); bumped under the lock.
    done_gen: StdMutex<u64>,
    /// Worker → every waiter in `cancel_sync` / `wait_idle`.
    done: Condvar,
}

impl Default for EffectScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectScheduler {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(Slot {
                state: WorkState::Idle,
                shutdown: false,
            })),
            wake: Signal::new(),
            done_gen: StdMutex::new(0),
            done: Condvar::new(),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut Slot) -> R) -> R {
        self.slot.lock(|cell| {
            let mut slot = cell.get();
            let r = f(&mut slot);
            cell.set(slot);
            r
        })
    }

    pub fn state(&self) -> WorkState {
        self.slot.lock(|cell| cell.get().state)
    }

    pub fn is_shutdown(&self) -> bool {
        self.slot.lock(|cell| cell.get().shutdown)
    }

    /// Wake every thread blocked in [`wait_until`](Self::wait_until).
    fn broadcast_done(&self) {
        let mut generation = self.done_gen.lock().unwrap_or_else(PoisonError::into_inner);
        *generation = generation.wrapping_add(1);
        self.done.notify_all();
    }

    /// Block until `ready` holds.  The predicate is re-checked with the
    /// completion lock held, so a `finish` between check and wait is
    /// never missed.
    fn wait_until(&self, mut ready: impl FnMut(&Self) -> bool) {
        let mut generation = self.done_gen.lock().unwrap_or_else(PoisonError::into_inner);
        while !ready(self) {
            generation = self
                .done
                .wait(generation)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    // ── Request path ──────────────────────────────────────────

    /// Queue a pass.  Returns `false` if the request was absorbed by an
    /// already-queued pass (or the scheduler is shut down).
    ///
    /// Never blocks.
    pub fn schedule(&self) -> bool {
        let queued = self.update(|slot| {
            if slot.shutdown {
                return false;
            }
            match slot.state {
                WorkState::Idle => {
                    slot.state = WorkState::Pending;
                    true
                }
                WorkState::Running => {
                    slot.state = WorkState::RunningPending;
                    true
                }
                WorkState::Pending | WorkState::RunningPending => false,
            }
        });
        if queued {
            self.wake.signal(());
        }
        queued
    }

    // ── Worker side ───────────────────────────────────────────

    /// Claim the queued pass.  `false` if there is none.
    pub fn begin(&self) -> bool {
        self.update(|slot| {
            if slot.shutdown || slot.state != WorkState::Pending {
                return false;
            }
            slot.state = WorkState::Running;
            true
        })
    }

    /// Mark the running pass complete.  Returns `true` if another pass was
    /// requested meanwhile and is now pending.
    pub fn finish(&self) -> bool {
        let again = self.update(|slot| match slot.state {
            WorkState::RunningPending => {
                slot.state = WorkState::Pending;
                true
            }
            _ => {
                slot.state = WorkState::Idle;
                false
            }
        });
        self.broadcast_done();
        again
    }

    /// Worker thread body.  Runs `pass` once per claimed slot until
    /// [`shutdown`](Self::shutdown).
    pub fn run_worker(&self, mut pass: impl FnMut()) {
        info!("scheduler: effect worker running");
        loop {
            block_on(self.wake.wait());
            if self.is_shutdown() {
                break;
            }
            while self.begin() {
                pass();
                self.finish();
            }
        }
        self.broadcast_done();
        info!("scheduler: effect worker stopped");
    }

    // ── Lifecycle side ────────────────────────────────────────

    /// Drop a pass that has not started and block until a running pass
    /// completes.  Returns `true` if a queued pass was discarded.
    ///
    /// Only valid with a worker thread present, or from a thread other
    /// than the one running passes.
    pub fn cancel_sync(&self) -> bool {
        let cancelled = self.update(|slot| match slot.state {
            WorkState::Pending => {
                slot.state = WorkState::Idle;
                true
            }
            WorkState::RunningPending => {
                slot.state = WorkState::Running;
                true
            }
            WorkState::Idle | WorkState::Running => false,
        });
        if cancelled {
            debug!("scheduler: queued pass cancelled");
        }
        self.wait_until(|s| !matches!(s.state(), WorkState::Running | WorkState::RunningPending));
        cancelled
    }

    /// Block until every queued pass has run.  Requires a live worker.
    pub fn wait_idle(&self) {
        self.wait_until(|s| s.state() == WorkState::Idle || s.is_shutdown());
    }

    /// Stop accepting work and release the worker.  A queued pass is
    /// discarded; a running pass finishes normally.
    pub fn shutdown(&self) {
        self.update(|slot| {
            slot.shutdown = true;
            if slot.state == WorkState::Pending {
                slot.state = WorkState::Idle;
            }
        });
        self.wake.signal(());
        self.broadcast_done();
    }
}
