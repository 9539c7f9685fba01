//! ESP-IDF runtime symbol providers for third-party crates.
//!
//! `critical-section` 1.x resolves its acquire/release pair at link time.
//! The scheduler slot and signals in [`crate::scheduler`] rely on it, so
//! the firmware provides a reentrant implementation backed by a std mutex.

use core::cell::{Cell, RefCell};
use std::sync::{Mutex, MutexGuard, PoisonError};

static CRITICAL_SECTION_MUTEX: Mutex<()> = Mutex::new(());

thread_local! {
    static CRITICAL_SECTION_DEPTH: Cell<u8> = const { Cell::new(0) };
    static CRITICAL_SECTION_GUARD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    CRITICAL_SECTION_DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            let lock = CRITICAL_SECTION_MUTEX
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            CRITICAL_SECTION_GUARD.with(|guard| *guard.borrow_mut() = Some(lock));
        }
        let new_depth = d.saturating_add(1);
        depth.set(new_depth);
        new_depth
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    CRITICAL_SECTION_DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            return;
        }
        depth.set(d - 1);
        if d == 1 {
            CRITICAL_SECTION_GUARD.with(|guard| *guard.borrow_mut() = None);
        }
    })
}
