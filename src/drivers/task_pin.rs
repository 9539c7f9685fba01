//! Worker thread spawning with core affinity.
//!
//! ESP-IDF implements `std::thread` on pthreads, which sit on FreeRTOS
//! tasks.  `esp_pthread_set_cfg()` configures the *next* `pthread_create()`
//! from the calling thread, so the config→spawn pair must not be
//! interleaved with other thread creation on the same thread.
//!
//! On host targets affinity and priority are ignored.

use std::io;
use std::thread::{Builder, JoinHandle};

/// CPU core of the ESP32-S3 Xtensa LX7 pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU), protocol stacks.
    Pro = 0,
    /// Core 1 (APP_CPU), runs the effect worker.
    App = 1,
}

/// Placement of a spawned worker.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
    /// Null-terminated; FreeRTOS keeps the pointer.
    pub name: &'static str,
}

/// Effect worker placement: app core, above the idle/IPC tasks, small stack.
pub const EFFECT_WORKER: TaskSpec = TaskSpec {
    core: Core::App,
    priority: 10,
    stack_kb: 4,
    name: "isa1000-work\0",
};

#[cfg(target_os = "espidf")]
pub fn spawn(spec: TaskSpec, f: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
    // SAFETY: the config struct is fully initialised by the IDF helper
    // and `spec.name` is a 'static null-terminated string.
    let ret = unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = spec.core as i32;
        cfg.prio = i32::from(spec.priority);
        cfg.stack_size = (spec.stack_kb * 1024) as i32;
        cfg.thread_name = spec.name.as_ptr() as *const _;
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_sys::ESP_OK as i32 {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    let display_name = spec.name.trim_end_matches('\0');
    log::info!(
        "task: spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name,
        spec.core,
        spec.priority,
        spec.stack_kb
    );

    Builder::new().name(display_name.into()).spawn(f)
}

#[cfg(not(target_os = "espidf"))]
pub fn spawn(spec: TaskSpec, f: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
    let display_name = spec.name.trim_end_matches('\0');
    log::debug!("task(sim): spawning '{}' (no core pinning)", display_name);

    // Host stacks are generous; the firmware budget would be too tight
    // for test harness frames.
    Builder::new()
        .name(display_name.into())
        .stack_size(spec.stack_kb.max(64) * 1024)
        .spawn(f)
}
