//! ISA1000 haptic actuator driver.
//!
//! Turns force-feedback rumble requests into a PWM duty cycle on an
//! ISA1000 motor driver, gated by its enable line.  All ESP-IDF-specific
//! code is guarded by `#[cfg(target_os = "espidf")]` within each module;
//! host builds run the same logic against simulation stubs.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod power;
pub mod scheduler;

#[cfg(target_os = "espidf")]
mod esp_link_shims;

pub use app::effects::{InputDeviceInfo, RumbleEffect};
pub use app::service::{DeviceStatus, HapticDevice, WorkerMode};
pub use config::{DriveLimits, HapticConfig, HardwareDescription};
pub use error::{DriveError, Error, SetupError};
