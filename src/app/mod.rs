//! Application core.
//!
//! [`service::HapticDevice`] holds the domain logic: request coalescing,
//! the drive policy and the close/suspend lifecycle.  All interaction
//! with hardware happens through the **port traits** in [`ports`],
//! keeping this layer testable without real peripherals.

pub mod effects;
pub mod ports;
pub mod service;
