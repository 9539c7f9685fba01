//! Intensity-to-drive policy.
//!
//! Maps a raw requested intensity onto an on/off decision and a duty
//! percentage.  Any non-zero request produces at least
//! [`DriveLimits::min_active_percent`]; a motor driven below that floor
//! stalls without a perceptible vibration.

use crate::config::DriveLimits;

/// Result of evaluating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveCommand {
    pub active: bool,
    /// Always within `0..=100`.
    pub duty_percent: u8,
}

/// Evaluate `requested_intensity` against `limits`.
///
/// Zero turns the actuator off and records the idle duty.  Everything else
/// is clamped into `[min_active_percent, max_percent]`.
pub fn compute_drive(requested_intensity: u32, limits: &DriveLimits) -> DriveCommand {
    if requested_intensity == 0 {
        return DriveCommand {
            active: false,
            duty_percent: limits.idle_percent.min(100),
        };
    }

    let ceiling = u32::from(limits.max_percent.min(100));
    let floor = u32::from(limits.min_active_percent).min(ceiling);
    // min/max rather than clamp: never panics on inverted limits.
    let duty = requested_intensity.min(ceiling).max(floor);

    DriveCommand {
        active: true,
        duty_percent: duty as u8,
    }
}
