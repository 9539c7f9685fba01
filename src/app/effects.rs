//! Force-feedback front end: rumble effects and the device identity
//! presented to the input layer.

use heapless::String;
use serde::{Deserialize, Serialize};

/// Name the device registers under.
pub const DEVICE_NAME: &str = "isa1000-ff-memless";
/// Input device version.
pub const DEVICE_VERSION: u16 = 1;

/// Dual-motor rumble request as delivered by a memoryless FF core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RumbleEffect {
    pub strong_magnitude: u16,
    pub weak_magnitude: u16,
}

impl RumbleEffect {
    pub const fn new(strong_magnitude: u16, weak_magnitude: u16) -> Self {
        Self {
            strong_magnitude,
            weak_magnitude,
        }
    }

    /// Raw intensity for the single ISA1000 motor, `0..=255`.
    ///
    /// The strong motor wins; the weak magnitude only counts when the
    /// strong one rounds to zero, and at half weight.
    pub const fn intensity(&self) -> u32 {
        let strong = (self.strong_magnitude >> 8) as u32;
        if strong != 0 {
            strong
        } else {
            (self.weak_magnitude >> 9) as u32
        }
    }
}

/// Force-feedback capabilities a device can advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FfCapability {
    Rumble,
}

/// What the device tells the input layer about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeviceInfo {
    pub name: String<32>,
    pub version: u16,
    pub capabilities: &'static [FfCapability],
}

impl InputDeviceInfo {
    pub fn isa1000() -> Self {
        let mut name = String::new();
        // DEVICE_NAME is shorter than the capacity.
        let _ = name.push_str(DEVICE_NAME);
        Self {
            name,
            version: DEVICE_VERSION,
            capabilities: &[FfCapability::Rumble],
        }
    }

    pub fn supports(&self, capability: FfCapability) -> bool {
        self.capabilities.contains(&capability)
    }
}
