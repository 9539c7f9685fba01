//! Driver configuration and hardware description.
//!
//! [`HapticConfig`] carries the tunable drive parameters; it is fixed for
//! the lifetime of an attached device.  [`HardwareDescription`] is the
//! board wiring read once at attach from a [`DescriptionSource`].

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{DescriptionSource, LineId};
use crate::error::SetupError;
use crate::pins;

pub const NSEC_PER_SEC: u32 = 1_000_000_000;

/// Compatible string matched against the hardware description.
pub const COMPATIBLE: &str = "imagis,isa1000";

/// Description property: chip enable GPIO.
pub const PROP_ENABLE_GPIO: &str = "gpio-isa1000-en";
/// Description property: haptic rail enable GPIO.
pub const PROP_HAPTIC_ENABLE_GPIO: &str = "gpio-haptic-en";
/// Description property: PWM output channel.
pub const PROP_PWM_CHANNEL: &str = "pwm-channel";

// ---------------------------------------------------------------------------
// Drive configuration
// ---------------------------------------------------------------------------

/// Duty-cycle bounds applied by the intensity policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveLimits {
    /// Floor for any non-zero request (weakest perceptible vibration).
    pub min_active_percent: u8,
    /// Ceiling for any request.
    pub max_percent: u8,
    /// Duty recorded while idle.  No physical effect; the output is off.
    pub idle_percent: u8,
}

impl Default for DriveLimits {
    fn default() -> Self {
        Self {
            min_active_percent: 70,
            max_percent: 100,
            idle_percent: 50,
        }
    }
}

/// Core driver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HapticConfig {
    /// PWM carrier frequency in Hz.
    pub pwm_frequency_hz: u32,
    /// Duty held before the first request arrives (0-100%).
    pub initial_duty_percent: u8,
    /// Policy clamp bounds.
    pub limits: DriveLimits,
}

impl Default for HapticConfig {
    fn default() -> Self {
        Self {
            pwm_frequency_hz: pins::ISA1000_PWM_FREQ_HZ,
            initial_duty_percent: 80,
            limits: DriveLimits::default(),
        }
    }
}

impl HapticConfig {
    /// Reject values the drive path cannot honour.  Invalid ranges are
    /// refused, never silently clamped.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.pwm_frequency_hz == 0 {
            return Err(SetupError::InvalidConfig("pwm_frequency_hz must be non-zero"));
        }
        if self.pwm_frequency_hz > NSEC_PER_SEC {
            return Err(SetupError::InvalidConfig("pwm_frequency_hz above 1 GHz"));
        }
        if self.initial_duty_percent > 100 {
            return Err(SetupError::InvalidConfig("initial_duty_percent above 100"));
        }
        let l = &self.limits;
        if l.max_percent > 100 || l.idle_percent > 100 {
            return Err(SetupError::InvalidConfig("duty limit above 100"));
        }
        if l.min_active_percent > l.max_percent {
            return Err(SetupError::InvalidConfig("min_active_percent above max_percent"));
        }
        Ok(())
    }

    /// PWM period in nanoseconds.  Only meaningful after [`validate`](Self::validate).
    pub fn period_ns(&self) -> u32 {
        NSEC_PER_SEC / self.pwm_frequency_hz.max(1)
    }
}

// ---------------------------------------------------------------------------
// Hardware description
// ---------------------------------------------------------------------------

/// Board wiring of one ISA1000.  Immutable after attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareDescription {
    pub enable_line: LineId,
    pub haptic_enable_line: LineId,
    pub pwm_channel: u32,
}

impl HardwareDescription {
    /// Read the wiring from a description node.
    ///
    /// Both GPIO properties are mandatory.  A missing `pwm-channel` is
    /// logged and falls back to channel 0.
    pub fn parse<S: DescriptionSource + ?Sized>(source: &S) -> Result<Self, SetupError> {
        if !source.is_compatible(COMPATIBLE) {
            return Err(SetupError::Incompatible);
        }

        let enable_line = Self::gpio(source, PROP_ENABLE_GPIO)?;
        let haptic_enable_line = Self::gpio(source, PROP_HAPTIC_ENABLE_GPIO)?;
        let pwm_channel = source.read_u32(PROP_PWM_CHANNEL).unwrap_or_else(|| {
            warn!("isa1000: please check pwm output channel, using 0");
            0
        });

        info!(
            "isa1000: {}: {}, {}: {}, {}: {}",
            PROP_ENABLE_GPIO,
            enable_line,
            PROP_HAPTIC_ENABLE_GPIO,
            haptic_enable_line,
            PROP_PWM_CHANNEL,
            pwm_channel
        );

        Ok(Self {
            enable_line,
            haptic_enable_line,
            pwm_channel,
        })
    }

    fn gpio<S: DescriptionSource + ?Sized>(
        source: &S,
        name: &'static str,
    ) -> Result<LineId, SetupError> {
        match source.named_gpio(name) {
            None => {
                warn!("isa1000: please check {}", name);
                Err(SetupError::MissingGpio(name))
            }
            Some(value) if !(0..=pins::MAX_LINE_ID).contains(&value) => {
                warn!("isa1000: invalid gpio {} in {}", value, name);
                Err(SetupError::InvalidGpio { name, value })
            }
            Some(value) => Ok(LineId(value as u32)),
        }
    }
}
