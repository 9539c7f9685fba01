//! Port traits: the hexagonal boundary between the haptic core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ HapticDevice (domain)
//! ```
//!
//! Driven adapters (PWM controller, GPIO lines, hardware description)
//! implement these traits.  [`HapticDevice`](super::service::HapticDevice)
//! consumes them via generics, so the domain core never touches registers
//! directly and runs unchanged against the recording mocks in `tests/`.
//!
//! Ports that are called from the effect worker thread must be `Send`.

use core::fmt;

use embedded_hal::digital::PinState;
use serde::{Deserialize, Serialize};

// ───────────────────────────────────────────────────────────────
// Line identifiers
// ───────────────────────────────────────────────────────────────

/// Identifier of a digital output line (a GPIO number on the board).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub u32);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpio{}", self.0)
    }
}

// ───────────────────────────────────────────────────────────────
// PWM port (driven adapter: domain → PWM controller)
// ───────────────────────────────────────────────────────────────

/// An acquired PWM output.  The handle is bound to its channel when the
/// [`PwmProvider`] hands it out; it is owned exclusively by the actuator.
pub trait PwmPort: Send + 'static {
    /// Program period and high time, both in nanoseconds.
    ///
    /// Implementations reject `duty_ns > period_ns` and `period_ns == 0`
    /// with [`PwmError::InvalidArgument`].
    fn configure(&mut self, duty_ns: u32, period_ns: u32) -> Result<(), PwmError>;

    /// Start generating the configured waveform.
    fn enable(&mut self) -> Result<(), PwmError>;

    /// Stop the waveform and park the output low.
    ///
    /// Callers on the shutdown path log a failure and carry on.
    fn disable(&mut self) -> Result<(), PwmError>;

    /// Give the channel back to the controller (teardown only).
    fn free(&mut self);

    /// The channel this handle drives.
    fn channel(&self) -> u32;
}

/// Hands out [`PwmPort`] handles (setup only).
pub trait PwmProvider {
    type Pwm: PwmPort;

    /// Reserve `channel` for exclusive use under `label`.
    fn request(&mut self, channel: u32, label: &'static str) -> Result<Self::Pwm, PwmError>;
}

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain → digital outputs)
// ───────────────────────────────────────────────────────────────

/// Digital output lines used by the driver chip.
pub trait GpioPort: Send + 'static {
    /// Claim `line` as an output and drive it to `initial`.
    fn request_output(
        &mut self,
        line: LineId,
        label: &'static str,
        initial: PinState,
    ) -> Result<(), GpioError>;

    /// Drive a claimed line.
    fn set_line(&mut self, line: LineId, level: PinState) -> Result<(), GpioError>;

    /// Release a claimed line.  Releasing an unclaimed line is a no-op.
    fn free(&mut self, line: LineId);
}

// ───────────────────────────────────────────────────────────────
// Hardware description port (setup only)
// ───────────────────────────────────────────────────────────────

/// Read-only view of the board's hardware description (device-tree style
/// node).  Consulted once by
/// [`HardwareDescription::parse`](crate::config::HardwareDescription::parse).
pub trait DescriptionSource {
    /// True if the node lists `compatible` among its compatible strings.
    fn is_compatible(&self, compatible: &str) -> bool;

    /// Raw GPIO number bound to the named property, if present.
    /// May be negative when the description encodes an error.
    fn named_gpio(&self, name: &str) -> Option<i64>;

    /// A `u32` property, if present and well-formed.
    fn read_u32(&self, name: &str) -> Option<u32>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`PwmPort`] / [`PwmProvider`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmError {
    /// Period/duty combination the controller cannot produce.
    InvalidArgument,
    /// Channel already reserved by someone else.
    Busy,
    /// Channel does not exist on this controller.
    NoSuchChannel,
    /// Controller-specific error code.
    Provider(i32),
}

/// Errors from [`GpioPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// Line number is not valid on this controller.
    InvalidLine,
    /// Line already claimed.
    Busy,
    /// Line was never claimed through [`GpioPort::request_output`].
    NotClaimed,
    /// Controller-specific error code.
    Provider(i32),
}

impl fmt::Display for PwmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid period/duty"),
            Self::Busy => write!(f, "channel busy"),
            Self::NoSuchChannel => write!(f, "no such channel"),
            Self::Provider(rc) => write!(f, "provider error (rc={})", rc),
        }
    }
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLine => write!(f, "invalid line"),
            Self::Busy => write!(f, "line busy"),
            Self::NotClaimed => write!(f, "line not claimed"),
            Self::Provider(rc) => write!(f, "provider error (rc={})", rc),
        }
    }
}

impl core::error::Error for PwmError {}
impl core::error::Error for GpioError {}
