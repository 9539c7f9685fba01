//! Error types for the ISA1000 driver.
//!
//! Two failure classes reach the outside world:
//!
//! - [`SetupError`] aborts attach.  The actuator never becomes usable and
//!   every resource claimed so far is released before it is returned.
//! - [`DriveError`] is a runtime PWM/GPIO rejection.  It is logged and
//!   recorded in the device status; the fire-and-forget request path never
//!   sees it.
//!
//! Shutdown-path failures have no type at all: they are logged and dropped.
//! All variants are `Copy` so they can be stored in the actuator status
//! without allocation.

use core::fmt;

use crate::app::ports::{GpioError, LineId, PwmError};

// ---------------------------------------------------------------------------
// Top-level driver error
// ---------------------------------------------------------------------------

/// Every fallible driver operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Attach failed.
    Setup(SetupError),
    /// Programming the drive signal failed.
    Drive(DriveError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup(e) => write!(f, "setup: {e}"),
            Self::Drive(e) => write!(f, "drive: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Setup errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    /// Hardware description node is not an ISA1000.
    Incompatible,
    /// Hardware description could not be parsed at all.
    MalformedDescription,
    /// Required GPIO property is absent.
    MissingGpio(&'static str),
    /// GPIO property holds a number that is not a valid line.
    InvalidGpio { name: &'static str, value: i64 },
    /// Configuration failed range validation.
    InvalidConfig(&'static str),
    /// A GPIO line could not be claimed.
    GpioRequest { line: LineId, cause: GpioError },
    /// The PWM channel could not be reserved.
    PwmRequest { channel: u32, cause: PwmError },
    /// The effect worker thread could not be started.
    WorkerSpawn,
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incompatible => write!(f, "description is not compatible"),
            Self::MalformedDescription => write!(f, "malformed hardware description"),
            Self::MissingGpio(name) => write!(f, "missing gpio property '{name}'"),
            Self::InvalidGpio { name, value } => write!(f, "invalid gpio {value} in '{name}'"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::GpioRequest { line, cause } => write!(f, "{line} request failed: {cause}"),
            Self::PwmRequest { channel, cause } => {
                write!(f, "pwm channel {channel} request failed: {cause}")
            }
            Self::WorkerSpawn => write!(f, "effect worker spawn failed"),
        }
    }
}

impl core::error::Error for SetupError {}

impl From<SetupError> for Error {
    fn from(e: SetupError) -> Self {
        Self::Setup(e)
    }
}

// ---------------------------------------------------------------------------
// Drive errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveError {
    /// PWM controller rejected the period/duty pair.
    PwmConfig(PwmError),
    /// PWM controller refused to start the output.
    PwmEnable(PwmError),
    /// The chip enable line could not be asserted.
    EnableLine(GpioError),
}

impl fmt::Display for DriveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmConfig(e) => write!(f, "unable to config pwm: {e}"),
            Self::PwmEnable(e) => write!(f, "unable to enable pwm: {e}"),
            Self::EnableLine(e) => write!(f, "unable to assert enable line: {e}"),
        }
    }
}

impl core::error::Error for DriveError {}

impl From<DriveError> for Error {
    fn from(e: DriveError) -> Self {
        Self::Drive(e)
    }
}
