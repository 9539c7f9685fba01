//! ISA1000 haptic motor driver.
//!
//! The chip is driven by a PWM input whose duty cycle sets vibration
//! strength, gated by an active-HIGH chip enable line.  A second line
//! powers the haptic rail and stays HIGH for the lifetime of the device.
//!
//! ## Sequencing contract
//!
//! ```text
//!   on:   pwm.configure ──▶ pwm.enable ──▶ EN high
//!   off:  EN low ──▶ pwm.disable
//! ```
//!
//! EN is asserted only after the PWM path has been confirmed running, and
//! is cut first on the way down so no drive energy reaches the motor while
//! the PWM is still live.  A failure anywhere on the `on` path runs the
//! `off` sequence before returning, so the outputs never end half on.
//!
//! ## Dual-target design
//!
//! This driver only talks to [`PwmPort`] / [`GpioPort`].  On ESP-IDF those
//! are the LEDC/GPIO adapters; on host they are simulation stubs or test
//! mocks.

use embedded_hal::digital::PinState;
use log::{error, warn};

use crate::app::ports::{GpioPort, LineId, PwmPort};
use crate::config::{HardwareDescription, NSEC_PER_SEC};
use crate::control::policy::DriveCommand;
use crate::error::DriveError;

// ═══════════════════════════════════════════════════════════════
//  Drive signal generator
// ═══════════════════════════════════════════════════════════════

pub struct Isa1000<P: PwmPort, G: GpioPort> {
    pwm: P,
    gpio: G,
    enable_line: LineId,
    haptic_enable_line: LineId,
    period_ns: u32,
}

impl<P: PwmPort, G: GpioPort> Isa1000<P, G> {
    /// Wrap already-claimed hardware.  `pwm_frequency_hz` must be
    /// validated (non-zero, at most 1 GHz).
    pub fn new(pwm: P, gpio: G, desc: &HardwareDescription, pwm_frequency_hz: u32) -> Self {
        Self {
            pwm,
            gpio,
            enable_line: desc.enable_line,
            haptic_enable_line: desc.haptic_enable_line,
            period_ns: NSEC_PER_SEC / pwm_frequency_hz.max(1),
        }
    }

    pub fn period_ns(&self) -> u32 {
        self.period_ns
    }

    /// High time for `duty_percent` of one period.
    pub fn duty_ns(&self, duty_percent: u8) -> u32 {
        let duty = u64::from(duty_percent.min(100));
        (u64::from(self.period_ns) * duty / 100) as u32
    }

    /// Turn the drive signal on at `duty_percent`, or off.
    ///
    /// The off path is infallible; provider failures there are logged.
    pub fn apply(&mut self, duty_percent: u8, on: bool) -> Result<(), DriveError> {
        if on {
            self.drive_on(duty_percent)
        } else {
            self.drive_off();
            Ok(())
        }
    }

    fn drive_on(&mut self, duty_percent: u8) -> Result<(), DriveError> {
        let period_ns = self.period_ns;
        let duty_ns = self.duty_ns(duty_percent);

        if let Err(e) = self.pwm.configure(duty_ns, period_ns) {
            error!(
                "isa1000: unable to config pwm ch{} ({}/{} ns): {}",
                self.pwm.channel(),
                duty_ns,
                period_ns,
                e
            );
            self.drive_off();
            return Err(DriveError::PwmConfig(e));
        }

        if let Err(e) = self.pwm.enable() {
            error!("isa1000: unable to enable pwm ch{}: {}", self.pwm.channel(), e);
            self.drive_off();
            return Err(DriveError::PwmEnable(e));
        }

        if let Err(e) = self.gpio.set_line(self.enable_line, PinState::High) {
            error!("isa1000: unable to assert {}: {}", self.enable_line, e);
            self.drive_off();
            return Err(DriveError::EnableLine(e));
        }

        Ok(())
    }

    fn drive_off(&mut self) {
        if let Err(e) = self.gpio.set_line(self.enable_line, PinState::Low) {
            warn!("isa1000: deassert {} failed: {}", self.enable_line, e);
        }
        if let Err(e) = self.pwm.disable() {
            warn!("isa1000: pwm ch{} disable failed: {}", self.pwm.channel(), e);
        }
    }

    /// Teardown: outputs off, haptic rail down, every resource returned.
    fn release(&mut self) {
        self.drive_off();
        if let Err(e) = self.gpio.set_line(self.haptic_enable_line, PinState::Low) {
            warn!("isa1000: deassert {} failed: {}", self.haptic_enable_line, e);
        }
        self.pwm.free();
        self.gpio.free(self.haptic_enable_line);
        self.gpio.free(self.enable_line);
    }
}

// ═══════════════════════════════════════════════════════════════
//  Actuator state
// ═══════════════════════════════════════════════════════════════

/// Everything the worker and the lifecycle paths mutate.  Lives behind
/// the device's hardware lock.
pub struct ActuatorState<P: PwmPort, G: GpioPort> {
    chip: Isa1000<P, G>,
    duty_percent: u8,
    active: bool,
    passes: u32,
    drive_failures: u32,
    last_error: Option<DriveError>,
    released: bool,
}

impl<P: PwmPort, G: GpioPort> ActuatorState<P, G> {
    pub fn new(chip: Isa1000<P, G>, initial_duty_percent: u8) -> Self {
        Self {
            chip,
            duty_percent: initial_duty_percent.min(100),
            active: false,
            passes: 0,
            drive_failures: 0,
            last_error: None,
            released: false,
        }
    }

    /// Apply one policy decision.
    ///
    /// A failed `on` leaves `active == false`: the generator has already
    /// run the off sequence, so that is what the hardware is doing.
    pub fn apply_command(&mut self, cmd: DriveCommand) -> Result<(), DriveError> {
        self.passes = self.passes.wrapping_add(1);
        if self.released {
            return Ok(());
        }

        self.duty_percent = cmd.duty_percent.min(100);
        match self.chip.apply(self.duty_percent, cmd.active) {
            Ok(()) => {
                self.active = cmd.active;
                Ok(())
            }
            Err(e) => {
                self.active = false;
                self.drive_failures = self.drive_failures.wrapping_add(1);
                self.last_error = Some(e);
                Err(e)
            }
        }
    }

    /// Unconditional off.  Used by close, suspend and teardown.
    pub fn force_off(&mut self) {
        if self.released {
            return;
        }
        self.chip.drive_off();
        self.active = false;
    }

    /// Outputs off and all hardware handed back.  Idempotent; later
    /// commands are ignored.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.chip.release();
        self.active = false;
        self.released = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn duty_percent(&self) -> u8 {
        self.duty_percent
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }

    pub fn drive_failures(&self) -> u32 {
        self.drive_failures
    }

    pub fn last_error(&self) -> Option<DriveError> {
        self.last_error
    }
}
