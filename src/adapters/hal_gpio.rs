//! [`GpioPort`] over a pair of `embedded_hal::digital::OutputPin`s.
//!
//! Lets the driver run on any HAL that hands out typed output pins
//! instead of raw GPIO numbers.  The two pins are bound to the enable and
//! haptic-enable [`LineId`]s of the hardware description; requests for
//! any other line fail with [`GpioError::InvalidLine`].

use embedded_hal::digital::{OutputPin, PinState};
use log::debug;

use crate::app::ports::{GpioError, GpioPort, LineId};
use crate::config::HardwareDescription;

/// Provider code reported when the HAL pin itself returns an error.
pub const HAL_PIN_ERROR: i32 = -1;

struct Bound<P> {
    line: LineId,
    pin: P,
    claimed: bool,
}

impl<P: OutputPin> Bound<P> {
    fn drive(&mut self, level: PinState) -> Result<(), GpioError> {
        self.pin
            .set_state(level)
            .map_err(|_| GpioError::Provider(HAL_PIN_ERROR))
    }
}

pub struct HalGpio<EN, HEN> {
    enable: Bound<EN>,
    haptic_enable: Bound<HEN>,
}

impl<EN, HEN> HalGpio<EN, HEN>
where
    EN: OutputPin + Send + 'static,
    HEN: OutputPin + Send + 'static,
{
    pub fn new(desc: &HardwareDescription, enable: EN, haptic_enable: HEN) -> Self {
        Self {
            enable: Bound {
                line: desc.enable_line,
                pin: enable,
                claimed: false,
            },
            haptic_enable: Bound {
                line: desc.haptic_enable_line,
                pin: haptic_enable,
                claimed: false,
            },
        }
    }

    /// Hand the pins back.
    pub fn into_pins(self) -> (EN, HEN) {
        (self.enable.pin, self.haptic_enable.pin)
    }

    fn claimed(&mut self, line: LineId) -> Result<&mut bool, GpioError> {
        if line == self.enable.line {
            Ok(&mut self.enable.claimed)
        } else if line == self.haptic_enable.line {
            Ok(&mut self.haptic_enable.claimed)
        } else {
            Err(GpioError::InvalidLine)
        }
    }

    fn drive(&mut self, line: LineId, level: PinState) -> Result<(), GpioError> {
        if line == self.enable.line {
            self.enable.drive(level)
        } else {
            self.haptic_enable.drive(level)
        }
    }
}

impl<EN, HEN> GpioPort for HalGpio<EN, HEN>
where
    EN: OutputPin + Send + 'static,
    HEN: OutputPin + Send + 'static,
{
    fn request_output(
        &mut self,
        line: LineId,
        label: &'static str,
        initial: PinState,
    ) -> Result<(), GpioError> {
        if *self.claimed(line)? {
            return Err(GpioError::Busy);
        }
        self.drive(line, initial)?;
        *self.claimed(line)? = true;
        debug!("hal_gpio: {} claimed by '{}'", line, label);
        Ok(())
    }

    fn set_line(&mut self, line: LineId, level: PinState) -> Result<(), GpioError> {
        if !*self.claimed(line)? {
            return Err(GpioError::NotClaimed);
        }
        self.drive(line, level)
    }

    fn free(&mut self, line: LineId) {
        if let Ok(claimed) = self.claimed(line) {
            *claimed = false;
        }
    }
}
