//! Hardware adapter: bridges the ESP32-S3 peripherals to the port traits.
//!
//! [`EspGpio`] implements [`GpioPort`] on plain GPIO outputs and
//! [`LedcProvider`] hands out [`LedcPwm`] channels implementing
//! [`PwmPort`].  This is the only module in the system that reaches the
//! raw peripheral helpers in [`hw_init`].  On non-espidf targets those
//! helpers are simulation stubs, so argument validation and bookkeeping
//! here still run on host.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::digital::PinState;
use log::{debug, info, warn};

use crate::app::ports::{GpioError, GpioPort, LineId, PwmError, PwmPort, PwmProvider};
use crate::config::NSEC_PER_SEC;
use crate::drivers::hw_init::{self, LEDC_DUTY_MAX};
use crate::pins;

fn is_high(level: PinState) -> bool {
    level == PinState::High
}

// ── GpioPort implementation ───────────────────────────────────

/// GPIO outputs on the SoC's own pads.
#[derive(Debug, Default)]
pub struct EspGpio {
    /// Bit `n` set while GPIO `n` is claimed.
    claimed: u64,
}

impl EspGpio {
    pub fn new() -> Self {
        Self::default()
    }

    fn bit(line: LineId) -> Result<u64, GpioError> {
        if line.0 < pins::ESP32S3_GPIO_COUNT {
            Ok(1u64 << line.0)
        } else {
            Err(GpioError::InvalidLine)
        }
    }

    pub fn is_claimed(&self, line: LineId) -> bool {
        Self::bit(line).is_ok_and(|b| self.claimed & b != 0)
    }
}

impl GpioPort for EspGpio {
    fn request_output(
        &mut self,
        line: LineId,
        label: &'static str,
        initial: PinState,
    ) -> Result<(), GpioError> {
        let bit = Self::bit(line)?;
        if self.claimed & bit != 0 {
            return Err(GpioError::Busy);
        }
        hw_init::gpio_configure_output(line.0 as i32, is_high(initial))
            .map_err(GpioError::Provider)?;
        self.claimed |= bit;
        debug!("gpio: {} claimed by '{}' ({:?})", line, label, initial);
        Ok(())
    }

    fn set_line(&mut self, line: LineId, level: PinState) -> Result<(), GpioError> {
        let bit = Self::bit(line)?;
        if self.claimed & bit == 0 {
            return Err(GpioError::NotClaimed);
        }
        hw_init::gpio_write(line.0 as i32, is_high(level)).map_err(GpioError::Provider)
    }

    fn free(&mut self, line: LineId) {
        let Ok(bit) = Self::bit(line) else {
            return;
        };
        if self.claimed & bit != 0 {
            hw_init::gpio_reset(line.0 as i32);
            self.claimed &= !bit;
            debug!("gpio: {} released", line);
        }
    }
}

// ── PwmProvider implementation ────────────────────────────────

/// The LEDC controller.  Every channel it hands out is routed to
/// `pwm_gpio`; the board has a single PWM consumer.
pub struct LedcProvider {
    pwm_gpio: i32,
    /// Bit `n` set while LEDC channel `n` is handed out.
    reserved: Arc<AtomicU32>,
}

impl LedcProvider {
    pub fn new(pwm_gpio: i32) -> Self {
        Self {
            pwm_gpio,
            reserved: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn board() -> Self {
        Self::new(pins::ISA1000_PWM_GPIO)
    }
}

impl PwmProvider for LedcProvider {
    type Pwm = LedcPwm;

    fn request(&mut self, channel: u32, label: &'static str) -> Result<LedcPwm, PwmError> {
        if channel >= pins::LEDC_CHANNEL_COUNT {
            return Err(PwmError::NoSuchChannel);
        }
        let bit = 1u32 << channel;
        if self.reserved.fetch_or(bit, Ordering::AcqRel) & bit != 0 {
            return Err(PwmError::Busy);
        }
        if let Err(rc) = hw_init::ledc_attach(channel, self.pwm_gpio, pins::ISA1000_PWM_FREQ_HZ) {
            self.reserved.fetch_and(!bit, Ordering::AcqRel);
            return Err(PwmError::Provider(rc));
        }
        info!("ledc: ch{} -> gpio{} reserved by '{}'", channel, self.pwm_gpio, label);
        Ok(LedcPwm {
            channel,
            gpio: self.pwm_gpio,
            freq_hz: pins::ISA1000_PWM_FREQ_HZ,
            duty_ticks: 0,
            reserved: Some(self.reserved.clone()),
        })
    }
}

// ── PwmPort implementation ────────────────────────────────────

/// One reserved LEDC channel.
pub struct LedcPwm {
    channel: u32,
    gpio: i32,
    freq_hz: u32,
    duty_ticks: u32,
    /// `None` once freed.
    reserved: Option<Arc<AtomicU32>>,
}

impl LedcPwm {
    /// Timer ticks for `duty_ns` of `period_ns` at the LEDC resolution.
    pub fn ticks(duty_ns: u32, period_ns: u32) -> u32 {
        (u64::from(duty_ns) * u64::from(LEDC_DUTY_MAX) / u64::from(period_ns.max(1))) as u32
    }

    pub fn frequency_hz(&self) -> u32 {
        self.freq_hz
    }

    pub fn duty_ticks(&self) -> u32 {
        self.duty_ticks
    }

    fn live(&self) -> Result<(), PwmError> {
        if self.reserved.is_some() { Ok(()) } else { Err(PwmError::NoSuchChannel) }
    }
}

impl PwmPort for LedcPwm {
    fn configure(&mut self, duty_ns: u32, period_ns: u32) -> Result<(), PwmError> {
        self.live()?;
        if period_ns == 0 || duty_ns > period_ns {
            return Err(PwmError::InvalidArgument);
        }
        let freq_hz = NSEC_PER_SEC / period_ns;
        if freq_hz == 0 {
            return Err(PwmError::InvalidArgument);
        }
        if freq_hz != self.freq_hz {
            hw_init::ledc_set_frequency(freq_hz).map_err(PwmError::Provider)?;
            self.freq_hz = freq_hz;
        }
        self.duty_ticks = Self::ticks(duty_ns, period_ns);
        Ok(())
    }

    fn enable(&mut self) -> Result<(), PwmError> {
        self.live()?;
        hw_init::ledc_start(self.channel, self.duty_ticks).map_err(PwmError::Provider)
    }

    fn disable(&mut self) -> Result<(), PwmError> {
        self.live()?;
        hw_init::ledc_halt(self.channel).map_err(PwmError::Provider)
    }

    fn free(&mut self) {
        let Some(reserved) = self.reserved.take() else {
            return;
        };
        if let Err(rc) = hw_init::ledc_halt(self.channel) {
            warn!("ledc: ch{} halt on free failed (rc={})", self.channel, rc);
        }
        hw_init::gpio_reset(self.gpio);
        reserved.fetch_and(!(1u32 << self.channel), Ordering::AcqRel);
        info!("ledc: ch{} released", self.channel);
    }

    fn channel(&self) -> u32 {
        self.channel
    }
}

impl Drop for LedcPwm {
    fn drop(&mut self) {
        self.free();
    }
}
