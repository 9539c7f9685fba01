//! Fuzz target: request / close / suspend sequences
//!
//! Drives a manual-mode device through arbitrary operation sequences
//! against an in-memory PWM/GPIO pair and verifies:
//! - No panics
//! - The enable line is only ever HIGH while the PWM is running
//! - `close` always leaves the actuator off with EN LOW
//! - Detach frees every line and the PWM channel
//!
//! cargo fuzz run fuzz_lifecycle

#![no_main]

use std::sync::{Arc, Mutex};

use embedded_hal::digital::PinState;
use isa1000::adapters::description::BoardDescription;
use isa1000::app::ports::{GpioError, GpioPort, LineId, PwmError, PwmPort, PwmProvider};
use isa1000::pins;
use isa1000::{HapticConfig, HapticDevice, RumbleEffect, WorkerMode};
use libfuzzer_sys::fuzz_target;

// ── In-memory hardware ────────────────────────────────────────

#[derive(Default)]
struct Hw {
    en_high: bool,
    pwm_running: bool,
    claimed_lines: u32,
    pwm_reserved: bool,
    fail_configure: bool,
    fail_enable: bool,
}

type Shared = Arc<Mutex<Hw>>;

#[derive(Clone)]
struct Gpio(Shared);
struct Pwm(Shared);

impl GpioPort for Gpio {
    fn request_output(&mut self, line: LineId, _: &'static str, initial: PinState) -> Result<(), GpioError> {
        let mut hw = self.0.lock().unwrap();
        hw.claimed_lines += 1;
        if line.0 == pins::ISA1000_EN_GPIO {
            hw.en_high = initial == PinState::High;
        }
        Ok(())
    }

    fn set_line(&mut self, line: LineId, level: PinState) -> Result<(), GpioError> {
        let mut hw = self.0.lock().unwrap();
        if line.0 == pins::ISA1000_EN_GPIO {
            hw.en_high = level == PinState::High;
            assert!(!hw.en_high || hw.pwm_running, "EN asserted with PWM stopped");
        }
        Ok(())
    }

    fn free(&mut self, _line: LineId) {
        self.0.lock().unwrap().claimed_lines -= 1;
    }
}

impl PwmProvider for Gpio {
    type Pwm = Pwm;

    fn request(&mut self, _channel: u32, _label: &'static str) -> Result<Pwm, PwmError> {
        self.0.lock().unwrap().pwm_reserved = true;
        Ok(Pwm(self.0.clone()))
    }
}

impl PwmPort for Pwm {
    fn configure(&mut self, duty_ns: u32, period_ns: u32) -> Result<(), PwmError> {
        let hw = self.0.lock().unwrap();
        assert!(duty_ns <= period_ns);
        if hw.fail_configure { Err(PwmError::InvalidArgument) } else { Ok(()) }
    }

    fn enable(&mut self) -> Result<(), PwmError> {
        let mut hw = self.0.lock().unwrap();
        if hw.fail_enable {
            return Err(PwmError::Provider(-1));
        }
        hw.pwm_running = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), PwmError> {
        let mut hw = self.0.lock().unwrap();
        assert!(!hw.en_high, "PWM stopped before EN was cut");
        hw.pwm_running = false;
        Ok(())
    }

    fn free(&mut self) {
        self.0.lock().unwrap().pwm_reserved = false;
    }

    fn channel(&self) -> u32 {
        0
    }
}

// ── Target ────────────────────────────────────────────────────

fuzz_target!(|data: &[u8]| {
    let hw: Shared = Arc::default();
    let gpio = Gpio(hw.clone());
    let mut provider = gpio.clone();
    let Ok(dev) = HapticDevice::probe(
        &BoardDescription,
        &HapticConfig::default(),
        &mut provider,
        gpio,
        WorkerMode::Manual,
    ) else {
        return;
    };

    for chunk in data.chunks(3) {
        let arg = chunk.get(1..).map_or(0, |b| b.iter().fold(0u32, |a, &x| a << 8 | u32::from(x)));
        match chunk[0] % 8 {
            0 | 1 => dev.set_intensity(arg),
            2 => dev.play_effect(&RumbleEffect::new(arg as u16, (arg >> 8) as u16)),
            3 => dev.flush(),
            4 => {
                dev.close();
                assert!(!dev.status().active);
                assert!(!hw.lock().unwrap().en_high);
            }
            5 => dev.suspend(),
            6 => dev.resume(),
            _ => {
                let mut h = hw.lock().unwrap();
                h.fail_configure = arg & 1 != 0;
                h.fail_enable = arg & 2 != 0;
            }
        }
        let status = dev.status();
        assert!(status.duty_percent <= 100);
        if status.active {
            assert!(hw.lock().unwrap().en_high);
        }
    }

    dev.detach();
    let h = hw.lock().unwrap();
    assert_eq!(h.claimed_lines, 0);
    assert!(!h.pwm_reserved);
    assert!(!h.en_high);
});
