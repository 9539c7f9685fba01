//! Mock hardware adapter for integration tests.
//!
//! Records every PWM and GPIO call in a shared journal so tests can assert
//! on the full command history without touching real registers.  A
//! one-shot gate can hold the next `configure` call open, which lets tests
//! catch the effect worker in the middle of a pass.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::digital::PinState;
use isa1000::adapters::description::JsonDescription;
use isa1000::app::ports::{GpioError, GpioPort, LineId, PwmError, PwmPort, PwmProvider};
use isa1000::config::HapticConfig;
use isa1000::{HapticDevice, SetupError, WorkerMode};

pub const EN: u32 = 39;
pub const HEN: u32 = 38;
pub const CHANNEL: u32 = 0;
/// 25 kHz default carrier.
pub const PERIOD_NS: u32 = 40_000;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwCall {
    RequestLine { line: u32, initial: PinState },
    SetLine { line: u32, level: PinState },
    FreeLine(u32),
    RequestPwm { channel: u32, label: &'static str },
    Configure { duty_ns: u32, period_ns: u32 },
    EnablePwm,
    DisablePwm,
    FreePwm,
}

struct Gate {
    entered: Sender<()>,
    release: Receiver<()>,
}

/// Test side of a configure gate.
pub struct GateHandle {
    /// Fires when the gated `configure` call has started.
    pub entered: Receiver<()>,
    /// Send once to let it finish.
    pub release: Sender<()>,
}

#[derive(Default)]
pub struct Journal {
    pub calls: Vec<HwCall>,
    pub levels: HashMap<u32, PinState>,
    pub claimed: HashSet<u32>,
    pub pwm_reserved: bool,
    pub pwm_running: bool,
    pub fail_configure: bool,
    pub fail_enable: bool,
    pub fail_request_line: Option<u32>,
    pub fail_request_pwm: bool,
    gate: Option<Gate>,
}

// ── MockHw ────────────────────────────────────────────────────

/// GPIO controller and PWM provider sharing one journal.
#[derive(Clone, Default)]
pub struct MockHw {
    journal: Arc<Mutex<Journal>>,
}

impl MockHw {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> MutexGuard<'_, Journal> {
        self.journal.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<HwCall> {
        self.journal().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.journal().calls.clear();
    }

    pub fn level(&self, line: u32) -> Option<PinState> {
        self.journal().levels.get(&line).copied()
    }

    pub fn enable_high(&self) -> bool {
        self.level(EN) == Some(PinState::High)
    }

    pub fn pwm_running(&self) -> bool {
        self.journal().pwm_running
    }

    pub fn configures(&self) -> Vec<(u32, u32)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HwCall::Configure { duty_ns, period_ns } => Some((duty_ns, period_ns)),
                _ => None,
            })
            .collect()
    }

    /// Hold the next `configure` call until the handle releases it.
    pub fn install_gate(&self) -> GateHandle {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        self.journal().gate = Some(Gate {
            entered: entered_tx,
            release: release_rx,
        });
        GateHandle {
            entered: entered_rx,
            release: release_tx,
        }
    }
}

impl GpioPort for MockHw {
    fn request_output(
        &mut self,
        line: LineId,
        _label: &'static str,
        initial: PinState,
    ) -> Result<(), GpioError> {
        let mut j = self.journal();
        if j.fail_request_line == Some(line.0) {
            return Err(GpioError::Provider(-16));
        }
        if !j.claimed.insert(line.0) {
            return Err(GpioError::Busy);
        }
        j.levels.insert(line.0, initial);
        j.calls.push(HwCall::RequestLine { line: line.0, initial });
        Ok(())
    }

    fn set_line(&mut self, line: LineId, level: PinState) -> Result<(), GpioError> {
        let mut j = self.journal();
        if !j.claimed.contains(&line.0) {
            return Err(GpioError::NotClaimed);
        }
        j.levels.insert(line.0, level);
        j.calls.push(HwCall::SetLine { line: line.0, level });
        Ok(())
    }

    fn free(&mut self, line: LineId) {
        let mut j = self.journal();
        if j.claimed.remove(&line.0) {
            j.calls.push(HwCall::FreeLine(line.0));
        }
    }
}

impl PwmProvider for MockHw {
    type Pwm = MockPwm;

    fn request(&mut self, channel: u32, label: &'static str) -> Result<MockPwm, PwmError> {
        let mut j = self.journal();
        if j.fail_request_pwm {
            return Err(PwmError::NoSuchChannel);
        }
        if j.pwm_reserved {
            return Err(PwmError::Busy);
        }
        j.pwm_reserved = true;
        j.calls.push(HwCall::RequestPwm { channel, label });
        Ok(MockPwm {
            channel,
            journal: self.journal.clone(),
        })
    }
}

// ── MockPwm ───────────────────────────────────────────────────

pub struct MockPwm {
    channel: u32,
    journal: Arc<Mutex<Journal>>,
}

impl PwmPort for MockPwm {
    fn configure(&mut self, duty_ns: u32, period_ns: u32) -> Result<(), PwmError> {
        let gate = {
            let mut j = self.journal.lock().unwrap();
            j.calls.push(HwCall::Configure { duty_ns, period_ns });
            if j.fail_configure {
                return Err(PwmError::InvalidArgument);
            }
            if period_ns == 0 || duty_ns > period_ns {
                return Err(PwmError::InvalidArgument);
            }
            j.gate.take()
        };
        // Journal unlocked while parked so the test can inspect it.
        if let Some(gate) = gate {
            let _ = gate.entered.send(());
            let _ = gate.release.recv();
        }
        Ok(())
    }

    fn enable(&mut self) -> Result<(), PwmError> {
        let mut j = self.journal.lock().unwrap();
        j.calls.push(HwCall::EnablePwm);
        if j.fail_enable {
            return Err(PwmError::Provider(-5));
        }
        j.pwm_running = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), PwmError> {
        let mut j = self.journal.lock().unwrap();
        j.calls.push(HwCall::DisablePwm);
        j.pwm_running = false;
        Ok(())
    }

    fn free(&mut self) {
        let mut j = self.journal.lock().unwrap();
        j.calls.push(HwCall::FreePwm);
        j.pwm_reserved = false;
        j.pwm_running = false;
    }

    fn channel(&self) -> u32 {
        self.channel
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub type TestDevice = HapticDevice<MockPwm, MockHw>;

pub fn description() -> JsonDescription {
    JsonDescription::from_json(&format!(
        r#"{{"compatible":"imagis,isa1000","gpio-isa1000-en":{EN},"gpio-haptic-en":{HEN},"pwm-channel":{CHANNEL}}}"#
    ))
    .unwrap()
}

pub fn try_attach_with(
    hw: &MockHw,
    config: &HapticConfig,
    mode: WorkerMode,
) -> Result<TestDevice, SetupError> {
    let mut provider = hw.clone();
    HapticDevice::probe(&description(), config, &mut provider, hw.clone(), mode)
}

/// Attached device plus its hardware, with the attach calls cleared.
pub fn attach(mode: WorkerMode) -> (TestDevice, MockHw) {
    let hw = MockHw::new();
    let dev = try_attach_with(&hw, &HapticConfig::default(), mode).unwrap();
    hw.clear_calls();
    (dev, hw)
}
