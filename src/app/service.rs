//! Haptic device service: the hexagonal core.
//!
//! [`HapticDevice`] owns the actuator, the coalescing effect scheduler and
//! the worker that drains it.  All hardware access flows through the port
//! traits, so the whole lifecycle runs against mock adapters.
//!
//! ```text
//!  set_intensity ──▶ requested (atomic) ──▶ ┌──────────────────┐
//!  play_effect   ──▶ scheduler.schedule ──▶ │  effect worker   │ ──▶ PwmPort
//!                                           │  policy · Isa1000│ ──▶ GpioPort
//!  close / suspend ───────────────────────▶ └──────────────────┘
//! ```
//!
//! The request path never blocks and never fails.  Close waits for an
//! in-flight pass and leaves the actuator off.  Suspend forces the
//! actuator off immediately and does not synchronise with the worker;
//! the hardware lock keeps the PWM/GPIO handles consistent, but a pass
//! that was already computing may re-energise the actuator afterwards.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use embedded_hal::digital::PinState;
use log::{debug, error, info, warn};

use crate::config::{DriveLimits, HapticConfig, HardwareDescription};
use crate::control::policy::compute_drive;
use crate::drivers::isa1000::{ActuatorState, Isa1000};
use crate::drivers::task_pin;
use crate::error::{DriveError, SetupError};
use crate::scheduler::{EffectScheduler, WorkState};

use super::effects::{InputDeviceInfo, RumbleEffect};
use super::ports::{DescriptionSource, GpioPort, PwmPort, PwmProvider};

/// PWM label used when reserving the channel.
pub const PWM_LABEL: &str = "isa1000";
const ENABLE_LABEL: &str = "isa1000-en";
const HAPTIC_ENABLE_LABEL: &str = "haptic-en";

/// Who runs the effect passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMode {
    /// Dedicated worker thread (production).
    Thread,
    /// No worker; passes run inside [`HapticDevice::flush`].  Lets tests
    /// observe the queue before anything is applied.
    Manual,
}

/// Point-in-time view of the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    pub active: bool,
    pub duty_percent: u8,
    pub requested_intensity: u32,
    /// Worker passes run since attach.
    pub passes: u32,
    pub drive_failures: u32,
    pub last_error: Option<DriveError>,
}

// ───────────────────────────────────────────────────────────────
// Shared state
// ───────────────────────────────────────────────────────────────

struct Shared<P: PwmPort, G: GpioPort> {
    /// Last requested intensity.  Last write wins.
    requested: AtomicU32,
    scheduler: EffectScheduler,
    actuator: Mutex<ActuatorState<P, G>>,
    limits: DriveLimits,
}

impl<P: PwmPort, G: GpioPort> Shared<P, G> {
    fn actuator(&self) -> MutexGuard<'_, ActuatorState<P, G>> {
        self.actuator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One worker pass: read the latest request, evaluate, apply.
    fn run_pass(&self) {
        let intensity = self.requested.load(Ordering::Acquire);
        let cmd = compute_drive(intensity, &self.limits);
        let mut actuator = self.actuator();
        if let Err(e) = actuator.apply_command(cmd) {
            error!("isa1000: drive failed (intensity={}): {}", intensity, e);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// HapticDevice
// ───────────────────────────────────────────────────────────────

pub struct HapticDevice<P: PwmPort, G: GpioPort> {
    shared: Arc<Shared<P, G>>,
    worker: Option<JoinHandle<()>>,
    mode: WorkerMode,
    info: InputDeviceInfo,
    desc: HardwareDescription,
    detached: bool,
}

impl<P: PwmPort, G: GpioPort> HapticDevice<P, G> {
    // ── Attach ────────────────────────────────────────────────

    /// Attach to the hardware described by `source`.
    ///
    /// Claims the enable line (LOW), the haptic-enable line (HIGH) and the
    /// PWM channel, in that order.  On failure everything already claimed
    /// is released in reverse order and the device never exists.
    pub fn probe<S, PP>(
        source: &S,
        config: &HapticConfig,
        pwm_provider: &mut PP,
        mut gpio: G,
        mode: WorkerMode,
    ) -> Result<Self, SetupError>
    where
        S: DescriptionSource + ?Sized,
        PP: PwmProvider<Pwm = P>,
    {
        config.validate()?;
        let desc = HardwareDescription::parse(source)?;

        gpio.request_output(desc.enable_line, ENABLE_LABEL, PinState::Low)
            .map_err(|cause| {
                error!("isa1000: failed to request {}: {}", desc.enable_line, cause);
                SetupError::GpioRequest {
                    line: desc.enable_line,
                    cause,
                }
            })?;

        if let Err(cause) =
            gpio.request_output(desc.haptic_enable_line, HAPTIC_ENABLE_LABEL, PinState::High)
        {
            error!("isa1000: failed to request {}: {}", desc.haptic_enable_line, cause);
            gpio.free(desc.enable_line);
            return Err(SetupError::GpioRequest {
                line: desc.haptic_enable_line,
                cause,
            });
        }

        let pwm = match pwm_provider.request(desc.pwm_channel, PWM_LABEL) {
            Ok(pwm) => pwm,
            Err(cause) => {
                error!("isa1000: failed to request pwm ch{}: {}", desc.pwm_channel, cause);
                if let Err(e) = gpio.set_line(desc.haptic_enable_line, PinState::Low) {
                    warn!("isa1000: deassert {} failed: {}", desc.haptic_enable_line, e);
                }
                gpio.free(desc.haptic_enable_line);
                gpio.free(desc.enable_line);
                return Err(SetupError::PwmRequest {
                    channel: desc.pwm_channel,
                    cause,
                });
            }
        };

        let chip = Isa1000::new(pwm, gpio, &desc, config.pwm_frequency_hz);
        let shared = Arc::new(Shared {
            requested: AtomicU32::new(0),
            scheduler: EffectScheduler::new(),
            actuator: Mutex::new(ActuatorState::new(chip, config.initial_duty_percent)),
            limits: config.limits,
        });

        let worker = match mode {
            WorkerMode::Manual => None,
            WorkerMode::Thread => {
                let w = shared.clone();
                match task_pin::spawn(task_pin::EFFECT_WORKER, move || {
                    w.scheduler.run_worker(|| w.run_pass());
                }) {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        error!("isa1000: worker spawn failed: {}", e);
                        shared.actuator().release();
                        return Err(SetupError::WorkerSpawn);
                    }
                }
            }
        };

        info!(
            "isa1000: attached (pwm ch{}, {} Hz, {:?} worker)",
            desc.pwm_channel, config.pwm_frequency_hz, mode
        );

        Ok(Self {
            shared,
            worker,
            mode,
            info: InputDeviceInfo::isa1000(),
            desc,
            detached: false,
        })
    }

    // ── Request path ──────────────────────────────────────────

    /// Record a new requested intensity and queue a pass.
    ///
    /// Non-blocking and infallible; callable from any thread.  Requests
    /// that arrive before the worker runs collapse into one pass that
    /// uses the last value.
    pub fn set_intensity(&self, raw: u32) {
        self.shared.requested.store(raw, Ordering::Release);
        if !self.shared.scheduler.schedule() {
            debug!("isa1000: request {} coalesced", raw);
        }
    }

    /// Force-feedback entry point.
    pub fn play_effect(&self, effect: &RumbleEffect) {
        self.set_intensity(effect.intensity());
    }

    /// Run (or wait for) every queued pass.
    pub fn flush(&self) {
        match self.mode {
            WorkerMode::Manual => {
                let scheduler = &self.shared.scheduler;
                while scheduler.begin() {
                    self.shared.run_pass();
                    scheduler.finish();
                }
            }
            WorkerMode::Thread => self.shared.scheduler.wait_idle(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Input device closed: drop the queued pass, wait out a running
    /// one, leave the actuator off.
    ///
    /// A request made after close queues work again.
    pub fn close(&self) {
        if self.shared.scheduler.cancel_sync() {
            debug!("isa1000: close dropped a queued pass");
        }
        let mut actuator = self.shared.actuator();
        if actuator.is_active() {
            actuator.force_off();
        }
        info!("isa1000: closed");
    }

    /// System suspend: actuator off now, without waiting for the worker.
    pub fn suspend(&self) {
        self.shared.actuator().force_off();
        info!("isa1000: suspended");
    }

    /// System resume.  No hardware action; the next request drives the
    /// actuator again.
    pub fn resume(&self) {
        info!("isa1000: resumed");
    }

    /// Tear down: close, stop the worker, release every resource.
    pub fn detach(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.detached {
            return;
        }
        self.close();
        self.shared.scheduler.shutdown();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("isa1000: effect worker panicked");
            }
        }
        self.shared.actuator().release();
        self.detached = true;
        info!("isa1000: detached");
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> DeviceStatus {
        let requested_intensity = self.shared.requested.load(Ordering::Acquire);
        let actuator = self.shared.actuator();
        DeviceStatus {
            active: actuator.is_active(),
            duty_percent: actuator.duty_percent(),
            requested_intensity,
            passes: actuator.passes(),
            drive_failures: actuator.drive_failures(),
            last_error: actuator.last_error(),
        }
    }

    pub fn work_state(&self) -> WorkState {
        self.shared.scheduler.state()
    }

    pub fn input_info(&self) -> &InputDeviceInfo {
        &self.info
    }

    pub fn description(&self) -> &HardwareDescription {
        &self.desc
    }

    pub fn mode(&self) -> WorkerMode {
        self.mode
    }
}

impl<P: PwmPort, G: GpioPort> Drop for HapticDevice<P, G> {
    fn drop(&mut self) {
        self.teardown();
    }
}
