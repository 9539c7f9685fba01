//! ISA1000 haptic firmware: main entry point.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Adapters (outer ring)                   │
//! │  BoardDescription   LedcProvider / LedcPwm   EspGpio    │
//! │  (DescriptionSource)(PwmProvider / PwmPort)  (GpioPort) │
//! │                                                         │
//! │  ─────────────── Port Trait Boundary ─────────────────  │
//! │                                                         │
//! │  ┌───────────────────────────────────────────────────┐  │
//! │  │  HapticDevice: policy · EffectScheduler · Isa1000 │  │
//! │  └───────────────────────────────────────────────────┘  │
//! │        effect worker (APP core, task_pin)               │
//! └─────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{error, info, warn};

use isa1000::adapters::description::BoardDescription;
use isa1000::adapters::hardware::{EspGpio, LedcProvider, LedcPwm};
use isa1000::{Error, HapticConfig, HapticDevice, RumbleEffect, WorkerMode};

type BoardDevice = HapticDevice<LedcPwm, EspGpio>;

/// Length of the boot confirmation buzz.
const STARTUP_PULSE_MS: u32 = 150;
/// Status log cadence of the idle loop.
const STATUS_INTERVAL_MS: u32 = 10_000;

/// Probe the on-board ISA1000.  Nothing stays claimed on failure.
fn attach(config: &HapticConfig) -> Result<BoardDevice, Error> {
    let mut ledc = LedcProvider::board();
    let device = HapticDevice::probe(
        &BoardDescription,
        config,
        &mut ledc,
        EspGpio::new(),
        WorkerMode::Thread,
    )?;
    Ok(device)
}

/// Short buzz confirming the drive path works.
fn boot_pulse(device: &BoardDevice) -> Result<(), Error> {
    device.play_effect(&RumbleEffect::new(0xC000, 0));
    FreeRtos::delay_ms(STARTUP_PULSE_MS);
    device.set_intensity(0);
    device.flush();
    match device.status().last_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  ISA1000 haptics v{}                ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Attach ─────────────────────────────────────────────
    let config = HapticConfig::default();
    let device = attach(&config).inspect_err(|e| error!("isa1000: attach failed: {}", e))?;
    let info = device.input_info();
    info!("input: '{}' v{} caps={:?}", info.name, info.version, info.capabilities);

    // ── 3. Boot pulse ─────────────────────────────────────────
    if let Err(e) = boot_pulse(&device) {
        warn!("isa1000: boot pulse: {}", e);
    }

    // ── 4. Idle loop ──────────────────────────────────────────
    // Effects arrive from the input layer through play_effect(); the
    // main task only reports health.
    let mut reported_failures = 0;
    loop {
        FreeRtos::delay_ms(STATUS_INTERVAL_MS);
        let status = device.status();
        info!(
            "isa1000: active={} duty={}% passes={} failures={}",
            status.active, status.duty_percent, status.passes, status.drive_failures
        );
        if status.drive_failures != reported_failures {
            if let Some(e) = status.last_error {
                error!("isa1000: last drive error: {}", e);
            }
            reported_failures = status.drive_failures;
        }
    }
}
