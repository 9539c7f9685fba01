//! Request path and drive sequencing.

use embedded_hal::digital::PinState;
use isa1000::app::ports::PwmError;
use isa1000::config::DriveLimits;
use isa1000::control::policy::compute_drive;
use isa1000::scheduler::WorkState;
use isa1000::{DriveError, RumbleEffect, WorkerMode};

use crate::mock_hw::{EN, HwCall, PERIOD_NS, attach};

#[test]
fn zero_request_turns_actuator_off() {
    let (dev, hw) = attach(WorkerMode::Manual);
    dev.set_intensity(80);
    dev.flush();
    hw.clear_calls();

    dev.set_intensity(0);
    dev.flush();

    assert_eq!(
        hw.calls(),
        vec![
            HwCall::SetLine { line: EN, level: PinState::Low },
            HwCall::DisablePwm,
        ]
    );
    let status = dev.status();
    assert!(!status.active);
    assert_eq!(status.duty_percent, 50);
    assert!(!hw.pwm_running());
}

#[test]
fn oversized_request_drives_full_period() {
    let (dev, hw) = attach(WorkerMode::Manual);
    dev.set_intensity(200);
    dev.flush();

    assert_eq!(
        hw.calls(),
        vec![
            HwCall::Configure { duty_ns: PERIOD_NS, period_ns: PERIOD_NS },
            HwCall::EnablePwm,
            HwCall::SetLine { line: EN, level: PinState::High },
        ]
    );
    let status = dev.status();
    assert!(status.active);
    assert_eq!(status.duty_percent, 100);
    assert_eq!(status.requested_intensity, 200);
}

#[test]
fn weak_request_raised_to_floor() {
    let (dev, hw) = attach(WorkerMode::Manual);
    dev.set_intensity(30);
    dev.flush();

    assert_eq!(hw.configures(), vec![(28_000, PERIOD_NS)]);
    assert_eq!(dev.status().duty_percent, 70);
    assert!(hw.enable_high());
}

#[test]
fn in_range_request_passes_through() {
    let (dev, hw) = attach(WorkerMode::Manual);
    dev.set_intensity(85);
    dev.flush();
    assert_eq!(hw.configures(), vec![(34_000, PERIOD_NS)]);
    assert_eq!(dev.status().duty_percent, 85);
}

#[test]
fn burst_coalesces_into_one_pass_with_last_value() {
    let (dev, hw) = attach(WorkerMode::Manual);
    for x in [10, 50, 90, 0, 75] {
        dev.set_intensity(x);
    }
    assert_eq!(dev.work_state(), WorkState::Pending);
    assert!(hw.calls().is_empty(), "nothing applied before the worker runs");

    dev.flush();

    assert_eq!(hw.configures(), vec![(30_000, PERIOD_NS)]);
    assert_eq!(dev.status().passes, 1);
    assert_eq!(dev.work_state(), WorkState::Idle);
}

#[test]
fn repeated_request_is_idempotent() {
    let (once, hw_once) = attach(WorkerMode::Manual);
    once.set_intensity(80);
    once.flush();

    let (twice, hw_twice) = attach(WorkerMode::Manual);
    twice.set_intensity(80);
    twice.set_intensity(80);
    twice.flush();

    assert_eq!(hw_once.calls(), hw_twice.calls());
    assert_eq!(once.status(), twice.status());
}

#[test]
fn configure_failure_never_asserts_enable() {
    let (dev, hw) = attach(WorkerMode::Manual);
    hw.journal().fail_configure = true;

    dev.set_intensity(80);
    dev.flush();

    let calls = hw.calls();
    assert!(!calls.contains(&HwCall::SetLine { line: EN, level: PinState::High }));
    assert!(!calls.contains(&HwCall::EnablePwm));
    assert!(!hw.enable_high());

    let status = dev.status();
    assert!(!status.active);
    assert_eq!(status.drive_failures, 1);
    assert_eq!(
        status.last_error,
        Some(DriveError::PwmConfig(PwmError::InvalidArgument))
    );
}

#[test]
fn enable_failure_never_asserts_enable() {
    let (dev, hw) = attach(WorkerMode::Manual);
    hw.journal().fail_enable = true;

    dev.set_intensity(100);
    dev.flush();

    assert!(!hw.calls().contains(&HwCall::SetLine { line: EN, level: PinState::High }));
    assert!(!hw.pwm_running());
    let status = dev.status();
    assert!(!status.active);
    assert_eq!(status.last_error, Some(DriveError::PwmEnable(PwmError::Provider(-5))));
}

#[test]
fn recovers_after_transient_failure() {
    let (dev, hw) = attach(WorkerMode::Manual);
    hw.journal().fail_configure = true;
    dev.set_intensity(80);
    dev.flush();
    assert!(!dev.status().active);

    hw.journal().fail_configure = false;
    dev.set_intensity(80);
    dev.flush();

    let status = dev.status();
    assert!(status.active);
    assert_eq!(status.drive_failures, 1);
    assert!(hw.enable_high());
}

#[test]
fn rumble_effect_uses_strong_then_weak_magnitude() {
    let (dev, hw) = attach(WorkerMode::Manual);
    dev.play_effect(&RumbleEffect::new(0xFFFF, 0));
    dev.flush();
    assert_eq!(dev.status().requested_intensity, 255);
    assert_eq!(dev.status().duty_percent, 100);

    dev.play_effect(&RumbleEffect::new(0, 0x0400));
    dev.flush();
    assert_eq!(dev.status().requested_intensity, 2);
    assert_eq!(dev.status().duty_percent, 70);

    dev.play_effect(&RumbleEffect::default());
    dev.flush();
    assert!(!dev.status().active);
    assert!(!hw.enable_high());
}

#[test]
fn thread_worker_applies_requests() {
    let (dev, hw) = attach(WorkerMode::Thread);
    dev.set_intensity(90);
    dev.flush();

    let status = dev.status();
    assert!(status.active);
    assert_eq!(status.duty_percent, 90);
    assert!(status.passes >= 1);
    assert!(hw.enable_high());
    assert_eq!(hw.configures().last(), Some(&(36_000, PERIOD_NS)));
}

#[test]
fn concurrent_callers_last_write_wins() {
    let (dev, hw) = attach(WorkerMode::Thread);

    std::thread::scope(|s| {
        for t in 0..8u32 {
            let dev = &dev;
            s.spawn(move || {
                for i in 0..100u32 {
                    dev.set_intensity(i % 40);
                }
                // Each caller finishes on its own distinct duty.
                dev.set_intensity(71 + t * 4);
            });
        }
    });
    dev.flush();

    let status = dev.status();
    let last = status.requested_intensity;
    assert!((0..8).any(|t| last == 71 + t * 4), "stored value {last} was never a final write");

    let expected = compute_drive(last, &DriveLimits::default());
    assert_eq!(status.active, expected.active);
    assert_eq!(status.duty_percent, expected.duty_percent);
    assert_eq!(status.drive_failures, 0);
    assert!(hw.enable_high());

    let (duty_ns, period_ns) = *hw.configures().last().expect("at least one pass drove on");
    assert_eq!(period_ns, PERIOD_NS);
    assert_eq!(duty_ns, PERIOD_NS / 100 * u32::from(expected.duty_percent));
}
