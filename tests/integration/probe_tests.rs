//! Attach: description parsing, resource claiming and unwinding.

use embedded_hal::digital::PinState;
use isa1000::adapters::description::JsonDescription;
use isa1000::app::effects::FfCapability;
use isa1000::app::ports::{GpioError, LineId, PwmError};
use isa1000::app::service::PWM_LABEL;
use isa1000::config::{PROP_ENABLE_GPIO, PROP_HAPTIC_ENABLE_GPIO};
use isa1000::{HapticConfig, HapticDevice, SetupError, WorkerMode};

use crate::mock_hw::{CHANNEL, EN, HEN, HwCall, MockHw, TestDevice, try_attach_with};

fn probe_json(json: &str, hw: &MockHw) -> Result<TestDevice, SetupError> {
    let source = JsonDescription::from_json(json).unwrap();
    let mut provider = hw.clone();
    HapticDevice::probe(
        &source,
        &HapticConfig::default(),
        &mut provider,
        hw.clone(),
        WorkerMode::Manual,
    )
}

#[test]
fn probe_claims_lines_then_pwm() {
    let hw = MockHw::new();
    let dev = try_attach_with(&hw, &HapticConfig::default(), WorkerMode::Manual).unwrap();

    assert_eq!(
        hw.calls(),
        vec![
            HwCall::RequestLine { line: EN, initial: PinState::Low },
            HwCall::RequestLine { line: HEN, initial: PinState::High },
            HwCall::RequestPwm { channel: CHANNEL, label: PWM_LABEL },
        ]
    );
    assert_eq!(dev.description().enable_line, LineId(EN));
    let status = dev.status();
    assert!(!status.active);
    assert_eq!(status.duty_percent, 80);
    assert_eq!(status.passes, 0);
}

#[test]
fn probe_reports_input_identity() {
    let hw = MockHw::new();
    let dev = try_attach_with(&hw, &HapticConfig::default(), WorkerMode::Manual).unwrap();
    let info = dev.input_info();
    assert_eq!(info.name.as_str(), "isa1000-ff-memless");
    assert_eq!(info.version, 1);
    assert!(info.supports(FfCapability::Rumble));
    assert_eq!(dev.mode(), WorkerMode::Manual);
}

#[test]
fn incompatible_node_claims_nothing() {
    let hw = MockHw::new();
    let err = probe_json(
        r#"{"compatible":"ti,drv2605","gpio-isa1000-en":1,"gpio-haptic-en":2}"#,
        &hw,
    )
    .err();
    assert_eq!(err, Some(SetupError::Incompatible));
    assert!(hw.calls().is_empty());
}

#[test]
fn missing_enable_gpio_is_fatal() {
    let hw = MockHw::new();
    let err = probe_json(r#"{"compatible":"imagis,isa1000","gpio-haptic-en":2}"#, &hw).err();
    assert_eq!(err, Some(SetupError::MissingGpio(PROP_ENABLE_GPIO)));
    assert!(hw.calls().is_empty());
}

#[test]
fn negative_gpio_is_fatal() {
    let hw = MockHw::new();
    let err = probe_json(
        r#"{"compatible":"imagis,isa1000","gpio-isa1000-en":1,"gpio-haptic-en":-2}"#,
        &hw,
    )
    .err();
    assert_eq!(
        err,
        Some(SetupError::InvalidGpio { name: PROP_HAPTIC_ENABLE_GPIO, value: -2 })
    );
}

#[test]
fn missing_channel_falls_back_to_zero() {
    let hw = MockHw::new();
    let dev = probe_json(
        r#"{"compatible":"imagis,isa1000","gpio-isa1000-en":1,"gpio-haptic-en":2}"#,
        &hw,
    )
    .unwrap();
    assert_eq!(dev.description().pwm_channel, 0);
    assert!(hw.calls().contains(&HwCall::RequestPwm { channel: 0, label: PWM_LABEL }));
}

#[test]
fn haptic_enable_failure_releases_enable_line() {
    let hw = MockHw::new();
    hw.journal().fail_request_line = Some(HEN);

    let err = try_attach_with(&hw, &HapticConfig::default(), WorkerMode::Manual).err();

    assert_eq!(
        err,
        Some(SetupError::GpioRequest { line: LineId(HEN), cause: GpioError::Provider(-16) })
    );
    assert_eq!(hw.calls().last(), Some(&HwCall::FreeLine(EN)));
    assert!(hw.journal().claimed.is_empty());
}

#[test]
fn pwm_failure_releases_both_lines_in_reverse() {
    let hw = MockHw::new();
    hw.journal().fail_request_pwm = true;

    let err = try_attach_with(&hw, &HapticConfig::default(), WorkerMode::Thread).err();

    assert_eq!(
        err,
        Some(SetupError::PwmRequest { channel: CHANNEL, cause: PwmError::NoSuchChannel })
    );
    assert_eq!(
        hw.calls(),
        vec![
            HwCall::RequestLine { line: EN, initial: PinState::Low },
            HwCall::RequestLine { line: HEN, initial: PinState::High },
            HwCall::SetLine { line: HEN, level: PinState::Low },
            HwCall::FreeLine(HEN),
            HwCall::FreeLine(EN),
        ]
    );
    assert!(hw.journal().claimed.is_empty());
}

#[test]
fn invalid_config_rejected_before_claiming() {
    let hw = MockHw::new();
    let config = HapticConfig { pwm_frequency_hz: 0, ..HapticConfig::default() };
    let err = try_attach_with(&hw, &config, WorkerMode::Manual).err();
    assert!(matches!(err, Some(SetupError::InvalidConfig(_))));
    assert!(hw.calls().is_empty());
}

#[test]
fn custom_frequency_sets_period() {
    let hw = MockHw::new();
    let config = HapticConfig { pwm_frequency_hz: 20_000, ..HapticConfig::default() };
    let dev = try_attach_with(&hw, &config, WorkerMode::Manual).unwrap();
    dev.set_intensity(200);
    dev.flush();
    assert_eq!(hw.configures(), vec![(50_000, 50_000)]);
}

#[test]
fn second_attach_on_same_hardware_is_busy() {
    let hw = MockHw::new();
    let _first = try_attach_with(&hw, &HapticConfig::default(), WorkerMode::Manual).unwrap();
    let err = try_attach_with(&hw, &HapticConfig::default(), WorkerMode::Manual).err();
    assert_eq!(
        err,
        Some(SetupError::GpioRequest { line: LineId(EN), cause: GpioError::Busy })
    );
}
