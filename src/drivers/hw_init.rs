//! Raw peripheral access for the ISA1000 outputs.
//!
//! Thin wrappers over the ESP-IDF GPIO and LEDC C API.  Every function
//! returns the raw `esp_err_t` on failure; the adapters in
//! [`crate::adapters::hardware`] translate codes into port errors.
//!
//! On host targets every call succeeds without touching anything, so the
//! full driver runs in simulation.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::pins;

/// Highest duty value at [`pins::PWM_RESOLUTION_BITS`].
pub const LEDC_DUTY_MAX: u32 = (1 << pins::PWM_RESOLUTION_BITS) - 1;

#[cfg(target_os = "espidf")]
const LEDC_MODE: ledc_mode_t = ledc_mode_t_LEDC_LOW_SPEED_MODE;
#[cfg(target_os = "espidf")]
const LEDC_TIMER: ledc_timer_t = ledc_timer_t_LEDC_TIMER_0;

#[cfg(target_os = "espidf")]
fn check(ret: esp_err_t) -> Result<(), i32> {
    if ret == ESP_OK { Ok(()) } else { Err(ret) }
}

// ── GPIO outputs ──────────────────────────────────────────────

/// Configure `pin` as a push-pull output already driven to `high`.
#[cfg(target_os = "espidf")]
pub fn gpio_configure_output(pin: i32, high: bool) -> Result<(), i32> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        ..Default::default()
    };
    // SAFETY: plain register configuration of a pin number validated by
    // the caller; the output latch is set before the driver is enabled so
    // the line never glitches.
    unsafe {
        check(gpio_set_level(pin, u32::from(high)))?;
        check(gpio_config(&cfg))?;
    }
    info!("hw_init: gpio{} output, initial {}", pin, if high { "HIGH" } else { "LOW" });
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_configure_output(_pin: i32, _high: bool) -> Result<(), i32> {
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), i32> {
    // SAFETY: writes the output latch of a pin configured by
    // gpio_configure_output(); callers hold the actuator lock.
    check(unsafe { gpio_set_level(pin, u32::from(high)) })
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) -> Result<(), i32> {
    Ok(())
}

/// Return `pin` to its reset state (input, no pulls).
#[cfg(target_os = "espidf")]
pub fn gpio_reset(pin: i32) {
    // SAFETY: resetting a pin we configured; no other owner exists.
    unsafe {
        gpio_reset_pin(pin);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_reset(_pin: i32) {}

// ── LEDC PWM ─────────────────────────────────────────────────

/// Bind `channel` to `gpio` on timer 0 with the output parked low.
#[cfg(target_os = "espidf")]
pub fn ledc_attach(channel: u32, gpio: i32, freq_hz: u32) -> Result<(), i32> {
    let timer = ledc_timer_config_t {
        speed_mode: LEDC_MODE,
        timer_num: LEDC_TIMER,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_10_BIT,
        freq_hz,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let chan = ledc_channel_config_t {
        speed_mode: LEDC_MODE,
        channel,
        timer_sel: LEDC_TIMER,
        gpio_num: gpio,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    };
    // SAFETY: called once at attach from a single thread; the channel is
    // exclusively owned by the requesting adapter afterwards.
    unsafe {
        check(ledc_timer_config(&timer))?;
        check(ledc_channel_config(&chan))?;
        check(ledc_stop(LEDC_MODE, channel, 0))?;
    }
    info!("hw_init: LEDC ch{} -> gpio{} ({} Hz)", channel, gpio, freq_hz);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_attach(_channel: u32, _gpio: i32, _freq_hz: u32) -> Result<(), i32> {
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set_frequency(freq_hz: u32) -> Result<(), i32> {
    // SAFETY: timer 0 was configured in ledc_attach().
    check(unsafe { ledc_set_freq(LEDC_MODE, LEDC_TIMER, freq_hz) })
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set_frequency(_freq_hz: u32) -> Result<(), i32> {
    Ok(())
}

/// Latch `duty` (0..=LEDC_DUTY_MAX) and start the output.
#[cfg(target_os = "espidf")]
pub fn ledc_start(channel: u32, duty: u32) -> Result<(), i32> {
    // SAFETY: channel configured in ledc_attach(); duty register writes
    // are serialised by the actuator lock.
    unsafe {
        check(ledc_set_duty(LEDC_MODE, channel, duty))?;
        check(ledc_update_duty(LEDC_MODE, channel))
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_start(_channel: u32, _duty: u32) -> Result<(), i32> {
    Ok(())
}

/// Stop the output and hold it LOW.
#[cfg(target_os = "espidf")]
pub fn ledc_halt(channel: u32) -> Result<(), i32> {
    // SAFETY: see ledc_start().
    check(unsafe { ledc_stop(LEDC_MODE, channel, 0) })
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_halt(_channel: u32) -> Result<(), i32> {
    Ok(())
}
