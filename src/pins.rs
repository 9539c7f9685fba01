//! Pin and peripheral assignments for the ISA1000 haptic board.
//!
//! Single source of truth for the board-default hardware description.
//! Boards that carry a description blob override these through
//! [`JsonDescription`](crate::adapters::description::JsonDescription).

// ---------------------------------------------------------------------------
// ISA1000 haptic driver
// ---------------------------------------------------------------------------

/// Digital output: ISA1000 chip enable (active HIGH).  Gates the drive
/// signal; held LOW whenever the actuator is idle.
pub const ISA1000_EN_GPIO: u32 = 39;
/// Digital output: haptic rail enable (active HIGH).  Asserted once at
/// attach and held for the lifetime of the device.
pub const HAPTIC_EN_GPIO: u32 = 38;
/// GPIO routed to the ISA1000 PWM input.
pub const ISA1000_PWM_GPIO: i32 = 40;
/// LEDC channel carrying the ISA1000 PWM signal.
pub const ISA1000_PWM_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// Controller limits
// ---------------------------------------------------------------------------

/// Highest GPIO number a description may reference.
pub const MAX_LINE_ID: i64 = 511;
/// Number of usable GPIOs on the ESP32-S3.
pub const ESP32S3_GPIO_COUNT: u32 = 49;
/// Number of LEDC channels on the ESP32-S3.
pub const LEDC_CHANNEL_COUNT: u32 = 8;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  10-bit is the widest that still
/// reaches 25 kHz from the 80 MHz APB clock.
pub const PWM_RESOLUTION_BITS: u32 = 10;
/// ISA1000 drive frequency (25 kHz, above the audible band).
pub const ISA1000_PWM_FREQ_HZ: u32 = 25_000;
