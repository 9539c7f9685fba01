//! ISA1000 driver, raw peripheral helpers, and worker placement.

pub mod hw_init;
pub mod isa1000;
pub mod task_pin;
